//! Command-line entry point.

use clap::Parser;
use easel_app::cli::{Cli, run};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("Starting Easel: {:?}", cli.command);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("easel: {}", e);
            ExitCode::FAILURE
        }
    }
}
