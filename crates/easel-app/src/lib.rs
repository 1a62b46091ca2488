//! Easel Application
//!
//! The editing session behind the toolbar, its layer panel, keyboard
//! shortcuts, replay scripts and the headless `easel` CLI.

pub mod cli;
mod error;
mod layers;
mod script;
mod session;
mod shortcuts;

pub use error::{AppError, AppResult};
pub use layers::{LayerPanel, LayerRow};
pub use script::{Script, Step};
pub use session::{IMPORT_TIMEOUT, Session, ToolbarAction};
pub use shortcuts::{Shortcut, ShortcutRegistry};
