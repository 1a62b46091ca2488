//! Headless command-line interface.
//!
//!   easel info drawing.json
//!   easel export drawing.json drawing.png
//!   easel replay session.json --project out.json --png out.png

use crate::error::{AppError, AppResult};
use crate::script::Script;
use crate::session::Session;
use crate::shortcuts::ShortcutRegistry;
use clap::{Parser, Subcommand};
use easel_core::{EditorConfig, EditorError, FileStorage, MemoryStorage, Scene, Storage};
use easel_render::export_png;
use std::path::{Path, PathBuf};

/// Easel headless editor.
#[derive(Parser, Debug)]
#[command(name = "easel", version, about = "Inspect, export and replay Easel drawings")]
pub struct Cli {
    /// Editor configuration (JSON). Missing fields keep their defaults.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Print the canvas and layer list of a project.
    Info { project: PathBuf },
    /// Render a project to PNG at canvas size.
    Export { project: PathBuf, output: PathBuf },
    /// Run a replay script against a fresh canvas.
    Replay {
        script: PathBuf,
        /// Write the resulting project here.
        #[arg(long, value_name = "FILE")]
        project: Option<PathBuf>,
        /// Write the resulting render here.
        #[arg(long, value_name = "FILE")]
        png: Option<PathBuf>,
        /// Directory used by `save`/`load` actions. Kept in memory when omitted.
        #[arg(long, value_name = "DIR")]
        store: Option<PathBuf>,
    },
    /// List keyboard shortcuts usable in replay scripts.
    Shortcuts,
}

pub fn run(cli: Cli) -> AppResult<()> {
    let config = match &cli.config {
        Some(path) => EditorConfig::load_from_file(path)?,
        None => EditorConfig::default(),
    };
    match cli.command {
        CliCommand::Info { project } => {
            let scene = open_project(&project)?;
            print!("{}", describe(&scene));
        }
        CliCommand::Export { project, output } => {
            let scene = open_project(&project)?;
            let bytes = export_png(&scene)?;
            write_file(&output, &bytes)?;
        }
        CliCommand::Replay {
            script,
            project,
            png,
            store,
        } => {
            let script = Script::load(&script)?;
            let storage: Box<dyn Storage> = match store {
                Some(dir) => Box::new(FileStorage::new(dir).map_err(EditorError::from)?),
                None => Box::new(MemoryStorage::new()),
            };
            let mut session = Session::new(config, storage);
            script.run(&mut session)?;
            if let Some(path) = project {
                let bytes = session.editor().save_project()?;
                write_file(&path, &bytes)?;
            }
            if let Some(path) = png {
                let bytes = export_png(session.editor().scene())?;
                write_file(&path, &bytes)?;
            }
        }
        CliCommand::Shortcuts => ShortcutRegistry::print_all(),
    }
    Ok(())
}

fn open_project(path: &Path) -> AppResult<Scene> {
    let bytes = std::fs::read(path).map_err(|e| AppError::io(path, e))?;
    let scene = easel_core::deserialize(&bytes).map_err(EditorError::from)?;
    log::info!("Opened {} ({} objects)", path.display(), scene.len());
    Ok(scene)
}

fn write_file(path: &Path, bytes: &[u8]) -> AppResult<()> {
    std::fs::write(path, bytes).map_err(|e| AppError::io(path, e))?;
    log::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Human-readable summary of a scene, topmost layer first.
pub fn describe(scene: &Scene) -> String {
    let bg = scene.background;
    let mut out = format!(
        "Canvas {}x{} background #{:02x}{:02x}{:02x}{:02x}\n{} objects\n",
        scene.width,
        scene.height,
        bg.r,
        bg.g,
        bg.b,
        bg.a,
        scene.len()
    );
    for object in scene.list_objects().iter().rev() {
        let mut flags = String::new();
        if !object.visible {
            flags.push_str(" hidden");
        }
        if object.locked {
            flags.push_str(" locked");
        }
        out.push_str(&format!(
            "  [{}] {} \"{}\"{}\n",
            object.z_index,
            object.kind.label(),
            object.name,
            flags
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use easel_core::shapes::Rectangle;
    use easel_core::{SceneObject, ShapeKind};
    use kurbo::Point;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_replay() {
        let cli = Cli::parse_from(["easel", "replay", "s.json", "--png", "o.png", "--config", "c.json"]);
        assert_eq!(cli.config, Some(PathBuf::from("c.json")));
        match cli.command {
            CliCommand::Replay { script, png, project, .. } => {
                assert_eq!(script, PathBuf::from("s.json"));
                assert_eq!(png, Some(PathBuf::from("o.png")));
                assert!(project.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_describe_lists_topmost_first() {
        let mut scene = Scene::new(10.0, 20.0);
        let mut rect = SceneObject::new(ShapeKind::Rectangle(Rectangle::new(1.0, 1.0)), Point::ZERO);
        rect.locked = true;
        scene.add_object(rect).unwrap();
        scene
            .add_object(SceneObject::new(ShapeKind::Rectangle(Rectangle::new(1.0, 1.0)), Point::ZERO).with_name("Top"))
            .unwrap();

        let text = describe(&scene);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Canvas 10x20 background #ffffffff");
        assert_eq!(lines[1], "2 objects");
        assert_eq!(lines[2], "  [1] Rectangle \"Top\"");
        assert_eq!(lines[3], "  [0] Rectangle \"Rectangle\" locked");
    }
}
