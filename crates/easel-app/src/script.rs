//! Replay scripts: recorded input and toolbar actions, run headlessly.
//!
//! A script is a JSON array. Each step is one of
//!
//! ```json
//! {"event": {"PointerDown": {"x": 10, "y": 10}}}
//! {"action": "insert_rectangle"}
//! {"key": "Ctrl+Z"}
//! ```

use crate::error::{AppError, AppResult};
use crate::session::{Session, ToolbarAction};
use crate::shortcuts::ShortcutRegistry;
use easel_core::InputEvent;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Event { event: InputEvent },
    Action { action: ToolbarAction },
    Key { key: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script {
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_json(json: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
        Self::from_json(&json)
    }

    /// Run every step in order, then wait for outstanding imports.
    ///
    /// Stops at the first failing step; earlier steps stay applied.
    pub fn run(&self, session: &mut Session) -> AppResult<()> {
        for (i, step) in self.steps.iter().enumerate() {
            let result = match step {
                Step::Event { event } => {
                    session.handle_event(event);
                    Ok(())
                }
                Step::Action { action } => session.dispatch(action.clone()),
                Step::Key { key } => match ShortcutRegistry::lookup(key) {
                    Some(action) => session.dispatch(action),
                    None => Err(AppError::UnknownShortcut(key.clone())),
                },
            };
            if let Err(e) = result {
                log::error!("Script step {} failed: {}", i, e);
                return Err(e);
            }
        }
        session.finish_imports();
        log::info!(
            "Replayed {} steps, {} objects in scene",
            self.steps.len(),
            session.editor().scene().len()
        );
        Ok(())
    }
}
