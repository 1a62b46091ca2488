//! Undo/redo stacks of invertible commands.

use crate::command::Command;
use crate::observer::SceneChange;
use crate::scene::{Scene, SceneResult};

/// Applied and redo stacks.
///
/// The applied stack followed by the reversed redo stack is the sequence of
/// every command executed since the last clear (minus any dropped by the
/// limit).
#[derive(Debug, Clone, Default)]
pub struct History {
    applied: Vec<Command>,
    redo: Vec<Command>,
    /// Maximum number of undoable commands (None = unlimited).
    limit: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// History that keeps at most `limit` undoable commands.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Apply a new command and record it. Clears the redo stack.
    ///
    /// A command that fails validation is not recorded and the redo stack is
    /// left alone.
    pub fn execute(&mut self, command: Command, scene: &mut Scene) -> SceneResult<Vec<SceneChange>> {
        let changes = command.apply(scene)?;
        self.applied.push(command);
        self.redo.clear();
        if let Some(limit) = self.limit {
            let excess = self.applied.len().saturating_sub(limit);
            if excess > 0 {
                self.applied.drain(..excess);
            }
        }
        Ok(changes)
    }

    /// Revert the most recent command. `Ok(None)` when there is nothing to undo.
    ///
    /// Placing a text block and typing into it undo as one step.
    pub fn undo(&mut self, scene: &mut Scene) -> SceneResult<Option<Vec<SceneChange>>> {
        let Some(command) = self.applied.pop() else {
            log::debug!("Nothing to undo");
            return Ok(None);
        };
        let mut changes = match command.revert(scene) {
            Ok(changes) => changes,
            Err(e) => {
                self.applied.push(command);
                return Err(e);
            }
        };
        let linked = command.settles_empty_text().is_some()
            && self.applied.last().and_then(Command::places_empty_text) == command.settles_empty_text();
        self.redo.push(command);
        if linked {
            if let Some(placement) = self.applied.pop() {
                match placement.revert(scene) {
                    Ok(more) => {
                        changes.extend(more);
                        self.redo.push(placement);
                    }
                    Err(e) => {
                        log::warn!("Text placement could not be undone: {}", e);
                        self.applied.push(placement);
                    }
                }
            }
        }
        Ok(Some(changes))
    }

    /// Re-apply the most recently undone command. `Ok(None)` when there is nothing to redo.
    pub fn redo(&mut self, scene: &mut Scene) -> SceneResult<Option<Vec<SceneChange>>> {
        let Some(command) = self.redo.pop() else {
            log::debug!("Nothing to redo");
            return Ok(None);
        };
        let mut changes = match command.apply(scene) {
            Ok(changes) => changes,
            Err(e) => {
                self.redo.push(command);
                return Err(e);
            }
        };
        let linked = command.places_empty_text().is_some()
            && self.redo.last().and_then(Command::settles_empty_text) == command.places_empty_text();
        self.applied.push(command);
        if linked {
            if let Some(edit) = self.redo.pop() {
                match edit.apply(scene) {
                    Ok(more) => {
                        changes.extend(more);
                        self.applied.push(edit);
                    }
                    Err(e) => {
                        log::warn!("Text edit could not be redone: {}", e);
                        self.redo.push(edit);
                    }
                }
            }
        }
        Ok(Some(changes))
    }

    pub fn can_undo(&self) -> bool {
        !self.applied.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of undoable commands.
    pub fn undo_len(&self) -> usize {
        self.applied.len()
    }

    /// Number of redoable commands.
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Name of the command `undo` would revert.
    pub fn undo_name(&self) -> Option<&'static str> {
        self.applied.last().map(Command::name)
    }

    /// Applied commands, oldest first.
    pub fn applied(&self) -> &[Command] {
        &self.applied
    }

    pub fn clear(&mut self) {
        self.applied.clear();
        self.redo.clear();
    }
}
