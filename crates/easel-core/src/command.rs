//! Invertible scene mutations.
//!
//! Every edit to the scene is described by a [`Command`] holding enough state
//! to run it forwards and backwards. A command validates all of its targets
//! before it writes anything, so a failed command leaves the scene untouched.

use crate::observer::SceneChange;
use crate::scene::{ObjectPatch, Scene, SceneError, SceneResult, check_object};
use crate::shapes::{ObjectId, SceneObject, SerializableColor};
use std::collections::HashSet;

/// A named, invertible mutation record.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Insert objects at the given z-indices (ascending).
    Insert { objects: Vec<(usize, SceneObject)> },
    /// Remove objects that sat at the given z-indices (ascending).
    Remove { objects: Vec<(usize, SceneObject)> },
    /// Replace object states.
    Modify {
        label: &'static str,
        before: Vec<SceneObject>,
        after: Vec<SceneObject>,
    },
    /// Move one object in z-order.
    Reorder {
        id: ObjectId,
        from: usize,
        to: usize,
    },
    /// Change the canvas background.
    SetBackground {
        before: SerializableColor,
        after: SerializableColor,
    },
}

impl Command {
    /// Insert a single object at `index`.
    pub fn insert(object: SceneObject, index: usize) -> Self {
        Command::Insert {
            objects: vec![(index, object)],
        }
    }

    /// Insert a single object on top of the scene.
    pub fn insert_on_top(scene: &Scene, object: SceneObject) -> Self {
        Self::insert(object, scene.len())
    }

    /// Capture the removal of `ids` from the current scene.
    pub fn remove(scene: &Scene, ids: &[ObjectId]) -> SceneResult<Self> {
        let mut objects = Vec::with_capacity(ids.len());
        let mut seen = HashSet::new();
        for &id in ids {
            if !seen.insert(id) {
                continue;
            }
            let index = scene.index_of(id).ok_or(SceneError::NotFound(id))?;
            objects.push((index, scene.list_objects()[index].clone()));
        }
        objects.sort_by_key(|(index, _)| *index);
        Ok(Command::Remove { objects })
    }

    /// Record a change from `before` to `after` (matched by position).
    pub fn modify(label: &'static str, before: Vec<SceneObject>, after: Vec<SceneObject>) -> Self {
        Command::Modify {
            label,
            before,
            after,
        }
    }

    /// Capture a partial update of one object.
    pub fn update(
        scene: &Scene,
        id: ObjectId,
        patch: &ObjectPatch,
        label: &'static str,
    ) -> SceneResult<Self> {
        let before = scene.get_object(id).ok_or(SceneError::NotFound(id))?;
        let after = patch.apply(before)?;
        Ok(Self::modify(label, vec![before.clone()], vec![after]))
    }

    /// Capture moving `id` to z-index `to`.
    pub fn reorder(scene: &Scene, id: ObjectId, to: usize) -> SceneResult<Self> {
        let from = scene.index_of(id).ok_or(SceneError::NotFound(id))?;
        if to >= scene.len() {
            return Err(SceneError::OutOfRange {
                index: to,
                len: scene.len(),
            });
        }
        Ok(Command::Reorder { id, from, to })
    }

    /// Capture a background change.
    pub fn set_background(scene: &Scene, color: SerializableColor) -> Self {
        Command::SetBackground {
            before: scene.background,
            after: color,
        }
    }

    /// Human-readable name, e.g. for an undo menu entry.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Insert { .. } => "Insert",
            Command::Remove { .. } => "Delete",
            Command::Modify { label, .. } => label,
            Command::Reorder { .. } => "Reorder",
            Command::SetBackground { .. } => "Background",
        }
    }

    /// Ids of the objects this command touches.
    pub fn targets(&self) -> Vec<ObjectId> {
        match self {
            Command::Insert { objects } | Command::Remove { objects } => {
                objects.iter().map(|(_, o)| o.id()).collect()
            }
            Command::Modify { after, .. } => after.iter().map(|o| o.id()).collect(),
            Command::Reorder { id, .. } => vec![*id],
            Command::SetBackground { .. } => Vec::new(),
        }
    }

    /// Whether applying this command would change nothing.
    pub fn is_noop(&self) -> bool {
        match self {
            Command::Insert { objects } | Command::Remove { objects } => objects.is_empty(),
            Command::Modify { before, after, .. } => before == after,
            Command::Reorder { from, to, .. } => from == to,
            Command::SetBackground { before, after } => before == after,
        }
    }

    /// Id of the empty text block this command places, when that is all it does.
    pub fn places_empty_text(&self) -> Option<ObjectId> {
        match self {
            Command::Insert { objects } => match objects.as_slice() {
                [(_, object)] if is_empty_text(object) => Some(object.id()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Id of the freshly placed text block this command fills in or discards.
    pub fn settles_empty_text(&self) -> Option<ObjectId> {
        match self {
            Command::Modify { before, .. } => match before.as_slice() {
                [object] if is_empty_text(object) => Some(object.id()),
                _ => None,
            },
            Command::Remove { objects } => match objects.as_slice() {
                [(_, object)] if is_empty_text(object) => Some(object.id()),
                _ => None,
            },
            _ => None,
        }
    }

    /// The command that undoes this one.
    pub fn inverse(&self) -> Command {
        match self {
            Command::Insert { objects } => Command::Remove {
                objects: objects.clone(),
            },
            Command::Remove { objects } => Command::Insert {
                objects: objects.clone(),
            },
            Command::Modify {
                label,
                before,
                after,
            } => Command::Modify {
                label,
                before: after.clone(),
                after: before.clone(),
            },
            Command::Reorder { id, from, to } => Command::Reorder {
                id: *id,
                from: *to,
                to: *from,
            },
            Command::SetBackground { before, after } => Command::SetBackground {
                before: *after,
                after: *before,
            },
        }
    }

    /// Run the forward mutation.
    pub fn apply(&self, scene: &mut Scene) -> SceneResult<Vec<SceneChange>> {
        self.validate(scene)?;
        let changes = match self {
            Command::Insert { objects } => {
                for (index, object) in objects {
                    scene.insert_object(object.clone(), *index)?;
                }
                objects
                    .iter()
                    .map(|(_, o)| SceneChange::Added(o.id()))
                    .collect()
            }
            Command::Remove { objects } => {
                for (_, object) in objects.iter().rev() {
                    scene.remove_object(object.id())?;
                }
                objects
                    .iter()
                    .map(|(_, o)| SceneChange::Removed(o.id()))
                    .collect()
            }
            Command::Modify { after, .. } => {
                for object in after {
                    scene.replace_object(object.clone())?;
                }
                after.iter().map(|o| SceneChange::Modified(o.id())).collect()
            }
            Command::Reorder { id, to, .. } => {
                scene.reorder(*id, *to)?;
                vec![SceneChange::Reordered(*id)]
            }
            Command::SetBackground { after, .. } => {
                scene.background = *after;
                vec![SceneChange::Canvas]
            }
        };
        Ok(changes)
    }

    /// Run the inverse mutation.
    pub fn revert(&self, scene: &mut Scene) -> SceneResult<Vec<SceneChange>> {
        self.inverse().apply(scene)
    }

    /// Check every precondition so that `apply` cannot fail halfway.
    fn validate(&self, scene: &Scene) -> SceneResult<()> {
        match self {
            Command::Insert { objects } => {
                let mut seen = HashSet::new();
                for (inserted, (index, object)) in objects.iter().enumerate() {
                    if scene.contains(object.id()) || !seen.insert(object.id()) {
                        return Err(SceneError::DuplicateId(object.id()));
                    }
                    check_object(object)?;
                    let len = scene.len() + inserted;
                    if *index > len {
                        return Err(SceneError::OutOfRange { index: *index, len });
                    }
                }
                Ok(())
            }
            Command::Remove { objects } => objects
                .iter()
                .map(|(_, o)| o.id())
                .find(|id| !scene.contains(*id))
                .map_or(Ok(()), |id| Err(SceneError::NotFound(id))),
            Command::Modify { before, after, .. } => {
                if before.len() != after.len() {
                    return Err(SceneError::MismatchedModify {
                        before: before.len(),
                        after: after.len(),
                    });
                }
                let mut seen = HashSet::new();
                for (b, a) in before.iter().zip(after) {
                    if b.id() != a.id() || !scene.contains(a.id()) {
                        return Err(SceneError::NotFound(a.id()));
                    }
                    if !seen.insert(a.id()) {
                        return Err(SceneError::DuplicateId(a.id()));
                    }
                    check_object(a)?;
                }
                Ok(())
            }
            Command::Reorder { id, to, .. } => {
                if !scene.contains(*id) {
                    return Err(SceneError::NotFound(*id));
                }
                if *to >= scene.len() {
                    return Err(SceneError::OutOfRange {
                        index: *to,
                        len: scene.len(),
                    });
                }
                Ok(())
            }
            Command::SetBackground { .. } => Ok(()),
        }
    }
}

fn is_empty_text(object: &SceneObject) -> bool {
    object.kind.as_text().is_some_and(|t| t.content.is_empty())
}
