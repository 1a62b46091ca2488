//! Change notifications for read-only scene observers (renderer, panels).

use crate::scene::Scene;
use crate::shapes::ObjectId;

/// One committed change to the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneChange {
    Added(ObjectId),
    Removed(ObjectId),
    Modified(ObjectId),
    Reordered(ObjectId),
    /// Canvas-level properties (background) changed.
    Canvas,
    /// The whole scene was swapped, e.g. by loading a project.
    Replaced,
}

impl SceneChange {
    /// The object this change concerns, if any.
    pub fn object(&self) -> Option<ObjectId> {
        match *self {
            SceneChange::Added(id)
            | SceneChange::Removed(id)
            | SceneChange::Modified(id)
            | SceneChange::Reordered(id) => Some(id),
            SceneChange::Canvas | SceneChange::Replaced => None,
        }
    }
}

/// Receives the scene after every committed mutation.
///
/// Observers only ever see a scene whose mutation fully applied.
pub trait SceneObserver {
    fn scene_changed(&mut self, scene: &Scene, changes: &[SceneChange]);
}
