//! Layer panel model.

use easel_core::{ObjectId, Scene, SceneChange, SceneObserver};

/// One row of the layer panel.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRow {
    pub id: ObjectId,
    pub name: String,
    pub kind: &'static str,
    pub visible: bool,
    pub locked: bool,
}

/// Rows mirror the committed scene, topmost object first.
#[derive(Debug, Default)]
pub struct LayerPanel {
    rows: Vec<LayerRow>,
    open: bool,
}

impl LayerPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[LayerRow] {
        &self.rows
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    /// Position of an object in the panel (0 is the top row).
    pub fn row_of(&self, id: ObjectId) -> Option<usize> {
        self.rows.iter().position(|r| r.id == id)
    }
}

impl SceneObserver for LayerPanel {
    fn scene_changed(&mut self, scene: &Scene, _changes: &[SceneChange]) {
        self.rows = scene
            .list_objects()
            .iter()
            .rev()
            .map(|o| LayerRow {
                id: o.id(),
                name: o.name.clone(),
                kind: o.kind.label(),
                visible: o.visible,
                locked: o.locked,
            })
            .collect();
    }
}
