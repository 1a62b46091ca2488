//! Editor session: the editor plus everything the toolbar drives.

use crate::error::{AppError, AppResult};
use crate::layers::LayerPanel;
use easel_core::shapes::{FontFamily, FontWeight, TextAlign};
use easel_core::{
    Editor, EditorConfig, EditorError, ImageFilter, InputEvent, ObjectId, ObjectPatch, Restack,
    SerializableColor, ShapeTool, Storage, ToolKind,
};
use easel_render::{ImageFilters, LiveSurface, decode_image, encode_png, export_png};
use image::RgbaImage;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

/// Toolbar buttons and menu entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolbarAction {
    SelectTool,
    Draw,
    Erase,
    InsertRectangle,
    InsertEllipse,
    Text,
    Undo,
    Redo,
    SelectAll,
    ClearSelection,
    DeleteSelection,
    BringForward,
    SendBackward,
    BringToFront,
    SendToBack,
    ToggleLock,
    ToggleVisibility,
    /// Apply a filter to the selected image.
    ApplyFilter(ImageFilter),
    ClearFilters,
    /// Decode an image file in the background; centred on the canvas without `at`.
    ImportImage {
        path: PathBuf,
        #[serde(default)]
        at: Option<Point>,
    },
    ExportPng {
        path: PathBuf,
    },
    /// Save to the session's project storage.
    Save {
        name: String,
    },
    Load {
        name: String,
    },
    ToggleLayerPanel,
    ToggleSnap,
    SetBackground(SerializableColor),
    /// Style of the selection, or of new shapes when nothing is selected.
    SetStrokeColor(SerializableColor),
    SetFillColor(Option<SerializableColor>),
    SetStrokeWidth(f64),
    SetOpacity(f64),
    /// Font of the selected text blocks. Font size also sets the size of new blocks.
    SetFontSize(f64),
    SetFontFamily(FontFamily),
    SetFontWeight(FontWeight),
    SetAlign(TextAlign),
}

impl ToolbarAction {
    pub fn label(&self) -> &'static str {
        match self {
            ToolbarAction::SelectTool => "Select tool",
            ToolbarAction::Draw => "Draw",
            ToolbarAction::Erase => "Erase",
            ToolbarAction::InsertRectangle => "Insert rectangle",
            ToolbarAction::InsertEllipse => "Insert ellipse",
            ToolbarAction::Text => "Text",
            ToolbarAction::Undo => "Undo",
            ToolbarAction::Redo => "Redo",
            ToolbarAction::SelectAll => "Select all",
            ToolbarAction::ClearSelection => "Clear selection",
            ToolbarAction::DeleteSelection => "Delete selection",
            ToolbarAction::BringForward => "Bring forward",
            ToolbarAction::SendBackward => "Send backward",
            ToolbarAction::BringToFront => "Bring to front",
            ToolbarAction::SendToBack => "Send to back",
            ToolbarAction::ToggleLock => "Toggle lock",
            ToolbarAction::ToggleVisibility => "Toggle visibility",
            ToolbarAction::ApplyFilter(_) => "Apply filter",
            ToolbarAction::ClearFilters => "Clear filters",
            ToolbarAction::ImportImage { .. } => "Import image",
            ToolbarAction::ExportPng { .. } => "Export PNG",
            ToolbarAction::Save { .. } => "Save",
            ToolbarAction::Load { .. } => "Load",
            ToolbarAction::ToggleLayerPanel => "Toggle layer panel",
            ToolbarAction::ToggleSnap => "Toggle snap",
            ToolbarAction::SetBackground(_) => "Set background",
            ToolbarAction::SetStrokeColor(_) => "Stroke color",
            ToolbarAction::SetFillColor(_) => "Fill color",
            ToolbarAction::SetStrokeWidth(_) => "Stroke width",
            ToolbarAction::SetOpacity(_) => "Opacity",
            ToolbarAction::SetFontSize(_) => "Font size",
            ToolbarAction::SetFontFamily(_) => "Font family",
            ToolbarAction::SetFontWeight(_) => "Font weight",
            ToolbarAction::SetAlign(_) => "Align",
        }
    }
}

/// How long a session waits for background imports before giving up.
pub const IMPORT_TIMEOUT: Duration = Duration::from_secs(30);

/// One editing session.
pub struct Session {
    editor: Editor,
    surface: Rc<RefCell<LiveSurface>>,
    layers: Rc<RefCell<LayerPanel>>,
    filters: ImageFilters,
    storage: Box<dyn Storage>,
    snap_enabled: bool,
}

impl Session {
    pub fn new(config: EditorConfig, storage: Box<dyn Storage>) -> Self {
        let snap_enabled = config.snap_enabled;
        let mut editor = Editor::new(config).with_decoder(Arc::new(decode_image));
        let surface = Rc::new(RefCell::new(LiveSurface::default()));
        let layers = Rc::new(RefCell::new(LayerPanel::new()));
        editor.add_observer(surface.clone());
        editor.add_observer(layers.clone());
        Self {
            editor,
            surface,
            layers,
            filters: ImageFilters::default(),
            storage,
            snap_enabled,
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn layers(&self) -> std::cell::Ref<'_, LayerPanel> {
        self.layers.borrow()
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn snap_enabled(&self) -> bool {
        self.snap_enabled
    }

    /// The last frame rendered from the committed scene.
    pub fn frame(&self) -> Option<RgbaImage> {
        self.surface.borrow().frame().cloned()
    }

    /// The current frame as PNG bytes.
    pub fn frame_png(&self) -> AppResult<Option<Vec<u8>>> {
        let surface = self.surface.borrow();
        Ok(surface.frame().map(encode_png).transpose()?)
    }

    /// Feed one pointer or keyboard event to the active tool.
    pub fn handle_event(&mut self, event: &InputEvent) {
        self.editor.handle_event(event);
        self.poll_imports();
    }

    /// Run a toolbar action.
    ///
    /// Rejected edits (missing objects, out-of-range indices, invalid
    /// property values) are logged and leave the scene as it was; every other
    /// failure is returned.
    pub fn dispatch(&mut self, action: ToolbarAction) -> AppResult<()> {
        log::debug!("Toolbar: {}", action.label());
        match self.run(action) {
            Err(AppError::Editor(e @ (EditorError::Scene(_) | EditorError::Style(_)))) => {
                log::warn!("Action skipped: {}", e);
                Ok(())
            }
            other => other,
        }
    }

    fn run(&mut self, action: ToolbarAction) -> AppResult<()> {
        match action {
            ToolbarAction::SelectTool => self.editor.set_tool(ToolKind::Select),
            ToolbarAction::Draw => self.editor.set_tool(ToolKind::Draw),
            ToolbarAction::Erase => self.editor.set_tool(ToolKind::Erase),
            ToolbarAction::InsertRectangle => self.editor.set_tool(ToolKind::Insert(ShapeTool::Rectangle)),
            ToolbarAction::InsertEllipse => self.editor.set_tool(ToolKind::Insert(ShapeTool::Ellipse)),
            ToolbarAction::Text => self.editor.set_tool(ToolKind::Text),
            ToolbarAction::Undo => {
                self.editor.undo()?;
            }
            ToolbarAction::Redo => {
                self.editor.redo()?;
            }
            ToolbarAction::SelectAll => self.editor.select_all(),
            ToolbarAction::ClearSelection => self.editor.clear_selection(),
            ToolbarAction::DeleteSelection => self.editor.delete_selection()?,
            ToolbarAction::BringForward => self.editor.restack_selection(Restack::Forward)?,
            ToolbarAction::SendBackward => self.editor.restack_selection(Restack::Backward)?,
            ToolbarAction::BringToFront => self.editor.restack_selection(Restack::Front)?,
            ToolbarAction::SendToBack => self.editor.restack_selection(Restack::Back)?,
            ToolbarAction::ToggleLock => self.editor.toggle_lock_selection()?,
            ToolbarAction::ToggleVisibility => self.editor.toggle_visibility_selection()?,
            ToolbarAction::ApplyFilter(filter) => {
                if let Some(id) = self.selected_image() {
                    self.editor.apply_filter(id, filter, &self.filters)?;
                }
            }
            ToolbarAction::ClearFilters => {
                if let Some(id) = self.selected_image() {
                    self.editor.clear_filters(id)?;
                }
            }
            ToolbarAction::ImportImage { path, at } => {
                let bytes = std::fs::read(&path).map_err(|e| AppError::io(&path, e))?;
                let ticket = self.editor.import_image(bytes, at)?;
                log::info!("Importing {} as {:?}", path.display(), ticket);
            }
            ToolbarAction::ExportPng { path } => {
                let bytes = export_png(self.editor.scene())?;
                std::fs::write(&path, bytes).map_err(|e| AppError::io(&path, e))?;
            }
            ToolbarAction::Save { name } => {
                pollster::block_on(self.editor.save_to(self.storage.as_ref(), &name))?;
                log::info!("Saved project {}", name);
            }
            ToolbarAction::Load { name } => {
                pollster::block_on(self.editor.load_from(self.storage.as_ref(), &name))?;
            }
            ToolbarAction::ToggleLayerPanel => {
                let open = self.layers.borrow_mut().toggle();
                log::debug!("Layer panel {}", if open { "opened" } else { "closed" });
            }
            ToolbarAction::ToggleSnap => {
                self.snap_enabled = !self.snap_enabled;
                self.editor.set_snap_enabled(self.snap_enabled);
            }
            ToolbarAction::SetBackground(color) => self.editor.set_background(color)?,
            ToolbarAction::SetStrokeColor(color) => {
                let patch = ObjectPatch {
                    stroke_color: Some(color),
                    ..Default::default()
                };
                self.restyle(patch, "Stroke color")?;
            }
            ToolbarAction::SetFillColor(fill) => {
                let patch = ObjectPatch {
                    fill_color: Some(fill),
                    ..Default::default()
                };
                self.restyle(patch, "Fill color")?;
            }
            ToolbarAction::SetStrokeWidth(width) => {
                let patch = ObjectPatch {
                    stroke_width: Some(width),
                    ..Default::default()
                };
                self.restyle(patch, "Stroke width")?;
            }
            ToolbarAction::SetOpacity(opacity) => {
                let patch = ObjectPatch {
                    opacity: Some(opacity),
                    ..Default::default()
                };
                self.restyle(patch, "Opacity")?;
            }
            ToolbarAction::SetFontSize(size) => {
                if self.selected_text().is_empty() {
                    self.editor.set_font_size(size)?;
                } else {
                    let patch = ObjectPatch {
                        font_size: Some(size),
                        ..Default::default()
                    };
                    self.retext(patch, "Font size")?;
                }
            }
            ToolbarAction::SetFontFamily(family) => {
                let patch = ObjectPatch {
                    font_family: Some(family),
                    ..Default::default()
                };
                self.retext(patch, "Font family")?;
            }
            ToolbarAction::SetFontWeight(weight) => {
                let patch = ObjectPatch {
                    font_weight: Some(weight),
                    ..Default::default()
                };
                self.retext(patch, "Font weight")?;
            }
            ToolbarAction::SetAlign(align) => {
                let patch = ObjectPatch {
                    align: Some(align),
                    ..Default::default()
                };
                self.retext(patch, "Align")?;
            }
        }
        self.poll_imports();
        Ok(())
    }

    /// Patch the selection as one command, or the style of new shapes when
    /// nothing is selected.
    fn restyle(&mut self, patch: ObjectPatch, label: &'static str) -> AppResult<()> {
        if !self.editor.selection().is_empty() {
            self.editor.update_selection(&patch, label)?;
            return Ok(());
        }
        let mut style = self.editor.current_style().clone();
        if let Some(color) = patch.stroke_color {
            style.stroke_color = color;
        }
        if let Some(fill) = patch.fill_color {
            style.fill_color = fill;
        }
        if let Some(width) = patch.stroke_width {
            style.stroke_width = width;
        }
        if let Some(opacity) = patch.opacity {
            style.opacity = opacity;
        }
        self.editor.set_current_style(style)?;
        log::debug!("{} set for new shapes", label);
        Ok(())
    }

    /// Patch the selected text blocks as one command; other selected kinds are left alone.
    fn retext(&mut self, patch: ObjectPatch, label: &'static str) -> AppResult<()> {
        let ids = self.selected_text();
        if ids.is_empty() {
            log::debug!("{} needs a selected text block", label);
            return Ok(());
        }
        self.editor.update_objects(&ids, &patch, label)?;
        Ok(())
    }

    fn selected_text(&self) -> Vec<ObjectId> {
        let scene = self.editor.scene();
        self.editor
            .selection()
            .in_z_order(scene)
            .into_iter()
            .filter(|&id| scene.get_object(id).is_some_and(|o| o.kind.as_text().is_some()))
            .collect()
    }

    fn selected_image(&self) -> Option<ObjectId> {
        let id = self.editor.selection().single();
        let image = id.filter(|&id| {
            self.editor
                .scene()
                .get_object(id)
                .is_some_and(|o| o.kind.as_image().is_some())
        });
        if image.is_none() {
            log::debug!("Filters need exactly one selected image");
        }
        image
    }

    /// Insert imports that finished since the last call.
    pub fn poll_imports(&mut self) -> Vec<ObjectId> {
        let results = self.editor.poll_imports();
        Self::inserted(results)
    }

    /// Block until every pending import has landed or failed.
    pub fn finish_imports(&mut self) -> Vec<ObjectId> {
        if self.editor.pending_imports() == 0 {
            return Vec::new();
        }
        let results = self.editor.wait_imports(IMPORT_TIMEOUT);
        if self.editor.pending_imports() > 0 {
            log::warn!("{} imports still pending", self.editor.pending_imports());
        }
        Self::inserted(results)
    }

    // Failures were already logged by the editor.
    fn inserted(results: Vec<easel_core::EditorResult<ObjectId>>) -> Vec<ObjectId> {
        results.into_iter().filter_map(Result::ok).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_core::MemoryStorage;

    fn session() -> Session {
        let config = EditorConfig {
            canvas_width: 64.0,
            canvas_height: 48.0,
            ..Default::default()
        };
        Session::new(config, Box::new(MemoryStorage::new()))
    }

    fn click_drag(session: &mut Session, from: Point, to: Point) {
        session.handle_event(&InputEvent::down(from));
        session.handle_event(&InputEvent::moved(to));
        session.handle_event(&InputEvent::up(to));
    }

    #[test]
    fn test_insert_returns_to_select() {
        let mut s = session();
        s.dispatch(ToolbarAction::InsertRectangle).unwrap();
        click_drag(&mut s, Point::new(5.0, 5.0), Point::new(20.0, 20.0));
        assert_eq!(s.editor().current_tool(), ToolKind::Select);

        // A second drag with the select tool must not insert again.
        click_drag(&mut s, Point::new(30.0, 30.0), Point::new(40.0, 40.0));
        assert_eq!(s.editor().scene().len(), 1);
        assert_eq!(s.editor().history().undo_len(), 1);
    }

    #[test]
    fn test_restack_and_undo_through_toolbar() {
        let mut s = session();
        for _ in 0..2 {
            s.dispatch(ToolbarAction::InsertEllipse).unwrap();
            click_drag(&mut s, Point::new(5.0, 5.0), Point::new(25.0, 25.0));
        }
        let bottom = s.editor().scene().list_objects()[0].id();
        s.editor_mut().select_ids(&[bottom]);
        s.dispatch(ToolbarAction::BringToFront).unwrap();
        assert_eq!(s.layers().row_of(bottom), Some(0));

        s.dispatch(ToolbarAction::Undo).unwrap();
        assert_eq!(s.layers().row_of(bottom), Some(1));
        s.dispatch(ToolbarAction::Redo).unwrap();
        assert_eq!(s.layers().row_of(bottom), Some(0));
    }

    #[test]
    fn test_filter_without_image_is_ignored() {
        let mut s = session();
        s.dispatch(ToolbarAction::ApplyFilter(ImageFilter::Invert)).unwrap();
        assert_eq!(s.editor().history().undo_len(), 0);
    }

    #[test]
    fn test_save_and_load_through_storage() {
        let mut s = session();
        s.dispatch(ToolbarAction::SetBackground(SerializableColor::new(10, 20, 30, 255)))
            .unwrap();
        s.dispatch(ToolbarAction::Save { name: "doc".into() }).unwrap();
        s.dispatch(ToolbarAction::SetBackground(SerializableColor::white())).unwrap();

        s.dispatch(ToolbarAction::Load { name: "doc".into() }).unwrap();
        assert_eq!(s.editor().scene().background, SerializableColor::new(10, 20, 30, 255));
        assert!(!s.editor().history().can_undo());
        assert_eq!(s.frame().unwrap().get_pixel(1, 1).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_load_missing_project_is_an_error() {
        let mut s = session();
        assert!(s.dispatch(ToolbarAction::Load { name: "nope".into() }).is_err());
    }

    #[test]
    fn test_toggle_snap_and_panel() {
        let mut s = session();
        assert!(!s.snap_enabled());
        s.dispatch(ToolbarAction::ToggleSnap).unwrap();
        assert!(s.snap_enabled());
        s.dispatch(ToolbarAction::ToggleLayerPanel).unwrap();
        assert!(s.layers().is_open());
    }

    #[test]
    fn test_style_without_selection_applies_to_new_shapes() {
        let mut s = session();
        let red = SerializableColor::new(255, 0, 0, 255);
        s.dispatch(ToolbarAction::SetStrokeColor(red)).unwrap();
        s.dispatch(ToolbarAction::SetStrokeWidth(6.0)).unwrap();
        assert_eq!(s.editor().history().undo_len(), 0);

        s.dispatch(ToolbarAction::InsertRectangle).unwrap();
        click_drag(&mut s, Point::new(5.0, 5.0), Point::new(30.0, 30.0));
        let style = &s.editor().scene().list_objects()[0].style;
        assert_eq!(style.stroke_color, red);
        assert!((style.stroke_width - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_property_values_are_skipped() {
        let mut s = session();
        s.dispatch(ToolbarAction::SetStrokeWidth(-4.0)).unwrap();
        s.dispatch(ToolbarAction::SetFontSize(0.0)).unwrap();
        assert!((s.editor().current_style().stroke_width - 2.0).abs() < f64::EPSILON);

        s.dispatch(ToolbarAction::InsertEllipse).unwrap();
        click_drag(&mut s, Point::new(5.0, 5.0), Point::new(30.0, 30.0));
        s.dispatch(ToolbarAction::SetStrokeWidth(-4.0)).unwrap();
        s.dispatch(ToolbarAction::SetOpacity(f64::NAN)).unwrap();
        assert_eq!(s.editor().history().undo_len(), 1);
    }

    #[test]
    fn test_font_actions_skip_non_text() {
        let mut s = session();
        s.dispatch(ToolbarAction::InsertRectangle).unwrap();
        click_drag(&mut s, Point::new(5.0, 5.0), Point::new(30.0, 30.0));
        s.dispatch(ToolbarAction::SetFontFamily(FontFamily::Serif)).unwrap();
        s.dispatch(ToolbarAction::SetAlign(TextAlign::Right)).unwrap();
        assert_eq!(s.editor().history().undo_len(), 1);
    }

    #[test]
    fn test_actions_round_trip_as_json() {
        let json = r#"["undo", {"apply_filter": {"Brighten": 20}}, {"import_image": {"path": "a.png"}},
            {"set_fill_color": null}, {"set_font_weight": "Bold"}]"#;
        let actions: Vec<ToolbarAction> = serde_json::from_str(json).unwrap();
        assert_eq!(actions[0], ToolbarAction::Undo);
        assert_eq!(actions[1], ToolbarAction::ApplyFilter(ImageFilter::Brighten(20)));
        assert_eq!(
            actions[2],
            ToolbarAction::ImportImage {
                path: "a.png".into(),
                at: None
            }
        );
        assert_eq!(actions[3], ToolbarAction::SetFillColor(None));
        assert_eq!(actions[4], ToolbarAction::SetFontWeight(FontWeight::Bold));
    }
}
