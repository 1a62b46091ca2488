//! The editor session: the one writer of a scene.
//!
//! An [`Editor`] owns the scene, its history, the selection and the tool
//! state machine. Every change goes through [`Editor::execute`], which records
//! a command and then notifies observers with the committed scene.

use crate::codec;
use crate::command::Command;
use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};
use crate::filter::{FilterBackend, FilterError, ImageFilter};
use crate::history::History;
use crate::import::{Decoder, ImportCompletion, ImportQueue, ImportTicket};
use crate::observer::{SceneChange, SceneObserver};
use crate::scene::{ObjectPatch, Restack, Scene, SceneError};
use crate::selection::Selection;
use crate::shapes::{InvalidObject, ObjectId, SceneObject, SerializableColor, ShapeKind, ShapeStyle};
use crate::snap::snap_correction;
use crate::storage::Storage;
use crate::tools::{InputEvent, ToolKind, ToolManager};
use kurbo::Point;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Shared handle to a scene observer.
pub type ObserverHandle = Rc<RefCell<dyn SceneObserver>>;

/// Editing session over one scene.
pub struct Editor {
    scene: Scene,
    history: History,
    selection: Selection,
    tools: ToolManager,
    config: EditorConfig,
    observers: Vec<ObserverHandle>,
    imports: Option<ImportQueue>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    /// Create an editor with an empty canvas sized by `config`.
    pub fn new(config: EditorConfig) -> Self {
        let scene = Scene::new(config.canvas_width, config.canvas_height)
            .with_background(config.background);
        Self {
            scene,
            history: History::with_limit(config.history_limit),
            selection: Selection::new(),
            tools: ToolManager::from_config(&config),
            config,
            observers: Vec::new(),
            imports: None,
        }
    }

    /// Enable image import with the given decoder.
    pub fn with_decoder(mut self, decoder: Decoder) -> Self {
        self.imports = Some(ImportQueue::new(decoder));
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn tools(&self) -> &ToolManager {
        &self.tools
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn current_tool(&self) -> ToolKind {
        self.tools.current_tool
    }

    /// Register an observer. It is called after every committed change.
    pub fn add_observer(&mut self, observer: ObserverHandle) {
        observer.borrow_mut().scene_changed(&self.scene, &[SceneChange::Replaced]);
        self.observers.push(observer);
    }

    fn notify(&self, changes: &[SceneChange]) {
        if changes.is_empty() {
            return;
        }
        for observer in &self.observers {
            match observer.try_borrow_mut() {
                Ok(mut observer) => observer.scene_changed(&self.scene, changes),
                Err(_) => log::warn!("Scene observer is busy, skipping notification"),
            }
        }
    }

    /// Apply and record one command.
    ///
    /// On error the scene, history and observers are untouched.
    pub fn execute(&mut self, command: Command) -> EditorResult<()> {
        if command.is_noop() {
            log::debug!("Skipping no-op {} command", command.name());
            return Ok(());
        }
        let name = command.name();
        let changes = self.history.execute(command, &mut self.scene).inspect_err(|e| {
            log::warn!("{} rejected: {}", name, e);
        })?;
        self.selection.retain_existing(&self.scene);
        self.notify(&changes);
        Ok(())
    }

    /// Revert the last command. Returns false when there was nothing to undo.
    pub fn undo(&mut self) -> EditorResult<bool> {
        self.end_gesture();
        match self.history.undo(&mut self.scene)? {
            Some(changes) => {
                self.selection.retain_existing(&self.scene);
                self.notify(&changes);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Re-apply the last undone command. Returns false when there was nothing to redo.
    pub fn redo(&mut self) -> EditorResult<bool> {
        self.end_gesture();
        match self.history.redo(&mut self.scene)? {
            Some(changes) => {
                self.selection.retain_existing(&self.scene);
                self.notify(&changes);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Commit any open text edit and drop any pointer gesture.
    fn end_gesture(&mut self) {
        let tool = self.tools.current_tool;
        if let Some(command) = self.tools.set_tool(tool, &self.scene) {
            self.execute_recovering(command);
        }
    }

    /// Execute a command produced by input; scene errors are logged, not returned.
    fn execute_recovering(&mut self, command: Command) {
        if let Err(e) = self.execute(command) {
            log::warn!("Dropped tool command: {}", e);
            self.selection.retain_existing(&self.scene);
        }
    }

    /// Switch tools. Gestures in progress are abandoned.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if let Some(command) = self.tools.set_tool(tool, &self.scene) {
            self.execute_recovering(command);
        }
    }

    /// Feed one input event to the active tool.
    pub fn handle_event(&mut self, event: &InputEvent) {
        if let Some(command) = self.tools.handle_event(event, &self.scene, &mut self.selection) {
            self.execute_recovering(command);
        }
    }

    /// The scene with the in-progress gesture drawn in. Nothing here is recorded.
    pub fn preview_scene(&self) -> Scene {
        let mut scene = self.scene.clone();
        for object in self.tools.preview(&self.scene) {
            let applied = if scene.contains(object.id()) {
                scene.replace_object(object).map(|_| ())
            } else {
                scene.add_object(object).map(|_| ())
            };
            if let Err(e) = applied {
                log::debug!("Preview object skipped: {}", e);
            }
        }
        scene
    }

    pub fn set_snap_enabled(&mut self, enabled: bool) {
        self.config.snap_enabled = enabled;
        self.tools.snap_mode = self.config.snap_mode();
    }

    /// Style given to shapes created from now on.
    pub fn set_current_style(&mut self, style: ShapeStyle) -> EditorResult<()> {
        style.validate()?;
        self.tools.current_style = style;
        Ok(())
    }

    pub fn current_style(&self) -> &ShapeStyle {
        &self.tools.current_style
    }

    /// Font size given to text blocks placed from now on.
    pub fn set_font_size(&mut self, size: f64) -> EditorResult<()> {
        if !(size.is_finite() && size > 0.0) {
            return Err(InvalidObject::Malformed("Text").into());
        }
        self.tools.font_size = size;
        Ok(())
    }

    pub fn select_ids(&mut self, ids: &[ObjectId]) {
        self.selection.select_ids(&self.scene, ids);
    }

    pub fn select_all(&mut self) {
        let ids: Vec<_> = self
            .scene
            .list_objects()
            .iter()
            .filter(|o| o.is_interactable())
            .map(SceneObject::id)
            .collect();
        self.selection.select_ids(&self.scene, &ids);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Insert an object on top of the scene as one command.
    pub fn insert_object(&mut self, object: SceneObject) -> EditorResult<ObjectId> {
        let id = object.id();
        self.execute(Command::insert_on_top(&self.scene, object))?;
        Ok(id)
    }

    /// Delete the selected objects as one command.
    pub fn delete_selection(&mut self) -> EditorResult<()> {
        if self.selection.is_empty() {
            return Ok(());
        }
        let command = Command::remove(&self.scene, self.selection.ids())?;
        self.execute(command)?;
        self.selection.clear();
        Ok(())
    }

    /// Apply a property patch to every selected object as one command.
    pub fn update_selection(&mut self, patch: &ObjectPatch, label: &'static str) -> EditorResult<()> {
        let ids = self.selection.in_z_order(&self.scene);
        self.update_objects(&ids, patch, label)
    }

    /// Apply a property patch to the given objects as one command.
    pub fn update_objects(
        &mut self,
        ids: &[ObjectId],
        patch: &ObjectPatch,
        label: &'static str,
    ) -> EditorResult<()> {
        let mut before = Vec::with_capacity(ids.len());
        let mut after = Vec::with_capacity(ids.len());
        for &id in ids {
            let object = self.scene.get_object(id).ok_or(SceneError::NotFound(id))?;
            after.push(patch.apply(object)?);
            before.push(object.clone());
        }
        if before.is_empty() {
            return Ok(());
        }
        self.execute(Command::modify(label, before, after))
    }

    /// Move the single selected object in z-order.
    pub fn restack_selection(&mut self, step: Restack) -> EditorResult<()> {
        let Some(id) = self.selection.single() else {
            log::debug!("Restack needs exactly one selected object");
            return Ok(());
        };
        let to = self.scene.restack_index(id, step)?;
        let command = Command::reorder(&self.scene, id, to)?;
        self.execute(command)
    }

    /// Flip the lock flag of every selected object. Mixed selections become locked.
    pub fn toggle_lock_selection(&mut self) -> EditorResult<()> {
        let lock = !self.selected_objects().all(|o| o.locked);
        let patch = ObjectPatch {
            locked: Some(lock),
            ..Default::default()
        };
        self.update_selection(&patch, if lock { "Lock" } else { "Unlock" })
    }

    /// Flip the visibility of every selected object. Mixed selections become hidden.
    pub fn toggle_visibility_selection(&mut self) -> EditorResult<()> {
        let show = !self.selected_objects().any(|o| o.visible);
        let patch = ObjectPatch {
            visible: Some(show),
            ..Default::default()
        };
        self.update_selection(&patch, if show { "Show" } else { "Hide" })
    }

    fn selected_objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.selection
            .ids()
            .iter()
            .filter_map(|&id| self.scene.get_object(id))
    }

    pub fn set_background(&mut self, color: SerializableColor) -> EditorResult<()> {
        self.execute(Command::set_background(&self.scene, color))
    }

    /// Run `filter` on an image object and record it.
    ///
    /// The backend runs first; if it fails nothing is recorded and the image
    /// keeps its current filters.
    pub fn apply_filter(
        &mut self,
        id: ObjectId,
        filter: ImageFilter,
        backend: &dyn FilterBackend,
    ) -> EditorResult<()> {
        let object = self.scene.get_object(id).ok_or(SceneError::NotFound(id))?;
        let image = object.kind.as_image().ok_or(FilterError::NotAnImage)?;
        filter.validate()?;
        backend.apply(image, filter).inspect_err(|e| {
            log::warn!("Filter {} failed on {}: {}", filter.name(), id, e);
        })?;

        let mut filters = image.filters.clone();
        filters.push(filter);
        let patch = ObjectPatch {
            filters: Some(filters),
            ..Default::default()
        };
        self.execute(Command::update(&self.scene, id, &patch, "Apply filter")?)
    }

    /// Remove every filter from an image object as one command.
    pub fn clear_filters(&mut self, id: ObjectId) -> EditorResult<()> {
        let object = self.scene.get_object(id).ok_or(SceneError::NotFound(id))?;
        if object.kind.as_image().is_none() {
            return Err(FilterError::NotAnImage.into());
        }
        let patch = ObjectPatch {
            filters: Some(Vec::new()),
            ..Default::default()
        };
        self.execute(Command::update(&self.scene, id, &patch, "Clear filters")?)
    }

    /// Start decoding an image in the background.
    pub fn import_image(&mut self, bytes: Vec<u8>, position: Option<Point>) -> EditorResult<ImportTicket> {
        let queue = self.imports.as_mut().ok_or(EditorError::NoDecoder)?;
        Ok(queue.submit(bytes, position))
    }

    /// Abandon a pending import; its result will never reach the scene.
    pub fn cancel_import(&mut self, ticket: ImportTicket) -> bool {
        self.imports.as_mut().is_some_and(|q| q.cancel(ticket))
    }

    pub fn pending_imports(&self) -> usize {
        self.imports.as_ref().map_or(0, ImportQueue::pending_count)
    }

    /// Insert every finished import, one command each.
    pub fn poll_imports(&mut self) -> Vec<EditorResult<ObjectId>> {
        let completions = self.imports.as_mut().map(ImportQueue::poll).unwrap_or_default();
        self.finish_imports(completions)
    }

    /// Block until pending imports finish (or `timeout` passes), then insert them.
    pub fn wait_imports(&mut self, timeout: Duration) -> Vec<EditorResult<ObjectId>> {
        let completions = self
            .imports
            .as_mut()
            .map(|q| q.wait(timeout))
            .unwrap_or_default();
        self.finish_imports(completions)
    }

    fn finish_imports(&mut self, completions: Vec<ImportCompletion>) -> Vec<EditorResult<ObjectId>> {
        completions
            .into_iter()
            .map(|completion| {
                let decoded = completion.result.inspect_err(|e| {
                    log::warn!("Image import {:?} failed: {}", completion.ticket, e);
                })?;
                let image = decoded.to_image(self.config.default_image_width);
                let position = match completion.position {
                    Some(p) => p + snap_correction(p, self.tools.snap_mode, self.tools.grid_size),
                    None => Point::new(
                        ((self.scene.width - image.width) / 2.0).max(0.0),
                        ((self.scene.height - image.height) / 2.0).max(0.0),
                    ),
                };
                let object = SceneObject::new(ShapeKind::Image(image), position);
                let id = self.insert_object(object)?;
                log::info!("Imported image {}", id);
                Ok(id)
            })
            .collect()
    }

    /// Encode the current scene as a project document.
    pub fn save_project(&self) -> EditorResult<Vec<u8>> {
        Ok(codec::serialize(&self.scene)?)
    }

    /// Replace the scene with a decoded project. On error nothing changes.
    pub fn load_project(&mut self, bytes: &[u8]) -> EditorResult<()> {
        let scene = codec::deserialize(bytes).inspect_err(|e| {
            log::warn!("Project rejected: {}", e);
        })?;
        self.replace_scene(scene);
        Ok(())
    }

    /// Swap in a whole new scene, resetting history, selection, tool state and imports.
    pub fn replace_scene(&mut self, scene: Scene) {
        self.scene = scene;
        self.history.clear();
        self.selection.clear();
        self.tools.state = Default::default();
        if let Some(queue) = self.imports.as_mut() {
            queue.cancel_all();
        }
        log::info!("Loaded project with {} objects", self.scene.len());
        self.notify(&[SceneChange::Replaced]);
    }

    /// Save the scene to a storage backend.
    pub async fn save_to(&self, storage: &dyn Storage, id: &str) -> EditorResult<()> {
        storage.save(id, &self.scene).await?;
        Ok(())
    }

    /// Load a scene from a storage backend, replacing the current one.
    pub async fn load_from(&mut self, storage: &dyn Storage, id: &str) -> EditorResult<()> {
        let scene = storage.load(id).await?;
        self.replace_scene(scene);
        Ok(())
    }
}
