//! Tool state machine: turns pointer and keyboard input into commands.
//!
//! Tools never write to the scene. A finished gesture yields at most one
//! [`Command`], which the editor executes through history. Intermediate
//! frames of a gesture are only visible through [`ToolManager::preview`].

use crate::command::Command;
use crate::config::EditorConfig;
use crate::scene::{ObjectPatch, Scene};
use crate::selection::{self, Corner, HANDLE_HIT_TOLERANCE, Selection};
use crate::shapes::{
    Ellipse, Freehand, ObjectId, Rectangle, SceneObject, ShapeKind, ShapeStyle, StrokeMode, Text,
};
use crate::snap::{SnapMode, snap_correction};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Shapes the insert tool can place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeTool {
    Rectangle,
    Ellipse,
}

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Draw,
    Erase,
    Insert(ShapeTool),
    Text,
}

impl ToolKind {
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Draw => "draw",
            ToolKind::Erase => "erase",
            ToolKind::Insert(ShapeTool::Rectangle) => "rectangle",
            ToolKind::Insert(ShapeTool::Ellipse) => "ellipse",
            ToolKind::Text => "text",
        }
    }
}

/// Input delivered to the active tool, in canvas coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default)]
        shift: bool,
    },
    PointerMove {
        x: f64,
        y: f64,
    },
    PointerUp {
        x: f64,
        y: f64,
    },
    /// Characters typed into the text block being edited.
    Type(String),
    Backspace,
    /// Finish editing the current text block.
    Commit,
    /// Abandon the current gesture without recording anything.
    Cancel,
}

impl InputEvent {
    pub fn down(point: Point) -> Self {
        InputEvent::PointerDown {
            x: point.x,
            y: point.y,
            shift: false,
        }
    }

    pub fn moved(point: Point) -> Self {
        InputEvent::PointerMove {
            x: point.x,
            y: point.y,
        }
    }

    pub fn up(point: Point) -> Self {
        InputEvent::PointerUp {
            x: point.x,
            y: point.y,
        }
    }
}

/// A select-tool drag: moving the selection or resizing one object.
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    /// The object under the pointer when the drag began.
    pub grabbed: ObjectId,
    /// Corner being dragged (None = moving).
    pub handle: Option<Corner>,
    pub start: Point,
    pub current: Point,
    /// Objects as they were when the drag began, in z-order.
    pub originals: Vec<SceneObject>,
}

impl DragState {
    pub fn delta(&self) -> Vec2 {
        self.current - self.start
    }

    /// Object states for the current pointer position.
    fn transformed(&self, snap: SnapMode, grid_size: f64) -> Vec<SceneObject> {
        let delta = self.delta();
        match self.handle {
            Some(corner) => self
                .originals
                .iter()
                .map(|original| {
                    let handle = selection::handles(original)
                        .into_iter()
                        .find(|h| h.corner == corner)
                        .map_or(original.position(), |h| h.position);
                    let correction = snap_correction(handle + delta, snap, grid_size);
                    selection::resize_from_corner(original, corner, delta + correction)
                })
                .collect(),
            None => {
                let anchor = self
                    .originals
                    .iter()
                    .find(|o| o.id() == self.grabbed)
                    .map_or(Point::ZERO, SceneObject::position);
                let total = delta + snap_correction(anchor + delta, snap, grid_size);
                self.originals
                    .iter()
                    .map(|original| {
                        let mut moved = original.clone();
                        moved.translate(total);
                        moved
                    })
                    .collect()
            }
        }
    }
}

/// Text block currently receiving typed input.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEdit {
    pub id: ObjectId,
    pub buffer: String,
}

/// State of a tool interaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ToolState {
    /// Waiting for input.
    #[default]
    Idle,
    Dragging(DragState),
    /// Rubber-band selection on empty canvas.
    Marquee { start: Point, current: Point },
    /// Accumulating a freehand path (canvas coordinates).
    Stroking { points: Vec<Point> },
    /// Click or drag that will place a shape or text block.
    Inserting { start: Point, current: Point },
    EditingText(TextEdit),
}

/// Manages the current tool and its state.
#[derive(Debug, Clone)]
pub struct ToolManager {
    /// Currently selected tool.
    pub current_tool: ToolKind,
    /// Current state of the tool.
    pub state: ToolState,
    /// Style applied to new shapes.
    pub current_style: ShapeStyle,
    /// Corner radius for new rectangles.
    pub corner_radius: f64,
    /// Font size for new text blocks.
    pub font_size: f64,
    pub snap_mode: SnapMode,
    pub grid_size: f64,
    hit_tolerance: f64,
    click_threshold: f64,
    default_size: (f64, f64),
    simplify_tolerance: f64,
    eraser_width: f64,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            current_tool: ToolKind::default(),
            state: ToolState::default(),
            current_style: config.default_style.clone(),
            corner_radius: 0.0,
            font_size: Text::DEFAULT_FONT_SIZE,
            snap_mode: config.snap_mode(),
            grid_size: config.grid_size,
            hit_tolerance: config.hit_tolerance,
            click_threshold: config.click_threshold,
            default_size: (config.default_shape_width, config.default_shape_height),
            simplify_tolerance: config.simplify_tolerance,
            eraser_width: config.eraser_width,
        }
    }

    /// Switch tools. Any pointer gesture in progress is dropped; an open text
    /// edit is committed.
    pub fn set_tool(&mut self, tool: ToolKind, scene: &Scene) -> Option<Command> {
        let command = self.finish_text_edit(scene);
        self.state = ToolState::Idle;
        self.current_tool = tool;
        command
    }

    /// Check if a gesture or text edit is in progress.
    pub fn is_active(&self) -> bool {
        self.state != ToolState::Idle
    }

    /// The id of the text block being edited.
    pub fn editing_text(&self) -> Option<ObjectId> {
        match &self.state {
            ToolState::EditingText(edit) => Some(edit.id),
            _ => None,
        }
    }

    /// Feed one input event. Returns the command the gesture produced, if any.
    pub fn handle_event(
        &mut self,
        event: &InputEvent,
        scene: &Scene,
        selection: &mut Selection,
    ) -> Option<Command> {
        match *event {
            InputEvent::PointerDown { x, y, shift } => {
                self.pointer_down(Point::new(x, y), shift, scene, selection)
            }
            InputEvent::PointerMove { x, y } => {
                self.pointer_move(Point::new(x, y));
                None
            }
            InputEvent::PointerUp { x, y } => self.pointer_up(Point::new(x, y), scene, selection),
            InputEvent::Type(ref chars) => {
                if let ToolState::EditingText(edit) = &mut self.state {
                    edit.buffer.push_str(chars);
                }
                None
            }
            InputEvent::Backspace => {
                if let ToolState::EditingText(edit) = &mut self.state {
                    edit.buffer.pop();
                }
                None
            }
            InputEvent::Commit => self.finish_text_edit(scene),
            InputEvent::Cancel => {
                self.state = ToolState::Idle;
                None
            }
        }
    }

    fn pointer_down(
        &mut self,
        point: Point,
        shift: bool,
        scene: &Scene,
        selection: &mut Selection,
    ) -> Option<Command> {
        // Clicking away ends text editing; this event's command is that commit.
        let committed = self.finish_text_edit(scene);
        self.state = ToolState::Idle;

        match self.current_tool {
            ToolKind::Select => self.begin_select(point, shift, scene, selection),
            ToolKind::Draw | ToolKind::Erase => {
                self.state = ToolState::Stroking {
                    points: vec![point],
                };
            }
            ToolKind::Insert(_) | ToolKind::Text => {
                self.state = ToolState::Inserting {
                    start: point,
                    current: point,
                };
            }
        }
        committed
    }

    fn begin_select(&mut self, point: Point, shift: bool, scene: &Scene, selection: &mut Selection) {
        if shift {
            selection.toggle_at(scene, point, self.hit_tolerance);
            return;
        }

        let resize = selection
            .single()
            .and_then(|id| scene.get_object(id))
            .filter(|o| o.is_interactable())
            .and_then(|o| {
                selection::handle_at(o, point, HANDLE_HIT_TOLERANCE).map(|c| (o.clone(), c))
            });
        if let Some((object, corner)) = resize {
            self.state = ToolState::Dragging(DragState {
                grabbed: object.id(),
                handle: Some(corner),
                start: point,
                current: point,
                originals: vec![object],
            });
            return;
        }

        match selection::hit_test(scene, point, self.hit_tolerance) {
            Some(hit) => {
                if !selection.contains(hit) {
                    selection.select_at(scene, point, self.hit_tolerance);
                }
                let originals = selection
                    .in_z_order(scene)
                    .into_iter()
                    .filter_map(|id| scene.get_object(id))
                    .filter(|o| o.is_interactable())
                    .cloned()
                    .collect();
                self.state = ToolState::Dragging(DragState {
                    grabbed: hit,
                    handle: None,
                    start: point,
                    current: point,
                    originals,
                });
            }
            None => {
                selection.clear();
                self.state = ToolState::Marquee {
                    start: point,
                    current: point,
                };
            }
        }
    }

    fn pointer_move(&mut self, point: Point) {
        match &mut self.state {
            ToolState::Dragging(drag) => drag.current = point,
            ToolState::Marquee { current, .. } | ToolState::Inserting { current, .. } => {
                *current = point
            }
            ToolState::Stroking { points } => {
                if points.last() != Some(&point) {
                    points.push(point);
                }
            }
            ToolState::Idle | ToolState::EditingText(_) => {}
        }
    }

    fn pointer_up(&mut self, point: Point, scene: &Scene, selection: &mut Selection) -> Option<Command> {
        self.pointer_move(point);
        match std::mem::take(&mut self.state) {
            ToolState::Dragging(drag) => self.finish_drag(&drag),
            ToolState::Marquee { start, current } => {
                if (current - start).hypot() >= self.click_threshold {
                    selection.select_rect(scene, Rect::from_points(start, current));
                }
                None
            }
            ToolState::Stroking { points } => self.finish_stroke(points, scene),
            ToolState::Inserting { start, current } => match self.current_tool {
                ToolKind::Insert(shape) => self.finish_insert(shape, start, current, scene, selection),
                ToolKind::Text => self.finish_text_click(start, scene, selection),
                _ => None,
            },
            // Pointer-up without a matching pointer-down.
            state @ (ToolState::Idle | ToolState::EditingText(_)) => {
                self.state = state;
                None
            }
        }
    }

    fn finish_drag(&self, drag: &DragState) -> Option<Command> {
        if drag.delta().hypot() < self.click_threshold || drag.originals.is_empty() {
            return None;
        }
        let label = if drag.handle.is_some() { "Resize" } else { "Move" };
        let after = drag.transformed(self.snap_mode, self.grid_size);
        let command = Command::modify(label, drag.originals.clone(), after);
        (!command.is_noop()).then_some(command)
    }

    fn finish_stroke(&self, points: Vec<Point>, scene: &Scene) -> Option<Command> {
        if points.len() < 2 {
            log::debug!("Discarding single-point stroke");
            return None;
        }
        let mode = match self.current_tool {
            ToolKind::Erase => StrokeMode::Erase,
            _ => StrokeMode::Draw,
        };
        let mut simplified = Freehand::from_points(points, mode);
        simplified.simplify(self.simplify_tolerance);
        let (freehand, origin) = Freehand::from_canvas_points(&simplified.points, mode);

        let mut style = self.current_style.clone();
        style.fill_color = None;
        if mode == StrokeMode::Erase {
            style.stroke_width = self.eraser_width;
        }
        let object = SceneObject::new(ShapeKind::Freehand(freehand), origin).with_style(style);
        Some(Command::insert_on_top(scene, object))
    }

    fn finish_insert(
        &mut self,
        shape: ShapeTool,
        start: Point,
        end: Point,
        scene: &Scene,
        selection: &mut Selection,
    ) -> Option<Command> {
        let rect = if (end - start).hypot() < self.click_threshold {
            Rect::from_origin_size(start, self.default_size)
        } else {
            Rect::from_points(start, end)
        };
        let (kind, origin) = match shape {
            ShapeTool::Rectangle => {
                let (mut r, origin) = Rectangle::from_corners(rect.origin(), Point::new(rect.x1, rect.y1));
                r.corner_radius = self.corner_radius;
                (ShapeKind::Rectangle(r), origin)
            }
            ShapeTool::Ellipse => {
                let (e, origin) = Ellipse::from_rect(rect);
                (ShapeKind::Ellipse(e), origin)
            }
        };
        let origin = origin + snap_correction(origin, self.snap_mode, self.grid_size);
        let object = SceneObject::new(kind, origin).with_style(self.current_style.clone());

        selection.replace(vec![object.id()]);
        self.current_tool = ToolKind::Select;
        Some(Command::insert_on_top(scene, object))
    }

    fn finish_text_click(&mut self, point: Point, scene: &Scene, selection: &mut Selection) -> Option<Command> {
        // Clicking an existing text block edits it instead of adding another.
        let existing = selection::hit_test(scene, point, self.hit_tolerance)
            .and_then(|id| scene.get_object(id))
            .and_then(|o| o.kind.as_text().map(|t| (o.id(), t.content.clone())));
        if let Some((id, content)) = existing {
            selection.replace(vec![id]);
            self.state = ToolState::EditingText(TextEdit { id, buffer: content });
            return None;
        }

        let position = point + snap_correction(point, self.snap_mode, self.grid_size);
        let text = Text::new(String::new()).with_font_size(self.font_size);
        let mut style = self.current_style.clone();
        style.fill_color = None;
        let object = SceneObject::new(ShapeKind::Text(text), position).with_style(style);
        let id = object.id();

        selection.replace(vec![id]);
        self.state = ToolState::EditingText(TextEdit {
            id,
            buffer: String::new(),
        });
        Some(Command::insert_on_top(scene, object))
    }

    /// Commit the text being edited, if any, as one command.
    ///
    /// A block left empty is removed.
    fn finish_text_edit(&mut self, scene: &Scene) -> Option<Command> {
        let ToolState::EditingText(edit) = std::mem::take(&mut self.state) else {
            return None;
        };
        let object = scene.get_object(edit.id)?;
        let current = object.kind.as_text()?;

        if edit.buffer.is_empty() {
            return Command::remove(scene, &[edit.id]).ok();
        }
        if edit.buffer == current.content {
            return None;
        }
        let patch = ObjectPatch {
            content: Some(edit.buffer),
            ..Default::default()
        };
        Command::update(scene, edit.id, &patch, "Edit text").ok()
    }

    /// Objects as the in-progress gesture would leave them.
    ///
    /// Objects with ids already in the scene replace those objects; the rest
    /// are new. Nothing here has been recorded.
    pub fn preview(&self, scene: &Scene) -> Vec<SceneObject> {
        match &self.state {
            ToolState::Idle | ToolState::Marquee { .. } => Vec::new(),
            ToolState::Dragging(drag) => drag.transformed(self.snap_mode, self.grid_size),
            ToolState::Stroking { points } if points.len() >= 2 => {
                let mode = match self.current_tool {
                    ToolKind::Erase => StrokeMode::Erase,
                    _ => StrokeMode::Draw,
                };
                let (freehand, origin) = Freehand::from_canvas_points(points, mode);
                let mut style = self.current_style.clone();
                if mode == StrokeMode::Erase {
                    style.stroke_width = self.eraser_width;
                }
                vec![SceneObject::new(ShapeKind::Freehand(freehand), origin).with_style(style)]
            }
            ToolState::Stroking { .. } => Vec::new(),
            ToolState::Inserting { start, current } => match self.current_tool {
                ToolKind::Insert(shape) if (*current - *start).hypot() >= self.click_threshold => {
                    let rect = Rect::from_points(*start, *current);
                    let (kind, origin) = match shape {
                        ShapeTool::Rectangle => {
                            let (r, o) = Rectangle::from_corners(*start, *current);
                            (ShapeKind::Rectangle(r), o)
                        }
                        ShapeTool::Ellipse => {
                            let (e, o) = Ellipse::from_rect(rect);
                            (ShapeKind::Ellipse(e), o)
                        }
                    };
                    vec![SceneObject::new(kind, origin).with_style(self.current_style.clone())]
                }
                _ => Vec::new(),
            },
            ToolState::EditingText(edit) => scene
                .get_object(edit.id)
                .and_then(|o| {
                    let patch = ObjectPatch {
                        content: Some(edit.buffer.clone()),
                        ..Default::default()
                    };
                    patch.apply(o).ok()
                })
                .into_iter()
                .collect(),
        }
    }
}
