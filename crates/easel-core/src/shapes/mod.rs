//! Scene object definitions.

mod ellipse;
mod freehand;
mod image;
mod rectangle;
mod text;

pub use ellipse::Ellipse;
pub use freehand::{Freehand, StrokeMode};
pub use image::{Image, ImageFormat};
pub use rectangle::Rectangle;
pub use text::{FontFamily, FontWeight, Text, TextAlign};

use kurbo::{Affine, BezPath, Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for scene objects.
pub type ObjectId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Style properties shared by every object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    /// Stroke color.
    pub stroke_color: SerializableColor,
    /// Stroke width in canvas pixels.
    pub stroke_width: f64,
    /// Fill color (None = no fill).
    pub fill_color: Option<SerializableColor>,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    1.0
}

impl ShapeStyle {
    /// Get the stroke color as a peniko Color.
    pub fn stroke(&self) -> Color {
        self.stroke_color.into()
    }

    /// Get the fill color as a peniko Color.
    pub fn fill(&self) -> Option<Color> {
        self.fill_color.map(|c| c.into())
    }

    /// Finite, non-negative stroke width and opacity within 0..=1.
    pub fn validate(&self) -> Result<(), InvalidObject> {
        if !self.stroke_width.is_finite() {
            return Err(InvalidObject::NonFinite("stroke width"));
        }
        if !self.opacity.is_finite() {
            return Err(InvalidObject::NonFinite("opacity"));
        }
        if self.stroke_width < 0.0 {
            return Err(InvalidObject::NegativeStrokeWidth(self.stroke_width));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(InvalidObject::Opacity(self.opacity));
        }
        Ok(())
    }
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::black(),
            stroke_width: 2.0,
            fill_color: None,
            opacity: 1.0,
        }
    }
}

/// Placement of an object on the canvas.
///
/// Local geometry is scaled, rotated around the centre of the scaled local
/// bounds, then translated by `position`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Translation of the local origin.
    pub position: Point,
    /// Non-uniform scale factors.
    pub scale: Vec2,
    /// Rotation in radians (around the centre of the scaled bounds).
    pub rotation: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::at(Point::ZERO)
    }
}

impl Transform {
    /// Unscaled, unrotated transform at `position`.
    pub fn at(position: Point) -> Self {
        Self {
            position,
            scale: Vec2::new(1.0, 1.0),
            rotation: 0.0,
        }
    }

    /// Build the local-to-canvas affine for geometry with the given local bounds.
    pub fn to_affine(&self, local_bounds: Rect) -> Affine {
        let scale = Affine::scale_non_uniform(self.scale.x, self.scale.y);
        let scaled = scale.transform_rect_bbox(local_bounds);
        let mut affine = Affine::translate(self.position.to_vec2());
        if self.rotation.abs() > f64::EPSILON {
            affine = affine * Affine::rotate_about(self.rotation, scaled.center());
        }
        affine * scale
    }

    fn is_invertible(&self) -> bool {
        self.scale.x.abs() > f64::EPSILON && self.scale.y.abs() > f64::EPSILON
    }
}

/// Variant-specific geometry of a scene object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    Rectangle(Rectangle),
    Ellipse(Ellipse),
    Freehand(Freehand),
    Text(Text),
    Image(Image),
}

impl ShapeKind {
    /// Bounds in local (untransformed) coordinates.
    pub fn local_bounds(&self) -> Rect {
        match self {
            ShapeKind::Rectangle(s) => s.local_bounds(),
            ShapeKind::Ellipse(s) => s.local_bounds(),
            ShapeKind::Freehand(s) => s.local_bounds(),
            ShapeKind::Text(s) => s.local_bounds(),
            ShapeKind::Image(s) => s.local_bounds(),
        }
    }

    /// Whether a local point lies on this geometry.
    pub fn contains_local(&self, point: Point, tolerance: f64) -> bool {
        match self {
            ShapeKind::Rectangle(s) => s.contains(point, tolerance),
            ShapeKind::Ellipse(s) => s.contains(point, tolerance),
            ShapeKind::Freehand(s) => s.contains(point, tolerance),
            ShapeKind::Text(s) => s.contains(point, tolerance),
            ShapeKind::Image(s) => s.contains(point, tolerance),
        }
    }

    /// Outline path in local coordinates.
    pub fn local_path(&self) -> BezPath {
        match self {
            ShapeKind::Rectangle(s) => s.to_path(),
            ShapeKind::Ellipse(s) => s.to_path(),
            ShapeKind::Freehand(s) => s.to_path(),
            ShapeKind::Text(s) => s.to_path(),
            ShapeKind::Image(s) => s.to_path(),
        }
    }

    /// Short human-readable name of the variant.
    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle(_) => "Rectangle",
            ShapeKind::Ellipse(_) => "Ellipse",
            ShapeKind::Freehand(f) => match f.mode {
                StrokeMode::Draw => "Stroke",
                StrokeMode::Erase => "Eraser",
            },
            ShapeKind::Text(_) => "Text",
            ShapeKind::Image(_) => "Image",
        }
    }

    /// Check that every number in the geometry is finite and sizes are non-negative.
    pub fn is_well_formed(&self) -> bool {
        let finite = |v: f64| v.is_finite();
        match self {
            ShapeKind::Rectangle(r) => {
                finite(r.width)
                    && finite(r.height)
                    && finite(r.corner_radius)
                    && r.width >= 0.0
                    && r.height >= 0.0
            }
            ShapeKind::Ellipse(e) => {
                finite(e.width) && finite(e.height) && e.width >= 0.0 && e.height >= 0.0
            }
            ShapeKind::Freehand(f) => f.points.iter().all(|p| finite(p.x) && finite(p.y)),
            ShapeKind::Text(t) => finite(t.font_size) && t.font_size > 0.0,
            ShapeKind::Image(i) => {
                finite(i.width)
                    && finite(i.height)
                    && i.width >= 0.0
                    && i.height >= 0.0
                    && i.source_width > 0
                    && i.source_height > 0
            }
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            ShapeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&Image> {
        match self {
            ShapeKind::Image(i) => Some(i),
            _ => None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A drawable object in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub(crate) id: ObjectId,
    /// Layer label shown in the layer panel.
    #[serde(default)]
    pub name: String,
    /// Placement on the canvas.
    pub transform: Transform,
    /// Paint order; equals the object's position in the scene.
    #[serde(default)]
    pub z_index: usize,
    /// Hidden objects are neither drawn nor hit.
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Locked objects cannot be picked with the pointer.
    #[serde(default)]
    pub locked: bool,
    /// Style properties.
    pub style: ShapeStyle,
    /// Variant geometry.
    pub kind: ShapeKind,
}

impl SceneObject {
    /// Create a new object with a fresh id, placed at `position`.
    pub fn new(kind: ShapeKind, position: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: kind.label().to_string(),
            transform: Transform::at(position),
            z_index: 0,
            visible: true,
            locked: false,
            style: ShapeStyle::default(),
            kind,
        }
    }

    /// Set the style.
    pub fn with_style(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }

    /// Set the layer name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn position(&self) -> Point {
        self.transform.position
    }

    /// Local-to-canvas transform.
    pub fn affine(&self) -> Affine {
        self.transform.to_affine(self.kind.local_bounds())
    }

    /// Axis-aligned bounding box in canvas coordinates.
    pub fn bounds(&self) -> Rect {
        let affine = self.affine();
        match &self.kind {
            ShapeKind::Freehand(f) if !f.points.is_empty() => {
                bounds_of(f.points.iter().map(|p| affine * *p))
            }
            kind => {
                let local = kind.local_bounds();
                bounds_of(corners(local).into_iter().map(|p| affine * p))
            }
        }
    }

    /// Check if a canvas point hits this object's geometry.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        if !self.transform.is_invertible() {
            return false;
        }
        let local = self.affine().inverse() * point;
        let min_scale = self.transform.scale.x.abs().min(self.transform.scale.y.abs());
        let reach = match self.kind {
            ShapeKind::Freehand(_) => tolerance + self.style.stroke_width / 2.0,
            _ => tolerance,
        };
        self.kind.contains_local(local, reach / min_scale)
    }

    /// Outline in canvas coordinates.
    pub fn to_path(&self) -> BezPath {
        let mut path = self.kind.local_path();
        path.apply_affine(self.affine());
        path
    }

    /// Translate the object.
    pub fn translate(&mut self, delta: Vec2) {
        self.transform.position += delta;
    }

    /// Whether this object can be picked with the pointer.
    pub fn is_interactable(&self) -> bool {
        self.visible && !self.locked && !self.is_eraser()
    }

    /// Eraser strokes only remove paint; there is nothing visible to pick.
    pub fn is_eraser(&self) -> bool {
        matches!(&self.kind, ShapeKind::Freehand(f) if f.mode == StrokeMode::Erase)
    }

    /// Check that the object can be drawn, saved and loaded again.
    pub fn validate(&self) -> Result<(), InvalidObject> {
        let t = &self.transform;
        let numbers = [
            ("position", t.position.x),
            ("position", t.position.y),
            ("scale", t.scale.x),
            ("scale", t.scale.y),
            ("rotation", t.rotation),
        ];
        if let Some((field, _)) = numbers.iter().find(|(_, v)| !v.is_finite()) {
            return Err(InvalidObject::NonFinite(field));
        }
        self.style.validate()?;
        if !self.kind.is_well_formed() {
            return Err(InvalidObject::Malformed(self.kind.label()));
        }
        if let ShapeKind::Image(image) = &self.kind {
            for filter in &image.filters {
                filter
                    .validate()
                    .map_err(|e| InvalidObject::Filter(e.to_string()))?;
            }
        }
        Ok(())
    }
}

/// Why an object was refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidObject {
    #[error("{0} is not a finite number")]
    NonFinite(&'static str),
    #[error("stroke width {0} is negative")]
    NegativeStrokeWidth(f64),
    #[error("opacity {0} is outside 0..=1")]
    Opacity(f64),
    #[error("{0} geometry is malformed")]
    Malformed(&'static str),
    #[error("{0}")]
    Filter(String),
}

/// The four corners of a rectangle, clockwise from the top-left.
pub(crate) fn corners(rect: Rect) -> [Point; 4] {
    [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ]
}

fn bounds_of(points: impl Iterator<Item = Point>) -> Rect {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    if min_x > max_x {
        return Rect::ZERO;
    }
    Rect::new(min_x, min_y, max_x, max_y)
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}

/// Minimum distance from a point to a polyline (sequence of connected segments).
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => (point - *only).hypot(),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}
