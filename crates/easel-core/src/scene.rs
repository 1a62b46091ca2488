//! Scene store: the authoritative, z-ordered list of objects.

use crate::filter::ImageFilter;
use crate::shapes::{
    FontFamily, FontWeight, InvalidObject, ObjectId, SceneObject, SerializableColor, ShapeKind,
    TextAlign,
};
use kurbo::{Point, Rect, Vec2};
use thiserror::Error;

/// Default canvas size.
pub const DEFAULT_CANVAS_WIDTH: f64 = 1280.0;
pub const DEFAULT_CANVAS_HEIGHT: f64 = 800.0;

/// Largest canvas side accepted from files and configuration.
pub const MAX_CANVAS_SIZE: f64 = 4096.0;

/// Whether `width` x `height` is a canvas the editor can hold and render.
pub fn canvas_size_ok(width: f64, height: f64) -> bool {
    [width, height]
        .iter()
        .all(|side| side.is_finite() && *side > 0.0 && *side <= MAX_CANVAS_SIZE)
}

/// Scene store errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error("Object not found: {0}")]
    NotFound(ObjectId),
    #[error("Index {index} out of range for {len} objects")]
    OutOfRange { index: usize, len: usize },
    #[error("Duplicate object id: {0}")]
    DuplicateId(ObjectId),
    #[error("Property `{property}` does not apply to {kind}")]
    PatchMismatch {
        property: &'static str,
        kind: &'static str,
    },
    #[error("Modify has {before} original states but {after} new ones")]
    MismatchedModify { before: usize, after: usize },
    #[error("Object {id} rejected: {reason}")]
    InvalidObject { id: ObjectId, reason: InvalidObject },
}

/// Refuse objects that could not be rendered or saved.
pub(crate) fn check_object(object: &SceneObject) -> SceneResult<()> {
    object.validate().map_err(|reason| SceneError::InvalidObject {
        id: object.id(),
        reason,
    })
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// The drawable content and canvas-level properties of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Canvas width in pixels.
    pub width: f64,
    /// Canvas height in pixels.
    pub height: f64,
    /// Canvas background color.
    pub background: SerializableColor,
    /// Objects back to front. `objects[i].z_index == i` at all times.
    objects: Vec<SceneObject>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT)
    }
}

impl Scene {
    /// Create an empty scene with a white background.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            background: SerializableColor::white(),
            objects: Vec::new(),
        }
    }

    pub fn with_background(mut self, background: SerializableColor) -> Self {
        self.background = background;
        self
    }

    /// Build a scene from objects already in z-order, assigning their indices.
    pub(crate) fn from_parts(
        width: f64,
        height: f64,
        background: SerializableColor,
        objects: Vec<SceneObject>,
    ) -> Self {
        let mut scene = Self {
            width,
            height,
            background,
            objects,
        };
        scene.reindex(0, scene.objects.len());
        scene
    }

    /// Canvas rectangle.
    pub fn canvas_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects in z-order (back to front).
    pub fn list_objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Get an object by ID.
    pub fn get_object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    /// Position of an object in z-order.
    pub fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| o.id() == id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.index_of(id).is_some()
    }

    /// Add an object on top of everything else. Returns its z-index.
    pub fn add_object(&mut self, object: SceneObject) -> SceneResult<usize> {
        let index = self.objects.len();
        self.insert_object(object, index)?;
        Ok(index)
    }

    /// Insert an object at an exact z-index.
    pub fn insert_object(&mut self, mut object: SceneObject, index: usize) -> SceneResult<()> {
        check_object(&object)?;
        if self.contains(object.id()) {
            return Err(SceneError::DuplicateId(object.id()));
        }
        if index > self.objects.len() {
            return Err(SceneError::OutOfRange {
                index,
                len: self.objects.len(),
            });
        }
        object.z_index = index;
        self.objects.insert(index, object);
        self.reindex(index, self.objects.len());
        Ok(())
    }

    /// Remove an object, returning it with the z-index it had.
    pub fn remove_object(&mut self, id: ObjectId) -> SceneResult<(usize, SceneObject)> {
        let index = self.index_of(id).ok_or(SceneError::NotFound(id))?;
        let object = self.objects.remove(index);
        self.reindex(index, self.objects.len());
        Ok((index, object))
    }

    /// Apply a partial update, returning the previous state of the object.
    pub fn update_object(&mut self, id: ObjectId, patch: &ObjectPatch) -> SceneResult<SceneObject> {
        let index = self.index_of(id).ok_or(SceneError::NotFound(id))?;
        let updated = patch.apply(&self.objects[index])?;
        Ok(std::mem::replace(&mut self.objects[index], updated))
    }

    /// Swap in a full object state for the object with the same id.
    /// The stored z-index is kept.
    pub(crate) fn replace_object(&mut self, mut object: SceneObject) -> SceneResult<SceneObject> {
        let index = self
            .index_of(object.id())
            .ok_or(SceneError::NotFound(object.id()))?;
        object.z_index = index;
        Ok(std::mem::replace(&mut self.objects[index], object))
    }

    /// Move an object to `new_index`, shifting everything in between.
    /// Returns the old index.
    pub fn reorder(&mut self, id: ObjectId, new_index: usize) -> SceneResult<usize> {
        let old_index = self.index_of(id).ok_or(SceneError::NotFound(id))?;
        if new_index >= self.objects.len() {
            return Err(SceneError::OutOfRange {
                index: new_index,
                len: self.objects.len(),
            });
        }
        let object = self.objects.remove(old_index);
        self.objects.insert(new_index, object);
        self.reindex(old_index.min(new_index), old_index.max(new_index) + 1);
        Ok(old_index)
    }

    /// Resolve a relative z-order move to an absolute index.
    pub fn restack_index(&self, id: ObjectId, step: Restack) -> SceneResult<usize> {
        let index = self.index_of(id).ok_or(SceneError::NotFound(id))?;
        let top = self.objects.len() - 1;
        Ok(match step {
            Restack::Front => top,
            Restack::Back => 0,
            Restack::Forward => (index + 1).min(top),
            Restack::Backward => index.saturating_sub(1),
        })
    }

    pub fn bring_to_front(&mut self, id: ObjectId) -> SceneResult<usize> {
        let to = self.restack_index(id, Restack::Front)?;
        self.reorder(id, to)
    }

    pub fn send_to_back(&mut self, id: ObjectId) -> SceneResult<usize> {
        let to = self.restack_index(id, Restack::Back)?;
        self.reorder(id, to)
    }

    pub fn bring_forward(&mut self, id: ObjectId) -> SceneResult<usize> {
        let to = self.restack_index(id, Restack::Forward)?;
        self.reorder(id, to)
    }

    pub fn send_backward(&mut self, id: ObjectId) -> SceneResult<usize> {
        let to = self.restack_index(id, Restack::Backward)?;
        self.reorder(id, to)
    }

    /// Get the bounding box of all objects.
    pub fn bounds(&self) -> Option<Rect> {
        self.objects
            .iter()
            .map(|o| o.bounds())
            .reduce(|acc, b| acc.union(b))
    }

    /// Ids are unique and every z-index matches its position.
    pub fn is_consistent(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.objects
            .iter()
            .enumerate()
            .all(|(i, o)| o.z_index == i && seen.insert(o.id()))
    }

    fn reindex(&mut self, from: usize, to: usize) {
        for (i, object) in self
            .objects
            .iter_mut()
            .enumerate()
            .take(to)
            .skip(from)
        {
            object.z_index = i;
        }
    }
}

/// Relative z-order moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restack {
    Front,
    Back,
    Forward,
    Backward,
}

/// A partial update to a scene object. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectPatch {
    pub name: Option<String>,
    pub position: Option<Point>,
    pub scale: Option<Vec2>,
    pub rotation: Option<f64>,
    pub visible: Option<bool>,
    pub locked: Option<bool>,
    pub stroke_color: Option<SerializableColor>,
    pub stroke_width: Option<f64>,
    pub fill_color: Option<Option<SerializableColor>>,
    pub opacity: Option<f64>,
    /// Rectangle only.
    pub corner_radius: Option<f64>,
    /// Text only.
    pub content: Option<String>,
    pub font_size: Option<f64>,
    pub font_family: Option<FontFamily>,
    pub font_weight: Option<FontWeight>,
    pub align: Option<TextAlign>,
    /// Image only.
    pub filters: Option<Vec<ImageFilter>>,
}

impl ObjectPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Produce the patched object without modifying `object`.
    pub fn apply(&self, object: &SceneObject) -> SceneResult<SceneObject> {
        let mut next = object.clone();

        if let Some(name) = &self.name {
            next.name = name.clone();
        }
        if let Some(position) = self.position {
            next.transform.position = position;
        }
        if let Some(scale) = self.scale {
            next.transform.scale = scale;
        }
        if let Some(rotation) = self.rotation {
            next.transform.rotation = rotation;
        }
        if let Some(visible) = self.visible {
            next.visible = visible;
        }
        if let Some(locked) = self.locked {
            next.locked = locked;
        }
        if let Some(color) = self.stroke_color {
            next.style.stroke_color = color;
        }
        if let Some(width) = self.stroke_width {
            next.style.stroke_width = width;
        }
        if let Some(fill) = self.fill_color {
            next.style.fill_color = fill;
        }
        if let Some(opacity) = self.opacity {
            next.style.opacity = opacity.clamp(0.0, 1.0);
        }

        let kind_label = next.kind.label();
        let mismatch = |property| SceneError::PatchMismatch {
            property,
            kind: kind_label,
        };

        if let Some(radius) = self.corner_radius {
            match &mut next.kind {
                ShapeKind::Rectangle(r) => r.corner_radius = radius.max(0.0),
                _ => return Err(mismatch("corner_radius")),
            }
        }

        let touches_text = self.content.is_some()
            || self.font_size.is_some()
            || self.font_family.is_some()
            || self.font_weight.is_some()
            || self.align.is_some();
        if touches_text {
            let ShapeKind::Text(text) = &mut next.kind else {
                return Err(mismatch("text"));
            };
            if let Some(content) = &self.content {
                text.content = content.clone();
            }
            if let Some(size) = self.font_size {
                text.font_size = size;
            }
            if let Some(family) = self.font_family {
                text.font_family = family;
            }
            if let Some(weight) = self.font_weight {
                text.font_weight = weight;
            }
            if let Some(align) = self.align {
                text.align = align;
            }
        }

        if let Some(filters) = &self.filters {
            match &mut next.kind {
                ShapeKind::Image(image) => image.filters = filters.clone(),
                _ => return Err(mismatch("filters")),
            }
        }

        check_object(&next)?;
        Ok(next)
    }
}
