//! Project file codec.
//!
//! A project is a pretty-printed JSON document:
//!
//! ```json
//! { "version": 1, "canvas": { "width": .., "height": .., "background": .. }, "objects": [..] }
//! ```
//!
//! Decoding validates the whole document before a [`Scene`] is built, so a
//! rejected file never reaches the live scene.

use crate::scene::{Scene, canvas_size_ok};
use crate::shapes::{InvalidObject, ObjectId, SceneObject, SerializableColor, ShapeKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Current project format version.
pub const FORMAT_VERSION: u32 = 1;

/// Project file errors.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Malformed project JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported project version {0}")]
    UnsupportedVersion(u32),
    #[error("Invalid canvas size {width}x{height}")]
    InvalidCanvas { width: f64, height: f64 },
    #[error("Duplicate object id: {0}")]
    DuplicateId(ObjectId),
    #[error("Object z-indices are not a contiguous range starting at 0")]
    NonContiguousZIndex,
    #[error("Object {id} rejected: {reason}")]
    InvalidObject { id: ObjectId, reason: InvalidObject },
    #[error("Object {0} has undecodable image data")]
    InvalidImageData(ObjectId),
}

/// Result type for codec operations.
pub type FormatResult<T> = Result<T, FormatError>;

/// Canvas-level properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasInfo {
    pub width: f64,
    pub height: f64,
    pub background: SerializableColor,
}

/// On-disk project layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub version: u32,
    pub canvas: CanvasInfo,
    #[serde(default)]
    pub objects: Vec<SceneObject>,
}

impl ProjectFile {
    pub fn from_scene(scene: &Scene) -> Self {
        Self {
            version: FORMAT_VERSION,
            canvas: CanvasInfo {
                width: scene.width,
                height: scene.height,
                background: scene.background,
            },
            objects: scene.list_objects().to_vec(),
        }
    }

    /// Check the document and build the scene it describes.
    pub fn into_scene(mut self) -> FormatResult<Scene> {
        if self.version == 0 || self.version > FORMAT_VERSION {
            return Err(FormatError::UnsupportedVersion(self.version));
        }
        let CanvasInfo {
            width,
            height,
            background,
        } = self.canvas;
        if !canvas_size_ok(width, height) {
            return Err(FormatError::InvalidCanvas { width, height });
        }

        let mut ids = HashSet::new();
        for object in &self.objects {
            if !ids.insert(object.id()) {
                return Err(FormatError::DuplicateId(object.id()));
            }
            validate_object(object)?;
        }

        let mut z: Vec<usize> = self.objects.iter().map(|o| o.z_index).collect();
        z.sort_unstable();
        if z.iter().enumerate().any(|(i, &z)| i != z) {
            return Err(FormatError::NonContiguousZIndex);
        }
        self.objects.sort_by_key(|o| o.z_index);

        Ok(Scene::from_parts(width, height, background, self.objects))
    }
}

fn validate_object(object: &SceneObject) -> FormatResult<()> {
    object.validate().map_err(|reason| FormatError::InvalidObject {
        id: object.id(),
        reason,
    })?;
    if let ShapeKind::Image(image) = &object.kind {
        if image.data().is_none() {
            return Err(FormatError::InvalidImageData(object.id()));
        }
    }
    Ok(())
}

/// Encode a scene as a project document.
pub fn serialize(scene: &Scene) -> FormatResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(&ProjectFile::from_scene(scene))?)
}

/// Decode and validate a project document.
pub fn deserialize(bytes: &[u8]) -> FormatResult<Scene> {
    let file: ProjectFile = serde_json::from_slice(bytes)?;
    file.into_scene()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Image, ImageFormat, Rectangle, Text};
    use kurbo::Point;

    fn sample_scene() -> Scene {
        let mut scene = Scene::new(640.0, 480.0).with_background(SerializableColor::new(10, 20, 30, 255));
        let mut rect = SceneObject::new(ShapeKind::Rectangle(Rectangle::new(10.5, 20.25)), Point::new(0.1, 0.2));
        rect.transform.rotation = 0.3;
        scene.add_object(rect).unwrap();
        scene
            .add_object(SceneObject::new(ShapeKind::Text(Text::new("hi\nthere")), Point::new(5.0, 5.0)))
            .unwrap();
        scene
    }

    #[test]
    fn test_round_trip() {
        let scene = sample_scene();
        let bytes = serialize(&scene).unwrap();
        assert_eq!(deserialize(&bytes).unwrap(), scene);
    }

    #[test]
    fn test_document_layout() {
        let bytes = serialize(&sample_scene()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["version"], FORMAT_VERSION);
        assert_eq!(value["canvas"]["width"], 640.0);
        assert_eq!(value["objects"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let scene = sample_scene();
        let bytes = serialize(&scene).unwrap();
        let mut value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        value["generator"] = "something newer".into();
        value["objects"][0]["shadow"] = serde_json::json!({ "blur": 4 });
        assert_eq!(deserialize(value.to_string().as_bytes()).unwrap(), scene);
    }

    #[test]
    fn test_objects_sorted_by_z_index() {
        let scene = sample_scene();
        let mut file = ProjectFile::from_scene(&scene);
        file.objects.reverse();
        let decoded = file.into_scene().unwrap();
        assert_eq!(decoded, scene);
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(matches!(deserialize(b"{ not json"), Err(FormatError::Json(_))));
        assert!(matches!(deserialize(b"{}"), Err(FormatError::Json(_))));
    }

    #[test]
    fn test_rejects_bad_version_and_canvas() {
        let mut file = ProjectFile::from_scene(&sample_scene());
        file.version = 99;
        assert!(matches!(file.into_scene(), Err(FormatError::UnsupportedVersion(99))));

        let mut file = ProjectFile::from_scene(&sample_scene());
        file.canvas.width = 0.0;
        assert!(matches!(file.into_scene(), Err(FormatError::InvalidCanvas { .. })));
    }

    #[test]
    fn test_rejects_oversized_canvas() {
        let mut file = ProjectFile::from_scene(&sample_scene());
        file.canvas.width = 16384.0;
        file.canvas.height = 16384.0;
        assert!(matches!(
            file.into_scene(),
            Err(FormatError::InvalidCanvas { width, .. }) if width == 16384.0
        ));

        let mut file = ProjectFile::from_scene(&sample_scene());
        file.canvas.width = crate::scene::MAX_CANVAS_SIZE;
        assert!(file.into_scene().is_ok());
    }

    #[test]
    fn test_rejects_duplicate_ids_and_gaps() {
        let mut file = ProjectFile::from_scene(&sample_scene());
        let first = file.objects[0].clone();
        file.objects[1] = first;
        assert!(matches!(file.into_scene(), Err(FormatError::DuplicateId(_))));

        let mut file = ProjectFile::from_scene(&sample_scene());
        file.objects[1].z_index = 5;
        assert!(matches!(file.into_scene(), Err(FormatError::NonContiguousZIndex)));
    }

    #[test]
    fn test_rejects_bad_geometry_and_image_data() {
        let mut file = ProjectFile::from_scene(&sample_scene());
        file.objects[0].transform.scale.x = f64::NAN;
        assert!(matches!(
            file.into_scene(),
            Err(FormatError::InvalidObject {
                reason: InvalidObject::NonFinite("scale"),
                ..
            })
        ));

        let mut image = Image::new(&[1, 2, 3], 1, 1, ImageFormat::Png);
        image.data_base64 = "%%%".to_string();
        let mut scene = Scene::default();
        scene.add_object(SceneObject::new(ShapeKind::Image(image), Point::ZERO)).unwrap();
        let file = ProjectFile::from_scene(&scene);
        assert!(matches!(file.into_scene(), Err(FormatError::InvalidImageData(_))));
    }

    #[test]
    fn test_rejects_invalid_filter_and_style() {
        let image = Image::new(&[0, 0, 0, 255], 1, 1, ImageFormat::Png);
        let mut scene = Scene::default();
        scene.add_object(SceneObject::new(ShapeKind::Image(image), Point::ZERO)).unwrap();
        let mut value = serde_json::to_value(ProjectFile::from_scene(&scene)).unwrap();
        value["objects"][0]["kind"]["Image"]["filters"] = serde_json::json!([{ "Blur": -3.0 }]);
        assert!(matches!(
            deserialize(value.to_string().as_bytes()),
            Err(FormatError::InvalidObject {
                reason: InvalidObject::Filter(_),
                ..
            })
        ));

        let mut file = ProjectFile::from_scene(&sample_scene());
        file.objects[1].style.stroke_width = -4.0;
        assert!(matches!(
            file.into_scene(),
            Err(FormatError::InvalidObject {
                reason: InvalidObject::NegativeStrokeWidth(_),
                ..
            })
        ));

        let mut file = ProjectFile::from_scene(&sample_scene());
        if let ShapeKind::Text(text) = &mut file.objects[1].kind {
            text.font_size = 0.0;
        }
        assert!(matches!(
            file.into_scene(),
            Err(FormatError::InvalidObject {
                reason: InvalidObject::Malformed("Text"),
                ..
            })
        ));
    }
}
