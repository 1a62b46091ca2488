//! Editor configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes. Unknown keys are ignored.

use crate::scene::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, MAX_CANVAS_SIZE};
use crate::shapes::{SerializableColor, ShapeStyle};
use crate::snap::{GRID_SIZE, SnapMode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Pointer tolerance for picking objects, in canvas pixels.
pub const HIT_TOLERANCE: f64 = 4.0;
/// Pointer travel below which a gesture counts as a click.
pub const CLICK_THRESHOLD: f64 = 3.0;
/// Size of a shape inserted with a single click.
pub const DEFAULT_SHAPE_WIDTH: f64 = 120.0;
pub const DEFAULT_SHAPE_HEIGHT: f64 = 80.0;
/// Width imported images are scaled to.
pub const DEFAULT_IMAGE_WIDTH: f64 = 320.0;
/// Ramer-Douglas-Peucker tolerance for freehand strokes.
pub const SIMPLIFY_TOLERANCE: f64 = 0.75;
/// Stroke width of the eraser.
pub const ERASER_WIDTH: f64 = 16.0;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Runtime-adjustable editor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Grid spacing used for snapping.
    pub grid_size: f64,
    pub snap_enabled: bool,
    pub hit_tolerance: f64,
    pub click_threshold: f64,
    pub default_shape_width: f64,
    pub default_shape_height: f64,
    pub default_image_width: f64,
    pub simplify_tolerance: f64,
    pub eraser_width: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub background: SerializableColor,
    /// Maximum undo depth (None = unlimited).
    pub history_limit: Option<usize>,
    /// Style given to newly created objects.
    pub default_style: ShapeStyle,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            snap_enabled: false,
            hit_tolerance: HIT_TOLERANCE,
            click_threshold: CLICK_THRESHOLD,
            default_shape_width: DEFAULT_SHAPE_WIDTH,
            default_shape_height: DEFAULT_SHAPE_HEIGHT,
            default_image_width: DEFAULT_IMAGE_WIDTH,
            simplify_tolerance: SIMPLIFY_TOLERANCE,
            eraser_width: ERASER_WIDTH,
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            background: SerializableColor::white(),
            history_limit: None,
            default_style: ShapeStyle::default(),
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn snap_mode(&self) -> SnapMode {
        SnapMode::from_enabled(self.snap_enabled)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let positive = [
            ("grid_size", self.grid_size),
            ("default_shape_width", self.default_shape_width),
            ("default_shape_height", self.default_shape_height),
            ("default_image_width", self.default_image_width),
            ("eraser_width", self.eraser_width),
            ("canvas_width", self.canvas_width),
            ("canvas_height", self.canvas_height),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be positive, got {}", value),
                });
            }
        }
        for (field, value) in [("canvas_width", self.canvas_width), ("canvas_height", self.canvas_height)] {
            if value > MAX_CANVAS_SIZE {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be at most {}, got {}", MAX_CANVAS_SIZE, value),
                });
            }
        }
        let non_negative = [
            ("hit_tolerance", self.hit_tolerance),
            ("click_threshold", self.click_threshold),
            ("simplify_tolerance", self.simplify_tolerance),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be zero or more, got {}", value),
                });
            }
        }
        if let Err(e) = self.default_style.validate() {
            return Err(ConfigError::Invalid {
                field: "default_style",
                reason: e.to_string(),
            });
        }
        if self.history_limit == Some(0) {
            return Err(ConfigError::Invalid {
                field: "history_limit",
                reason: "must keep at least one command".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = EditorConfig::from_json(r#"{ "grid_size": 50.0, "snap_enabled": true }"#).unwrap();
        assert!((config.grid_size - 50.0).abs() < f64::EPSILON);
        assert!(config.snap_enabled);
        assert_eq!(config.snap_mode(), SnapMode::Grid);
        assert_eq!(config.history_limit, None);
        assert!((config.hit_tolerance - HIT_TOLERANCE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config = EditorConfig::from_json(r#"{ "theme": "dark" }"#).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            EditorConfig::from_json(r#"{ "grid_size": 0.0 }"#),
            Err(ConfigError::Invalid { field: "grid_size", .. })
        ));
        assert!(matches!(
            EditorConfig::from_json(r#"{ "history_limit": 0 }"#),
            Err(ConfigError::Invalid { field: "history_limit", .. })
        ));
        assert!(matches!(
            EditorConfig::from_json(r#"{ "canvas_width": 16384.0, "canvas_height": 16384.0 }"#),
            Err(ConfigError::Invalid { field: "canvas_width", .. })
        ));
        assert!(EditorConfig::from_json(r#"{ "canvas_width": 4096.0 }"#).is_ok());
        assert!(matches!(
            EditorConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let config = EditorConfig {
            history_limit: Some(25),
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(EditorConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("easel.json");
        std::fs::write(&path, r#"{ "eraser_width": 30.0 }"#).unwrap();
        let config = EditorConfig::load_from_file(&path).unwrap();
        assert!((config.eraser_width - 30.0).abs() < f64::EPSILON);
        assert!(matches!(
            EditorConfig::load_from_file(&dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }
}
