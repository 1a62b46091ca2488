//! Image objects embedding raster data.

use crate::filter::ImageFilter;
use base64::{Engine, engine::general_purpose::STANDARD};
use kurbo::{BezPath, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// Image format for stored image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

/// A raster image displayed at `width` × `height` in local space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Display width.
    pub width: f64,
    /// Display height.
    pub height: f64,
    /// Original image width in pixels.
    pub source_width: u32,
    /// Original image height in pixels.
    pub source_height: u32,
    pub format: ImageFormat,
    /// Encoded image bytes as base64, so the project stays plain JSON.
    pub data_base64: String,
    /// Filters applied on top of the source pixels, in order.
    #[serde(default)]
    pub filters: Vec<ImageFilter>,
}

impl Image {
    /// Create an image from encoded bytes, displayed at source size.
    pub fn new(data: &[u8], source_width: u32, source_height: u32, format: ImageFormat) -> Self {
        Self {
            width: source_width as f64,
            height: source_height as f64,
            source_width,
            source_height,
            format,
            data_base64: STANDARD.encode(data),
            filters: Vec::new(),
        }
    }

    /// Create an image shape with specific display dimensions.
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Scale to `width`, preserving the source aspect ratio.
    pub fn fit_width(mut self, width: f64) -> Self {
        let aspect = self.source_height as f64 / self.source_width.max(1) as f64;
        self.width = width;
        self.height = width * aspect;
        self
    }

    /// Get the raw image data (decoded from base64).
    pub fn data(&self) -> Option<Vec<u8>> {
        STANDARD.decode(&self.data_base64).ok()
    }

    pub fn local_bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    pub(crate) fn contains(&self, point: Point, tolerance: f64) -> bool {
        self.local_bounds()
            .inflate(tolerance, tolerance)
            .contains(point)
    }

    pub(crate) fn to_path(&self) -> BezPath {
        self.local_bounds().to_path(0.1)
    }
}
