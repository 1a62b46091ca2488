//! Image filter descriptions and the backend seam that executes them.
//!
//! The core only records which filters an image carries. Pixel processing is
//! delegated to a [`FilterBackend`], so the editor can reject a filter before it
//! reaches history.

use crate::shapes::Image;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A filter that can be applied to an image object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ImageFilter {
    Grayscale,
    Invert,
    /// Add a constant to every channel (negative darkens).
    Brighten(i32),
    /// Contrast adjustment in percent (negative reduces contrast).
    Contrast(f32),
    /// Gaussian blur with the given sigma.
    Blur(f32),
    /// Hue rotation in degrees.
    HueRotate(i32),
}

impl ImageFilter {
    pub fn name(&self) -> &'static str {
        match self {
            ImageFilter::Grayscale => "grayscale",
            ImageFilter::Invert => "invert",
            ImageFilter::Brighten(_) => "brighten",
            ImageFilter::Contrast(_) => "contrast",
            ImageFilter::Blur(_) => "blur",
            ImageFilter::HueRotate(_) => "hue-rotate",
        }
    }

    /// Validate filter parameters without touching pixels.
    pub fn validate(&self) -> FilterResult<()> {
        match *self {
            ImageFilter::Blur(sigma) if !(sigma.is_finite() && sigma > 0.0) => {
                Err(FilterError::InvalidParameter {
                    filter: self.name(),
                    reason: format!("sigma must be positive, got {}", sigma),
                })
            }
            ImageFilter::Contrast(amount) if !amount.is_finite() => {
                Err(FilterError::InvalidParameter {
                    filter: self.name(),
                    reason: "contrast must be finite".to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Filter errors.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Object is not an image")]
    NotAnImage,
    #[error("Invalid {filter} parameter: {reason}")]
    InvalidParameter { filter: &'static str, reason: String },
    #[error("Image data could not be decoded: {0}")]
    Decode(String),
    #[error("Filter backend failed: {0}")]
    Backend(String),
}

/// Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Executes filters on image pixels.
pub trait FilterBackend {
    /// Run `image`'s existing filters followed by `filter`.
    ///
    /// Only success matters to the editor: the image object keeps its source
    /// bytes and records the filter, and renderers re-run the list.
    fn apply(&self, image: &Image, filter: ImageFilter) -> FilterResult<()>;
}
