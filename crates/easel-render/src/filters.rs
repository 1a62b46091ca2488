//! Image decoding and filter processing backed by the `image` crate.

use easel_core::filter::{FilterBackend, FilterError, FilterResult, ImageFilter};
use easel_core::import::{DecodedImage, ImportError, ImportResult};
use easel_core::shapes::{Image, ImageFormat};
use image::DynamicImage;

/// Decode encoded image bytes for import.
///
/// Matches [`easel_core::import::Decoder`], so it can be handed to
/// `Editor::with_decoder` directly.
pub fn decode_image(bytes: &[u8]) -> ImportResult<DecodedImage> {
    if bytes.is_empty() {
        return Err(ImportError::Empty);
    }
    let (format, codec) = match image::guess_format(bytes) {
        Ok(image::ImageFormat::Png) => (ImageFormat::Png, image::ImageFormat::Png),
        Ok(image::ImageFormat::Jpeg) => (ImageFormat::Jpeg, image::ImageFormat::Jpeg),
        Ok(image::ImageFormat::WebP) => (ImageFormat::WebP, image::ImageFormat::WebP),
        _ => return Err(ImportError::UnsupportedFormat),
    };
    let decoded = image::load_from_memory_with_format(bytes, codec)
        .map_err(|e| ImportError::Decode(e.to_string()))?;
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(ImportError::Empty);
    }
    Ok(DecodedImage {
        bytes: bytes.to_vec(),
        width: decoded.width(),
        height: decoded.height(),
        format,
    })
}

/// Decode an image object's embedded bytes.
pub fn decode_pixels(image: &Image) -> Result<DynamicImage, String> {
    let data = image.data().ok_or_else(|| "invalid base64 data".to_string())?;
    image::load_from_memory(&data).map_err(|e| e.to_string())
}

/// Run one filter.
pub fn apply_filter(image: DynamicImage, filter: ImageFilter) -> DynamicImage {
    match filter {
        ImageFilter::Grayscale => image.grayscale(),
        ImageFilter::Invert => {
            let mut image = image;
            image.invert();
            image
        }
        ImageFilter::Brighten(value) => image.brighten(value),
        ImageFilter::Contrast(amount) => image.adjust_contrast(amount),
        ImageFilter::Blur(sigma) => image.blur(sigma),
        ImageFilter::HueRotate(degrees) => image.huerotate(degrees),
    }
}

/// Run a filter list in order.
pub fn apply_filters(image: DynamicImage, filters: &[ImageFilter]) -> DynamicImage {
    filters.iter().fold(image, |image, filter| apply_filter(image, *filter))
}

/// Filter backend running on the CPU through `image::imageops`.
#[derive(Debug, Clone, Copy)]
pub struct ImageFilters {
    /// Largest image (in source pixels) a filter will run on.
    pub max_pixels: u64,
}

impl ImageFilters {
    pub const DEFAULT_MAX_PIXELS: u64 = 64 * 1024 * 1024;
}

impl Default for ImageFilters {
    fn default() -> Self {
        Self {
            max_pixels: Self::DEFAULT_MAX_PIXELS,
        }
    }
}

impl FilterBackend for ImageFilters {
    fn apply(&self, image: &Image, filter: ImageFilter) -> FilterResult<()> {
        filter.validate()?;
        let pixels = image.source_width as u64 * image.source_height as u64;
        if pixels > self.max_pixels {
            return Err(FilterError::Backend(format!(
                "{}x{} image exceeds the {} pixel filter limit",
                image.source_width, image.source_height, self.max_pixels
            )));
        }
        let decoded = decode_pixels(image).map_err(FilterError::Decode)?;
        let filtered = apply_filter(apply_filters(decoded, &image.filters), filter);
        if filtered.width() == 0 || filtered.height() == 0 {
            return Err(FilterError::Backend(format!("{} produced an empty image", filter.name())));
        }
        log::debug!("Filter {} ran on {}x{} image", filter.name(), filtered.width(), filtered.height());
        Ok(())
    }
}
