//! PNG export.

use crate::renderer::{CpuRenderer, RenderError, RenderResult, Renderer};
use easel_core::scene::Scene;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

/// Encode pixels as PNG.
pub fn encode_png(pixels: &RgbaImage) -> RenderResult<Vec<u8>> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(pixels.as_raw(), pixels.width(), pixels.height(), ExtendedColorType::Rgba8)
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(bytes)
}

/// Render a scene at 1:1 canvas scale and encode it as PNG.
pub fn export_png(scene: &Scene) -> RenderResult<Vec<u8>> {
    let pixels = CpuRenderer::new().render(scene)?;
    let bytes = encode_png(&pixels)?;
    log::info!(
        "Exported {}x{} PNG ({} bytes)",
        pixels.width(),
        pixels.height(),
        bytes.len()
    );
    Ok(bytes)
}
