//! Renderer trait and the CPU implementation.

use crate::filters::{apply_filters, decode_pixels};
use crate::raster::{Layer, Mask, premultiply, straight_to_premul};
use easel_core::filter::ImageFilter;
use easel_core::scene::Scene;
use easel_core::shapes::{Freehand, Image, ObjectId, SceneObject, ShapeKind, ShapeStyle, StrokeMode};
use image::RgbaImage;
use kurbo::{Affine, BezPath, Cap, Join, Point, Shape as KurboShape, Stroke, StrokeOpts, Vec2};
use peniko::Color;
use std::collections::HashMap;
use thiserror::Error;

/// Largest surface edge the renderer will allocate.
pub const MAX_SURFACE_SIZE: f64 = easel_core::MAX_CANVAS_SIZE;

/// Tolerance used when outlining strokes.
const STROKE_TOLERANCE: f64 = 0.1;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid surface size {width}x{height}")]
    InvalidSurface { width: f64, height: f64 },
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Trait for rendering backends.
pub trait Renderer {
    /// Draw the committed scene onto a fresh surface the size of the canvas.
    fn render(&mut self, scene: &Scene) -> RenderResult<RgbaImage>;

    /// Forget anything cached for one object.
    fn invalidate(&mut self, _id: ObjectId) {}

    /// Forget everything cached.
    fn invalidate_all(&mut self) {}
}

/// Draw a scene with a throwaway [`CpuRenderer`].
pub fn render(scene: &Scene) -> RenderResult<RgbaImage> {
    CpuRenderer::new().render(scene)
}

/// Decoded, filtered pixels of one image object.
struct CachedImage {
    filters: Vec<ImageFilter>,
    /// `None` when the embedded data could not be decoded.
    pixels: Option<RgbaImage>,
}

/// Software renderer.
///
/// Objects are drawn bottom to top onto a transparent layer. Erase strokes
/// remove coverage from that layer; the layer is then composited over the
/// canvas background.
#[derive(Default)]
pub struct CpuRenderer {
    /// Image cache to avoid re-decoding images every frame.
    image_cache: HashMap<ObjectId, CachedImage>,
}

impl CpuRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of images with cached pixels.
    pub fn cached_images(&self) -> usize {
        self.image_cache.len()
    }

    fn draw_object(&mut self, layer: &mut Layer, object: &SceneObject) {
        let (width, height) = (layer.width(), layer.height());
        let affine = object.affine();
        let style = &object.style;
        match &object.kind {
            ShapeKind::Rectangle(_) | ShapeKind::Ellipse(_) => {
                let local = object.kind.local_path();
                if let Some(fill) = style.fill() {
                    let mut path = local.clone();
                    path.apply_affine(affine);
                    if let Some(mask) = Mask::fill(&path, width, height) {
                        layer.paint(&mask, premultiply(fill, style.opacity));
                    }
                }
                if let Some(mask) = stroke_mask(&local, style, Stroke::new(style.stroke_width), affine, width, height) {
                    layer.paint(&mask, premultiply(style.stroke(), style.opacity));
                }
            }
            ShapeKind::Freehand(freehand) => self.draw_freehand(layer, freehand, style, affine),
            ShapeKind::Text(text) => {
                let mut path = text.outline();
                path.apply_affine(affine);
                if let Some(mask) = Mask::fill(&path, width, height) {
                    layer.paint(&mask, premultiply(style.stroke(), style.opacity));
                }
            }
            ShapeKind::Image(image) => match self.image_pixels(object.id(), image) {
                Some(pixels) => draw_image(layer, pixels, image, affine, style.opacity),
                None => draw_image_placeholder(layer, image, affine),
            },
        }
    }

    fn draw_freehand(&self, layer: &mut Layer, freehand: &Freehand, style: &ShapeStyle, affine: Affine) {
        let stroke = Stroke::new(style.stroke_width)
            .with_caps(Cap::Round)
            .with_join(Join::Round);
        let local = freehand_path(freehand);
        let Some(mask) = stroke_mask(&local, style, stroke, affine, layer.width(), layer.height()) else {
            return;
        };
        match freehand.mode {
            StrokeMode::Draw => layer.paint(&mask, premultiply(style.stroke(), style.opacity)),
            StrokeMode::Erase => layer.erase(&mask, style.opacity.clamp(0.0, 1.0) as f32),
        }
    }

    /// Decoded and filtered pixels for an image object, from cache when the
    /// filter list is unchanged.
    fn image_pixels(&mut self, id: ObjectId, image: &Image) -> Option<&RgbaImage> {
        let stale = self
            .image_cache
            .get(&id)
            .is_none_or(|cached| cached.filters != image.filters);
        if stale {
            let pixels = match decode_pixels(image) {
                Ok(decoded) => Some(apply_filters(decoded, &image.filters).to_rgba8()),
                Err(e) => {
                    log::warn!("Failed to decode image {}: {}", id, e);
                    None
                }
            };
            self.image_cache.insert(
                id,
                CachedImage {
                    filters: image.filters.clone(),
                    pixels,
                },
            );
        }
        self.image_cache.get(&id).and_then(|cached| cached.pixels.as_ref())
    }
}

impl Renderer for CpuRenderer {
    fn render(&mut self, scene: &Scene) -> RenderResult<RgbaImage> {
        let (width, height) = surface_size(scene)?;
        let mut layer = Layer::new(width, height);
        for object in scene.list_objects() {
            if object.visible {
                self.draw_object(&mut layer, object);
            }
        }
        self.image_cache.retain(|id, _| scene.contains(*id));
        Ok(layer.composite_over(premultiply(Color::from(scene.background), 1.0)))
    }

    fn invalidate(&mut self, id: ObjectId) {
        self.image_cache.remove(&id);
    }

    fn invalidate_all(&mut self) {
        self.image_cache.clear();
    }
}

fn surface_size(scene: &Scene) -> RenderResult<(usize, usize)> {
    let (w, h) = (scene.width.ceil(), scene.height.ceil());
    let valid = |v: f64| v.is_finite() && (1.0..=MAX_SURFACE_SIZE).contains(&v);
    if !(valid(w) && valid(h)) {
        return Err(RenderError::InvalidSurface {
            width: scene.width,
            height: scene.height,
        });
    }
    Ok((w as usize, h as usize))
}

/// Coverage of `path`'s stroke outline, or `None` when nothing is stroked.
fn stroke_mask(
    path: &BezPath,
    style: &ShapeStyle,
    stroke: Stroke,
    affine: Affine,
    width: usize,
    height: usize,
) -> Option<Mask> {
    if style.stroke_width <= 0.0 || style.stroke_color.a == 0 {
        return None;
    }
    let mut outline = kurbo::stroke(path.iter(), &stroke, &StrokeOpts::default(), STROKE_TOLERANCE);
    outline.apply_affine(affine);
    Mask::fill(&outline, width, height)
}

/// A lone point still leaves a dot.
fn freehand_path(freehand: &Freehand) -> BezPath {
    let mut path = BezPath::new();
    match freehand.points.as_slice() {
        [] => {}
        [only] => {
            path.move_to(*only);
            path.line_to(*only + Vec2::new(1e-3, 0.0));
        }
        [first, rest @ ..] => {
            path.move_to(*first);
            for p in rest {
                path.line_to(*p);
            }
        }
    }
    path
}

/// Sample `pixels` through the inverse of the object transform (nearest neighbour).
fn draw_image(layer: &mut Layer, pixels: &RgbaImage, image: &Image, affine: Affine, opacity: f64) {
    let (src_w, src_h) = pixels.dimensions();
    if src_w == 0 || src_h == 0 || image.width <= 0.0 || image.height <= 0.0 {
        return;
    }
    if affine.determinant().abs() < f64::EPSILON {
        return;
    }
    let inverse = affine.inverse();
    let bounds = affine.transform_rect_bbox(image.local_bounds());
    let x0 = bounds.x0.floor().max(0.0) as usize;
    let y0 = bounds.y0.floor().max(0.0) as usize;
    let x1 = bounds.x1.ceil().clamp(0.0, layer.width() as f64) as usize;
    let y1 = bounds.y1.ceil().clamp(0.0, layer.height() as f64) as usize;

    for y in y0..y1 {
        for x in x0..x1 {
            let local = inverse * Point::new(x as f64 + 0.5, y as f64 + 0.5);
            let inside = local.x >= 0.0 && local.y >= 0.0 && local.x < image.width && local.y < image.height;
            if !inside {
                continue;
            }
            let sx = ((local.x / image.width * src_w as f64) as u32).min(src_w - 1);
            let sy = ((local.y / image.height * src_h as f64) as u32).min(src_h - 1);
            layer.blend(x, y, straight_to_premul(pixels.get_pixel(sx, sy).0, opacity));
        }
    }
}

/// Gray box with a cross for images whose data cannot be decoded.
fn draw_image_placeholder(layer: &mut Layer, image: &Image, affine: Affine) {
    let (width, height) = (layer.width(), layer.height());
    let bounds = image.local_bounds();
    let mut rect_path = bounds.to_path(0.1);
    rect_path.apply_affine(affine);
    if let Some(mask) = Mask::fill(&rect_path, width, height) {
        layer.paint(&mask, premultiply(Color::from_rgba8(200, 200, 200, 255), 1.0));
    }

    let mut cross = BezPath::new();
    cross.move_to(Point::new(bounds.x0, bounds.y0));
    cross.line_to(Point::new(bounds.x1, bounds.y1));
    cross.move_to(Point::new(bounds.x1, bounds.y0));
    cross.line_to(Point::new(bounds.x0, bounds.y1));
    let mut outline = kurbo::stroke(cross.iter(), &Stroke::new(2.0), &StrokeOpts::default(), STROKE_TOLERANCE);
    outline.apply_affine(affine);
    if let Some(mask) = Mask::fill(&outline, width, height) {
        layer.paint(&mask, premultiply(Color::from_rgba8(150, 150, 150, 255), 1.0));
    }
}
