//! Scanline coverage rasterization onto a premultiplied RGBA layer.

use image::{Rgba, RgbaImage};
use kurbo::{BezPath, PathEl, Point, Shape as KurboShape};
use peniko::Color;

/// Vertical samples per pixel row.
const SUBSAMPLES: usize = 4;
/// Curve flattening tolerance in pixels.
const FLATTEN_TOLERANCE: f64 = 0.1;

/// Premultiplied RGBA with channels in `0.0..=1.0`.
pub(crate) type Premul = [f32; 4];

/// Premultiply a color, scaling its alpha by `opacity`.
pub(crate) fn premultiply(color: Color, opacity: f64) -> Premul {
    let rgba = color.to_rgba8();
    straight_to_premul([rgba.r, rgba.g, rgba.b, rgba.a], opacity)
}

pub(crate) fn straight_to_premul(rgba: [u8; 4], opacity: f64) -> Premul {
    let a = rgba[3] as f32 / 255.0 * opacity.clamp(0.0, 1.0) as f32;
    [
        rgba[0] as f32 / 255.0 * a,
        rgba[1] as f32 / 255.0 * a,
        rgba[2] as f32 / 255.0 * a,
        a,
    ]
}

/// A polygon edge, stored top to bottom.
#[derive(Debug, Clone, Copy)]
struct Edge {
    top: Point,
    bottom: Point,
    winding: i32,
}

fn push_edge(edges: &mut Vec<Edge>, from: Point, to: Point) {
    if (from.y - to.y).abs() < 1e-12 {
        return;
    }
    let edge = if from.y < to.y {
        Edge {
            top: from,
            bottom: to,
            winding: 1,
        }
    } else {
        Edge {
            top: to,
            bottom: from,
            winding: -1,
        }
    };
    edges.push(edge);
}

/// Flatten a path into closed polygon edges. Open subpaths are closed.
fn edges(path: &BezPath) -> Vec<Edge> {
    let mut edges = Vec::new();
    let mut start = Point::ZERO;
    let mut last = Point::ZERO;
    kurbo::flatten(path.iter(), FLATTEN_TOLERANCE, |el| match el {
        PathEl::MoveTo(p) => {
            push_edge(&mut edges, last, start);
            start = p;
            last = p;
        }
        PathEl::LineTo(p) => {
            push_edge(&mut edges, last, p);
            last = p;
        }
        PathEl::ClosePath => {
            push_edge(&mut edges, last, start);
            last = start;
        }
        _ => {}
    });
    push_edge(&mut edges, last, start);
    edges
}

/// Add `weight` of coverage for the horizontal span `[a, b)` of one row.
fn add_span(row: &mut [f32], a: f64, b: f64, weight: f32) {
    let len = row.len() as f64;
    let a = a.clamp(0.0, len);
    let b = b.clamp(0.0, len);
    if b <= a {
        return;
    }
    let first = a.floor() as usize;
    let last = b.floor() as usize;
    if first == last {
        row[first] += (b - a) as f32 * weight;
        return;
    }
    row[first] += (first as f64 + 1.0 - a) as f32 * weight;
    for px in &mut row[first + 1..last] {
        *px += weight;
    }
    if last < row.len() {
        row[last] += (b - last as f64) as f32 * weight;
    }
}

/// Anti-aliased nonzero coverage of a path, covering only the pixels its
/// bounds touch.
#[derive(Debug, Clone)]
pub(crate) struct Mask {
    x0: usize,
    y0: usize,
    width: usize,
    coverage: Vec<f32>,
}

impl Mask {
    /// Rasterize `path` (in pixel coordinates) clipped to a `width` × `height` surface.
    pub(crate) fn fill(path: &BezPath, width: usize, height: usize) -> Option<Self> {
        let edges = edges(path);
        if edges.is_empty() {
            return None;
        }
        let bounds = path.bounding_box();
        if !(bounds.x0.is_finite() && bounds.y0.is_finite() && bounds.x1.is_finite() && bounds.y1.is_finite()) {
            return None;
        }
        let x0 = bounds.x0.floor().max(0.0) as usize;
        let y0 = bounds.y0.floor().max(0.0) as usize;
        let x1 = bounds.x1.ceil().clamp(0.0, width as f64) as usize;
        let y1 = bounds.y1.ceil().clamp(0.0, height as f64) as usize;
        if x0 >= x1 || y0 >= y1 {
            return None;
        }

        let mask_width = x1 - x0;
        let mut coverage = vec![0.0f32; mask_width * (y1 - y0)];
        let mut crossings: Vec<(f64, i32)> = Vec::new();
        let step = 1.0 / SUBSAMPLES as f64;

        for (row_index, row) in coverage.chunks_mut(mask_width).enumerate() {
            let y = (y0 + row_index) as f64;
            for sample in 0..SUBSAMPLES {
                let sy = y + (sample as f64 + 0.5) * step;
                crossings.clear();
                for edge in &edges {
                    if sy >= edge.top.y && sy < edge.bottom.y {
                        let t = (sy - edge.top.y) / (edge.bottom.y - edge.top.y);
                        let x = edge.top.x + t * (edge.bottom.x - edge.top.x);
                        crossings.push((x - x0 as f64, edge.winding));
                    }
                }
                crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

                let mut winding = 0;
                for pair in crossings.windows(2) {
                    winding += pair[0].1;
                    if winding != 0 {
                        add_span(row, pair[0].0, pair[1].0, step as f32);
                    }
                }
            }
        }
        for c in &mut coverage {
            *c = c.min(1.0);
        }

        Some(Self {
            x0,
            y0,
            width: mask_width,
            coverage,
        })
    }

    /// Covered pixels as `(x, y, coverage)` in surface coordinates.
    pub(crate) fn pixels(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        self.coverage
            .iter()
            .enumerate()
            .filter(|(_, c)| **c > 0.0)
            .map(|(i, c)| (self.x0 + i % self.width, self.y0 + i / self.width, *c))
    }

    #[cfg(test)]
    pub(crate) fn at(&self, x: usize, y: usize) -> f32 {
        if x < self.x0 || y < self.y0 || x >= self.x0 + self.width {
            return 0.0;
        }
        self.coverage
            .get((y - self.y0) * self.width + (x - self.x0))
            .copied()
            .unwrap_or(0.0)
    }
}

/// The object layer: premultiplied pixels, transparent where nothing was drawn.
pub(crate) struct Layer {
    width: usize,
    height: usize,
    pixels: Vec<Premul>,
}

impl Layer {
    pub(crate) fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 4]; width * height],
        }
    }

    pub(crate) fn width(&self) -> usize {
        self.width
    }

    pub(crate) fn height(&self) -> usize {
        self.height
    }

    /// Source-over one premultiplied pixel.
    pub(crate) fn blend(&mut self, x: usize, y: usize, src: Premul) {
        if x >= self.width || y >= self.height {
            return;
        }
        let dst = &mut self.pixels[y * self.width + x];
        let keep = 1.0 - src[3];
        for (d, s) in dst.iter_mut().zip(src) {
            *d = s + *d * keep;
        }
    }

    /// Paint `color` through a coverage mask.
    pub(crate) fn paint(&mut self, mask: &Mask, color: Premul) {
        for (x, y, coverage) in mask.pixels() {
            self.blend(x, y, color.map(|c| c * coverage));
        }
    }

    /// Remove coverage from everything painted so far.
    pub(crate) fn erase(&mut self, mask: &Mask, strength: f32) {
        for (x, y, coverage) in mask.pixels() {
            if x < self.width && y < self.height {
                let keep = 1.0 - coverage * strength;
                let px = &mut self.pixels[y * self.width + x];
                *px = px.map(|c| c * keep);
            }
        }
    }

    /// Composite the layer over an opaque-or-not background into straight RGBA.
    pub(crate) fn composite_over(&self, background: Premul) -> RgbaImage {
        let mut out = RgbaImage::new(self.width as u32, self.height as u32);
        for (i, px) in self.pixels.iter().enumerate() {
            let keep = 1.0 - px[3];
            let c: Premul = std::array::from_fn(|k| px[k] + background[k] * keep);
            let a = c[3];
            let straight = if a > 0.0 {
                [c[0] / a, c[1] / a, c[2] / a, a]
            } else {
                [0.0; 4]
            };
            let x = (i % self.width) as u32;
            let y = (i / self.width) as u32;
            out.put_pixel(x, y, Rgba(straight.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Circle, Rect};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_rect_coverage() {
        let path = Rect::new(2.0, 2.0, 6.0, 5.0).to_path(0.1);
        let mask = Mask::fill(&path, 10, 10).unwrap();
        assert!(approx(mask.at(3, 3), 1.0));
        assert!(approx(mask.at(5, 4), 1.0));
        assert!(approx(mask.at(6, 3), 0.0));
        assert!(approx(mask.at(1, 3), 0.0));
        assert!(approx(mask.at(3, 5), 0.0));
    }

    #[test]
    fn test_partial_pixel_coverage() {
        let path = Rect::new(1.5, 0.0, 3.0, 2.0).to_path(0.1);
        let mask = Mask::fill(&path, 4, 4).unwrap();
        assert!(approx(mask.at(1, 0), 0.5));
        assert!(approx(mask.at(2, 0), 1.0));
    }

    #[test]
    fn test_clipped_to_surface() {
        let path = Rect::new(-5.0, -5.0, 100.0, 3.0).to_path(0.1);
        let mask = Mask::fill(&path, 8, 8).unwrap();
        assert!(mask.pixels().all(|(x, y, _)| x < 8 && y < 8));
        assert!(Mask::fill(&Rect::new(20.0, 20.0, 30.0, 30.0).to_path(0.1), 8, 8).is_none());
    }

    #[test]
    fn test_nonzero_overlap_does_not_exceed_one() {
        let mut path = Rect::new(0.0, 0.0, 4.0, 4.0).to_path(0.1);
        path.extend(Rect::new(1.0, 1.0, 3.0, 3.0).path_elements(0.1));
        let mask = Mask::fill(&path, 4, 4).unwrap();
        assert!(approx(mask.at(2, 2), 1.0));
    }

    #[test]
    fn test_circle_is_antialiased() {
        let path = Circle::new((8.0, 8.0), 5.0).to_path(0.1);
        let mask = Mask::fill(&path, 16, 16).unwrap();
        assert!(approx(mask.at(8, 8), 1.0));
        assert!(approx(mask.at(0, 0), 0.0));
        let edge = mask.at(11, 4);
        assert!(edge > 0.0 && edge < 1.0);
    }

    #[test]
    fn test_paint_erase_composite() {
        let mask = Mask::fill(&Rect::new(0.0, 0.0, 2.0, 1.0).to_path(0.1), 2, 1).unwrap();
        let mut layer = Layer::new(2, 1);
        layer.paint(&mask, premultiply(Color::from_rgba8(255, 0, 0, 255), 1.0));
        let erase = Mask::fill(&Rect::new(1.0, 0.0, 2.0, 1.0).to_path(0.1), 2, 1).unwrap();
        layer.erase(&erase, 1.0);

        let out = layer.composite_over(premultiply(Color::from_rgba8(0, 0, 255, 255), 1.0));
        assert_eq!(out.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(1, 0).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_half_opacity_blend() {
        let mask = Mask::fill(&Rect::new(0.0, 0.0, 1.0, 1.0).to_path(0.1), 1, 1).unwrap();
        let mut layer = Layer::new(1, 1);
        layer.paint(&mask, premultiply(Color::from_rgba8(255, 255, 255, 255), 0.5));
        let out = layer.composite_over(premultiply(Color::from_rgba8(0, 0, 0, 255), 1.0));
        let [r, _, _, a] = out.get_pixel(0, 0).0;
        assert_eq!(a, 255);
        assert!((127..=128).contains(&r));
    }
}
