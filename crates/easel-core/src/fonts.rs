//! Bundled fonts and text layout.
//!
//! Text is measured and outlined with the DejaVu faces shipped in
//! `assets/`, so bounds, hit areas and rendering agree on every machine.

use crate::shapes::{FontFamily, FontWeight, Text};
use ab_glyph::{Font, FontRef, GlyphId, OutlineCurve, ScaleFont};
use kurbo::{BezPath, Point};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded DejaVu faces, keyed by the names [`face_name`] returns.
static FACES: [(&str, &[u8]); 7] = [
    ("DejaVu Sans ExtraLight", include_bytes!("../assets/DejaVuSans-ExtraLight.ttf")),
    ("DejaVu Sans", include_bytes!("../assets/DejaVuSans.ttf")),
    ("DejaVu Sans Bold", include_bytes!("../assets/DejaVuSans-Bold.ttf")),
    ("DejaVu Serif", include_bytes!("../assets/DejaVuSerif.ttf")),
    ("DejaVu Serif Bold", include_bytes!("../assets/DejaVuSerif-Bold.ttf")),
    ("DejaVu Sans Mono", include_bytes!("../assets/DejaVuSansMono.ttf")),
    ("DejaVu Sans Mono Bold", include_bytes!("../assets/DejaVuSansMono-Bold.ttf")),
];

/// Name of the bundled face used for a family and weight.
///
/// Serif and Monospace have no light cut; they fall back to Regular.
pub fn face_name(family: FontFamily, weight: FontWeight) -> &'static str {
    match (family, weight) {
        (FontFamily::Sans, FontWeight::Light) => "DejaVu Sans ExtraLight",
        (FontFamily::Sans, FontWeight::Regular) => "DejaVu Sans",
        (FontFamily::Sans, FontWeight::Bold) => "DejaVu Sans Bold",
        (FontFamily::Serif, FontWeight::Bold) => "DejaVu Serif Bold",
        (FontFamily::Serif, _) => "DejaVu Serif",
        (FontFamily::Monospace, FontWeight::Bold) => "DejaVu Sans Mono Bold",
        (FontFamily::Monospace, _) => "DejaVu Sans Mono",
    }
}

fn face(family: FontFamily, weight: FontWeight) -> Option<&'static FontRef<'static>> {
    static LOADED: OnceLock<HashMap<&'static str, FontRef<'static>>> = OnceLock::new();
    let faces = LOADED.get_or_init(|| {
        FACES
            .iter()
            .filter_map(|(name, bytes)| match FontRef::try_from_slice(bytes) {
                Ok(font) => Some((*name, font)),
                Err(e) => {
                    log::error!("Failed to parse bundled font {}: {}", name, e);
                    None
                }
            })
            .collect()
    });
    faces.get(face_name(family, weight))
}

/// Glyphs of one line with their pen positions, and the line's advance width.
fn layout_line<F: Font, S: ScaleFont<F>>(scaled: &S, line: &str) -> (Vec<(GlyphId, f32)>, f32) {
    let mut glyphs = Vec::with_capacity(line.len());
    let mut cursor_x = 0.0f32;
    let mut last_glyph: Option<GlyphId> = None;
    for ch in line.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(prev) = last_glyph {
            cursor_x += scaled.kern(prev, id);
        }
        glyphs.push((id, cursor_x));
        cursor_x += scaled.h_advance(id);
        last_glyph = Some(id);
    }
    (glyphs, cursor_x)
}

/// Advance width of one line of `text`. Zero when the face is unavailable.
pub fn line_width(text: &Text, line: &str) -> f64 {
    let Some(font) = face(text.font_family, text.font_weight) else {
        return 0.0;
    };
    let scaled = font.as_scaled(text.font_size as f32);
    f64::from(layout_line(&scaled, line).1)
}

/// Glyph outlines of the whole block in local coordinates, lines aligned
/// inside [`Text::local_bounds`] and vertically centred in their line box.
pub fn text_outline(text: &Text) -> BezPath {
    let mut path = BezPath::new();
    let Some(font) = face(text.font_family, text.font_weight) else {
        return path;
    };
    let scaled = font.as_scaled(text.font_size as f32);
    let sx = f64::from(scaled.h_scale_factor());
    let sy = f64::from(scaled.v_scale_factor());
    let ascent = f64::from(scaled.ascent());
    let glyph_height = f64::from(scaled.height());
    let box_width = text.local_bounds().width();
    let line_height = text.line_height();

    for (row, line) in text.lines().iter().enumerate() {
        let (glyphs, width) = layout_line(&scaled, line);
        let left = (box_width - f64::from(width)) * text.align.offset_factor();
        let baseline = row as f64 * line_height + (line_height - glyph_height) / 2.0 + ascent;
        for (id, x) in glyphs {
            let Some(outline) = font.outline(id) else {
                continue;
            };
            let origin = Point::new(left + f64::from(x), baseline);
            // Font units are y-up.
            let to_local = |p: ab_glyph::Point| {
                Point::new(origin.x + f64::from(p.x) * sx, origin.y - f64::from(p.y) * sy)
            };
            append_curves(&mut path, &outline.curves, to_local);
        }
    }
    path
}

/// Each contour starts where the previous curve did not end.
fn append_curves(path: &mut BezPath, curves: &[OutlineCurve], to_local: impl Fn(ab_glyph::Point) -> Point) {
    let mut pen: Option<ab_glyph::Point> = None;
    for curve in curves {
        let (start, end) = match curve {
            OutlineCurve::Line(a, b) => (*a, *b),
            OutlineCurve::Quad(a, _, b) => (*a, *b),
            OutlineCurve::Cubic(a, _, _, b) => (*a, *b),
        };
        if pen != Some(start) {
            if pen.is_some() {
                path.close_path();
            }
            path.move_to(to_local(start));
        }
        match curve {
            OutlineCurve::Line(_, b) => path.line_to(to_local(*b)),
            OutlineCurve::Quad(_, c, b) => path.quad_to(to_local(*c), to_local(*b)),
            OutlineCurve::Cubic(_, c1, c2, b) => path.curve_to(to_local(*c1), to_local(*c2), to_local(*b)),
        }
        pen = Some(end);
    }
    if pen.is_some() {
        path.close_path();
    }
}
