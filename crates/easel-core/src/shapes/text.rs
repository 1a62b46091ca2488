//! Text blocks.

use crate::fonts;
use kurbo::{BezPath, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// Font family options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    Sans,
    Serif,
    Monospace,
}

impl FontFamily {
    /// Get display name for UI.
    pub fn display_name(&self) -> &'static str {
        match self {
            FontFamily::Sans => "Sans",
            FontFamily::Serif => "Serif",
            FontFamily::Monospace => "Mono",
        }
    }

    /// Get all available font families.
    pub fn all() -> &'static [FontFamily] {
        &[FontFamily::Sans, FontFamily::Serif, FontFamily::Monospace]
    }
}

/// Font weight options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontWeight {
    Light,
    #[default]
    Regular,
    Bold,
}

/// Horizontal alignment of lines inside the text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    /// Fraction of the free horizontal space placed before a line.
    pub fn offset_factor(self) -> f64 {
        match self {
            TextAlign::Left => 0.0,
            TextAlign::Center => 0.5,
            TextAlign::Right => 1.0,
        }
    }
}

/// A text block. Its box starts at the local origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    /// The text content.
    pub content: String,
    /// Font size in pixels.
    pub font_size: f64,
    #[serde(default)]
    pub font_family: FontFamily,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub align: TextAlign,
}

impl Text {
    pub const DEFAULT_FONT_SIZE: f64 = 20.0;
    /// Line height as a multiple of the font size.
    pub const LINE_HEIGHT: f64 = 1.2;
    /// Narrowest box an empty or short text block gets, so it stays clickable.
    pub const MIN_WIDTH: f64 = 20.0;

    /// Create a new text block.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            font_size: Self::DEFAULT_FONT_SIZE,
            font_family: FontFamily::default(),
            font_weight: FontWeight::default(),
            align: TextAlign::default(),
        }
    }

    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    pub fn with_font_family(mut self, family: FontFamily) -> Self {
        self.font_family = family;
        self
    }

    pub fn with_font_weight(mut self, weight: FontWeight) -> Self {
        self.font_weight = weight;
        self
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    /// Lines of the block; empty content still has one line.
    pub fn lines(&self) -> Vec<&str> {
        let mut lines: Vec<&str> = self.content.split('\n').collect();
        if lines.is_empty() {
            lines.push("");
        }
        lines
    }

    /// Advance width of one line in the bundled face.
    pub fn line_width(&self, line: &str) -> f64 {
        fonts::line_width(self, line)
    }

    pub fn line_height(&self) -> f64 {
        self.font_size * Self::LINE_HEIGHT
    }

    pub fn local_bounds(&self) -> Rect {
        let lines = self.lines();
        let width = lines
            .iter()
            .map(|line| self.line_width(line))
            .fold(0.0, f64::max)
            .max(Self::MIN_WIDTH);
        let height = lines.len() as f64 * self.line_height();
        Rect::new(0.0, 0.0, width, height)
    }

    pub(crate) fn contains(&self, point: Point, tolerance: f64) -> bool {
        self.local_bounds()
            .inflate(tolerance, tolerance)
            .contains(point)
    }

    /// Filled glyph outlines in local coordinates.
    pub fn outline(&self) -> BezPath {
        fonts::text_outline(self)
    }

    /// Picking and selection work on the box, not the glyphs.
    pub(crate) fn to_path(&self) -> BezPath {
        self.local_bounds().to_path(0.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_creation() {
        let text = Text::new("Hello");
        assert_eq!(text.content, "Hello");
        assert!((text.font_size - Text::DEFAULT_FONT_SIZE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_text_has_clickable_box() {
        let bounds = Text::new("").local_bounds();
        assert!((bounds.width() - Text::MIN_WIDTH).abs() < f64::EPSILON);
        assert!(bounds.height() > 0.0);
    }

    #[test]
    fn test_multiline_bounds() {
        let single = Text::new("abc").local_bounds();
        let double = Text::new("abc\nabcdef").local_bounds();
        assert!((double.height() - 2.0 * single.height()).abs() < 1e-9);
        assert!(double.width() > single.width());
    }

    #[test]
    fn test_bigger_font_is_wider() {
        let small = Text::new("Hello world").local_bounds();
        let big = Text::new("Hello world").with_font_size(40.0).local_bounds();
        assert!(big.width() > small.width());
    }

    #[test]
    fn test_bounds_follow_glyph_advances() {
        let narrow = Text::new("iiiiiiii").local_bounds();
        let wide = Text::new("WWWWWWWW").local_bounds();
        assert!(wide.width() > 2.0 * narrow.width());

        let mono = Text::new("iiiiiiii").with_font_family(FontFamily::Monospace).local_bounds();
        let mono_wide = Text::new("WWWWWWWW").with_font_family(FontFamily::Monospace).local_bounds();
        assert!((mono.width() - mono_wide.width()).abs() < 1e-6);
    }

    #[test]
    fn test_align_factor() {
        assert!((TextAlign::Center.offset_factor() - 0.5).abs() < f64::EPSILON);
        assert!((TextAlign::Right.offset_factor() - 1.0).abs() < f64::EPSILON);
    }
}
