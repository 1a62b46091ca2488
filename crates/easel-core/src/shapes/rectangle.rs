//! Rectangle geometry.

use kurbo::{BezPath, Point, Rect, RoundedRect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// A rectangle spanning `(0, 0)..(width, height)` in local space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    /// Width of the rectangle.
    pub width: f64,
    /// Height of the rectangle.
    pub height: f64,
    /// Corner radius (0 = sharp corners).
    #[serde(default)]
    pub corner_radius: f64,
}

impl Rectangle {
    /// Create a new rectangle.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            corner_radius: 0.0,
        }
    }

    /// Create a rectangle from two corner points, returning it with its top-left corner.
    pub fn from_corners(p1: Point, p2: Point) -> (Self, Point) {
        let origin = Point::new(p1.x.min(p2.x), p1.y.min(p2.y));
        let rect = Self::new((p2.x - p1.x).abs(), (p2.y - p1.y).abs());
        (rect, origin)
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
        if self.corner_radius > 0.0 {
            RoundedRect::from_rect(self.local_bounds(), self.corner_radius).to_path(0.1)
        } else {
            self.local_bounds().to_path(0.1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_from_corners() {
        let (rect, origin) =
            Rectangle::from_corners(Point::new(100.0, 100.0), Point::new(50.0, 50.0));
        assert!((origin.x - 50.0).abs() < f64::EPSILON);
        assert!((origin.y - 50.0).abs() < f64::EPSILON);
        assert!((rect.width - 50.0).abs() < f64::EPSILON);
        assert!((rect.height - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_contains() {
        let rect = Rectangle::new(100.0, 100.0);
        assert!(rect.contains(Point::new(50.0, 50.0), 0.0));
        assert!(!rect.contains(Point::new(150.0, 50.0), 0.0));
        assert!(rect.contains(Point::new(105.0, 50.0), 10.0)); // Within tolerance
    }

    #[test]
    fn test_rounded_path_is_closed() {
        let mut rect = Rectangle::new(40.0, 20.0);
        rect.corner_radius = 5.0;
        let path = rect.to_path();
        assert!(path.elements().len() > 4);
        assert!(path.contains(Point::new(20.0, 10.0)));
    }
}
