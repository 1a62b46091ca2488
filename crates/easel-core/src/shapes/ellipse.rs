//! Ellipse geometry.

use kurbo::{BezPath, Ellipse as KurboEllipse, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// An ellipse inscribed in `(0, 0)..(width, height)` in local space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    /// Horizontal diameter.
    pub width: f64,
    /// Vertical diameter.
    pub height: f64,
}

impl Ellipse {
    /// Create a new ellipse.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Create a circle.
    pub fn circle(radius: f64) -> Self {
        Self::new(radius * 2.0, radius * 2.0)
    }

    /// Create an ellipse filling a rectangle, returning it with its top-left corner.
    pub fn from_rect(rect: Rect) -> (Self, Point) {
        (Self::new(rect.width(), rect.height()), rect.origin())
    }

    fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Get as a kurbo Ellipse.
    pub fn as_kurbo(&self) -> KurboEllipse {
        KurboEllipse::new(self.center(), (self.width / 2.0, self.height / 2.0), 0.0)
    }

    pub fn local_bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    pub(crate) fn contains(&self, point: Point, tolerance: f64) -> bool {
        let center = self.center();
        let rx = self.width / 2.0 + tolerance;
        let ry = self.height / 2.0 + tolerance;
        if rx < f64::EPSILON || ry < f64::EPSILON {
            return false;
        }
        let dx = (point.x - center.x) / rx;
        let dy = (point.y - center.y) / ry;
        dx * dx + dy * dy <= 1.0
    }

    pub(crate) fn to_path(&self) -> BezPath {
        self.as_kurbo().to_path(0.1)
    }
}
