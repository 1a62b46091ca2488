//! Grid snapping for committed positions.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Default grid spacing in canvas pixels.
pub const GRID_SIZE: f64 = 20.0;

/// Snap mode for aligning shapes to the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SnapMode {
    /// No snapping.
    #[default]
    None,
    /// Snap to grid intersections.
    Grid,
}

impl SnapMode {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled { SnapMode::Grid } else { SnapMode::None }
    }

    pub fn is_enabled(self) -> bool {
        self != SnapMode::None
    }
}

/// Result of a snap operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    /// The snapped point.
    pub point: Point,
    /// Whether the X coordinate moved.
    pub snapped_x: bool,
    /// Whether the Y coordinate moved.
    pub snapped_y: bool,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self {
            point,
            snapped_x: false,
            snapped_y: false,
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }
}

/// Round a point to the nearest grid intersection.
pub fn snap_to_grid(point: Point, grid_size: f64) -> SnapResult {
    if !(grid_size.is_finite() && grid_size > 0.0) {
        return SnapResult::none(point);
    }
    let snapped = Point::new(
        (point.x / grid_size).round() * grid_size,
        (point.y / grid_size).round() * grid_size,
    );
    SnapResult {
        point: snapped,
        snapped_x: snapped.x != point.x,
        snapped_y: snapped.y != point.y,
    }
}

/// Snap a point based on the current snap mode.
pub fn snap_point(point: Point, mode: SnapMode, grid_size: f64) -> SnapResult {
    match mode {
        SnapMode::None => SnapResult::none(point),
        SnapMode::Grid => snap_to_grid(point, grid_size),
    }
}

/// Correction that moves `point` onto the grid (zero when snapping is off).
pub fn snap_correction(point: Point, mode: SnapMode, grid_size: f64) -> Vec2 {
    snap_point(point, mode, grid_size).point - point
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_to_grid() {
        let result = snap_to_grid(Point::new(47.0, 53.0), 50.0);
        assert_eq!(result.point, Point::new(50.0, 50.0));
        assert!(result.is_snapped());

        let result = snap_to_grid(Point::new(24.0, 26.0), 50.0);
        assert_eq!(result.point, Point::new(0.0, 50.0));
    }

    #[test]
    fn test_snap_on_grid_is_untouched() {
        let result = snap_to_grid(Point::new(40.0, 60.0), 20.0);
        assert_eq!(result.point, Point::new(40.0, 60.0));
        assert!(!result.is_snapped());
    }

    #[test]
    fn test_snap_negative_coordinates() {
        let result = snap_to_grid(Point::new(-26.0, -74.0), 50.0);
        assert_eq!(result.point, Point::new(-50.0, -50.0));
    }

    #[test]
    fn test_invalid_grid_size() {
        let p = Point::new(3.0, 4.0);
        assert_eq!(snap_to_grid(p, 0.0).point, p);
        assert_eq!(snap_to_grid(p, f64::NAN).point, p);
    }

    #[test]
    fn test_snap_mode() {
        assert_eq!(snap_point(Point::new(7.0, 7.0), SnapMode::None, 10.0).point, Point::new(7.0, 7.0));
        assert!(!SnapMode::from_enabled(false).is_enabled());
        assert!(SnapMode::from_enabled(true).is_enabled());

        let correction = snap_correction(Point::new(47.0, 53.0), SnapMode::Grid, 50.0);
        assert!((correction.x - 3.0).abs() < f64::EPSILON);
        assert!((correction.y + 3.0).abs() < f64::EPSILON);
    }
}
