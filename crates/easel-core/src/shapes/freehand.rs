//! Freehand paths produced by the draw and erase tools.

use super::point_to_polyline_dist;
use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};

/// How a freehand path composites with what is below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrokeMode {
    /// Paint the stroke.
    #[default]
    Draw,
    /// Remove coverage of everything painted below.
    Erase,
}

/// A freehand drawing (series of points, local to the object's position).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Freehand {
    /// Points in the freehand path.
    pub points: Vec<Point>,
    /// Compositing mode.
    #[serde(default)]
    pub mode: StrokeMode,
}

impl Freehand {
    /// Create from existing points.
    pub fn from_points(points: Vec<Point>, mode: StrokeMode) -> Self {
        Self { points, mode }
    }

    /// Build a path from canvas-space points, returning it with the origin its
    /// local points are relative to (the top-left of their bounds).
    pub fn from_canvas_points(points: &[Point], mode: StrokeMode) -> (Self, Point) {
        let origin = points.iter().fold(
            Point::new(f64::INFINITY, f64::INFINITY),
            |acc, p| Point::new(acc.x.min(p.x), acc.y.min(p.y)),
        );
        let origin = if origin.x.is_finite() { origin } else { Point::ZERO };
        let local = points.iter().map(|p| (*p - origin).to_point()).collect();
        (Self::from_points(local, mode), origin)
    }

    /// Add a point to the path.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Get the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Simplify the path by removing redundant points.
    pub fn simplify(&mut self, tolerance: f64) {
        if self.points.len() < 3 {
            return;
        }

        // Ramer-Douglas-Peucker algorithm
        self.points = rdp_simplify(&self.points, tolerance);
    }

    pub fn local_bounds(&self) -> Rect {
        if self.points.is_empty() {
            return Rect::ZERO;
        }

        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;

        for point in &self.points {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }

        Rect::new(min_x, min_y, max_x, max_y)
    }

    /// `tolerance` already includes half the stroke width.
    pub(crate) fn contains(&self, point: Point, tolerance: f64) -> bool {
        point_to_polyline_dist(point, &self.points) <= tolerance
    }

    pub(crate) fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();

        let Some((first, rest)) = self.points.split_first() else {
            return path;
        };

        path.move_to(*first);
        for point in rest {
            path.line_to(*point);
        }

        path
    }
}

/// Ramer-Douglas-Peucker line simplification.
fn rdp_simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    // Find point with maximum distance from line between first and last
    let first = points[0];
    let last = points[points.len() - 1];

    let mut max_dist = 0.0;
    let mut max_index = 0;

    for (i, point) in points.iter().enumerate().skip(1).take(points.len() - 2) {
        let dist = perpendicular_distance(*point, first, last);
        if dist > max_dist {
            max_dist = dist;
            max_index = i;
        }
    }

    if max_dist > tolerance {
        let mut left = rdp_simplify(&points[..=max_index], tolerance);
        let right = rdp_simplify(&points[max_index..], tolerance);

        // Combine, removing duplicate point at junction
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}

/// Calculate perpendicular distance from point to line.
fn perpendicular_distance(point: Point, line_start: Point, line_end: Point) -> f64 {
    let dx = line_end.x - line_start.x;
    let dy = line_end.y - line_start.y;

    let line_len_sq = dx * dx + dy * dy;
    if line_len_sq < f64::EPSILON {
        return (point - line_start).hypot();
    }

    // Area of triangle * 2 / base = height
    let area2 = ((point.x - line_start.x) * dy - (point.y - line_start.y) * dx).abs();
    area2 / line_len_sq.sqrt()
}
