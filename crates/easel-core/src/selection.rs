//! Hit testing, the selection set and corner resize handles.

use crate::scene::Scene;
use crate::shapes::{ObjectId, SceneObject, Transform, corners};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Handle size in canvas pixels.
pub const HANDLE_SIZE: f64 = 10.0;
/// Handle hit tolerance in canvas pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 8.0;
/// Smallest scaled extent a resize may produce.
const MIN_EXTENT: f64 = 1.0;

/// Find the topmost visible, unlocked object containing `point`.
pub fn hit_test(scene: &Scene, point: Point, tolerance: f64) -> Option<ObjectId> {
    scene
        .list_objects()
        .iter()
        .rev()
        .filter(|o| o.is_interactable())
        .find(|o| o.hit_test(point, tolerance))
        .map(SceneObject::id)
}

/// Corner positions, in local (unrotated) terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomRight => Corner::TopLeft,
            Corner::BottomLeft => Corner::TopRight,
        }
    }

    /// Index into [`corners`] ordering.
    fn index(self) -> usize {
        match self {
            Corner::TopLeft => 0,
            Corner::TopRight => 1,
            Corner::BottomRight => 2,
            Corner::BottomLeft => 3,
        }
    }

    /// Sign of growth along each axis when this corner moves outward.
    fn outward(self) -> Vec2 {
        match self {
            Corner::TopLeft => Vec2::new(-1.0, -1.0),
            Corner::TopRight => Vec2::new(1.0, -1.0),
            Corner::BottomRight => Vec2::new(1.0, 1.0),
            Corner::BottomLeft => Vec2::new(-1.0, 1.0),
        }
    }
}

/// A resize handle with its canvas position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub position: Point,
    pub corner: Corner,
}

impl Handle {
    /// Check if a canvas point hits this handle.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// Corner handles of an object, following its rotation.
pub fn handles(object: &SceneObject) -> Vec<Handle> {
    let affine = object.affine();
    let local = corners(object.kind.local_bounds());
    Corner::ALL
        .iter()
        .map(|&corner| Handle {
            position: affine * local[corner.index()],
            corner,
        })
        .collect()
}

/// The handle of `object` under `point`, if any.
pub fn handle_at(object: &SceneObject, point: Point, tolerance: f64) -> Option<Corner> {
    handles(object)
        .into_iter()
        .find(|h| h.hit_test(point, tolerance))
        .map(|h| h.corner)
}

/// Resize `original` by dragging `corner` by `delta` (canvas units).
///
/// The opposite corner stays fixed on the canvas. Resizing changes the
/// transform's scale; local geometry is untouched.
pub fn resize_from_corner(original: &SceneObject, corner: Corner, delta: Vec2) -> SceneObject {
    let mut resized = original.clone();
    let local = original.kind.local_bounds();
    let transform = original.transform;
    if local.width() <= f64::EPSILON && local.height() <= f64::EPSILON {
        return resized;
    }

    // Express the pointer delta in the object's unrotated frame.
    let (sin, cos) = (-transform.rotation).sin_cos();
    let d = Vec2::new(delta.x * cos - delta.y * sin, delta.x * sin + delta.y * cos);
    let grow = corner.outward();

    let mut scale = transform.scale;
    if local.width() > f64::EPSILON {
        let extent = (local.width() * scale.x.abs() + d.x * grow.x).max(MIN_EXTENT);
        scale.x = extent / local.width() * scale.x.signum();
    }
    if local.height() > f64::EPSILON {
        let extent = (local.height() * scale.y.abs() + d.y * grow.y).max(MIN_EXTENT);
        scale.y = extent / local.height() * scale.y.signum();
    }

    let anchor_local = corners(local)[corner.opposite().index()];
    let fixed = original.affine() * anchor_local;
    let unplaced = Transform {
        position: Point::ZERO,
        scale,
        rotation: transform.rotation,
    };
    let moved = unplaced.to_affine(local) * anchor_local;
    resized.transform.scale = scale;
    resized.transform.position = fixed - moved.to_vec2();
    resized
}

/// The current selection, in the order ids were selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<ObjectId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[ObjectId] {
        &self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.ids.contains(&id)
    }

    /// The selected id when exactly one object is selected.
    pub fn single(&self) -> Option<ObjectId> {
        match self.ids.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Replace the selection with whatever is under `point`.
    pub fn select_at(&mut self, scene: &Scene, point: Point, tolerance: f64) -> Option<ObjectId> {
        self.ids.clear();
        let hit = hit_test(scene, point, tolerance);
        self.ids.extend(hit);
        hit
    }

    /// Add or remove the object under `point` (shift-click).
    pub fn toggle_at(&mut self, scene: &Scene, point: Point, tolerance: f64) -> Option<ObjectId> {
        let hit = hit_test(scene, point, tolerance)?;
        if let Some(pos) = self.ids.iter().position(|&id| id == hit) {
            self.ids.remove(pos);
        } else {
            self.ids.push(hit);
        }
        Some(hit)
    }

    /// Select every visible, unlocked object whose bounds intersect `rect`.
    pub fn select_rect(&mut self, scene: &Scene, rect: Rect) {
        let rect = rect.abs();
        self.ids = scene
            .list_objects()
            .iter()
            .filter(|o| o.is_interactable())
            .filter(|o| {
                let bounds = o.bounds();
                bounds.x0 <= rect.x1
                    && bounds.x1 >= rect.x0
                    && bounds.y0 <= rect.y1
                    && bounds.y1 >= rect.y0
            })
            .map(SceneObject::id)
            .collect();
    }

    /// Programmatic selection. Locked and hidden objects are allowed; ids not
    /// in the scene are skipped.
    pub fn select_ids(&mut self, scene: &Scene, ids: &[ObjectId]) {
        self.ids.clear();
        for &id in ids {
            if scene.contains(id) && !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    /// Set the selection without consulting a scene (for objects about to be inserted).
    pub(crate) fn replace(&mut self, ids: Vec<ObjectId>) {
        self.ids = ids;
    }

    /// Drop ids that no longer exist in the scene.
    pub fn retain_existing(&mut self, scene: &Scene) {
        self.ids.retain(|&id| scene.contains(id));
    }

    /// Selected ids in z-order, bottom first.
    pub fn in_z_order(&self, scene: &Scene) -> Vec<ObjectId> {
        scene
            .list_objects()
            .iter()
            .map(SceneObject::id)
            .filter(|id| self.ids.contains(id))
            .collect()
    }

    /// Bounding box of the selected objects.
    pub fn bounds(&self, scene: &Scene) -> Option<Rect> {
        self.ids
            .iter()
            .filter_map(|&id| scene.get_object(id))
            .map(SceneObject::bounds)
            .reduce(|acc, b| acc.union(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Ellipse, Rectangle, ShapeKind};

    fn rect_at(scene: &mut Scene, x: f64, y: f64, w: f64, h: f64) -> ObjectId {
        let obj = SceneObject::new(ShapeKind::Rectangle(Rectangle::new(w, h)), Point::new(x, y));
        let id = obj.id();
        scene.add_object(obj).unwrap();
        id
    }

    #[test]
    fn test_topmost_wins() {
        let mut scene = Scene::default();
        let bottom = rect_at(&mut scene, 0.0, 0.0, 100.0, 100.0);
        let ellipse = SceneObject::new(ShapeKind::Ellipse(Ellipse::new(100.0, 100.0)), Point::new(50.0, 50.0));
        let top = ellipse.id();
        scene.add_object(ellipse).unwrap();

        assert_eq!(hit_test(&scene, Point::new(90.0, 90.0), 0.0), Some(top));
        assert_eq!(hit_test(&scene, Point::new(10.0, 10.0), 0.0), Some(bottom));
        assert_eq!(hit_test(&scene, Point::new(500.0, 500.0), 0.0), None);
    }

    #[test]
    fn test_locked_and_hidden_are_skipped() {
        let mut scene = Scene::default();
        let bottom = rect_at(&mut scene, 0.0, 0.0, 100.0, 100.0);
        let top = rect_at(&mut scene, 0.0, 0.0, 100.0, 100.0);
        let p = Point::new(50.0, 50.0);

        let mut locked = scene.get_object(top).unwrap().clone();
        locked.locked = true;
        scene.replace_object(locked).unwrap();
        assert_eq!(hit_test(&scene, p, 0.0), Some(bottom));

        let mut hidden = scene.get_object(bottom).unwrap().clone();
        hidden.visible = false;
        scene.replace_object(hidden).unwrap();
        assert_eq!(hit_test(&scene, p, 0.0), None);
    }

    #[test]
    fn test_select_at_replaces_or_clears() {
        let mut scene = Scene::default();
        let a = rect_at(&mut scene, 0.0, 0.0, 10.0, 10.0);
        let b = rect_at(&mut scene, 100.0, 0.0, 10.0, 10.0);
        let mut selection = Selection::new();

        selection.select_at(&scene, Point::new(5.0, 5.0), 0.0);
        assert_eq!(selection.ids(), &[a]);
        selection.select_at(&scene, Point::new(105.0, 5.0), 0.0);
        assert_eq!(selection.ids(), &[b]);
        selection.select_at(&scene, Point::new(500.0, 5.0), 0.0);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_toggle() {
        let mut scene = Scene::default();
        let a = rect_at(&mut scene, 0.0, 0.0, 10.0, 10.0);
        let b = rect_at(&mut scene, 100.0, 0.0, 10.0, 10.0);
        let mut selection = Selection::new();
        selection.toggle_at(&scene, Point::new(5.0, 5.0), 0.0);
        selection.toggle_at(&scene, Point::new(105.0, 5.0), 0.0);
        assert_eq!(selection.ids(), &[a, b]);
        selection.toggle_at(&scene, Point::new(5.0, 5.0), 0.0);
        assert_eq!(selection.ids(), &[b]);
    }

    #[test]
    fn test_select_rect() {
        let mut scene = Scene::default();
        let a = rect_at(&mut scene, 0.0, 0.0, 10.0, 10.0);
        let b = rect_at(&mut scene, 50.0, 50.0, 10.0, 10.0);
        let _far = rect_at(&mut scene, 500.0, 500.0, 10.0, 10.0);
        let locked = rect_at(&mut scene, 20.0, 20.0, 10.0, 10.0);
        let mut obj = scene.get_object(locked).unwrap().clone();
        obj.locked = true;
        scene.replace_object(obj).unwrap();

        let mut selection = Selection::new();
        // Dragged from bottom-right to top-left.
        selection.select_rect(&scene, Rect::new(55.0, 55.0, 5.0, 5.0));
        assert_eq!(selection.ids(), &[a, b]);
    }

    #[test]
    fn test_select_ids_allows_locked() {
        let mut scene = Scene::default();
        let id = rect_at(&mut scene, 0.0, 0.0, 10.0, 10.0);
        let mut obj = scene.get_object(id).unwrap().clone();
        obj.locked = true;
        scene.replace_object(obj).unwrap();

        let mut selection = Selection::new();
        selection.select_ids(&scene, &[id, uuid::Uuid::new_v4(), id]);
        assert_eq!(selection.ids(), &[id]);
        assert_eq!(selection.single(), Some(id));
    }

    #[test]
    fn test_handles_follow_transform() {
        let mut scene = Scene::default();
        let id = rect_at(&mut scene, 10.0, 20.0, 100.0, 50.0);
        let obj = scene.get_object(id).unwrap();
        let hs = handles(obj);
        assert_eq!(hs.len(), 4);
        assert_eq!(hs[0].position, Point::new(10.0, 20.0));
        assert_eq!(hs[2].position, Point::new(110.0, 70.0));
        assert_eq!(handle_at(obj, Point::new(111.0, 69.0), HANDLE_HIT_TOLERANCE), Some(Corner::BottomRight));
        assert_eq!(handle_at(obj, Point::new(60.0, 45.0), HANDLE_HIT_TOLERANCE), None);
    }

    #[test]
    fn test_resize_bottom_right() {
        let obj = SceneObject::new(ShapeKind::Rectangle(Rectangle::new(100.0, 50.0)), Point::new(10.0, 10.0));
        let resized = resize_from_corner(&obj, Corner::BottomRight, Vec2::new(100.0, 50.0));
        assert!((resized.transform.scale.x - 2.0).abs() < 1e-9);
        assert!((resized.transform.scale.y - 2.0).abs() < 1e-9);
        assert!((resized.position().x - 10.0).abs() < 1e-9);
        let bounds = resized.bounds();
        assert!((bounds.x1 - 210.0).abs() < 1e-9);
        assert!((bounds.y1 - 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_resize_top_left_keeps_opposite_corner() {
        let obj = SceneObject::new(ShapeKind::Rectangle(Rectangle::new(100.0, 100.0)), Point::new(0.0, 0.0));
        let resized = resize_from_corner(&obj, Corner::TopLeft, Vec2::new(50.0, 50.0));
        let bounds = resized.bounds();
        assert!((bounds.x0 - 50.0).abs() < 1e-9);
        assert!((bounds.y0 - 50.0).abs() < 1e-9);
        assert!((bounds.x1 - 100.0).abs() < 1e-9);
        assert!((bounds.y1 - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_resize_rotated_keeps_anchor() {
        let mut obj = SceneObject::new(ShapeKind::Rectangle(Rectangle::new(100.0, 40.0)), Point::new(30.0, 30.0));
        obj.transform.rotation = 0.6;
        let anchor = handles(&obj)[0].position;
        let resized = resize_from_corner(&obj, Corner::BottomRight, Vec2::new(25.0, 10.0));
        let after = handles(&resized)[0].position;
        assert!((anchor - after).hypot() < 1e-9);
    }

    #[test]
    fn test_resize_clamps_to_minimum() {
        let obj = SceneObject::new(ShapeKind::Rectangle(Rectangle::new(10.0, 10.0)), Point::ZERO);
        let resized = resize_from_corner(&obj, Corner::BottomRight, Vec2::new(-50.0, -50.0));
        assert!(resized.bounds().width() >= MIN_EXTENT - 1e-9);
        assert!(resized.transform.scale.x > 0.0);
    }
}
