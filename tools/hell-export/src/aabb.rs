//! Axis-aligned bounding boxes over engine-space positions

use glam::Vec3;

/// Running bounding box.
///
/// Starts as the empty sentinel (min = +inf, max = -inf) so the first point
/// always initializes it. A box that never saw a point keeps the sentinel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const EMPTY: Self = Self {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    pub fn new() -> Self {
        Self::EMPTY
    }

    pub fn update(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Union with another box; an empty box contributes nothing
    pub fn merge(&mut self, other: &Aabb) {
        if other.is_empty() {
            return;
        }
        self.update(other.min);
        self.update(other.max);
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn contains(&self, p: Vec3, tolerance: f32) -> bool {
        p.cmpge(self.min - Vec3::splat(tolerance)).all()
            && p.cmple(self.max + Vec3::splat(tolerance)).all()
    }

    pub fn to_tuple(&self) -> ([f32; 3], [f32; 3]) {
        (self.min.to_array(), self.max.to_array())
    }

    /// Bounds to write for this box: the sentinel stays unless `zero_empty` is set
    pub fn written_bounds(&self, zero_empty: bool) -> (Vec3, Vec3) {
        if zero_empty && self.is_empty() {
            (Vec3::ZERO, Vec3::ZERO)
        } else {
            (self.min, self.max)
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl FromIterator<Vec3> for Aabb {
    fn from_iter<I: IntoIterator<Item = Vec3>>(iter: I) -> Self {
        let mut aabb = Aabb::new();
        for p in iter {
            aabb.update(p);
        }
        aabb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_point_initializes() {
        let mut aabb = Aabb::new();
        assert!(aabb.is_empty());
        aabb.update(Vec3::new(1.0, -2.0, 3.0));
        assert_eq!(aabb.min, Vec3::new(1.0, -2.0, 3.0));
        assert_eq!(aabb.max, Vec3::new(1.0, -2.0, 3.0));
        assert!(!aabb.is_empty());
    }

    #[test]
    fn test_contains_every_point() {
        let points = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(-1.0, 5.0, 2.0),
            Vec3::new(3.0, -4.0, 0.5),
        ];
        let aabb: Aabb = points.iter().copied().collect();
        assert_eq!(aabb.to_tuple(), ([-1.0, -4.0, 0.0], [3.0, 5.0, 2.0]));
        assert!(points.iter().all(|&p| aabb.contains(p, 0.0)));
    }

    #[test]
    fn test_merge_ignores_empty_boxes() {
        let mut scene = Aabb::new();
        scene.merge(&Aabb::EMPTY);
        assert!(scene.is_empty());

        let a: Aabb = [Vec3::ZERO, Vec3::ONE].into_iter().collect();
        scene.merge(&a);
        scene.merge(&Aabb::EMPTY);
        assert_eq!(scene, a);
    }

    #[test]
    fn test_empty_sentinel_is_written_verbatim_by_default() {
        let (min, max) = Aabb::EMPTY.written_bounds(false);
        assert_eq!(min, Vec3::INFINITY);
        assert_eq!(max, Vec3::NEG_INFINITY);
        assert_eq!(Aabb::EMPTY.written_bounds(true), (Vec3::ZERO, Vec3::ZERO));
    }
}
