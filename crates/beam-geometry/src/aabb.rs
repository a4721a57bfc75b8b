//! Axis-aligned bounding boxes.
//!
//! Used as the sampling domain of the Monte Carlo estimator and for the
//! cheap bounds-overlap diagnostic.

use beam_types::{Beam, Vec3};
use rand::Rng;

/// An axis-aligned bounding box, defined by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create a bounding box from its two opposite corners.
    ///
    /// The constructor normalises the corners so that `min ≤ max` per axis.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Smallest box containing every point in `points`, or `None` when the
    /// iterator is empty.
    pub fn enclosing(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::new(first, first), |acc, p| acc.encapsulate(p)))
    }

    /// Bounds of a beam: both endpoints grown by the radius on every side.
    pub fn of_beam(beam: &Beam) -> Self {
        Self::new(beam.origin(), beam.endpoint()).grow(beam.radius())
    }

    /// Grow the box just enough to contain `p`.
    pub fn encapsulate(self, p: Vec3) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    /// Move every face outwards by `margin`.
    pub fn grow(self, margin: f32) -> Self {
        let m = Vec3::new(margin, margin, margin);
        Self {
            min: self.min.sub(m),
            max: self.max.add(m),
        }
    }

    /// Return the centre point of the box.
    pub fn centre(&self) -> Vec3 {
        self.min.add(self.max).scale(0.5)
    }

    /// Edge lengths along each axis.
    pub fn size(&self) -> Vec3 {
        self.max.sub(self.min)
    }

    pub fn volume(&self) -> f32 {
        let s = self.size();
        s.x * s.y * s.z
    }

    /// True when the point lies inside or on the boundary of the box.
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// True when `other` overlaps (intersects or touches) this box.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// The shared region of two boxes, or `None` when they are disjoint.
    pub fn intersection(&self, other: &Aabb) -> Option<Aabb> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Aabb {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        })
    }

    /// True when every edge length is finite, i.e. points can be drawn
    /// from the box.
    pub fn is_sampleable(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.size().is_finite()
    }

    /// Draw a point uniformly from the box, or `None` when the box is not
    /// [sampleable](Self::is_sampleable).
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Vec3> {
        if !self.is_sampleable() {
            return None;
        }
        Some(Vec3::new(
            rng.gen_range(self.min.x..=self.max.x),
            rng.gen_range(self.min.y..=self.max.y),
            rng.gen_range(self.min.z..=self.max.z),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn unit_box() -> Aabb {
        Aabb::new(Vec3::zero(), Vec3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn new_normalises_corners() {
        let b = Aabb::new(Vec3::new(1.0, -1.0, 3.0), Vec3::new(-1.0, 1.0, 0.0));
        assert_eq!(b.min, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 1.0, 3.0));
    }

    #[test]
    fn enclosing_empty_is_none() {
        assert!(Aabb::enclosing(Vec::new()).is_none());
        let b = Aabb::enclosing([Vec3::zero(), Vec3::new(2.0, -1.0, 4.0)]).unwrap();
        assert_eq!(b.size(), Vec3::new(2.0, 1.0, 4.0));
    }

    #[test]
    fn grow_adds_margin_per_face() {
        let b = unit_box().grow(0.5);
        assert_eq!(b.size(), Vec3::new(2.0, 2.0, 2.0));
        assert!((b.volume() - 8.0).abs() < 1e-6);
    }

    #[test]
    fn beam_bounds_cover_radius() {
        let beam = Beam::new(Vec3::zero(), Vec3::forward(), 1.0, 5.0).unwrap();
        let b = Aabb::of_beam(&beam);
        assert_eq!(b.min, Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(b.max, Vec3::new(1.0, 1.0, 6.0));
    }

    #[test]
    fn intersection_of_disjoint_boxes_is_none() {
        let far = Aabb::new(Vec3::new(5.0, 5.0, 5.0), Vec3::new(6.0, 6.0, 6.0));
        assert!(unit_box().intersection(&far).is_none());
    }

    #[test]
    fn intersection_of_overlapping_boxes() {
        let shifted = Aabb::new(Vec3::new(0.5, 0.5, 0.5), Vec3::new(2.0, 2.0, 2.0));
        let i = unit_box().intersection(&shifted).unwrap();
        assert!((i.volume() - 0.125).abs() < 1e-6);
    }

    #[test]
    fn samples_stay_inside() {
        let mut rng = StdRng::seed_from_u64(7);
        let b = Aabb::new(Vec3::new(-2.0, 0.0, 1.0), Vec3::new(2.0, 0.5, 3.0));
        for _ in 0..1000 {
            assert!(b.contains_point(b.sample(&mut rng).unwrap()));
        }
    }

    #[test]
    fn overflowing_box_is_not_sampled() {
        let mut rng = StdRng::seed_from_u64(7);
        let huge = Aabb::new(Vec3::new(-2e38, 0.0, 0.0), Vec3::new(2e38, 1.0, 1.0));
        assert!(!huge.is_sampleable());
        assert!(huge.sample(&mut rng).is_none());
    }
}
