//! Beam overlap volume estimation.
//!
//! Two estimators are provided:
//!
//! - [`estimate_overlap_volume`] – the O(1) closed-form approximation.  Two
//!   beams are considered disjoint when the distance between their *origins*
//!   exceeds the sum of their radii; otherwise the overlap is modelled as the
//!   thinner cylinder over the shorter length, scaled linearly by how close
//!   the origins are:
//!
//!   ```text
//!   factor = 1 − |o_a − o_b| / (r_a + r_b)
//!   volume = π · min(r_a, r_b)² · min(l_a, l_b) · factor
//!   ```
//!
//!   Axis direction and the true overlapping span are ignored.  This is an
//!   approximation kept for compatibility, not an exact solid intersection.
//!
//! - [`estimate_overlap_volume_stochastic`] – Monte Carlo sampling of the
//!   shared bounding box, with a closed-form shortcut for (anti-)parallel
//!   axes that measures the perpendicular offset between axes instead of the
//!   origin distance.
//!
//! [`Estimator`] bundles the choice so trackers can be configured with either.
//!
//! # Example
//!
//! ```rust
//! use beam_geometry::overlap::estimate_overlap_volume;
//! use beam_types::{Beam, Vec3};
//!
//! let a = Beam::new(Vec3::zero(), Vec3::forward(), 1.0, 5.0).unwrap();
//! let b = Beam::new(Vec3::new(1.5, 0.0, 0.0), Vec3::forward(), 1.0, 5.0).unwrap();
//!
//! // factor = 1 − 1.5 / 2 = 0.25  →  π · 1 · 5 · 0.25
//! let v = estimate_overlap_volume(&a, &b);
//! assert!((v - 3.927).abs() < 1e-3);
//! ```

use std::f32::consts::PI;

use beam_types::Beam;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::aabb::Aabb;

/// `|d_a · d_b|` above which two axes are treated as parallel.
pub const PARALLEL_DOT_THRESHOLD: f32 = 0.99;

/// Sample count used when none is configured.
pub const DEFAULT_SAMPLE_COUNT: usize = 1000;

// ────────────────────────────────────────────────────────────────────────────
// Closed form
// ────────────────────────────────────────────────────────────────────────────

/// Closed-form overlap estimate based on origin separation.
///
/// Returns `0` when `|o_a − o_b| > r_a + r_b`.  Symmetric in its arguments.
pub fn estimate_overlap_volume(a: &Beam, b: &Beam) -> f32 {
    let center_distance = a.origin().distance(b.origin());
    overlap_for_separation(a, b, center_distance)
}

/// The closed-form formula with an explicit separation between the beams.
fn overlap_for_separation(a: &Beam, b: &Beam, separation: f32) -> f32 {
    let radius_sum = a.radius() + b.radius();
    if separation > radius_sum {
        return 0.0;
    }

    let overlap_radius = a.radius().min(b.radius());
    let overlap_length = a.length().min(b.length());
    let overlap_factor = 1.0 - separation / radius_sum;

    PI * overlap_radius * overlap_radius * overlap_length * overlap_factor
}

// ────────────────────────────────────────────────────────────────────────────
// Stochastic
// ────────────────────────────────────────────────────────────────────────────

/// True when the two beam axes are (anti-)parallel.
pub fn axes_parallel(a: &Beam, b: &Beam) -> bool {
    a.direction().dot(b.direction()).abs() > PARALLEL_DOT_THRESHOLD
}

/// Distance from `b`'s origin to the infinite axis line of `a`.
pub fn perpendicular_offset(a: &Beam, b: &Beam) -> f32 {
    let d = b.origin().sub(a.origin());
    let along = a.direction().scale(d.dot(a.direction()));
    d.sub(along).length()
}

/// Higher-fidelity estimate.
///
/// Parallel axes skip sampling and reuse the closed-form formula over the
/// perpendicular offset between axes.  Everything else is sampled with
/// [`sample_overlap_volume`].  Reproducible for a seeded `rng`.
pub fn estimate_overlap_volume_stochastic<R: Rng + ?Sized>(
    a: &Beam,
    b: &Beam,
    sample_count: usize,
    rng: &mut R,
) -> f32 {
    if axes_parallel(a, b) {
        return overlap_for_separation(a, b, perpendicular_offset(a, b));
    }
    sample_overlap_volume(a, b, sample_count, rng)
}

/// The sampling domain: both beams' endpoints, grown by the larger radius on
/// every face.
pub fn sampling_bounds(a: &Beam, b: &Beam) -> Aabb {
    let corners = [a.origin(), a.endpoint(), b.origin(), b.endpoint()];
    let max_radius = a.radius().max(b.radius());
    // `corners` is non-empty, the fallback is never taken.
    Aabb::enclosing(corners)
        .unwrap_or_else(|| Aabb::new(a.origin(), a.origin()))
        .grow(max_radius)
}

/// Pure Monte Carlo estimate: the fraction of `sample_count` uniform points
/// in [`sampling_bounds`] that fall inside both cylinders, times the box
/// volume.  Zero samples yield `0`, and so does a box whose extent or
/// volume overflows `f32`.
#[instrument(level = "debug", skip(a, b, rng))]
pub fn sample_overlap_volume<R: Rng + ?Sized>(
    a: &Beam,
    b: &Beam,
    sample_count: usize,
    rng: &mut R,
) -> f32 {
    if sample_count == 0 {
        return 0.0;
    }

    let bounds = sampling_bounds(a, b);
    let box_volume = bounds.volume();
    if !(bounds.is_sampleable() && box_volume.is_finite()) {
        warn!(?bounds, "sampling box overflows f32, skipping monte carlo");
        return 0.0;
    }

    let inside = (0..sample_count)
        .filter(|_| {
            bounds
                .sample(rng)
                .is_some_and(|p| a.contains_point(p) && b.contains_point(p))
        })
        .count();

    debug!(inside, box_volume, "monte carlo overlap");
    inside as f32 / sample_count as f32 * box_volume
}

/// Volume of the intersection of the two beams' axis-aligned bounds.
///
/// An inexpensive upper bound on the true overlap; `0` when the bounds are
/// disjoint.
pub fn bounds_overlap_volume(a: &Beam, b: &Beam) -> f32 {
    Aabb::of_beam(a)
        .intersection(&Aabb::of_beam(b))
        .map(|i| i.volume())
        .unwrap_or(0.0)
}

// ────────────────────────────────────────────────────────────────────────────
// Estimator
// ────────────────────────────────────────────────────────────────────────────

/// Which estimator a tracker uses for its pair volumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    /// [`estimate_overlap_volume`].
    #[default]
    ClosedForm,
    /// [`estimate_overlap_volume_stochastic`] with a fresh RNG seeded from
    /// `seed` on every call.
    MonteCarlo { samples: usize, seed: u64 },
}

impl Estimator {
    pub fn monte_carlo(samples: usize, seed: u64) -> Self {
        Estimator::MonteCarlo { samples, seed }
    }

    /// Estimate the overlap volume of `a` and `b`.
    pub fn estimate(&self, a: &Beam, b: &Beam) -> f32 {
        match *self {
            Estimator::ClosedForm => estimate_overlap_volume(a, b),
            Estimator::MonteCarlo { samples, seed } => {
                let mut rng = StdRng::seed_from_u64(seed);
                estimate_overlap_volume_stochastic(a, b, samples, &mut rng)
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use beam_types::Vec3;

    fn beam_at(x: f32, radius: f32, length: f32) -> Beam {
        Beam::new(Vec3::new(x, 0.0, 0.0), Vec3::forward(), radius, length).unwrap()
    }

    fn crossing_pair() -> (Beam, Beam) {
        // Z-axis beam and an X-axis beam crossing it at z = 2.5.
        let a = Beam::new(Vec3::zero(), Vec3::forward(), 1.0, 5.0).unwrap();
        let b = Beam::new(
            Vec3::new(-2.5, 0.0, 2.5),
            Vec3::new(1.0, 0.0, 0.0),
            1.0,
            5.0,
        )
        .unwrap();
        (a, b)
    }

    // ── closed form ─────────────────────────────────────────────────────────

    #[test]
    fn end_to_end_example() {
        let v = estimate_overlap_volume(&beam_at(0.0, 1.0, 5.0), &beam_at(1.5, 1.0, 5.0));
        assert!((v - PI * 5.0 * 0.25).abs() < 1e-4, "got {v}");
    }

    #[test]
    fn identical_beams_overlap_fully() {
        let a = beam_at(0.0, 1.0, 5.0);
        let v = estimate_overlap_volume(&a, &a);
        assert!(v > 0.0);
        assert!((v - a.volume()).abs() < 1e-4);
    }

    #[test]
    fn touching_radii_yield_zero() {
        let v = estimate_overlap_volume(&beam_at(0.0, 1.0, 5.0), &beam_at(2.0, 1.0, 5.0));
        assert_eq!(v, 0.0);
    }

    #[test]
    fn separated_beams_yield_zero() {
        let v = estimate_overlap_volume(&beam_at(0.0, 1.0, 5.0), &beam_at(3.0, 1.0, 5.0));
        assert_eq!(v, 0.0);
    }

    #[test]
    fn uses_thinner_radius_and_shorter_length() {
        let v = estimate_overlap_volume(&beam_at(0.0, 2.0, 10.0), &beam_at(0.0, 0.5, 4.0));
        assert!((v - PI * 0.25 * 4.0).abs() < 1e-4);
    }

    #[test]
    fn distant_origins_with_crossing_axes_are_disjoint() {
        // The origin-distance test misses this intersection by construction.
        let a = Beam::new(Vec3::zero(), Vec3::forward(), 1.0, 20.0).unwrap();
        let b = Beam::new(Vec3::new(-10.0, 0.0, 10.0), Vec3::new(1.0, 0.0, 0.0), 1.0, 20.0).unwrap();
        assert_eq!(estimate_overlap_volume(&a, &b), 0.0);
    }

    // ── stochastic ──────────────────────────────────────────────────────────

    #[test]
    fn zero_samples_yield_zero() {
        let (a, b) = crossing_pair();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(estimate_overlap_volume_stochastic(&a, &b, 0, &mut rng), 0.0);
        assert_eq!(sample_overlap_volume(&a, &a, 0, &mut rng), 0.0);
    }

    #[test]
    fn far_apart_crossing_beams_do_not_overflow_the_sampler() {
        let a = Beam::new(Vec3::new(-2e38, 0.0, 0.0), Vec3::forward(), 1.0, 5.0).unwrap();
        let b = Beam::new(Vec3::new(2e38, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 1.0, 5.0).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(estimate_overlap_volume_stochastic(&a, &b, 10, &mut rng), 0.0);
        assert_eq!(Estimator::monte_carlo(10, 3).estimate(&a, &b), 0.0);
    }

    #[test]
    fn huge_but_finite_box_volume_yields_zero() {
        // Every edge fits in f32 but their product does not.
        let a = Beam::new(Vec3::new(-1e13, -1e13, -1e13), Vec3::forward(), 1e13, 2e13).unwrap();
        let b = Beam::new(Vec3::new(-1e13, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 1e13, 2e13).unwrap();
        assert!(sampling_bounds(&a, &b).is_sampleable());
        let mut rng = StdRng::seed_from_u64(4);
        assert_eq!(sample_overlap_volume(&a, &b, 10, &mut rng), 0.0);
    }

    #[test]
    fn same_seed_same_estimate() {
        let (a, b) = crossing_pair();
        let v1 = estimate_overlap_volume_stochastic(&a, &b, 5_000, &mut StdRng::seed_from_u64(99));
        let v2 = estimate_overlap_volume_stochastic(&a, &b, 5_000, &mut StdRng::seed_from_u64(99));
        assert_eq!(v1, v2);
    }

    #[test]
    fn sampling_converges_for_coincident_cylinders() {
        let a = beam_at(0.0, 1.0, 5.0);
        let mut rng = StdRng::seed_from_u64(2024);
        let v = sample_overlap_volume(&a, &a, 200_000, &mut rng);
        let exact = a.volume();
        assert!((v - exact).abs() / exact < 0.02, "got {v}, expected ≈{exact}");
    }

    #[test]
    fn stochastic_converges_for_coincident_cylinders() {
        let a = beam_at(0.0, 0.5, 3.0);
        let mut rng = StdRng::seed_from_u64(5);
        let v = estimate_overlap_volume_stochastic(&a, &a, 100_000, &mut rng);
        assert!((v - a.volume()).abs() / a.volume() < 0.02);
    }

    #[test]
    fn crossing_cylinders_match_steinmetz_solid() {
        // Two equal-radius cylinders crossing at right angles share 16r³/3.
        let (a, b) = crossing_pair();
        let mut rng = StdRng::seed_from_u64(11);
        let v = estimate_overlap_volume_stochastic(&a, &b, 200_000, &mut rng);
        let exact = 16.0 / 3.0;
        assert!((v - exact).abs() / exact < 0.05, "got {v}");
    }

    #[test]
    fn parallel_shortcut_ignores_axial_offset() {
        // Same axis, origins 3 units apart along it: perpendicular offset 0.
        let a = beam_at(0.0, 1.0, 5.0);
        let b = Beam::new(Vec3::new(0.0, 0.0, 3.0), Vec3::forward(), 1.0, 5.0).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let v = estimate_overlap_volume_stochastic(&a, &b, 10, &mut rng);
        assert!((v - a.volume()).abs() < 1e-4);
        // The closed form sees origin distance 3 > 2 and calls it disjoint.
        assert_eq!(estimate_overlap_volume(&a, &b), 0.0);
    }

    #[test]
    fn anti_parallel_axes_take_shortcut() {
        let a = beam_at(0.0, 1.0, 5.0);
        let b = Beam::new(Vec3::new(1.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0), 1.0, 5.0).unwrap();
        assert!(axes_parallel(&a, &b));
        assert!((perpendicular_offset(&a, &b) - 1.0).abs() < 1e-6);
        let mut rng = StdRng::seed_from_u64(0);
        let v = estimate_overlap_volume_stochastic(&a, &b, 10, &mut rng);
        assert!((v - PI * 5.0 * 0.5).abs() < 1e-4);
    }

    #[test]
    fn sampling_bounds_grow_by_larger_radius() {
        let a = beam_at(0.0, 1.0, 5.0);
        let b = beam_at(0.0, 2.0, 5.0);
        let bounds = sampling_bounds(&a, &b);
        assert_eq!(bounds.min, Vec3::new(-2.0, -2.0, -2.0));
        assert_eq!(bounds.max, Vec3::new(2.0, 2.0, 7.0));
    }

    // ── bounds overlap ──────────────────────────────────────────────────────

    #[test]
    fn bounds_overlap_is_an_upper_bound() {
        let a = beam_at(0.0, 1.0, 5.0);
        let b = beam_at(1.5, 1.0, 5.0);
        // x: [-1, 1] ∩ [0.5, 2.5] = 0.5, y: 2, z: 7
        assert!((bounds_overlap_volume(&a, &b) - 7.0).abs() < 1e-5);
        assert_eq!(bounds_overlap_volume(&a, &beam_at(10.0, 1.0, 5.0)), 0.0);
    }

    // ── Estimator ───────────────────────────────────────────────────────────

    #[test]
    fn estimator_dispatch() {
        let a = beam_at(0.0, 1.0, 5.0);
        let b = beam_at(1.5, 1.0, 5.0);
        assert_eq!(Estimator::ClosedForm.estimate(&a, &b), estimate_overlap_volume(&a, &b));

        let (c, d) = crossing_pair();
        let mc = Estimator::monte_carlo(2_000, 3);
        assert_eq!(mc.estimate(&c, &d), mc.estimate(&c, &d));
    }

    #[test]
    fn estimator_default_is_closed_form() {
        assert_eq!(Estimator::default(), Estimator::ClosedForm);
    }
}
