//! `beam-geometry` – overlap estimation between finite cylinders.
//!
//! # Modules
//!
//! - [`aabb`] – [`Aabb`][aabb::Aabb]: axis-aligned bounding boxes, the
//!   sampling domain for the Monte Carlo estimator.
//! - [`overlap`] – the closed-form and stochastic overlap estimators and the
//!   [`Estimator`][overlap::Estimator] strategy trackers are configured with.
//!
//! Everything here is stateless and safe to call from any thread.

pub mod aabb;
pub mod overlap;

pub use aabb::Aabb;
pub use overlap::{
    Estimator, bounds_overlap_volume, estimate_overlap_volume, estimate_overlap_volume_stochastic,
    sample_overlap_volume,
};
