//! [`Beam`] – a validated finite cylinder.
//!
//! A beam is the solid cylinder swept by a disc of `radius` moving from
//! `origin` along the unit `direction` for `length` units.  Construction goes
//! through [`Beam::new`] (strict: the direction must already be unit length)
//! or [`Beam::from_axis`] (lenient: any non-zero direction is normalised), so
//! every `Beam` value satisfies `radius > 0`, `length > 0` and `|direction| = 1`.
//!
//! # Example
//!
//! ```rust
//! use beam_types::{Beam, Vec3};
//!
//! let beam = Beam::new(Vec3::zero(), Vec3::forward(), 1.0, 5.0).unwrap();
//! assert_eq!(beam.endpoint(), Vec3::new(0.0, 0.0, 5.0));
//! assert!(beam.contains_point(Vec3::new(0.5, 0.0, 2.0)));
//!
//! // A direction of length 2 is a contract violation for `new` …
//! assert!(Beam::new(Vec3::zero(), Vec3::new(0.0, 0.0, 2.0), 1.0, 5.0).is_err());
//! // … but `from_axis` normalises it.
//! assert!(Beam::from_axis(Vec3::zero(), Vec3::new(0.0, 0.0, 2.0), 1.0, 5.0).is_ok());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vector::Vec3;

/// How far `|direction|` may stray from 1 before [`Beam::new`] rejects it.
pub const UNIT_TOLERANCE: f32 = 1e-3;

/// Degenerate geometry rejected at construction time.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeometryError {
    #[error("radius must be positive, got {0}")]
    NonPositiveRadius(f32),

    #[error("length must be positive, got {0}")]
    NonPositiveLength(f32),

    #[error("direction vector has zero length")]
    ZeroDirection,

    #[error("direction must be unit length, got |d| = {length}")]
    NonUnitDirection { length: f32 },

    #[error("beam geometry contains a non-finite value")]
    NonFinite,
}

/// A finite cylinder: origin, unit axis direction, radius and length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBeam", into = "RawBeam")]
pub struct Beam {
    origin: Vec3,
    direction: Vec3,
    radius: f32,
    length: f32,
}

impl Beam {
    /// Build a beam, rejecting degenerate input.
    ///
    /// `direction` must be unit length within [`UNIT_TOLERANCE`]; it is
    /// re-normalised exactly before being stored.
    pub fn new(origin: Vec3, direction: Vec3, radius: f32, length: f32) -> Result<Self, GeometryError> {
        Self::check_scalars(origin, direction, radius, length)?;
        let len = direction.length();
        if len <= f32::EPSILON {
            return Err(GeometryError::ZeroDirection);
        }
        if (len - 1.0).abs() > UNIT_TOLERANCE {
            return Err(GeometryError::NonUnitDirection { length: len });
        }
        let beam = Self {
            origin,
            direction: direction.scale(1.0 / len),
            radius,
            length,
        };
        beam.check_extent()?;
        Ok(beam)
    }

    /// Build a beam from any non-zero axis direction, normalising it.
    pub fn from_axis(origin: Vec3, axis: Vec3, radius: f32, length: f32) -> Result<Self, GeometryError> {
        Self::check_scalars(origin, axis, radius, length)?;
        let direction = axis.normalized().ok_or(GeometryError::ZeroDirection)?;
        Self::new(origin, direction, radius, length)
    }

    /// Build a beam spanning `start` → `end`.
    pub fn between(start: Vec3, end: Vec3, radius: f32) -> Result<Self, GeometryError> {
        let axis = end.sub(start);
        Self::from_axis(start, axis, radius, axis.length())
    }

    fn check_scalars(origin: Vec3, direction: Vec3, radius: f32, length: f32) -> Result<(), GeometryError> {
        if !(origin.is_finite() && direction.is_finite() && radius.is_finite() && length.is_finite()) {
            return Err(GeometryError::NonFinite);
        }
        if radius <= 0.0 {
            return Err(GeometryError::NonPositiveRadius(radius));
        }
        if length <= 0.0 {
            return Err(GeometryError::NonPositiveLength(length));
        }
        Ok(())
    }

    /// The far end and the radius-grown extent must stay representable.
    fn check_extent(&self) -> Result<(), GeometryError> {
        let end = self.endpoint();
        let reach = self.radius + self.length;
        if !(end.is_finite() && reach.is_finite()) {
            return Err(GeometryError::NonFinite);
        }
        Ok(())
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    /// `origin + direction * length`.
    pub fn endpoint(&self) -> Vec3 {
        self.origin.add(self.direction.scale(self.length))
    }

    /// Solid volume `π r² l`.
    pub fn volume(&self) -> f32 {
        std::f32::consts::PI * self.radius * self.radius * self.length
    }

    /// Copy of this beam moved to `origin`.
    pub fn with_origin(mut self, origin: Vec3) -> Result<Self, GeometryError> {
        Self::check_scalars(origin, self.direction, self.radius, self.length)?;
        self.origin = origin;
        self.check_extent()?;
        Ok(self)
    }

    /// Copy of this beam re-aimed along `axis` (normalised).
    pub fn with_axis(self, axis: Vec3) -> Result<Self, GeometryError> {
        Self::from_axis(self.origin, axis, self.radius, self.length)
    }

    /// True when `p` lies inside the solid cylinder (boundary inclusive).
    ///
    /// The scalar projection of `p - origin` onto the axis must fall in
    /// `[0, length]` and the perpendicular distance from the axis at that
    /// projection must not exceed `radius`.
    pub fn contains_point(&self, p: Vec3) -> bool {
        let to_point = p.sub(self.origin);
        let projection = to_point.dot(self.direction);
        if projection < 0.0 || projection > self.length {
            return false;
        }
        let closest = self.origin.add(self.direction.scale(projection));
        p.distance(closest) <= self.radius
    }
}

/// Unvalidated wire form of a [`Beam`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawBeam {
    origin: Vec3,
    direction: Vec3,
    radius: f32,
    length: f32,
}

impl TryFrom<RawBeam> for Beam {
    type Error = GeometryError;

    fn try_from(raw: RawBeam) -> Result<Self, Self::Error> {
        Beam::new(raw.origin, raw.direction, raw.radius, raw.length)
    }
}

impl From<Beam> for RawBeam {
    fn from(b: Beam) -> Self {
        Self {
            origin: b.origin,
            direction: b.direction,
            radius: b.radius,
            length: b.length,
        }
    }
}
