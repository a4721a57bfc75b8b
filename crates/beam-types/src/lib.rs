//! `beam-types` – shared vocabulary for the BeamLab workspace.
//!
//! - [`vector`] – [`Vec3`]: 3-D vector arithmetic.
//! - [`beam`] – [`Beam`]: a validated finite cylinder and its
//!   [`GeometryError`]s.
//!
//! The crate root holds the identifiers, event payloads and the workspace
//! error type that cross crate boundaries.

pub mod beam;
pub mod vector;

pub use beam::{Beam, GeometryError};
pub use vector::Vec3;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Name of a beam in the host scene (e.g. `"beam_a"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BeamId(String);

impl BeamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BeamId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for BeamId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for BeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the host should display for a beam.  Keyed purely on whether the
/// beam currently overlaps anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VisualState {
    /// The beam's original material color.
    #[default]
    Default,
    /// At least one partner overlaps the beam.
    OverlapActive,
}

impl VisualState {
    pub fn for_count(collision_count: usize) -> Self {
        if collision_count > 0 {
            VisualState::OverlapActive
        } else {
            VisualState::Default
        }
    }
}

/// A single overlap notification addressed to one beam's tracker.
///
/// The host delivers one of these to each side of a physical overlap; the
/// payload carries the *other* beam's identity and geometry snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum OverlapEvent {
    Begin { partner: BeamId, geometry: Beam },
    Continue { partner: BeamId, geometry: Beam },
    End { partner: BeamId },
}

impl OverlapEvent {
    pub fn partner(&self) -> &BeamId {
        match self {
            OverlapEvent::Begin { partner, .. }
            | OverlapEvent::Continue { partner, .. }
            | OverlapEvent::End { partner } => partner,
        }
    }
}

/// Host-side occurrences queued for a scene: pair overlap phases or a beam
/// being moved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenePayload {
    PairBegin { a: BeamId, b: BeamId },
    PairContinue { a: BeamId, b: BeamId },
    PairEnd { a: BeamId, b: BeamId },
    Move { beam: BeamId, geometry: Beam },
}

/// Envelope for every queued scene event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g. `"beam-cli::scenario"`
    pub source: String,
    pub payload: ScenePayload,
}

impl SceneEvent {
    /// Wrap `payload` with a fresh id and the current UTC time.
    pub fn new(source: impl Into<String>, payload: ScenePayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

/// Workspace-wide error type.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BeamError {
    #[error("Invalid beam geometry: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Unknown beam: {0}")]
    UnknownBeam(BeamId),

    #[error("Beam already registered: {0}")]
    DuplicateBeam(BeamId),

    #[error("Scenario error: {0}")]
    Scenario(String),
}
