//! Scenario files: a set of beams plus a scripted overlap event feed.
//!
//! ```toml
//! [[beams]]
//! id = "beam_a"
//! origin = [0.0, 0.0, 0.0]
//! direction = [0.0, 0.0, 1.0]
//! radius = 1.0
//! length = 5.0
//!
//! [[events]]
//! kind = "begin"
//! a = "beam_a"
//! b = "beam_b"
//! ```

use std::path::Path;

use beam_geometry::Estimator;
use beam_tracker::{BeamScene, VisualSink};
use beam_types::{Beam, BeamError, BeamId, ScenePayload, Vec3};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

const SOURCE: &str = "beam-cli::scenario";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Scenario {
    #[serde(default)]
    pub beams: Vec<BeamEntry>,
    #[serde(default)]
    pub events: Vec<EventEntry>,
}

/// One beam.  `direction` must be unit length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BeamEntry {
    pub id: String,
    pub origin: [f32; 3],
    pub direction: [f32; 3],
    pub radius: f32,
    pub length: f32,
}

/// One scripted host event, replayed in file order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventEntry {
    Begin {
        a: String,
        b: String,
    },
    Continue {
        a: String,
        b: String,
    },
    End {
        a: String,
        b: String,
    },
    /// Move or re-aim a beam.  Omitted fields keep their current value.
    Move {
        beam: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        origin: Option<[f32; 3]>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        direction: Option<[f32; 3]>,
    },
}

impl BeamEntry {
    pub fn to_beam(&self) -> Result<Beam, BeamError> {
        Ok(Beam::new(
            Vec3::from(self.origin),
            Vec3::from(self.direction),
            self.radius,
            self.length,
        )?)
    }
}

impl Scenario {
    pub fn parse(raw: &str) -> Result<Self, BeamError> {
        toml::from_str(raw).map_err(|e| BeamError::Scenario(format!("Failed to parse scenario: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self, BeamError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| BeamError::Scenario(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::parse(&raw)
    }

    /// JSON schema of the scenario format.
    pub fn schema_json() -> Result<String, BeamError> {
        serde_json::to_string_pretty(&schemars::schema_for!(Scenario))
            .map_err(|e| BeamError::Scenario(e.to_string()))
    }

    /// Register every beam in a fresh scene.  Invalid geometry or duplicate
    /// ids abort the build.
    pub fn build_scene<S: VisualSink>(&self, estimator: Estimator, sink: S) -> Result<BeamScene<S>, BeamError> {
        let mut scene = BeamScene::new(estimator, sink);
        for entry in &self.beams {
            let beam = entry
                .to_beam()
                .map_err(|e| BeamError::Scenario(format!("beam '{}': {e}", entry.id)))?;
            scene.add_beam(entry.id.as_str(), beam)?;
        }
        Ok(scene)
    }

    /// Replay the event feed into `scene`, one event at a time so each move
    /// sees the geometry left by the events before it.  Returns the number
    /// of events delivered; events naming unknown beams are skipped.
    #[instrument(skip_all, fields(beams = self.beams.len(), events = self.events.len()))]
    pub fn replay<S: VisualSink>(&self, scene: &mut BeamScene<S>) -> usize {
        let mut delivered = 0;
        for (index, event) in self.events.iter().enumerate() {
            let payload = match event.to_payload(scene) {
                Ok(p) => p,
                Err(e) => {
                    warn!(index, error = %e, "skipping scenario event");
                    continue;
                }
            };
            let id = scene.push(SOURCE, payload);
            debug!(index, %id, "scenario event queued");
            delivered += scene.process_events();
        }
        info!(delivered, total = self.events.len(), "scenario replayed");
        delivered
    }
}

impl EventEntry {
    fn to_payload<S: VisualSink>(&self, scene: &BeamScene<S>) -> Result<ScenePayload, BeamError> {
        let pair = |a: &str, b: &str| (BeamId::from(a), BeamId::from(b));
        Ok(match self {
            EventEntry::Begin { a, b } => {
                let (a, b) = pair(a, b);
                ScenePayload::PairBegin { a, b }
            }
            EventEntry::Continue { a, b } => {
                let (a, b) = pair(a, b);
                ScenePayload::PairContinue { a, b }
            }
            EventEntry::End { a, b } => {
                let (a, b) = pair(a, b);
                ScenePayload::PairEnd { a, b }
            }
            EventEntry::Move { beam, origin, direction } => {
                let id = BeamId::from(beam.as_str());
                let mut geometry = *scene.geometry(&id).ok_or_else(|| BeamError::UnknownBeam(id.clone()))?;
                if let Some(origin) = origin {
                    geometry = geometry.with_origin(Vec3::from(*origin))?;
                }
                if let Some(direction) = direction {
                    geometry = geometry.with_axis(Vec3::from(*direction))?;
                }
                ScenePayload::Move { beam: id, geometry }
            }
        })
    }
}
