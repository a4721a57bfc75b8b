//! [`CollisionReport`] – on-demand textual summary of one tracker.

use beam_types::BeamId;
use serde::Serialize;
use tracing::info;

/// Snapshot of a tracker for display.
///
/// The [`Display`][std::fmt::Display] form is the human-readable report:
///
/// ```text
/// === Beam beam_a Collision Info ===
/// Total overlap volume: 3.93 cubic units
/// Colliding beams: 1
///   - beam_b
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollisionReport {
    pub beam_id: BeamId,
    pub total_overlap_volume: f32,
    pub collision_count: usize,
    /// Detection order.
    pub partners: Vec<BeamId>,
}

impl CollisionReport {
    /// Emit the report through `tracing` at `info` level, one event per line.
    pub fn log(&self) {
        info!(beam = %self.beam_id, "=== Beam {} Collision Info ===", self.beam_id);
        info!(
            beam = %self.beam_id,
            "Total overlap volume: {:.2} cubic units",
            self.total_overlap_volume
        );
        info!(beam = %self.beam_id, "Colliding beams: {}", self.collision_count);
        for partner in &self.partners {
            info!(beam = %self.beam_id, "  - {partner}");
        }
    }
}

impl std::fmt::Display for CollisionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Beam {} Collision Info ===", self.beam_id)?;
        writeln!(f, "Total overlap volume: {:.2} cubic units", self.total_overlap_volume)?;
        write!(f, "Colliding beams: {}", self.collision_count)?;
        for partner in &self.partners {
            write!(f, "\n  - {partner}")?;
        }
        Ok(())
    }
}
