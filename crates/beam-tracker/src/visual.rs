//! [`VisualSink`] – where visual state change requests go.
//!
//! The host implements this trait to swap a beam's displayed color when it
//! starts or stops overlapping anything.  [`BeamScene`][crate::scene::BeamScene]
//! calls it exactly once per zero ↔ positive transition of a tracker's
//! collision count.

use beam_types::{BeamId, VisualState};
use tracing::info;

/// Receiver of visual state change requests.
pub trait VisualSink {
    fn visual_state_changed(&mut self, beam: &BeamId, state: VisualState);
}

/// Logs every change at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl VisualSink for LogSink {
    fn visual_state_changed(&mut self, beam: &BeamId, state: VisualState) {
        info!(beam = %beam, state = ?state, "visual state changed");
    }
}

/// Keeps every change in order; used by tests and the CLI's replay summary.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub changes: Vec<(BeamId, VisualState)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return all recorded changes.
    pub fn drain(&mut self) -> Vec<(BeamId, VisualState)> {
        std::mem::take(&mut self.changes)
    }
}

impl VisualSink for RecordingSink {
    fn visual_state_changed(&mut self, beam: &BeamId, state: VisualState) {
        self.changes.push((beam.clone(), state));
    }
}
