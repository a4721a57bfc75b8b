//! [`BeamScene`] – host adapter that owns the trackers and delivers events.
//!
//! The host engine never touches a tracker directly.  It registers beams,
//! pushes [`ScenePayload`]s as its trigger system reports them, and calls
//! [`BeamScene::process_events`] once per update.  Events are drained in FIFO
//! order:
//!
//! - `PairBegin` / `PairContinue` / `PairEnd { a, b }` are delivered to *both*
//!   trackers.  Each side receives the other's geometry snapshot as it is at
//!   delivery time, so the two records are independent and may differ.
//! - `Move { beam, geometry }` replaces a beam's geometry snapshot.
//!
//! Events naming unregistered beams are logged and skipped.  Every
//! zero ↔ positive change in a tracker's collision count is forwarded to the
//! scene's [`VisualSink`].
//!
//! # Example
//!
//! ```
//! use beam_geometry::Estimator;
//! use beam_tracker::{BeamScene, RecordingSink};
//! use beam_types::{Beam, ScenePayload, Vec3, VisualState};
//!
//! let mut scene = BeamScene::new(Estimator::ClosedForm, RecordingSink::new());
//! scene.add_beam("a", Beam::new(Vec3::zero(), Vec3::forward(), 1.0, 5.0).unwrap()).unwrap();
//! scene.add_beam("b", Beam::new(Vec3::new(1.5, 0.0, 0.0), Vec3::forward(), 1.0, 5.0).unwrap()).unwrap();
//!
//! scene.push("host", ScenePayload::PairBegin { a: "a".into(), b: "b".into() });
//! assert_eq!(scene.process_events(), 1);
//!
//! assert_eq!(scene.sink().changes.len(), 2);
//! assert_eq!(scene.sink().changes[0].1, VisualState::OverlapActive);
//! ```

use std::collections::{BTreeMap, VecDeque};

use beam_geometry::Estimator;
use beam_types::{Beam, BeamError, BeamId, ScenePayload, SceneEvent, VisualState};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::report::CollisionReport;
use crate::tracker::BeamCollisionTracker;
use crate::visual::{LogSink, VisualSink};

/// Which phase a pair event carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Begin,
    Continue,
    End,
}

/// Owns one [`BeamCollisionTracker`] per registered beam and an explicit
/// event queue.
#[derive(Debug)]
pub struct BeamScene<S: VisualSink = LogSink> {
    trackers: BTreeMap<BeamId, BeamCollisionTracker>,
    queue: VecDeque<SceneEvent>,
    estimator: Estimator,
    sink: S,
}

impl<S: VisualSink> BeamScene<S> {
    /// Create an empty scene whose trackers all use `estimator`.
    pub fn new(estimator: Estimator, sink: S) -> Self {
        Self {
            trackers: BTreeMap::new(),
            queue: VecDeque::new(),
            estimator,
            sink,
        }
    }

    pub fn estimator(&self) -> Estimator {
        self.estimator
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    // ── registration ────────────────────────────────────────────────────────

    /// Register a beam.  Ids must be unique.
    pub fn add_beam(&mut self, id: impl Into<BeamId>, geometry: Beam) -> Result<(), BeamError> {
        let id = id.into();
        if self.trackers.contains_key(&id) {
            return Err(BeamError::DuplicateBeam(id));
        }
        let tracker = BeamCollisionTracker::with_estimator(id.clone(), geometry, self.estimator);
        self.trackers.insert(id, tracker);
        Ok(())
    }

    /// Immediately replace a beam's geometry snapshot.
    pub fn update_geometry(&mut self, id: &BeamId, geometry: Beam) -> Result<(), BeamError> {
        self.trackers
            .get_mut(id)
            .ok_or_else(|| BeamError::UnknownBeam(id.clone()))?
            .set_geometry(geometry);
        Ok(())
    }

    pub fn geometry(&self, id: &BeamId) -> Option<&Beam> {
        self.trackers.get(id).map(|t| t.geometry())
    }

    /// Registered beam ids in sorted order.
    pub fn beam_ids(&self) -> impl Iterator<Item = &BeamId> {
        self.trackers.keys()
    }

    pub fn tracker(&self, id: &BeamId) -> Option<&BeamCollisionTracker> {
        self.trackers.get(id)
    }

    // ── queue ───────────────────────────────────────────────────────────────

    /// Wrap `payload` in a [`SceneEvent`] and enqueue it.  Returns its id.
    pub fn push(&mut self, source: &str, payload: ScenePayload) -> Uuid {
        let event = SceneEvent::new(source, payload);
        let id = event.id;
        self.queue.push_back(event);
        id
    }

    /// Enqueue an already-built event.
    pub fn push_event(&mut self, event: SceneEvent) {
        self.queue.push_back(event);
    }

    /// Number of queued, unprocessed events.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Drain the queue, delivering every event.  Returns the number of events
    /// that were delivered successfully.
    #[instrument(skip(self), fields(pending = self.queue.len()))]
    pub fn process_events(&mut self) -> usize {
        let mut delivered = 0;
        while let Some(event) = self.queue.pop_front() {
            match self.deliver(&event.payload) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(event = %event.id, source = %event.source, error = %e, "skipping scene event"),
            }
        }
        delivered
    }

    /// Deliver a single payload right away, bypassing the queue.
    pub fn deliver(&mut self, payload: &ScenePayload) -> Result<(), BeamError> {
        match payload {
            ScenePayload::PairBegin { a, b } => self.deliver_pair(a, b, Phase::Begin),
            ScenePayload::PairContinue { a, b } => self.deliver_pair(a, b, Phase::Continue),
            ScenePayload::PairEnd { a, b } => self.deliver_pair(a, b, Phase::End),
            ScenePayload::Move { beam, geometry } => self.update_geometry(beam, *geometry),
        }
    }

    // ── reports ─────────────────────────────────────────────────────────────

    pub fn report(&self, id: &BeamId) -> Result<CollisionReport, BeamError> {
        self.trackers
            .get(id)
            .map(BeamCollisionTracker::report)
            .ok_or_else(|| BeamError::UnknownBeam(id.clone()))
    }

    /// Reports for every beam, in id order.
    pub fn reports(&self) -> Vec<CollisionReport> {
        self.trackers.values().map(BeamCollisionTracker::report).collect()
    }

    // ── internals ───────────────────────────────────────────────────────────

    fn deliver_pair(&mut self, a: &BeamId, b: &BeamId, phase: Phase) -> Result<(), BeamError> {
        // Snapshot both sides before mutating either.
        let geom_a = *self.geometry(a).ok_or_else(|| BeamError::UnknownBeam(a.clone()))?;
        let geom_b = *self.geometry(b).ok_or_else(|| BeamError::UnknownBeam(b.clone()))?;
        if a == b {
            debug!(beam = %a, "ignoring pair event for a beam with itself");
            return Ok(());
        }

        self.deliver_one(a, b, &geom_b, phase);
        self.deliver_one(b, a, &geom_a, phase);
        Ok(())
    }

    fn deliver_one(&mut self, target: &BeamId, partner: &BeamId, partner_geometry: &Beam, phase: Phase) {
        let Some(tracker) = self.trackers.get_mut(target) else {
            return;
        };
        let change: Option<VisualState> = match phase {
            Phase::Begin => tracker.on_overlap_begin(partner, partner_geometry),
            Phase::Continue => {
                tracker.on_overlap_continue(partner, partner_geometry);
                None
            }
            Phase::End => tracker.on_overlap_end(partner),
        };
        if let Some(state) = change {
            self.sink.visual_state_changed(target, state);
        }
    }
}

impl Default for BeamScene<LogSink> {
    fn default() -> Self {
        Self::new(Estimator::default(), LogSink)
    }
}
