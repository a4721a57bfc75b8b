//! [`BeamCollisionTracker`] – per-beam overlap bookkeeping.
//!
//! Each beam in the host scene owns one tracker.  The host feeds it
//! begin / continue / end notifications naming the *other* beam; the tracker
//! keeps one [`OverlapRecord`] per partner it currently overlaps, estimates
//! the pair's volume with its [`Estimator`], and derives a
//! [`TrackerAggregate`].
//!
//! Per partner the tracker is a two-state machine:
//!
//! ```text
//!            begin (untracked)
//!   Absent ─────────────────────▶ Tracked ──┐ continue: re-estimate
//!      ▲                             │  ◀───┘
//!      └────────── end ──────────────┘
//! ```
//!
//! Begin on a tracked partner, end on an untracked one and continue on an
//! untracked one are all no-ops.  The aggregate is always recomputed from the
//! full record set rather than accumulated incrementally.
//!
//! Whenever `collision_count` crosses between zero and positive, begin/end
//! return the new [`VisualState`] so the host can swap the beam's color.
//!
//! # Example
//!
//! ```
//! use beam_tracker::BeamCollisionTracker;
//! use beam_types::{Beam, BeamId, Vec3, VisualState};
//!
//! let a = Beam::new(Vec3::zero(), Vec3::forward(), 1.0, 5.0).unwrap();
//! let b = Beam::new(Vec3::new(1.5, 0.0, 0.0), Vec3::forward(), 1.0, 5.0).unwrap();
//!
//! let mut tracker = BeamCollisionTracker::new("beam_a", a);
//! let change = tracker.on_overlap_begin(&BeamId::from("beam_b"), &b);
//! assert_eq!(change, Some(VisualState::OverlapActive));
//! assert_eq!(tracker.aggregate().collision_count, 1);
//! ```

use beam_geometry::Estimator;
use beam_types::{Beam, BeamId, OverlapEvent, VisualState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::report::CollisionReport;

// ────────────────────────────────────────────────────────────────────────────
// Public types
// ────────────────────────────────────────────────────────────────────────────

/// One currently-overlapping partner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapRecord {
    pub partner_id: BeamId,
    /// Last computed overlap volume for this pair.
    pub estimated_volume: f32,
    /// When the begin event that created this record was handled.
    pub since: DateTime<Utc>,
}

/// Aggregate counters derived from the current record set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TrackerAggregate {
    pub total_overlap_volume: f32,
    pub collision_count: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// BeamCollisionTracker
// ────────────────────────────────────────────────────────────────────────────

/// Live set of beams overlapping one beam.
#[derive(Debug, Clone)]
pub struct BeamCollisionTracker {
    beam_id: BeamId,
    geometry: Beam,
    estimator: Estimator,
    /// Insertion (detection) order.
    records: Vec<OverlapRecord>,
    aggregate: TrackerAggregate,
}

impl BeamCollisionTracker {
    /// Create a tracker using the closed-form estimator.
    pub fn new(beam_id: impl Into<BeamId>, geometry: Beam) -> Self {
        Self::with_estimator(beam_id, geometry, Estimator::ClosedForm)
    }

    pub fn with_estimator(beam_id: impl Into<BeamId>, geometry: Beam, estimator: Estimator) -> Self {
        Self {
            beam_id: beam_id.into(),
            geometry,
            estimator,
            records: Vec::new(),
            aggregate: TrackerAggregate::default(),
        }
    }

    pub fn beam_id(&self) -> &BeamId {
        &self.beam_id
    }

    /// The tracker's own geometry snapshot.
    pub fn geometry(&self) -> &Beam {
        &self.geometry
    }

    pub fn estimator(&self) -> Estimator {
        self.estimator
    }

    /// Replace the own geometry snapshot.  Existing records keep their
    /// volumes until the next continue event for each partner.
    pub fn set_geometry(&mut self, geometry: Beam) {
        self.geometry = geometry;
    }

    // ── events ──────────────────────────────────────────────────────────────

    /// A partner started overlapping this beam.
    ///
    /// Returns the new [`VisualState`] when this was the first partner.
    #[instrument(level = "debug", skip_all, fields(beam = %self.beam_id, partner = %partner_id))]
    pub fn on_overlap_begin(&mut self, partner_id: &BeamId, partner: &Beam) -> Option<VisualState> {
        if partner_id == &self.beam_id {
            debug!(beam = %self.beam_id, "ignoring self-overlap");
            return None;
        }
        if self.is_tracking(partner_id) {
            return None;
        }

        let before = self.aggregate.collision_count;
        let estimated_volume = self.estimator.estimate(&self.geometry, partner);
        self.records.push(OverlapRecord {
            partner_id: partner_id.clone(),
            estimated_volume,
            since: Utc::now(),
        });
        self.recompute();

        debug!(
            beam = %self.beam_id,
            partner = %partner_id,
            volume = estimated_volume,
            total = self.aggregate.total_overlap_volume,
            "overlap began"
        );
        self.transition_from(before)
    }

    /// A partner stopped overlapping this beam.
    ///
    /// Returns [`VisualState::Default`] when the last partner left.
    pub fn on_overlap_end(&mut self, partner_id: &BeamId) -> Option<VisualState> {
        let idx = self.records.iter().position(|r| &r.partner_id == partner_id)?;

        let before = self.aggregate.collision_count;
        self.records.remove(idx);
        self.recompute();

        debug!(
            beam = %self.beam_id,
            partner = %partner_id,
            total = self.aggregate.total_overlap_volume,
            "overlap ended"
        );
        self.transition_from(before)
    }

    /// A tracked partner is still overlapping, possibly with new geometry.
    ///
    /// Re-estimates the pair and returns `true`; returns `false` (and changes
    /// nothing) for untracked partners.
    #[instrument(level = "debug", skip_all, fields(beam = %self.beam_id, partner = %partner_id))]
    pub fn on_overlap_continue(&mut self, partner_id: &BeamId, partner: &Beam) -> bool {
        let Some(idx) = self.records.iter().position(|r| &r.partner_id == partner_id) else {
            return false;
        };
        self.records[idx].estimated_volume = self.estimator.estimate(&self.geometry, partner);
        self.recompute();
        true
    }

    /// Dispatch a per-tracker [`OverlapEvent`].
    pub fn handle(&mut self, event: &OverlapEvent) -> Option<VisualState> {
        match event {
            OverlapEvent::Begin { partner, geometry } => self.on_overlap_begin(partner, geometry),
            OverlapEvent::Continue { partner, geometry } => {
                self.on_overlap_continue(partner, geometry);
                None
            }
            OverlapEvent::End { partner } => self.on_overlap_end(partner),
        }
    }

    // ── reads ───────────────────────────────────────────────────────────────

    pub fn aggregate(&self) -> TrackerAggregate {
        self.aggregate
    }

    /// Partner ids in detection order.
    pub fn tracked_partners(&self) -> Vec<&BeamId> {
        self.records.iter().map(|r| &r.partner_id).collect()
    }

    pub fn records(&self) -> &[OverlapRecord] {
        &self.records
    }

    pub fn record(&self, partner_id: &BeamId) -> Option<&OverlapRecord> {
        self.records.iter().find(|r| &r.partner_id == partner_id)
    }

    pub fn is_tracking(&self, partner_id: &BeamId) -> bool {
        self.record(partner_id).is_some()
    }

    pub fn visual_state(&self) -> VisualState {
        VisualState::for_count(self.aggregate.collision_count)
    }

    /// Snapshot for on-demand display.
    pub fn report(&self) -> CollisionReport {
        CollisionReport {
            beam_id: self.beam_id.clone(),
            total_overlap_volume: self.aggregate.total_overlap_volume,
            collision_count: self.aggregate.collision_count,
            partners: self.records.iter().map(|r| r.partner_id.clone()).collect(),
        }
    }

    // ── internals ───────────────────────────────────────────────────────────

    fn recompute(&mut self) {
        self.aggregate = TrackerAggregate {
            total_overlap_volume: self.records.iter().map(|r| r.estimated_volume).sum(),
            collision_count: self.records.len(),
        };
    }

    fn transition_from(&self, before: usize) -> Option<VisualState> {
        let after = self.aggregate.collision_count;
        if (before > 0) != (after > 0) {
            Some(VisualState::for_count(after))
        } else {
            None
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use beam_geometry::estimate_overlap_volume;
    use beam_types::Vec3;

    fn beam_at(x: f32) -> Beam {
        Beam::new(Vec3::new(x, 0.0, 0.0), Vec3::forward(), 1.0, 5.0).unwrap()
    }

    fn id(s: &str) -> BeamId {
        BeamId::from(s)
    }

    fn tracker() -> BeamCollisionTracker {
        BeamCollisionTracker::new("a", beam_at(0.0))
    }

    #[test]
    fn fresh_tracker_is_empty() {
        let t = tracker();
        assert_eq!(t.aggregate(), TrackerAggregate::default());
        assert!(t.tracked_partners().is_empty());
        assert_eq!(t.visual_state(), VisualState::Default);
    }

    #[test]
    fn begin_records_estimate() {
        let mut t = tracker();
        t.on_overlap_begin(&id("b"), &beam_at(1.5));
        let agg = t.aggregate();
        assert_eq!(agg.collision_count, 1);
        assert!((agg.total_overlap_volume - 3.927).abs() < 1e-3);
        assert_eq!(t.visual_state(), VisualState::OverlapActive);
    }

    #[test]
    fn begin_is_idempotent() {
        let mut t = tracker();
        assert!(t.on_overlap_begin(&id("b"), &beam_at(1.5)).is_some());
        let first = t.aggregate();
        assert!(t.on_overlap_begin(&id("b"), &beam_at(0.5)).is_none());
        assert_eq!(t.aggregate(), first);
    }

    #[test]
    fn end_on_untracked_is_noop() {
        let mut t = tracker();
        assert!(t.on_overlap_end(&id("ghost")).is_none());
        assert_eq!(t.aggregate().collision_count, 0);
    }

    #[test]
    fn continue_on_untracked_is_noop() {
        let mut t = tracker();
        assert!(!t.on_overlap_continue(&id("ghost"), &beam_at(0.5)));
        assert!(t.records().is_empty());
    }

    #[test]
    fn self_overlap_is_ignored() {
        let mut t = tracker();
        assert!(t.on_overlap_begin(&id("a"), &beam_at(0.0)).is_none());
        assert_eq!(t.aggregate().collision_count, 0);
    }

    #[test]
    fn visual_change_only_on_zero_crossings() {
        let mut t = tracker();
        assert_eq!(
            t.on_overlap_begin(&id("b"), &beam_at(1.0)),
            Some(VisualState::OverlapActive)
        );
        assert_eq!(t.on_overlap_begin(&id("c"), &beam_at(-1.0)), None);
        assert_eq!(t.on_overlap_end(&id("b")), None);
        assert_eq!(t.on_overlap_end(&id("c")), Some(VisualState::Default));
    }

    #[test]
    fn partners_keep_detection_order() {
        let mut t = tracker();
        for p in ["c", "b", "d"] {
            t.on_overlap_begin(&id(p), &beam_at(0.5));
        }
        t.on_overlap_end(&id("b"));
        t.on_overlap_begin(&id("b"), &beam_at(0.5));
        let order: Vec<&str> = t.tracked_partners().iter().map(|p| p.as_str()).collect();
        assert_eq!(order, vec!["c", "d", "b"]);
    }

    #[test]
    fn aggregate_matches_records_after_mixed_sequence() {
        let mut t = tracker();
        t.on_overlap_begin(&id("b"), &beam_at(0.5));
        t.on_overlap_begin(&id("c"), &beam_at(1.0));
        t.on_overlap_begin(&id("d"), &beam_at(1.5));
        t.on_overlap_end(&id("c"));
        t.on_overlap_end(&id("c"));
        t.on_overlap_begin(&id("b"), &beam_at(1.9));

        let expected = estimate_overlap_volume(&beam_at(0.0), &beam_at(0.5))
            + estimate_overlap_volume(&beam_at(0.0), &beam_at(1.5));
        let agg = t.aggregate();
        assert_eq!(agg.collision_count, t.records().len());
        assert_eq!(agg.collision_count, 2);
        assert!((agg.total_overlap_volume - expected).abs() < 1e-4);
    }

    #[test]
    fn continue_reestimates_with_new_geometry() {
        let mut t = tracker();
        t.on_overlap_begin(&id("b"), &beam_at(1.5));
        let before = t.aggregate().total_overlap_volume;
        assert!(t.on_overlap_continue(&id("b"), &beam_at(0.5)));
        let after = t.aggregate().total_overlap_volume;
        assert!(after > before);
        assert_eq!(t.aggregate().collision_count, 1);
    }

    #[test]
    fn own_geometry_is_used_on_next_continue() {
        let mut t = tracker();
        t.on_overlap_begin(&id("b"), &beam_at(1.5));
        t.set_geometry(beam_at(1.5));
        t.on_overlap_continue(&id("b"), &beam_at(1.5));
        let v = t.record(&id("b")).unwrap().estimated_volume;
        assert!((v - beam_at(0.0).volume()).abs() < 1e-4);
    }

    #[test]
    fn handle_dispatches_events() {
        let mut t = tracker();
        let begin = OverlapEvent::Begin { partner: id("b"), geometry: beam_at(1.0) };
        assert_eq!(t.handle(&begin), Some(VisualState::OverlapActive));
        let cont = OverlapEvent::Continue { partner: id("b"), geometry: beam_at(0.0) };
        assert_eq!(t.handle(&cont), None);
        assert!((t.aggregate().total_overlap_volume - beam_at(0.0).volume()).abs() < 1e-4);
        assert_eq!(t.handle(&OverlapEvent::End { partner: id("b") }), Some(VisualState::Default));
    }

    #[test]
    fn monte_carlo_tracker_is_reproducible() {
        let crossing = Beam::new(Vec3::new(-2.5, 0.0, 2.5), Vec3::new(1.0, 0.0, 0.0), 1.0, 5.0).unwrap();
        let est = Estimator::monte_carlo(4_000, 42);
        let mut t1 = BeamCollisionTracker::with_estimator("a", beam_at(0.0), est);
        let mut t2 = BeamCollisionTracker::with_estimator("a", beam_at(0.0), est);
        t1.on_overlap_begin(&id("x"), &crossing);
        t2.on_overlap_begin(&id("x"), &crossing);
        assert_eq!(t1.aggregate(), t2.aggregate());
        assert!(t1.aggregate().total_overlap_volume > 0.0);
    }

    #[test]
    fn report_reflects_state() {
        let mut t = tracker();
        t.on_overlap_begin(&id("b"), &beam_at(1.5));
        t.on_overlap_begin(&id("c"), &beam_at(0.5));
        let r = t.report();
        assert_eq!(r.beam_id, id("a"));
        assert_eq!(r.collision_count, 2);
        assert_eq!(r.partners, vec![id("b"), id("c")]);
    }
}
