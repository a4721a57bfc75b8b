//! `beam-tracker` – per-beam collision bookkeeping driven by host events.
//!
//! # Modules
//!
//! - [`tracker`] – [`BeamCollisionTracker`][tracker::BeamCollisionTracker]:
//!   the live set of partners overlapping one beam, their estimated volumes
//!   and the derived [`TrackerAggregate`][tracker::TrackerAggregate].
//! - [`scene`] – [`BeamScene`][scene::BeamScene]: the host adapter.  Owns a
//!   tracker per beam, queues pair events and delivers them to both sides.
//! - [`visual`] – [`VisualSink`][visual::VisualSink]: receives color swap
//!   requests when a beam starts or stops overlapping anything.
//! - [`report`] – [`CollisionReport`][report::CollisionReport]: the
//!   on-demand textual summary.

pub mod report;
pub mod scene;
pub mod tracker;
pub mod visual;

pub use report::CollisionReport;
pub use scene::BeamScene;
pub use tracker::{BeamCollisionTracker, OverlapRecord, TrackerAggregate};
pub use visual::{LogSink, RecordingSink, VisualSink};
