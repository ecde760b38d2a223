//! Live snapshot ingestion.
//!
//! A source delivers the entire current dataset on every change; the
//! controller re-runs the engine per delivery and atomically replaces the
//! published result.

pub mod controller;
pub mod source;

pub use controller::{ControllerState, Published, RecomputeController};
pub use source::{
    parse_snapshot, subscription, FileSource, HttpSource, SnapshotError, SnapshotEvent,
    SnapshotPublisher, SnapshotSource, Subscription,
};
