//! The classification-and-aggregation engine.
//!
//! Data flows one way: snapshot → normalized records → classified records →
//! aggregates → chart-ready data. Every stage is a pure function; the whole
//! pipeline is re-run from scratch on each snapshot.

pub mod aggregator;
pub mod charts;
pub mod classifier;
pub mod normalizer;

use crate::models::{DashboardFrame, Snapshot};
use chrono::Utc;

/// Run the full pipeline over one snapshot.
pub fn analyze(seq: u64, snapshot: &Snapshot) -> DashboardFrame {
    let responses = normalizer::normalize_snapshot(snapshot);
    let aggregates = aggregator::aggregate(&responses);
    let charts = charts::chart_set(&aggregates);

    DashboardFrame {
        seq,
        generated_at: Utc::now(),
        responses,
        aggregates,
        charts,
    }
}
