//! Live recompute controller.
//!
//! Drives the engine over a subscription of full-snapshot events and keeps
//! exactly one published result current. Events queued behind an in-flight
//! tick are coalesced down to the newest, and every publish is guarded by
//! the event sequence, so the published frame always derives from the most
//! recent snapshot.

use crate::engine;
use crate::live::source::Subscription;
use crate::models::DashboardFrame;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// What the controller is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Recomputing,
}

/// The latest published analysis.
///
/// `frame` is the last good result; it survives transport failures.
/// `last_failure` is set when the most recent delivery could not be used
/// and cleared again by the next successful recompute.
#[derive(Debug, Clone, Default)]
pub struct Published {
    pub frame: Option<Arc<DashboardFrame>>,
    pub last_failure: Option<String>,
}

/// Recomputes the dashboard on every snapshot event.
pub struct RecomputeController {
    handle: JoinHandle<()>,
    published: watch::Receiver<Published>,
    state: watch::Receiver<ControllerState>,
    shutdown: watch::Sender<bool>,
}

impl RecomputeController {
    /// Spawn the controller over a subscription.
    pub fn spawn(subscription: Subscription) -> Self {
        let (published_tx, published_rx) = watch::channel(Published::default());
        let (state_tx, state_rx) = watch::channel(ControllerState::Idle);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(run_loop(subscription, published_tx, state_tx, shutdown_rx));

        Self {
            handle,
            published: published_rx,
            state: state_rx,
            shutdown: shutdown_tx,
        }
    }

    /// Watch the published result; each replace is one atomic swap.
    pub fn published(&self) -> watch::Receiver<Published> {
        self.published.clone()
    }

    /// Current activity.
    #[allow(dead_code)] // Introspection for collaborators and tests
    pub fn state(&self) -> ControllerState {
        *self.state.borrow()
    }

    /// Stop reacting to further events. An in-flight recompute is not
    /// interrupted; once it finishes the loop exits.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Wait for the controller task to finish.
    pub async fn join(self) {
        let _ = self.handle.await;
    }
}

async fn run_loop(
    mut subscription: Subscription,
    published: watch::Sender<Published>,
    state: watch::Sender<ControllerState>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut last_published_seq = 0u64;

    loop {
        let mut event = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            next = subscription.next_event() => match next {
                Some(event) => event,
                None => break,
            },
        };

        // Coalesce whatever queued up behind us down to the newest event.
        while let Some(newer) = subscription.try_next_event() {
            debug!("superseding snapshot {} with {}", event.seq, newer.seq);
            event = newer;
        }

        let _ = state.send(ControllerState::Recomputing);
        match event.payload {
            Ok(snapshot) => {
                let frame = engine::analyze(event.seq, &snapshot);
                if event.seq > last_published_seq {
                    last_published_seq = event.seq;
                    debug!(
                        "publishing snapshot {} ({} responses)",
                        frame.seq,
                        frame.respondent_count()
                    );
                    published.send_modify(|current| {
                        current.frame = Some(Arc::new(frame));
                        current.last_failure = None;
                    });
                } else {
                    debug!("discarding stale result for snapshot {}", event.seq);
                }
            }
            Err(error) => {
                warn!("snapshot delivery failed: {error}");
                published.send_modify(|current| {
                    current.last_failure = Some(error.to_string());
                });
            }
        }
        let _ = state.send(ControllerState::Idle);
    }

    debug!("recompute controller stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::source::{subscription, SnapshotError};
    use crate::models::Snapshot;

    fn snapshot_of(names: &[&str]) -> Snapshot {
        names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let entry = serde_json::json!({ "respuestas": { "nombre": name } });
                (
                    format!("-N{index:03}"),
                    serde_json::from_value(entry).unwrap(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_publishes_frame_for_snapshot() {
        let (mut publisher, sub) = subscription();
        let controller = RecomputeController::spawn(sub);
        let mut published = controller.published();

        publisher.send(snapshot_of(&["Ana"]));

        published.changed().await.unwrap();
        let current = published.borrow_and_update().clone();
        let frame = current.frame.expect("a frame should be published");
        assert_eq!(frame.respondent_count(), 1);
        assert_eq!(frame.responses[0].name, "Ana");
        assert!(current.last_failure.is_none());
    }

    #[tokio::test]
    async fn test_superset_snapshot_replaces_whole_result() {
        let (mut publisher, sub) = subscription();
        let controller = RecomputeController::spawn(sub);
        let mut published = controller.published();

        publisher.send(snapshot_of(&["Ana"]));
        publisher.send(snapshot_of(&["Ana", "Luis"]));

        // Every published frame is all-of-one-snapshot; wait for the newest.
        let frame = loop {
            published.changed().await.unwrap();
            let current = published.borrow_and_update().clone();
            let frame = current.frame.expect("a frame should be published");
            assert!(
                frame.respondent_count() == 1 || frame.respondent_count() == 2,
                "a frame must never mix snapshots"
            );
            if frame.seq == 2 {
                break frame;
            }
        };
        assert_eq!(frame.respondent_count(), 2);
    }

    #[tokio::test]
    async fn test_failure_keeps_last_good_frame() {
        let (mut publisher, sub) = subscription();
        let controller = RecomputeController::spawn(sub);
        let mut published = controller.published();

        publisher.send(snapshot_of(&["Ana"]));
        published.changed().await.unwrap();
        assert!(published.borrow_and_update().frame.is_some());

        publisher.send_failure(SnapshotError::Fetch("boom".into()));
        published.changed().await.unwrap();
        let current = published.borrow_and_update().clone();
        // State is retained on transient failure and the failure is surfaced.
        let frame = current.frame.expect("last good frame must survive");
        assert_eq!(frame.respondent_count(), 1);
        assert!(current.last_failure.unwrap().contains("boom"));

        publisher.send(snapshot_of(&["Ana", "Luis"]));
        published.changed().await.unwrap();
        let current = published.borrow_and_update().clone();
        assert_eq!(current.frame.unwrap().respondent_count(), 2);
        assert!(current.last_failure.is_none());
    }

    #[tokio::test]
    async fn test_source_closing_stops_controller() {
        let (publisher, sub) = subscription();
        let controller = RecomputeController::spawn(sub);

        drop(publisher);
        controller.join().await;
    }

    #[tokio::test]
    async fn test_stop_ends_loop_without_new_publishes() {
        let (mut publisher, sub) = subscription();
        let controller = RecomputeController::spawn(sub);
        let mut published = controller.published();

        publisher.send(snapshot_of(&["Ana"]));
        published.changed().await.unwrap();

        controller.stop();
        controller.join().await;
        // The subscription is gone with the loop; later sends have no taker.
        assert!(!publisher.send(snapshot_of(&["Ana", "Luis"])));
    }

    #[tokio::test]
    async fn test_initial_state_is_idle() {
        let (_publisher, sub) = subscription();
        let controller = RecomputeController::spawn(sub);
        assert_eq!(controller.state(), ControllerState::Idle);
    }
}
