//! Snapshot subscription sources.
//!
//! The engine consumes full-dataset replace events through a narrow
//! contract: `subscribe` hands back a [`Subscription`], and dropping it (or
//! calling `unsubscribe`) stops delivery. Deltas are never sent; every event
//! carries the whole current dataset.
//!
//! Two sources are provided: polling a snapshot JSON file on disk and
//! polling an HTTP endpoint that serves the snapshot JSON (a Firebase-style
//! `.json` export of the dataset).

use crate::models::{RawSubmission, Snapshot};
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

/// Why a snapshot could not be delivered.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The source file could not be read.
    #[error("failed to read snapshot source: {0}")]
    Read(String),

    /// The HTTP request failed or returned an error status.
    #[error("failed to fetch snapshot: {0}")]
    Fetch(String),

    /// The payload is not valid snapshot JSON.
    #[error("failed to parse snapshot: {0}")]
    Parse(String),
}

/// One delivery from a source: the entire current dataset, or the failure
/// that prevented it.
#[derive(Debug)]
pub struct SnapshotEvent {
    /// Monotonic arrival sequence, assigned by the publisher.
    pub seq: u64,
    pub payload: Result<Snapshot, SnapshotError>,
}

/// A live feed of snapshot events. Dropping it unsubscribes.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<SnapshotEvent>,
}

impl Subscription {
    /// Wait for the next event. `None` means the source is gone.
    pub async fn next_event(&mut self) -> Option<SnapshotEvent> {
        self.rx.recv().await
    }

    /// Take an already-queued event without waiting.
    pub fn try_next_event(&mut self) -> Option<SnapshotEvent> {
        self.rx.try_recv().ok()
    }

    /// Stop receiving events. Equivalent to dropping the subscription;
    /// in-flight source work is not interrupted.
    #[allow(dead_code)] // Explicit spelling of drop for collaborators
    pub fn unsubscribe(self) {}
}

/// The sending half backing a [`Subscription`].
pub struct SnapshotPublisher {
    tx: mpsc::UnboundedSender<SnapshotEvent>,
    next_seq: u64,
}

impl SnapshotPublisher {
    /// Deliver a full snapshot. Returns false once the subscriber is gone.
    pub fn send(&mut self, snapshot: Snapshot) -> bool {
        self.deliver(Ok(snapshot))
    }

    /// Deliver a transport failure as a distinct signal.
    pub fn send_failure(&mut self, error: SnapshotError) -> bool {
        self.deliver(Err(error))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn deliver(&mut self, payload: Result<Snapshot, SnapshotError>) -> bool {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tx.send(SnapshotEvent { seq, payload }).is_ok()
    }
}

/// Create a publisher/subscription pair. Sources build on this; tests can
/// feed events directly.
pub fn subscription() -> (SnapshotPublisher, Subscription) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SnapshotPublisher { tx, next_seq: 1 }, Subscription { rx })
}

/// Anything that can feed the engine with whole-dataset events.
pub trait SnapshotSource {
    fn subscribe(&self) -> Subscription;
}

/// Parse snapshot JSON into submissions keyed by opaque id.
///
/// Accepts the dataset itself, a single-key `{"encuestas": …}` export
/// wrapping it, and `null` for an empty dataset. Entries that are not
/// objects normalize to an all-defaults submission rather than poisoning
/// the snapshot.
pub fn parse_snapshot(text: &str) -> Result<Snapshot, SnapshotError> {
    let value: Value =
        serde_json::from_str(text).map_err(|error| SnapshotError::Parse(error.to_string()))?;

    let node = match value {
        Value::Null => return Ok(Snapshot::new()),
        Value::Object(mut map) => match map.remove("encuestas") {
            Some(Value::Null) if map.is_empty() => return Ok(Snapshot::new()),
            Some(inner @ Value::Object(_)) if map.is_empty() => inner,
            Some(entry) => {
                // Not an export wrapper after all; put the entry back.
                map.insert("encuestas".to_string(), entry);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => {
            return Err(SnapshotError::Parse(format!(
                "expected an object of submissions, got {other}"
            )))
        }
    };

    let entries: BTreeMap<String, Value> =
        serde_json::from_value(node).map_err(|error| SnapshotError::Parse(error.to_string()))?;

    Ok(entries
        .into_iter()
        .map(|(id, entry)| {
            let submission: RawSubmission = serde_json::from_value(entry).unwrap_or_default();
            (id, submission)
        })
        .collect())
}

/// Polls a snapshot JSON file and delivers the whole dataset when its
/// modification time changes. The first poll always delivers.
pub struct FileSource {
    path: PathBuf,
    poll_interval: Duration,
}

impl FileSource {
    pub fn new(path: PathBuf, poll_interval: Duration) -> Self {
        Self {
            path,
            poll_interval,
        }
    }
}

impl SnapshotSource for FileSource {
    fn subscribe(&self) -> Subscription {
        let (mut publisher, subscription) = subscription();
        let path = self.path.clone();
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            let mut ticker = time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Change detection on (mtime, size); mtime alone is too coarse
            // on some filesystems for back-to-back writes.
            let mut last_stamp = None;

            loop {
                ticker.tick().await;
                if publisher.is_closed() {
                    break;
                }

                let stamp = tokio::fs::metadata(&path)
                    .await
                    .ok()
                    .map(|meta| (meta.modified().ok(), meta.len()));
                if stamp.is_some() && stamp == last_stamp {
                    continue;
                }

                let delivered = match tokio::fs::read_to_string(&path).await {
                    Ok(text) => match parse_snapshot(&text) {
                        Ok(snapshot) => {
                            last_stamp = stamp;
                            publisher.send(snapshot)
                        }
                        Err(error) => publisher.send_failure(error),
                    },
                    Err(error) => publisher.send_failure(SnapshotError::Read(error.to_string())),
                };
                if !delivered {
                    break;
                }
            }
            debug!("file source for {} stopped", path.display());
        });

        subscription
    }
}

/// Polls an HTTP endpoint serving the snapshot JSON. Identical bodies are
/// skipped so an unchanged dataset does not trigger recomputes.
pub struct HttpSource {
    url: String,
    poll_interval: Duration,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(url: String, poll_interval: Duration, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            url,
            poll_interval,
            client,
        })
    }
}

impl SnapshotSource for HttpSource {
    fn subscribe(&self) -> Subscription {
        let (mut publisher, subscription) = subscription();
        let url = self.url.clone();
        let client = self.client.clone();
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            let mut ticker = time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last_body: Option<String> = None;

            loop {
                ticker.tick().await;
                if publisher.is_closed() {
                    break;
                }

                let body = match fetch_body(&client, &url).await {
                    Ok(body) => body,
                    Err(error) => {
                        if publisher.send_failure(error) {
                            continue;
                        }
                        break;
                    }
                };
                if last_body.as_deref() == Some(body.as_str()) {
                    continue;
                }

                let delivered = match parse_snapshot(&body) {
                    Ok(snapshot) => {
                        last_body = Some(body);
                        publisher.send(snapshot)
                    }
                    Err(error) => publisher.send_failure(error),
                };
                if !delivered {
                    break;
                }
            }
            debug!("http source for {url} stopped");
        });

        subscription
    }
}

async fn fetch_body(client: &reqwest::Client, url: &str) -> Result<String, SnapshotError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|error| SnapshotError::Fetch(error.to_string()))?;

    let response = response
        .error_for_status()
        .map_err(|error| SnapshotError::Fetch(error.to_string()))?;

    response
        .text()
        .await
        .map_err(|error| SnapshotError::Fetch(error.to_string()))
}
