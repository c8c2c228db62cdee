//! Loader lifecycle events and output sinks.
//!
//! Every batch transition and endpoint settlement produces a [`LoaderEvent`]
//! that the loader hands synchronously to each registered [`EventSink`].
//! Sinks cover the usual consumers: [`MemorySink`] for tests and snapshots,
//! [`ChannelSink`] for async fan-out to dashboards or streams, and
//! [`TracingSink`] for structured log output.

use std::io::{self, Result as IoResult};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A timestamped loader lifecycle event.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoaderEvent {
    /// A batch was activated with the listed state keys.
    BatchStarted {
        batch_id: String,
        state_keys: Vec<String>,
        when: DateTime<Utc>,
    },
    /// An in-flight batch was cancelled before settling.
    BatchAborted {
        batch_id: String,
        outstanding: usize,
        when: DateTime<Utc>,
    },
    /// An endpoint settled successfully; `changed` is false when the merged
    /// value kept its previous identity.
    EndpointLoaded {
        batch_id: String,
        state_key: String,
        changed: bool,
        version: u32,
        when: DateTime<Utc>,
    },
    /// An endpoint settled with a failure.
    EndpointFailed {
        batch_id: String,
        state_key: String,
        status: Option<u16>,
        message: String,
        when: DateTime<Utc>,
    },
    /// Every endpoint of the batch has settled.
    BatchSettled {
        batch_id: String,
        failures: usize,
        when: DateTime<Utc>,
    },
}

impl LoaderEvent {
    pub fn batch_started(batch_id: impl Into<String>, state_keys: Vec<String>) -> Self {
        LoaderEvent::BatchStarted {
            batch_id: batch_id.into(),
            state_keys,
            when: Utc::now(),
        }
    }

    pub fn batch_aborted(batch_id: impl Into<String>, outstanding: usize) -> Self {
        LoaderEvent::BatchAborted {
            batch_id: batch_id.into(),
            outstanding,
            when: Utc::now(),
        }
    }

    pub fn endpoint_loaded(
        batch_id: impl Into<String>,
        state_key: impl Into<String>,
        changed: bool,
        version: u32,
    ) -> Self {
        LoaderEvent::EndpointLoaded {
            batch_id: batch_id.into(),
            state_key: state_key.into(),
            changed,
            version,
            when: Utc::now(),
        }
    }

    pub fn endpoint_failed(
        batch_id: impl Into<String>,
        state_key: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        LoaderEvent::EndpointFailed {
            batch_id: batch_id.into(),
            state_key: state_key.into(),
            status,
            message: message.into(),
            when: Utc::now(),
        }
    }

    pub fn batch_settled(batch_id: impl Into<String>, failures: usize) -> Self {
        LoaderEvent::BatchSettled {
            batch_id: batch_id.into(),
            failures,
            when: Utc::now(),
        }
    }

    /// The batch this event belongs to.
    #[must_use]
    pub fn batch_id(&self) -> &str {
        match self {
            LoaderEvent::BatchStarted { batch_id, .. }
            | LoaderEvent::BatchAborted { batch_id, .. }
            | LoaderEvent::EndpointLoaded { batch_id, .. }
            | LoaderEvent::EndpointFailed { batch_id, .. }
            | LoaderEvent::BatchSettled { batch_id, .. } => batch_id,
        }
    }

    /// The state key, for per-endpoint events.
    #[must_use]
    pub fn state_key(&self) -> Option<&str> {
        match self {
            LoaderEvent::EndpointLoaded { state_key, .. }
            | LoaderEvent::EndpointFailed { state_key, .. } => Some(state_key),
            _ => None,
        }
    }
}

/// Abstraction over an output target that consumes loader events.
pub trait EventSink: Send + Sync {
    /// Handle one event. The sink decides how to serialize or forward it.
    fn handle(&mut self, event: &LoaderEvent) -> IoResult<()>;
}

/// In-memory sink for testing and snapshots.
#[derive(Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<LoaderEvent>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of all captured events.
    pub fn snapshot(&self) -> Vec<LoaderEvent> {
        self.entries.lock().unwrap().clone()
    }

    /// Clear all captured events.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl EventSink for MemorySink {
    fn handle(&mut self, event: &LoaderEvent) -> IoResult<()> {
        self.entries.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Channel-based sink for streaming to async consumers.
pub struct ChannelSink {
    tx: flume::Sender<LoaderEvent>,
}

impl ChannelSink {
    /// Create a sink forwarding into the given channel.
    ///
    /// # Example
    /// ```rust
    /// use tributary::events::{ChannelSink, EventSink, LoaderEvent};
    ///
    /// let (tx, rx) = flume::unbounded();
    /// let mut sink = ChannelSink::new(tx);
    /// sink.handle(&LoaderEvent::batch_settled("batch-1", 0)).unwrap();
    /// assert_eq!(rx.recv().unwrap().batch_id(), "batch-1");
    /// ```
    pub fn new(tx: flume::Sender<LoaderEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn handle(&mut self, event: &LoaderEvent) -> IoResult<()> {
        self.tx
            .send(event.clone())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "channel receiver dropped"))
    }
}

/// Sink that forwards events to the `tracing` subscriber.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn handle(&mut self, event: &LoaderEvent) -> IoResult<()> {
        match event {
            LoaderEvent::BatchStarted {
                batch_id,
                state_keys,
                ..
            } => {
                tracing::info!(batch = %batch_id, keys = state_keys.len(), "batch started");
            }
            LoaderEvent::BatchAborted {
                batch_id,
                outstanding,
                ..
            } => {
                tracing::info!(batch = %batch_id, outstanding, "batch aborted");
            }
            LoaderEvent::EndpointLoaded {
                batch_id,
                state_key,
                changed,
                version,
                ..
            } => {
                tracing::debug!(batch = %batch_id, key = %state_key, changed, version, "endpoint loaded");
            }
            LoaderEvent::EndpointFailed {
                batch_id,
                state_key,
                status,
                message,
                ..
            } => {
                tracing::warn!(batch = %batch_id, key = %state_key, status = ?status, %message, "endpoint failed");
            }
            LoaderEvent::BatchSettled {
                batch_id, failures, ..
            } => {
                tracing::info!(batch = %batch_id, failures, "batch settled");
            }
        }
        Ok(())
    }
}
