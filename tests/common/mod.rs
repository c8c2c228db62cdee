//! Shared test doubles for the loader suites.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::Notify;

use tributary::client::{ApiClient, FetchError};
use tributary::descriptor::EndpointDescriptor;

/// Scripted behavior for one state key.
#[derive(Clone)]
pub enum StubBehavior {
    /// Resolve immediately with this body.
    Ok(Value),
    /// Resolve with this body after a delay.
    DelayedOk(Duration, Value),
    /// Fail with a status error after an optional delay.
    Fail {
        delay: Duration,
        status: u16,
        detail: String,
        body: Value,
    },
    /// Fail at the transport level.
    Transport(String),
    /// Resolve with the next body in the queue; the last entry repeats.
    Sequence(Arc<Mutex<VecDeque<Value>>>),
    /// Never resolve (cancellation tests).
    Hang,
    /// Wait for the gate, then resolve with this body.
    Gated(Arc<Notify>, Value),
}

/// [`ApiClient`] double with per-state-key scripted outcomes.
#[derive(Default)]
pub struct StubClient {
    behaviors: FxHashMap<String, StubBehavior>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl StubClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ok(mut self, state_key: &str, body: Value) -> Self {
        self.behaviors
            .insert(state_key.to_string(), StubBehavior::Ok(body));
        self
    }

    pub fn with_delayed_ok(mut self, state_key: &str, delay_ms: u64, body: Value) -> Self {
        self.behaviors.insert(
            state_key.to_string(),
            StubBehavior::DelayedOk(Duration::from_millis(delay_ms), body),
        );
        self
    }

    pub fn with_failure(mut self, state_key: &str, status: u16, detail: &str) -> Self {
        self.behaviors.insert(
            state_key.to_string(),
            StubBehavior::Fail {
                delay: Duration::ZERO,
                status,
                detail: detail.to_string(),
                body: serde_json::json!({"detail": detail}),
            },
        );
        self
    }

    pub fn with_delayed_failure(
        mut self,
        state_key: &str,
        delay_ms: u64,
        status: u16,
        detail: &str,
    ) -> Self {
        self.behaviors.insert(
            state_key.to_string(),
            StubBehavior::Fail {
                delay: Duration::from_millis(delay_ms),
                status,
                detail: detail.to_string(),
                body: serde_json::json!({"detail": detail}),
            },
        );
        self
    }

    pub fn with_ok_sequence(mut self, state_key: &str, bodies: Vec<Value>) -> Self {
        self.behaviors.insert(
            state_key.to_string(),
            StubBehavior::Sequence(Arc::new(Mutex::new(bodies.into_iter().collect()))),
        );
        self
    }

    pub fn with_transport_failure(mut self, state_key: &str, message: &str) -> Self {
        self.behaviors.insert(
            state_key.to_string(),
            StubBehavior::Transport(message.to_string()),
        );
        self
    }

    pub fn with_hang(mut self, state_key: &str) -> Self {
        self.behaviors
            .insert(state_key.to_string(), StubBehavior::Hang);
        self
    }

    pub fn with_gated(mut self, state_key: &str, gate: Arc<Notify>, body: Value) -> Self {
        self.behaviors
            .insert(state_key.to_string(), StubBehavior::Gated(gate, body));
        self
    }

    /// How many fetches were issued against this client.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ApiClient for StubClient {
    async fn fetch(&self, descriptor: &EndpointDescriptor) -> Result<Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self
            .behaviors
            .get(descriptor.state_key())
            .unwrap_or_else(|| panic!("no stub behavior for {:?}", descriptor.state_key()))
            .clone();
        match behavior {
            StubBehavior::Ok(body) => Ok(body),
            StubBehavior::DelayedOk(delay, body) => {
                tokio::time::sleep(delay).await;
                Ok(body)
            }
            StubBehavior::Fail {
                delay,
                status,
                detail,
                body,
            } => {
                if delay > Duration::ZERO {
                    tokio::time::sleep(delay).await;
                }
                Err(FetchError::Status {
                    status,
                    detail,
                    body,
                })
            }
            StubBehavior::Sequence(bodies) => {
                let mut queue = bodies.lock().unwrap();
                let body = if queue.len() > 1 {
                    queue.pop_front().unwrap()
                } else {
                    queue.front().cloned().expect("sequence exhausted")
                };
                Ok(body)
            }
            StubBehavior::Transport(message) => Err(FetchError::Transport { message }),
            StubBehavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!("pending future resolved")
            }
            StubBehavior::Gated(gate, body) => {
                gate.notified().await;
                Ok(body)
            }
        }
    }
}
