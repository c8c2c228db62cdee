//! One in-flight batch: spawned request tasks plus their outcome channel.
//!
//! A [`Batch`] owns a `JoinSet` with one task per descriptor. Tasks report
//! through a per-batch flume channel; cancelling a batch drops both, so a
//! late completion from a cancelled batch has neither a task to run on nor a
//! receiver to land in. Suppression is structural, not a flag check.

use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::client::{ApiClient, FetchError};
use crate::descriptor::EndpointDescriptor;

/// One settled request, delivered to the loader's fold loop.
pub(crate) struct EndpointOutcome {
    pub state_key: String,
    pub result: Result<Value, FetchError>,
}

/// The running half of a batch: tasks and their outcome channel.
///
/// Dropping a `Batch` aborts every outstanding task.
pub(crate) struct Batch {
    id: String,
    outcomes: flume::Receiver<EndpointOutcome>,
    #[allow(dead_code)] // held for abort-on-drop
    tasks: JoinSet<()>,
}

impl Batch {
    /// Spawn one task per descriptor against the shared client.
    ///
    /// All requests go out concurrently; completion order is whatever the
    /// network gives us. Must be called from within a Tokio runtime.
    pub fn spawn<C: ApiClient + 'static>(
        client: &Arc<C>,
        descriptors: &[EndpointDescriptor],
    ) -> Self {
        let id = format!("batch-{}", Uuid::new_v4());
        let (tx, outcomes) = flume::bounded(descriptors.len().max(1));
        let mut tasks = JoinSet::new();
        for descriptor in descriptors.iter().cloned() {
            let client = Arc::clone(client);
            let tx = tx.clone();
            tasks.spawn(async move {
                let result = client.fetch(&descriptor).await;
                // A closed receiver means the batch was cancelled underneath
                // us; the outcome has nowhere to go and must not.
                let _ = tx
                    .send_async(EndpointOutcome {
                        state_key: descriptor.state_key().to_string(),
                        result,
                    })
                    .await;
            });
        }
        Self { id, outcomes, tasks }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Await the next settled request.
    ///
    /// `None` means every sender is gone with nothing buffered: either the
    /// batch already drained, or a task died without reporting.
    pub async fn next_outcome(&mut self) -> Option<EndpointOutcome> {
        self.outcomes.recv_async().await.ok()
    }
}
