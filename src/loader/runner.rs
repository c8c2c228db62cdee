use std::sync::Arc;

use miette::Diagnostic;
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::client::{ApiClient, FetchError};
use crate::config::LoaderConfig;
use crate::descriptor::EndpointDescriptor;
use crate::errors::EndpointFailure;
use crate::events::{EventSink, LoaderEvent};
use crate::state::{BatchPhase, LoaderSnapshot, LoaderState};

use super::batch::{Batch, EndpointOutcome};

/// Hook invoked when a batch settles with zero recorded failures.
pub type SettledHook = Box<dyn Fn(&LoaderSnapshot) + Send + Sync>;

/// Errors surfaced by the batch driver.
///
/// Individual endpoint failures are *not* errors here; they become loader
/// state and the batch settles normally. These variants cover misuse and a
/// batch dying without reporting.
#[derive(Debug, Error, Diagnostic)]
pub enum LoaderError {
    /// Two descriptors in one batch shared a state key.
    #[error("duplicate state key in batch: {state_key:?}")]
    #[diagnostic(
        code(tributary::loader::duplicate_state_key),
        help("Each descriptor in a batch must store its response under a distinct key.")
    )]
    DuplicateStateKey { state_key: String },

    /// The batch's tasks are gone but outcomes are still owed.
    #[error("batch {batch_id} interrupted with {outstanding} request(s) unsettled")]
    #[diagnostic(
        code(tributary::loader::batch_interrupted),
        help("A request task ended without reporting; the runtime may be shutting down.")
    )]
    BatchInterrupted {
        batch_id: String,
        outstanding: usize,
    },
}

/// What one [`EndpointLoader::settle_next`] call folded into state.
#[derive(Debug, Clone, PartialEq)]
pub struct SettleReport {
    pub batch_id: String,
    pub state_key: String,
    /// Requests still outstanding after this settlement.
    pub remaining: usize,
    pub outcome: SettleOutcome,
}

/// Per-endpoint settlement classification.
#[derive(Debug, Clone, PartialEq)]
pub enum SettleOutcome {
    /// Body merged into the slot; `changed` is false when the merge kept the
    /// previous identity.
    Loaded { changed: bool, version: u32 },
    /// A renderable 4xx body stored as data (bad-request rendering enabled).
    StoredBadRequest { status: u16 },
    /// Recorded as a batch failure.
    Failed { message: String },
}

/// 4xx statuses whose bodies are renderable payloads rather than failures.
/// 401 is excluded: an auth problem must never render as data.
fn renderable_bad_request(status: u16) -> bool {
    matches!(status, 400 | 403 | 404)
}

/// Coordinates one batch of concurrent endpoint requests at a time and owns
/// the accumulated [`LoaderState`].
///
/// The loader issues every descriptor of a batch concurrently, folds each
/// completion into keyed state as it arrives, and exposes aggregate
/// loading/failure/settled status through [`snapshot`](Self::snapshot).
/// Activating a new batch (or dropping the loader) aborts all in-flight
/// requests of the previous one; their late responses are structurally
/// unroutable and can never mutate state.
///
/// # Driving a batch
///
/// [`load`](Self::load) is the one-call path. For stepwise control (callers
/// that want a snapshot between settlements) use
/// [`start_batch`](Self::start_batch) plus [`settle_next`](Self::settle_next),
/// the same split the settle loop uses internally.
///
/// # Examples
///
/// ```rust,no_run
/// use tributary::client::HttpClient;
/// use tributary::config::LoaderConfig;
/// use tributary::descriptor::EndpointDescriptor;
/// use tributary::loader::EndpointLoader;
/// use tributary::state::BatchView;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = LoaderConfig::new("https://sentry.example.com");
/// let client = HttpClient::from_config(&config)?;
/// let mut loader = EndpointLoader::new(client, config);
///
/// let snapshot = loader
///     .load(vec![
///         EndpointDescriptor::get("issues", "/api/0/issues/")?.with_query("statsPeriod", "14d"),
///         EndpointDescriptor::get("stats", "/api/0/stats/")?,
///     ])
///     .await?;
///
/// match snapshot.view() {
///     BatchView::Ready { data } => println!("issues: {}", data["issues"]),
///     BatchView::Failed { message } => eprintln!("{message}"),
///     BatchView::Loading { .. } => unreachable!("load() settles the batch"),
/// }
/// # Ok(())
/// # }
/// ```
pub struct EndpointLoader<C: ApiClient> {
    client: Arc<C>,
    config: LoaderConfig,
    state: LoaderState,
    batch: Option<Batch>,
    sinks: Vec<Box<dyn EventSink>>,
    on_all_settled: Option<SettledHook>,
}

impl<C: ApiClient + 'static> EndpointLoader<C> {
    pub fn new(client: C, config: LoaderConfig) -> Self {
        Self::from_arc(Arc::new(client), config)
    }

    /// Variant that shares an already-wrapped client between loaders.
    pub fn from_arc(client: Arc<C>, config: LoaderConfig) -> Self {
        Self {
            client,
            config,
            state: LoaderState::new(),
            batch: None,
            sinks: Vec::new(),
            on_all_settled: None,
        }
    }

    /// Register an output sink for lifecycle events.
    pub fn add_sink<T: EventSink + 'static>(&mut self, sink: T) {
        self.sinks.push(Box::new(sink));
    }

    /// Install the settled-without-failures hook. Replaces any previous hook.
    pub fn on_all_settled(&mut self, hook: impl Fn(&LoaderSnapshot) + Send + Sync + 'static) {
        self.on_all_settled = Some(Box::new(hook));
    }

    /// Activate a new batch.
    ///
    /// Any previous batch is aborted first: its tasks stop, its outcomes are
    /// unroutable, and nothing from it will touch state. Failures and the
    /// remaining count reset; slot values survive as merge baselines. An
    /// empty descriptor set settles immediately (firing the hook).
    #[instrument(skip(self, descriptors), fields(count = descriptors.len()))]
    pub fn start_batch(&mut self, descriptors: Vec<EndpointDescriptor>) -> Result<(), LoaderError> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for descriptor in &descriptors {
            if !seen.insert(descriptor.state_key()) {
                return Err(LoaderError::DuplicateStateKey {
                    state_key: descriptor.state_key().to_string(),
                });
            }
        }

        self.abort_active_batch();

        let batch = Batch::spawn(&self.client, &descriptors);
        let batch_id = batch.id().to_string();
        debug!(batch = %batch_id, count = descriptors.len(), "batch activated");

        self.state.begin_batch(descriptors.len());
        self.emit(LoaderEvent::batch_started(
            &batch_id,
            descriptors
                .iter()
                .map(|d| d.state_key().to_string())
                .collect(),
        ));

        if self.state.loading() {
            self.batch = Some(batch);
        } else {
            // Zero descriptors: trivially settled.
            self.finish_batch(&batch_id);
        }
        Ok(())
    }

    /// Await the next settlement and fold it into state.
    ///
    /// Returns `Ok(None)` once the current batch has settled (or none is
    /// active). Endpoint failures are folded, not raised; the only `Err` here
    /// is a batch whose tasks died without reporting.
    pub async fn settle_next(&mut self) -> Result<Option<SettleReport>, LoaderError> {
        if !self.state.loading() {
            return Ok(None);
        }
        let Some(batch) = self.batch.as_mut() else {
            return Ok(None);
        };
        let batch_id = batch.id().to_string();

        let Some(outcome) = batch.next_outcome().await else {
            let outstanding = self.state.remaining();
            self.state.cancel_batch();
            self.batch = None;
            return Err(LoaderError::BatchInterrupted {
                batch_id,
                outstanding,
            });
        };

        Ok(Some(self.fold_outcome(&batch_id, outcome)))
    }

    /// Drive the active batch to settlement and return the final snapshot.
    #[instrument(skip(self), err)]
    pub async fn run_to_settled(&mut self) -> Result<LoaderSnapshot, LoaderError> {
        while self.settle_next().await?.is_some() {}
        Ok(self.snapshot())
    }

    /// Convenience: activate a batch and drive it to settlement.
    pub async fn load(
        &mut self,
        descriptors: Vec<EndpointDescriptor>,
    ) -> Result<LoaderSnapshot, LoaderError> {
        self.start_batch(descriptors)?;
        self.run_to_settled().await
    }

    /// Cancel the active batch without starting a new one.
    pub fn abort(&mut self) {
        self.abort_active_batch();
        self.state.cancel_batch();
    }

    /// Abort the active batch and drop all accumulated slots and failures.
    pub fn reset(&mut self) {
        self.abort_active_batch();
        self.state.reset();
    }

    /// Point-in-time view of loader state. Cheap: values are `Arc`-shared.
    #[must_use]
    pub fn snapshot(&self) -> LoaderSnapshot {
        self.state.snapshot()
    }

    #[must_use]
    pub fn phase(&self) -> BatchPhase {
        self.state.phase()
    }

    /// True while any request of the current batch is outstanding.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.state.loading()
    }

    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    fn fold_outcome(&mut self, batch_id: &str, outcome: EndpointOutcome) -> SettleReport {
        let EndpointOutcome { state_key, result } = outcome;

        let settle = match result {
            Ok(body) => {
                let (changed, version) = self.state.record_success(&state_key, body);
                self.emit(LoaderEvent::endpoint_loaded(
                    batch_id, &state_key, changed, version,
                ));
                SettleOutcome::Loaded { changed, version }
            }
            Err(error) => self.fold_failure(batch_id, &state_key, error),
        };

        self.state.settle_one();
        let remaining = self.state.remaining();
        debug!(batch = %batch_id, key = %state_key, remaining, "request settled");

        if !self.state.loading() {
            self.finish_batch(batch_id);
        }

        SettleReport {
            batch_id: batch_id.to_string(),
            state_key,
            remaining,
            outcome: settle,
        }
    }

    fn fold_failure(&mut self, batch_id: &str, state_key: &str, error: FetchError) -> SettleOutcome {
        if self.config.render_bad_requests()
            && let Some(status) = error.status()
            && renderable_bad_request(status)
        {
            let body = error.body().cloned().unwrap_or(serde_json::Value::Null);
            let (changed, version) = self.state.record_success(state_key, body);
            self.emit(LoaderEvent::endpoint_loaded(
                batch_id, state_key, changed, version,
            ));
            return SettleOutcome::StoredBadRequest { status };
        }

        let failure = EndpointFailure::from_fetch(state_key, &error);
        let message = failure.message.clone();
        self.emit(LoaderEvent::endpoint_failed(
            batch_id,
            state_key,
            failure.status,
            message.clone(),
        ));
        self.state.record_failure(failure);
        SettleOutcome::Failed { message }
    }

    fn finish_batch(&mut self, batch_id: &str) {
        self.batch = None;
        let failures = self.state.failures().len();
        self.emit(LoaderEvent::batch_settled(batch_id, failures));
        if failures == 0
            && let Some(hook) = self.on_all_settled.as_ref()
        {
            hook(&self.state.snapshot());
        }
    }

    fn abort_active_batch(&mut self) {
        if let Some(batch) = self.batch.take() {
            let outstanding = self.state.remaining();
            debug!(batch = %batch.id(), outstanding, "aborting in-flight batch");
            self.emit(LoaderEvent::batch_aborted(batch.id(), outstanding));
            // Dropping the batch aborts its JoinSet and closes the outcome
            // channel; anything still in flight is now unroutable.
            drop(batch);
        }
    }

    fn emit(&mut self, event: LoaderEvent) {
        for sink in self.sinks.iter_mut() {
            if let Err(e) = sink.handle(&event) {
                debug!(error = %e, "event sink rejected event");
            }
        }
    }
}
