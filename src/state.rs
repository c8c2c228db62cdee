//! Loader state: keyed slots, batch bookkeeping, and snapshots.
//!
//! One [`LoaderState`] is exclusively owned by one loader instance. Each
//! endpoint's merged response lives in a slot keyed by the descriptor's state
//! key; slots carry a version that bumps only when a merge actually produced
//! a new root pointer. Failures accumulate per batch and reset when the next
//! batch starts.
//!
//! Snapshots are cheap: slot values are `Arc`-shared, so
//! [`LoaderState::snapshot`] clones pointers, not trees.
//!
//! # Examples
//!
//! ```rust
//! use tributary::state::{BatchPhase, LoaderState};
//! use serde_json::json;
//!
//! let mut state = LoaderState::new();
//! state.begin_batch(1);
//! assert_eq!(state.phase(), BatchPhase::Loading);
//!
//! let (changed, version) = state.record_success("issues", json!([{"id": 1}]));
//! assert!(changed);
//! assert_eq!(version, 1);
//! state.settle_one();
//!
//! let snapshot = state.snapshot();
//! assert_eq!(snapshot.phase, BatchPhase::Settled);
//! assert_eq!(snapshot.get("issues").unwrap().to_value(), json!([{"id": 1}]));
//! ```

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::errors::{EndpointFailure, consolidate};
use crate::merge::{SharedValue, structural_merge_value};

/// Lifecycle of the loader's current batch.
///
/// `Idle → Loading → Settled`, with `Settled → Loading` (or a mid-flight
/// `Loading → Loading` restart) whenever a new descriptor set activates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BatchPhase {
    /// No batch has been started (or the last one was aborted).
    #[default]
    Idle,
    /// At least one request of the current batch is outstanding.
    Loading,
    /// Every request of the current batch has settled.
    Settled,
}

/// One endpoint's slot: the merged value plus a change-counting version.
#[derive(Clone, Debug)]
struct Slot {
    value: Arc<SharedValue>,
    version: u32,
}

/// Mutable state owned by a single loader instance.
#[derive(Clone, Debug, Default)]
pub struct LoaderState {
    slots: FxHashMap<String, Slot>,
    failures: Vec<EndpointFailure>,
    remaining: usize,
    phase: BatchPhase,
}

impl LoaderState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new batch of `expected` requests.
    ///
    /// Failures and the remaining count reset; slot values survive as merge
    /// baselines so repolled, value-identical data keeps its identity. An
    /// empty batch settles immediately.
    pub fn begin_batch(&mut self, expected: usize) {
        self.failures.clear();
        self.remaining = expected;
        self.phase = if expected == 0 {
            BatchPhase::Settled
        } else {
            BatchPhase::Loading
        };
    }

    /// Merge a successful response body into its slot.
    ///
    /// Returns `(changed, version)`: whether the merge produced a new root
    /// pointer, and the slot's version afterwards.
    pub fn record_success(&mut self, state_key: &str, body: Value) -> (bool, u32) {
        match self.slots.get_mut(state_key) {
            Some(slot) => {
                let merged = structural_merge_value(&slot.value, body);
                let changed = !Arc::ptr_eq(&merged, &slot.value);
                if changed {
                    slot.value = merged;
                    slot.version += 1;
                }
                (changed, slot.version)
            }
            None => {
                self.slots.insert(
                    state_key.to_string(),
                    Slot {
                        value: SharedValue::from_value(body),
                        version: 1,
                    },
                );
                (true, 1)
            }
        }
    }

    /// Record a failed endpoint. The slot, if any, keeps its previous value.
    pub fn record_failure(&mut self, failure: EndpointFailure) {
        self.failures.push(failure);
    }

    /// Mark one request of the current batch as settled.
    ///
    /// The remaining count never underflows; once it reaches zero the phase
    /// flips to [`BatchPhase::Settled`].
    pub fn settle_one(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 && self.phase == BatchPhase::Loading {
            self.phase = BatchPhase::Settled;
        }
    }

    /// Cancel the current batch: nothing further will settle.
    pub fn cancel_batch(&mut self) {
        self.remaining = 0;
        self.phase = BatchPhase::Idle;
    }

    /// Drop all slots and failures, returning to a pristine state.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.failures.clear();
        self.remaining = 0;
        self.phase = BatchPhase::Idle;
    }

    #[must_use]
    pub fn phase(&self) -> BatchPhase {
        self.phase
    }

    /// True while any request of the current batch is outstanding.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.remaining > 0
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    #[must_use]
    pub fn value(&self, state_key: &str) -> Option<&Arc<SharedValue>> {
        self.slots.get(state_key).map(|slot| &slot.value)
    }

    #[must_use]
    pub fn version(&self, state_key: &str) -> Option<u32> {
        self.slots.get(state_key).map(|slot| slot.version)
    }

    #[must_use]
    pub fn failures(&self) -> &[EndpointFailure] {
        &self.failures
    }

    /// Take a point-in-time view. Slot values are pointer-shared with the
    /// live state, so this is O(keys), not O(data).
    #[must_use]
    pub fn snapshot(&self) -> LoaderSnapshot {
        LoaderSnapshot {
            phase: self.phase,
            remaining: self.remaining,
            data: self
                .slots
                .iter()
                .map(|(key, slot)| (key.clone(), Arc::clone(&slot.value)))
                .collect(),
            versions: self
                .slots
                .iter()
                .map(|(key, slot)| (key.clone(), slot.version))
                .collect(),
            failures: self.failures.clone(),
        }
    }
}

/// Immutable view of loader state at one point in time.
#[derive(Clone, Debug)]
pub struct LoaderSnapshot {
    pub phase: BatchPhase,
    /// Outstanding requests in the batch this snapshot was taken from.
    pub remaining: usize,
    /// Merged response value per state key.
    pub data: FxHashMap<String, Arc<SharedValue>>,
    /// Slot version per state key.
    pub versions: FxHashMap<String, u32>,
    /// Failures recorded by the batch so far.
    pub failures: Vec<EndpointFailure>,
}

impl LoaderSnapshot {
    #[must_use]
    pub fn loading(&self) -> bool {
        self.remaining > 0
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    #[must_use]
    pub fn get(&self, state_key: &str) -> Option<&Arc<SharedValue>> {
        self.data.get(state_key)
    }

    #[must_use]
    pub fn version(&self, state_key: &str) -> Option<u32> {
        self.versions.get(state_key).copied()
    }

    /// The consolidated, de-duplicated failure text for this snapshot.
    #[must_use]
    pub fn consolidated_failures(&self) -> String {
        consolidate(&self.failures)
    }

    /// Derive what the owning layer should present.
    ///
    /// Loading while anything is outstanding; the consolidated failure text
    /// once settled with failures; otherwise the accumulated data. Partial
    /// success is indistinguishable from full success here; the caller
    /// decides how to react to missing keys.
    #[must_use]
    pub fn view(&self) -> BatchView<'_> {
        if self.loading() {
            BatchView::Loading {
                remaining: self.remaining,
            }
        } else if self.has_failures() {
            BatchView::Failed {
                message: self.consolidated_failures(),
            }
        } else {
            BatchView::Ready { data: &self.data }
        }
    }
}

/// What a settled (or still-loading) snapshot asks the owner to present.
#[derive(Debug, PartialEq)]
pub enum BatchView<'a> {
    Loading {
        remaining: usize,
    },
    Failed {
        message: String,
    },
    Ready {
        data: &'a FxHashMap<String, Arc<SharedValue>>,
    },
}
