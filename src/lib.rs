//! # Tributary: Concurrent Multi-Endpoint Data Loading
//!
//! Tributary coordinates batches of concurrent read requests, folds each
//! response into keyed state as it settles, and hands back snapshots whose
//! values keep their identity whenever repolled data comes back value-equal.
//!
//! ## Core Concepts
//!
//! - **Descriptors**: Typed `(state_key, path, options)` tuples describing one request
//! - **Batches**: One activation cycle covering a descriptor set; cancellation-safe
//! - **State**: Keyed slots with change-counting versions, snapshot-based access
//! - **Structural merge**: `Arc`-sharing merge that preserves unchanged subtree identity
//! - **Events**: Lifecycle notifications fanned out to pluggable sinks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tributary::client::HttpClient;
//! use tributary::config::LoaderConfig;
//! use tributary::descriptor::EndpointDescriptor;
//! use tributary::loader::EndpointLoader;
//! use tributary::state::BatchView;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LoaderConfig::new("https://sentry.example.com");
//! let client = HttpClient::from_config(&config)?;
//! let mut loader = EndpointLoader::new(client, config);
//!
//! let snapshot = loader
//!     .load(vec![
//!         EndpointDescriptor::get("issues", "/api/0/issues/")?.with_query("statsPeriod", "14d"),
//!         EndpointDescriptor::get("stats", "/api/0/stats/")?,
//!     ])
//!     .await?;
//!
//! match snapshot.view() {
//!     BatchView::Ready { data } => println!("issues: {}", data["issues"]),
//!     BatchView::Failed { message } => eprintln!("load failed: {message}"),
//!     BatchView::Loading { .. } => unreachable!("load() drives the batch to settlement"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Stable Identity Across Polls
//!
//! Repolling the same endpoints reuses each slot's previous value as a merge
//! baseline. A value-identical response keeps both the slot's `Arc` pointer
//! and its version; consumers watching versions (or pointers) see no change:
//!
//! ```rust
//! use std::sync::Arc;
//! use tributary::merge::{SharedValue, structural_merge};
//! use serde_json::json;
//!
//! let old = SharedValue::from_value(json!({"a": {"b": 1}, "c": {"d": 2}}));
//! let new = SharedValue::from_value(json!({"a": {"b": 9}, "c": {"d": 2}}));
//!
//! let merged = structural_merge(&old, &new);
//! assert_eq!(merged.to_value(), new.to_value());
//! assert!(Arc::ptr_eq(merged.get("c").unwrap(), old.get("c").unwrap()));
//! ```
//!
//! ## Failure Semantics
//!
//! A failed endpoint never halts its siblings: the batch always runs to
//! settlement, failures accumulate in state, and identical messages collapse
//! to one line in [`state::LoaderSnapshot::consolidated_failures`]. With
//! [`config::LoaderConfig::with_render_bad_requests`], renderable 4xx bodies
//! (400, 403, 404) store as data instead.
//!
//! ## Module Guide
//!
//! - [`descriptor`] - Request descriptors and validation
//! - [`merge`] - `SharedValue` trees and the structural merge
//! - [`state`] - Loader state, slots, snapshots, and the render view
//! - [`loader`] - The batch driver
//! - [`client`] - The `ApiClient` seam and the `reqwest` implementation
//! - [`errors`] - Recorded endpoint failures and consolidation
//! - [`events`] - Lifecycle events and sinks
//! - [`config`] - Injected, read-only configuration
//! - [`telemetry`] - Tracing subscriber setup

pub mod client;
pub mod config;
pub mod descriptor;
pub mod errors;
pub mod events;
pub mod loader;
pub mod merge;
pub mod state;
pub mod telemetry;
