//! Batch loading: concurrent endpoint fan-out with cancellation-safe folds.
//!
//! The loader is built around three pieces:
//!
//! - **[`EndpointLoader`]**: owns the state, activates batches, folds
//!   settlements, broadcasts events, fires the settled hook
//! - **`Batch`** (internal): the spawned request tasks plus their per-batch
//!   outcome channel; dropping it is cancellation
//! - **[`SettleReport`]/[`SettleOutcome`]**: what each settlement did
//!
//! One loader drives one batch at a time. Activating a new batch while the
//! previous one is in flight aborts it; the old batch's responses can no
//! longer reach state because both their tasks and their channel are gone.
//!
//! # Usage
//!
//! ```rust,no_run
//! use tributary::client::HttpClient;
//! use tributary::config::LoaderConfig;
//! use tributary::descriptor::EndpointDescriptor;
//! use tributary::loader::EndpointLoader;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LoaderConfig::new("https://sentry.example.com");
//! let client = HttpClient::from_config(&config)?;
//! let mut loader = EndpointLoader::new(client, config);
//!
//! let snapshot = loader
//!     .load(vec![EndpointDescriptor::get("projects", "/api/0/projects/")?])
//!     .await?;
//! println!("loaded {} key(s)", snapshot.data.len());
//! # Ok(())
//! # }
//! ```

mod batch;
pub mod runner;

pub use runner::{EndpointLoader, LoaderError, SettleOutcome, SettleReport, SettledHook};
