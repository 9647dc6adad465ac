//! `listing-pipeline` validates batches of restaurant-listing CSV files.
//!
//! A run scans a source directory and drives each file through admission, field
//! normalization and classification, then writes four artifacts per file:
//!
//! - `a.out`: records with `name`, `phone` and `location` all present
//! - `b.bad`: records missing any of them
//! - `b.bad_metadata.csv`: the rejected row ids, grouped by issue type
//! - `not_valid_location.bad`: records whose `location` is not a known area, whether
//!   accepted or rejected
//!
//! Finished files are recorded in a processed-file registry so re-runs skip them, and every
//! admitted file is moved to an archive directory.
//!
//! ## Quick example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use listing_pipeline::config::PipelineConfig;
//! use listing_pipeline::lookup::LocationLookup;
//! use listing_pipeline::pipeline::Pipeline;
//! use listing_pipeline::registry::InMemoryRegistry;
//!
//! # fn main() -> Result<(), listing_pipeline::PipelineError> {
//! let lookup: LocationLookup = ["BTM", "Banashankari"].into_iter().collect();
//! let pipeline = Pipeline::new(
//!     PipelineConfig::default(),
//!     Arc::new(InMemoryRegistry::new()),
//!     lookup,
//! )?;
//! let summary = pipeline.run()?;
//! println!("processed={} skipped={}", summary.processed(), summary.skipped());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`pipeline`]: the per-file state machine and run summary
//! - [`admission`], [`registry`]: candidate discovery, admission checks, processed-file registry
//! - [`normalize`], [`classify`], [`output`]: cleaning rules, partitioning, artifact writing
//! - [`lookup`]: the location lookup set
//! - [`ingestion`], [`types`], [`processing`], [`execution`]: the in-memory record-set engine
//! - [`config`], [`logging`], [`observability`], [`error`]: ambient plumbing

pub mod admission;
pub mod classify;
pub mod config;
pub mod error;
pub mod execution;
pub mod housekeeping;
pub mod ingestion;
pub mod listing;
pub mod logging;
pub mod lookup;
pub mod normalize;
pub mod observability;
pub mod output;
pub mod pipeline;
pub mod processing;
pub mod registry;
pub mod types;

pub use error::{PipelineError, PipelineResult};
