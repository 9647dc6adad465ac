//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`ingest_from_path`] (from [`unified`]), which picks a reader by
//! file extension (or an explicit [`IngestionOptions::format`]) and materializes the file into
//! an in-memory [`crate::types::DataSet`].
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - `excel` (feature `excel`)

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod unified;

pub use unified::{ingest_from_path, IngestionFormat, IngestionOptions};
