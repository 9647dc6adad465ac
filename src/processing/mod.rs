//! In-memory record-set operations.
//!
//! The processing layer operates on [`crate::types::DataSet`] values produced by ingestion and
//! is the capability surface the normalizer and classifier are written against:
//!
//! - [`filter_any_null()`]: rows with a null in any of the given columns
//! - [`with_column()`]: derive (or replace) a single column
//! - [`project()`]: keep a subset of columns
//! - [`group_by_aggregate()`]: grouped string join
//!
//! ## Example: derive → filter → aggregate
//!
//! ```rust
//! use listing_pipeline::processing::{filter_any_null, group_by_aggregate, with_column, Aggregation};
//! use listing_pipeline::types::{DataSet, DataType, Field, Schema, Value};
//!
//! let schema = Schema::new(vec![
//!     Field::new("row_num", DataType::Int64),
//!     Field::new("phone", DataType::Utf8),
//! ]);
//! let ds = DataSet::new(
//!     schema,
//!     vec![
//!         vec![Value::Int64(0), Value::Utf8("08041714161".to_string())],
//!         vec![Value::Int64(1), Value::Null],
//!         vec![Value::Int64(2), Value::Null],
//!     ],
//! );
//!
//! let missing = filter_any_null(&ds, &["phone"]);
//! let tagged = with_column(&missing, Field::new("issue", DataType::Utf8), |_| {
//!     Value::Utf8("null".to_string())
//! });
//! let summary = group_by_aggregate(&tagged, "issue", &[(Aggregation::join("row_num", ","), "ids")])
//!     .unwrap();
//! assert_eq!(summary.rows[0][1], Value::Utf8("1,2".to_string()));
//! ```

pub mod aggregate;
pub mod derive;
pub mod filter;

pub use aggregate::{group_by_aggregate, Aggregation};
pub use derive::{project, with_column};
pub use filter::filter_any_null;
