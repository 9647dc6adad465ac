//! Column derivation and projection for [`crate::types::DataSet`].

use crate::types::{DataSet, Field, Value};

/// Returns a new [`DataSet`] with `field` derived from each row.
///
/// This is a convenience wrapper around [`DataSet::with_column`].
pub fn with_column<F>(dataset: &DataSet, field: Field, derive: F) -> DataSet
where
    F: FnMut(&[Value]) -> Value,
{
    dataset.with_column(field, derive)
}

/// Returns a new [`DataSet`] keeping only `columns`, in order.
pub fn project<S: AsRef<str>>(dataset: &DataSet, columns: &[S]) -> DataSet {
    dataset.project(columns)
}
