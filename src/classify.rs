//! Record classification: completeness partition plus the location-validity view.

use serde::Serialize;

use crate::execution::ExecutionEngine;
use crate::listing::{LOCATION, NAME, PHONE, ROW_NUM, VALID_LOCATION};
use crate::lookup::LocationLookup;
use crate::processing::{filter_any_null, group_by_aggregate, with_column, Aggregation};
use crate::types::{DataSet, DataType, Field, Schema, Value};

/// Issue type recorded for records rejected because a required field is null.
pub const NULL_ISSUE: &str = "null";
pub const ISSUE_TYPE_COLUMN: &str = "Type_of_issue";
pub const ROW_LIST_COLUMN: &str = "Row_num_list";

/// Fields that must be non-null (after normalization) for a record to be accepted.
pub const REQUIRED_NON_NULL: [&str; 3] = [NAME, PHONE, LOCATION];

/// The partitions produced for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Records with every required field present.
    pub accepted: DataSet,
    /// Records with at least one required field null.
    pub rejected: DataSet,
    /// Records whose raw location is not in the lookup, regardless of acceptance.
    pub invalid_location: DataSet,
    /// One row per issue type: `Type_of_issue`, `Row_num_list`.
    pub reject_metadata: DataSet,
}

/// Row counts for one classified file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassificationCounts {
    pub cleaned: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub invalid_location: usize,
}

impl Classification {
    pub fn counts(&self) -> ClassificationCounts {
        ClassificationCounts {
            cleaned: self.accepted.row_count() + self.rejected.row_count(),
            accepted: self.accepted.row_count(),
            rejected: self.rejected.row_count(),
            invalid_location: self.invalid_location.row_count(),
        }
    }
}

/// Tag every record with `valid_location` and split the set.
///
/// Location validity reads the `location` column as ingested; completeness reads the
/// normalized `name` and `phone`. Neither predicate influences the other.
pub fn classify(
    engine: &ExecutionEngine,
    cleaned: &DataSet,
    lookup: &LocationLookup,
) -> Classification {
    let loc_idx = cleaned.schema.index_of(LOCATION);
    let tagged = engine.with_column_parallel(
        cleaned,
        Field::new(VALID_LOCATION, DataType::Bool),
        |row| {
            let location = loc_idx.and_then(|i| row.get(i)).and_then(Value::as_str);
            Value::Bool(lookup.contains(location))
        },
    );

    let valid_idx = tagged.schema.index_of(VALID_LOCATION);
    let invalid_location = engine.filter_parallel(&tagged, |row| {
        !matches!(valid_idx.and_then(|i| row.get(i)), Some(Value::Bool(true)))
    });

    let rejected = filter_any_null(&tagged, &REQUIRED_NON_NULL);
    let required_idxs: Vec<Option<usize>> = REQUIRED_NON_NULL
        .iter()
        .map(|c| tagged.schema.index_of(c))
        .collect();
    let accepted = engine.filter_parallel(&tagged, |row| {
        required_idxs
            .iter()
            .all(|idx| idx.and_then(|i| row.get(i)).is_some_and(|v| !v.is_null()))
    });

    let reject_metadata = reject_metadata(&rejected);

    Classification {
        accepted,
        rejected,
        invalid_location,
        reject_metadata,
    }
}

/// Summarize rejected records as `(Type_of_issue, Row_num_list)` rows.
///
/// Every rejection is of the `"null"` type today; an empty input yields an empty summary.
pub fn reject_metadata(rejected: &DataSet) -> DataSet {
    let tagged = with_column(rejected, Field::new(ISSUE_TYPE_COLUMN, DataType::Utf8), |_| {
        Value::Utf8(NULL_ISSUE.to_string())
    });
    group_by_aggregate(
        &tagged,
        ISSUE_TYPE_COLUMN,
        &[(Aggregation::join(ROW_NUM, ","), ROW_LIST_COLUMN)],
    )
    .unwrap_or_else(empty_metadata)
}

fn empty_metadata() -> DataSet {
    DataSet::new(
        Schema::new(vec![
            Field::new(ISSUE_TYPE_COLUMN, DataType::Utf8),
            Field::new(ROW_LIST_COLUMN, DataType::Utf8),
        ]),
        Vec::new(),
    )
}
