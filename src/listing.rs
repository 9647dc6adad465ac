//! Column names and the raw reader for restaurant-listing files.

use std::path::Path;

use crate::error::PipelineResult;
use crate::ingestion::csv::ingest_csv_from_path;
use crate::types::{DataSet, DataType, Field, Schema, Value};

pub const NAME: &str = "name";
pub const PHONE: &str = "phone";
pub const LOCATION: &str = "location";
pub const ADDRESS: &str = "address";
pub const REVIEWS_LIST: &str = "reviews_list";
pub const DISH_LIKED: &str = "dish_liked";
pub const CUISINES: &str = "cuisines";

pub const ROW_NUM: &str = "row_num";
pub const ADDRESS_CLEAN: &str = "address_clean";
pub const REVIEW_1: &str = "review_1";
pub const REVIEW_2: &str = "review_2";
pub const DISH_1: &str = "dish_1";
pub const DISH_2: &str = "dish_2";
pub const CUISINE_1: &str = "cuisine_1";
pub const CUISINE_2: &str = "cuisine_2";
pub const VALID_LOCATION: &str = "valid_location";

/// Raw multi-value columns replaced by their derived pairs in the accepted output.
pub const RAW_DERIVED_SOURCES: [&str; 4] = [ADDRESS, REVIEWS_LIST, DISH_LIKED, CUISINES];

/// Columns that must be present in every listing file's header.
pub fn required_schema() -> Schema {
    Schema::new(
        [NAME, PHONE, LOCATION, ADDRESS, REVIEWS_LIST, DISH_LIKED, CUISINES]
            .into_iter()
            .map(|c| Field::new(c, DataType::Utf8))
            .collect(),
    )
}

/// Read a listing file and tag every row with a `row_num` identifier.
///
/// Row ids are the 0-based data-row index, so they are unique within the file.
pub fn read_listing(path: impl AsRef<Path>) -> PipelineResult<DataSet> {
    let raw = ingest_csv_from_path(path, &required_schema())?;
    Ok(with_row_ids(&raw))
}

/// Append a `row_num` column numbering rows from zero.
pub fn with_row_ids(dataset: &DataSet) -> DataSet {
    let mut next = 0i64;
    dataset.with_column(Field::new(ROW_NUM, DataType::Int64), |_| {
        let id = next;
        next += 1;
        Value::Int64(id)
    })
}
