//! CSV ingestion implementation.

use std::path::Path;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{DataSet, DataType, Field, Schema, Value};

/// Ingest a CSV file into an in-memory [`DataSet`].
///
/// Rules:
///
/// - CSV must have headers.
/// - Headers must contain all `required` fields (order can differ).
/// - The output keeps every header column in file order. Required fields are parsed according
///   to their schema type; every other column is carried through as [`DataType::Utf8`].
/// - Text cells are kept exactly as read (no trimming); only empty cells become
///   [`Value::Null`]. Typed (non-text) fields are parsed from the trimmed cell.
/// - Short rows are tolerated; missing trailing cells are null.
pub fn ingest_csv_from_path(path: impl AsRef<Path>, required: &Schema) -> PipelineResult<DataSet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    ingest_csv_from_reader(&mut rdr, required)
}

/// Ingest CSV data from an existing CSV reader.
pub fn ingest_csv_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
    required: &Schema,
) -> PipelineResult<DataSet> {
    let headers = rdr.headers()?.clone();

    for field in &required.fields {
        if !headers.iter().any(|h| h.trim() == field.name) {
            return Err(PipelineError::SchemaMismatch {
                message: format!(
                    "missing required column '{field}'. headers={:?}",
                    headers.iter().collect::<Vec<_>>(),
                    field = field.name
                ),
            });
        }
    }

    let schema = Schema::new(
        headers
            .iter()
            .map(|h| {
                let name = h.trim();
                let data_type = required
                    .index_of(name)
                    .map(|i| required.fields[i].data_type)
                    .unwrap_or(DataType::Utf8);
                Field::new(name, data_type)
            })
            .collect(),
    );

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for (row_idx0, result) in rdr.records().enumerate() {
        // Report 1-based row number for users; +1 again because header is row 1.
        let user_row = row_idx0 + 2;
        let record = result?;

        let mut row: Vec<Value> = Vec::with_capacity(schema.fields.len());
        for (csv_idx, field) in schema.fields.iter().enumerate() {
            let raw = record.get(csv_idx).unwrap_or("");
            row.push(parse_typed_value(user_row, &field.name, field.data_type, raw)?);
        }
        rows.push(row);
    }

    Ok(DataSet::new(schema, rows))
}

fn parse_typed_value(
    row: usize,
    column: &str,
    data_type: DataType,
    raw: &str,
) -> PipelineResult<Value> {
    if raw.is_empty() {
        return Ok(Value::Null);
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() && data_type != DataType::Utf8 {
        return Ok(Value::Null);
    }

    match data_type {
        DataType::Utf8 => Ok(Value::Utf8(raw.to_owned())),
        DataType::Int64 => trimmed.parse::<i64>().map(Value::Int64).map_err(|e| {
            PipelineError::ParseError {
                row,
                column: column.to_owned(),
                raw: raw.to_owned(),
                message: e.to_string(),
            }
        }),
        DataType::Bool => parse_bool(trimmed).map(Value::Bool).map_err(|message| {
            PipelineError::ParseError {
                row,
                column: column.to_owned(),
                raw: raw.to_owned(),
                message,
            }
        }),
    }
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Ok(true),
        "false" | "f" | "0" | "no" | "n" => Ok(false),
        _ => Err("expected bool (true/false/1/0/yes/no)".to_string()),
    }
}
