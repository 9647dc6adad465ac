#![cfg(feature = "excel")]

//! Excel workbook ingestion, used for the location lookup.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};

use crate::error::{PipelineError, PipelineResult};
use crate::types::{DataSet, DataType, Schema, Value};

/// Ingest one sheet of a workbook (`.xlsx`, `.xls`, `.ods`, etc.) into an in-memory `DataSet`.
///
/// Behavior:
/// - Picks `sheet_name` if provided; otherwise uses the first sheet in the workbook
/// - Detects the first non-empty row as the header row
/// - Validates that all schema fields exist as headers
/// - Reads remaining rows, projecting to the schema fields only
pub fn ingest_excel_from_path(
    path: impl AsRef<Path>,
    sheet_name: Option<&str>,
    schema: &Schema,
) -> PipelineResult<DataSet> {
    let sheets: Option<Vec<&str>> = sheet_name.map(|s| vec![s]);
    match sheets {
        Some(names) => ingest_excel_workbook_from_path(path, Some(&names), schema),
        None => {
            let mut workbook = open_workbook_auto(path)?;
            let first = workbook.sheet_names().first().cloned().ok_or_else(|| {
                PipelineError::SchemaMismatch {
                    message: "workbook has no sheets".to_string(),
                }
            })?;
            let range = workbook.worksheet_range(&first)?;
            let rows = ingest_sheet_range(&first, &range, schema)?;
            Ok(DataSet::new(schema.clone(), rows))
        }
    }
}

/// Ingest several sheets and concatenate their rows.
///
/// - If `sheet_names` is `None`, ingests **all sheets** in workbook order.
/// - All selected sheets must carry the schema's header columns.
pub fn ingest_excel_workbook_from_path(
    path: impl AsRef<Path>,
    sheet_names: Option<&[&str]>,
    schema: &Schema,
) -> PipelineResult<DataSet> {
    let mut workbook = open_workbook_auto(path)?;

    let sheets: Vec<String> = match sheet_names {
        Some(names) => names.iter().map(|s| s.to_string()).collect(),
        None => workbook.sheet_names().to_vec(),
    };
    if sheets.is_empty() {
        return Err(PipelineError::SchemaMismatch {
            message: "workbook has no sheets".to_string(),
        });
    }

    let mut all_rows: Vec<Vec<Value>> = Vec::new();
    for sheet in sheets {
        let range = workbook.worksheet_range(&sheet)?;
        all_rows.extend(ingest_sheet_range(&sheet, &range, schema)?);
    }

    Ok(DataSet::new(schema.clone(), all_rows))
}

fn ingest_sheet_range(
    sheet: &str,
    range: &calamine::Range<Data>,
    schema: &Schema,
) -> PipelineResult<Vec<Vec<Value>>> {
    let (header_row_idx, col_idxs) = build_header_projection(range, schema).map_err(|e| match e {
        PipelineError::SchemaMismatch { message } => PipelineError::SchemaMismatch {
            message: format!("sheet '{sheet}': {message}"),
        },
        other => other,
    })?;

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for (idx0, row) in range.rows().enumerate().skip(header_row_idx + 1) {
        // Skip blank spacer rows below the header.
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        let user_row = idx0 + 1;

        let mut out_row: Vec<Value> = Vec::with_capacity(schema.fields.len());
        for (field, &col_idx) in schema.fields.iter().zip(col_idxs.iter()) {
            let cell = row.get(col_idx).unwrap_or(&Data::Empty);
            let col_label = format!("{sheet}:{name}", name = field.name);
            out_row.push(convert_cell(user_row, &col_label, field.data_type, cell)?);
        }
        rows.push(out_row);
    }

    Ok(rows)
}

fn build_header_projection(
    range: &calamine::Range<Data>,
    schema: &Schema,
) -> PipelineResult<(usize, Vec<usize>)> {
    let (header_row_idx, header_cells) = range
        .rows()
        .enumerate()
        .find(|(_, row)| row.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|(idx0, row)| (idx0, row.iter().map(cell_to_string).collect::<Vec<_>>()))
        .ok_or_else(|| PipelineError::SchemaMismatch {
            message: "sheet has no non-empty rows (no header row found)".to_string(),
        })?;

    let mut col_idxs: Vec<usize> = Vec::with_capacity(schema.fields.len());
    for f in &schema.fields {
        match header_cells.iter().position(|h| h.trim() == f.name) {
            Some(idx) => col_idxs.push(idx),
            None => {
                return Err(PipelineError::SchemaMismatch {
                    message: format!(
                        "missing required column '{}'. headers={:?}",
                        f.name, header_cells
                    ),
                });
            }
        }
    }

    Ok((header_row_idx, col_idxs))
}

fn cell_to_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 => (*f as i64).to_string(),
        Data::Empty => String::new(),
        _ => c.to_string(),
    }
}

fn convert_cell(row: usize, column: &str, data_type: DataType, c: &Data) -> PipelineResult<Value> {
    if matches!(c, Data::Empty) {
        return Ok(Value::Null);
    }

    let parse_err = |message: &str| PipelineError::ParseError {
        row,
        column: column.to_string(),
        raw: c.to_string(),
        message: message.to_string(),
    };

    match data_type {
        DataType::Utf8 => {
            let s = cell_to_string(c);
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(Value::Null)
            } else {
                Ok(Value::Utf8(trimmed.to_string()))
            }
        }
        DataType::Bool => match c {
            Data::Bool(b) => Ok(Value::Bool(*b)),
            Data::Int(i) => Ok(Value::Bool(*i != 0)),
            _ => Err(parse_err("expected bool")),
        },
        DataType::Int64 => match c {
            Data::Int(i) => Ok(Value::Int64(*i)),
            Data::Float(f) if f.fract() == 0.0 => Ok(Value::Int64(*f as i64)),
            Data::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int64)
                .map_err(|e| parse_err(&e.to_string())),
            _ => Err(parse_err("expected integer")),
        },
    }
}
