//! Unified ingestion entrypoint.
//!
//! [`ingest_from_path`] reads a tabular file into an in-memory [`crate::types::DataSet`],
//! choosing the reader from [`IngestionOptions::format`] or, when unset, from the file
//! extension.

use std::path::Path;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{DataSet, Schema};

use super::csv;

/// Supported ingestion formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionFormat {
    /// Comma-separated values.
    Csv,
    /// Spreadsheet/workbook formats (feature-gated behind `excel`).
    Excel,
}

impl IngestionFormat {
    /// Parse an ingestion format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }
}

/// Options controlling unified ingestion behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionOptions {
    /// If `None`, auto-detect format from file extension.
    pub format: Option<IngestionFormat>,
    /// Workbook sheet to read; `None` reads the first sheet.
    pub sheet: Option<String>,
}

/// Ingest a file, requiring every field of `schema`.
///
/// CSV input keeps all of its header columns (see [`csv::ingest_csv_from_path`]); workbook
/// input is projected to the schema fields.
///
/// ```no_run
/// use listing_pipeline::ingestion::{ingest_from_path, IngestionOptions};
/// use listing_pipeline::types::{DataType, Field, Schema};
///
/// # fn main() -> Result<(), listing_pipeline::PipelineError> {
/// let schema = Schema::new(vec![Field::new("Area", DataType::Utf8)]);
/// let ds = ingest_from_path("lookup/areas.csv", &schema, &IngestionOptions::default())?;
/// println!("rows={}", ds.row_count());
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_path(
    path: impl AsRef<Path>,
    schema: &Schema,
    options: &IngestionOptions,
) -> PipelineResult<DataSet> {
    let path = path.as_ref();
    let fmt = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };

    match fmt {
        IngestionFormat::Csv => csv::ingest_csv_from_path(path, schema),
        IngestionFormat::Excel => ingest_excel_dispatch(path, schema, options.sheet.as_deref()),
    }
}

fn infer_format_from_path(path: &Path) -> PipelineResult<IngestionFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| PipelineError::SchemaMismatch {
            message: format!(
                "cannot infer format: path has no extension ({})",
                path.display()
            ),
        })?;

    IngestionFormat::from_extension(ext).ok_or_else(|| PipelineError::SchemaMismatch {
        message: format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}

fn ingest_excel_dispatch(
    path: &Path,
    schema: &Schema,
    sheet: Option<&str>,
) -> PipelineResult<DataSet> {
    #[cfg(feature = "excel")]
    {
        super::excel::ingest_excel_from_path(path, sheet, schema)
    }

    #[cfg(not(feature = "excel"))]
    {
        let _ = (path, schema, sheet);
        Err(PipelineError::SchemaMismatch {
            message: "excel ingestion not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{infer_format_from_path, IngestionFormat};
    use std::path::Path;

    #[test]
    fn format_is_inferred_case_insensitively() {
        assert_eq!(
            infer_format_from_path(Path::new("files/zomato_1.CSV")).unwrap(),
            IngestionFormat::Csv
        );
        assert_eq!(
            infer_format_from_path(Path::new("lookup/Areas_in_blore.xlsx")).unwrap(),
            IngestionFormat::Excel
        );
    }

    #[test]
    fn unknown_or_missing_extension_is_a_schema_error() {
        let err = infer_format_from_path(Path::new("files/notes.txt")).unwrap_err();
        assert!(err.to_string().contains("cannot infer format from extension 'txt'"));
        let err = infer_format_from_path(Path::new("files/README")).unwrap_err();
        assert!(err.to_string().contains("no extension"));
    }
}
