//! Pipeline configuration.
//!
//! Defaults reproduce the classic directory layout relative to the working directory:
//!
//! ```toml
//! source_dir = "files"
//! archive_dir = "processed_files"
//! lookup_path = "lookup/Areas_in_blore.xlsx"
//! output_dir = "output"
//! registry_path = "processed_files.txt"
//! expected_extension = "csv"
//!
//! [execution]
//! chunk_size = 4096
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{PipelineError, PipelineResult};
use crate::execution::ExecutionOptions;
use crate::observability::Severity;

/// Everything a [`crate::pipeline::Pipeline`] run needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory scanned (non-recursively) for candidate files.
    pub source_dir: PathBuf,
    /// Where processed (or failed) source files are moved.
    pub archive_dir: PathBuf,
    /// Tabular file with an `Area` column.
    pub lookup_path: PathBuf,
    /// Workbook sheet holding the lookup; first sheet if unset.
    pub lookup_sheet: Option<String>,
    /// Root of the per-file output directories.
    pub output_dir: PathBuf,
    /// Newline-delimited processed-file registry.
    pub registry_path: PathBuf,
    /// Extension (without dot, case-insensitive) a candidate must have.
    pub expected_extension: String,
    /// Optional audit file receiving one line per pipeline event.
    pub audit_log: Option<PathBuf>,
    /// Failures at or above this severity are raised as alerts.
    #[serde(with = "severity_name")]
    pub alert_at_or_above: Severity,
    pub execution: ExecutionOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("files"),
            archive_dir: PathBuf::from("processed_files"),
            lookup_path: PathBuf::from("lookup/Areas_in_blore.xlsx"),
            lookup_sheet: None,
            output_dir: PathBuf::from("output"),
            registry_path: PathBuf::from("processed_files.txt"),
            expected_extension: "csv".to_string(),
            audit_log: None,
            alert_at_or_above: Severity::Critical,
            execution: ExecutionOptions::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file; missing keys take their defaults.
    pub fn from_toml_file(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> PipelineResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| PipelineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no run could succeed with.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.expected_extension.trim_start_matches('.').is_empty() {
            return Err(PipelineError::Config(
                "expected_extension must not be empty".to_string(),
            ));
        }
        if self.source_dir == self.archive_dir {
            return Err(PipelineError::Config(
                "archive_dir must differ from source_dir".to_string(),
            ));
        }
        Ok(())
    }
}

mod severity_name {
    use serde::{Deserialize, Deserializer};

    use crate::observability::Severity;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Severity, D::Error> {
        let s = String::deserialize(d)?;
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "critical" => Ok(Severity::Critical),
            other => Err(serde::de::Error::custom(format!(
                "unknown severity '{other}' (expected info/warning/error/critical)"
            ))),
        }
    }
}
