//! Candidate discovery and admission checks.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PipelineResult;
use crate::registry::ProcessedRegistry;

/// A file found in the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// File name (no directory component); the registry key.
    pub name: String,
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Extension without the dot, as found on disk.
    pub extension: Option<String>,
}

impl CandidateFile {
    /// Build a candidate from a path, reading its size from the file system.
    pub fn from_path(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let size = fs::metadata(path)?.len();
        Ok(Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: path.to_path_buf(),
            size,
            extension: path
                .extension()
                .map(|e| e.to_string_lossy().into_owned()),
        })
    }
}

/// Lists regular files directly inside `dir`, sorted by name. Subdirectories are ignored.
pub fn discover(dir: impl AsRef<Path>) -> PipelineResult<Vec<CandidateFile>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        out.push(CandidateFile::from_path(entry.path())?);
    }
    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}

/// Why a candidate was not admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyProcessed,
    Empty,
    WrongExtension { found: Option<String> },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyProcessed => f.write_str("already processed"),
            SkipReason::Empty => f.write_str("file is empty"),
            SkipReason::WrongExtension { found: Some(ext) } => {
                write!(f, "unexpected extension '.{ext}'")
            }
            SkipReason::WrongExtension { found: None } => f.write_str("file has no extension"),
        }
    }
}

/// Outcome of [`admit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Skipped(SkipReason),
}

/// Runs the admission checks in order, stopping at the first failure:
/// known to the registry, zero bytes, extension other than `expected_extension`
/// (case-insensitive).
pub fn admit(
    candidate: &CandidateFile,
    registry: &dyn ProcessedRegistry,
    expected_extension: &str,
) -> PipelineResult<Admission> {
    if registry.is_known(&candidate.name)? {
        return Ok(Admission::Skipped(SkipReason::AlreadyProcessed));
    }
    if candidate.size == 0 {
        return Ok(Admission::Skipped(SkipReason::Empty));
    }
    let expected = expected_extension.trim_start_matches('.');
    match &candidate.extension {
        Some(ext) if ext.eq_ignore_ascii_case(expected) => Ok(Admission::Admitted),
        found => Ok(Admission::Skipped(SkipReason::WrongExtension {
            found: found.clone(),
        })),
    }
}
