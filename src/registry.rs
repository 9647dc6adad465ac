//! Processed-file registry.
//!
//! The registry is the only state that survives between runs: once a file name is recorded it
//! is never admitted again. The driver talks to it only through [`ProcessedRegistry`].

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::{PipelineError, PipelineResult};

/// Append-only set of processed file names.
pub trait ProcessedRegistry: Send + Sync {
    /// Returns whether `name` has already been recorded. A missing store is an empty registry.
    fn is_known(&self, name: &str) -> PipelineResult<bool>;

    /// Records `name`. Recording a known name is a no-op.
    fn record(&self, name: &str) -> PipelineResult<()>;
}

/// Newline-delimited registry file.
///
/// Appends are serialized through an internal lock, so one instance can be shared across
/// threads.
#[derive(Debug)]
pub struct FileRegistry {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileRegistry {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn registry_err(&self, source: io::Error) -> PipelineError {
        PipelineError::Registry {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn load(&self) -> PipelineResult<HashSet<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(text
                .lines()
                .map(str::trim_end)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(HashSet::new()),
            Err(e) => Err(self.registry_err(e)),
        }
    }
}

impl ProcessedRegistry for FileRegistry {
    fn is_known(&self, name: &str) -> PipelineResult<bool> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.contains(name))
    }

    fn record(&self, name: &str) -> PipelineResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.load()?.contains(name) {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.registry_err(e))?;
        }
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.registry_err(e))?;
        writeln!(f, "{name}").map_err(|e| self.registry_err(e))
    }
}

/// Registry held in memory only; useful for dry runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    names: Mutex<HashSet<String>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded names, sorted.
    pub fn names(&self) -> Vec<String> {
        let names = self.names.lock().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<String> = names.iter().cloned().collect();
        out.sort();
        out
    }
}

impl ProcessedRegistry for InMemoryRegistry {
    fn is_known(&self, name: &str) -> PipelineResult<bool> {
        Ok(self
            .names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(name))
    }

    fn record(&self, name: &str) -> PipelineResult<()> {
        self.names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{FileRegistry, InMemoryRegistry, ProcessedRegistry};
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn tmp_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir()
            .join(format!("listing-pipeline-registry-{name}-{nanos}"))
            .join("processed_files.txt")
    }

    #[test]
    fn missing_file_is_an_empty_registry() {
        let reg = FileRegistry::new(tmp_path("missing"));
        assert!(!reg.is_known("zomato_1.csv").unwrap());
    }

    #[test]
    fn record_appends_once_and_is_visible_to_new_instances() {
        let path = tmp_path("append");
        let reg = FileRegistry::new(&path);
        reg.record("zomato_1.csv").unwrap();
        reg.record("zomato_1.csv").unwrap();
        reg.record("zomato_2.csv").unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "zomato_1.csv\nzomato_2.csv\n");

        let reopened = FileRegistry::new(&path);
        assert!(reopened.is_known("zomato_2.csv").unwrap());
        assert!(!reopened.is_known("zomato_3.csv").unwrap());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn names_match_whole_lines_only() {
        let reg = InMemoryRegistry::new();
        reg.record("zomato_10.csv").unwrap();
        assert!(!reg.is_known("zomato_1.csv").unwrap());
        assert_eq!(reg.names(), vec!["zomato_10.csv".to_string()]);
    }
}
