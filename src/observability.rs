//! Observer hooks for per-file pipeline outcomes.
//!
//! The driver logs every transition through `tracing`; observers are the programmatic
//! counterpart, for callers that want to count, persist or alert on outcomes.

use std::error::Error as StdError;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::admission::SkipReason;
use crate::classify::ClassificationCounts;
use crate::error::PipelineError;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (the file failed).
    Error,
    /// Critical error (typically I/O or other infrastructure failures).
    Critical,
}

/// Classify an error for alerting. Anything rooted in I/O is critical.
pub fn severity_for_error(e: &PipelineError) -> Severity {
    match e {
        PipelineError::Io(_) | PipelineError::Registry { .. } => Severity::Critical,
        PipelineError::Csv(err) => match err.kind() {
            csv::ErrorKind::Io(_) => Severity::Critical,
            _ => Severity::Error,
        },
        #[cfg(feature = "excel")]
        PipelineError::Excel(err) => {
            if error_chain_contains_io(err) {
                Severity::Critical
            } else {
                Severity::Error
            }
        }
        PipelineError::Output { .. } => Severity::Critical,
        PipelineError::SchemaMismatch { .. }
        | PipelineError::ParseError { .. }
        | PipelineError::Config(_)
        | PipelineError::Json(_) => Severity::Error,
    }
}

#[cfg_attr(not(feature = "excel"), allow(dead_code))]
fn error_chain_contains_io(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<std::io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}

/// The file an event is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContext {
    pub name: String,
    pub path: PathBuf,
}

/// Observer interface for per-file outcomes. Every method defaults to a no-op.
pub trait PipelineObserver: Send + Sync {
    /// Called when admission rejects a candidate.
    fn on_skipped(&self, _ctx: &FileContext, _reason: &SkipReason) {}

    /// Called once a file's outputs are written and it is registered.
    fn on_completed(&self, _ctx: &FileContext, _counts: ClassificationCounts) {}

    /// Called when a file fails after admission.
    fn on_failed(&self, _ctx: &FileContext, _severity: Severity, _error: &PipelineError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failed`].
    fn on_alert(&self, ctx: &FileContext, severity: Severity, error: &PipelineError) {
        self.on_failed(ctx, severity, error)
    }

    /// Called after a file has been moved to the archive (or the move failed).
    fn on_archived(&self, _ctx: &FileContext, _result: Result<&Path, &PipelineError>) {}
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn PipelineObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl PipelineObserver for CompositeObserver {
    fn on_skipped(&self, ctx: &FileContext, reason: &SkipReason) {
        for o in &self.observers {
            o.on_skipped(ctx, reason);
        }
    }

    fn on_completed(&self, ctx: &FileContext, counts: ClassificationCounts) {
        for o in &self.observers {
            o.on_completed(ctx, counts);
        }
    }

    fn on_failed(&self, ctx: &FileContext, severity: Severity, error: &PipelineError) {
        for o in &self.observers {
            o.on_failed(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &FileContext, severity: Severity, error: &PipelineError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }

    fn on_archived(&self, ctx: &FileContext, result: Result<&Path, &PipelineError>) {
        for o in &self.observers {
            o.on_archived(ctx, result);
        }
    }
}

/// Emits alerts as `tracing` error events with an `alert` marker field.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_alert(&self, ctx: &FileContext, severity: Severity, error: &PipelineError) {
        tracing::error!(
            alert = true,
            file = %ctx.name,
            ?severity,
            error = %error,
            "pipeline alert"
        );
    }
}

/// Appends one line per event to a local audit file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the audit file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{} {line}", unix_ts());
        }
    }
}

impl PipelineObserver for FileObserver {
    fn on_skipped(&self, ctx: &FileContext, reason: &SkipReason) {
        self.append_line(&format!("skipped file={} reason={reason}", ctx.name));
    }

    fn on_completed(&self, ctx: &FileContext, counts: ClassificationCounts) {
        self.append_line(&format!(
            "completed file={} accepted={} rejected={} invalid_location={}",
            ctx.name, counts.accepted, counts.rejected, counts.invalid_location
        ));
    }

    fn on_failed(&self, ctx: &FileContext, severity: Severity, error: &PipelineError) {
        self.append_line(&format!(
            "failed severity={severity:?} file={} err={error}",
            ctx.name
        ));
    }

    fn on_alert(&self, ctx: &FileContext, severity: Severity, error: &PipelineError) {
        self.append_line(&format!(
            "ALERT severity={severity:?} file={} err={error}",
            ctx.name
        ));
    }

    fn on_archived(&self, ctx: &FileContext, result: Result<&Path, &PipelineError>) {
        match result {
            Ok(dest) => self.append_line(&format!(
                "archived file={} dest={}",
                ctx.name,
                dest.display()
            )),
            Err(e) => self.append_line(&format!("archive_failed file={} err={e}", ctx.name)),
        }
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
