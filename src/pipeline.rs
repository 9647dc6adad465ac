//! The pipeline driver.
//!
//! Candidates are handled strictly one after another. Each file walks the state machine
//!
//! ```text
//! Discovered ─┬─> Skipped                                   (no archival)
//!             └─> Admitted -> Normalized -> Classified -> Written -> Registered -> Archived
//!                    └──────────────┴────────────┴────────────┴─> Failed -> (archival attempted)
//! ```
//!
//! A failed file is moved out of the source directory but never registered, so it is only
//! processed again if someone puts it back.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, info_span, warn};

use crate::admission::{admit, discover, Admission, CandidateFile};
use crate::classify::{classify, ClassificationCounts};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::execution::{ExecutionEngine, TracingExecutionObserver};
use crate::housekeeping::archive_file;
use crate::ingestion::IngestionOptions;
use crate::listing::read_listing;
use crate::lookup::LocationLookup;
use crate::normalize::normalize;
use crate::observability::{severity_for_error, FileContext, PipelineObserver};
use crate::output::{output_dir_for, write_partitions};
use crate::registry::{FileRegistry, ProcessedRegistry};

/// Where a file is in the per-file state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    Discovered,
    Admitted,
    Skipped,
    Normalized,
    Classified,
    Written,
    Registered,
    Archived,
    Failed,
}

/// What happened to one candidate file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub name: String,
    pub path: PathBuf,
    pub state: FileState,
    /// The last state reached before failing.
    pub failed_at: Option<FileState>,
    pub skip_reason: Option<String>,
    pub error: Option<String>,
    pub counts: Option<ClassificationCounts>,
    pub output_dir: Option<PathBuf>,
    pub archived: bool,
}

impl FileReport {
    fn discovered(candidate: &CandidateFile) -> Self {
        Self {
            name: candidate.name.clone(),
            path: candidate.path.clone(),
            state: FileState::Discovered,
            failed_at: None,
            skip_reason: None,
            error: None,
            counts: None,
            output_dir: None,
            archived: false,
        }
    }
}

/// Reports for every candidate of one run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub files: Vec<FileReport>,
}

impl RunSummary {
    fn count(&self, pred: impl Fn(&FileReport) -> bool) -> usize {
        self.files.iter().filter(|f| pred(f)).count()
    }

    /// Files whose outputs were written and which are now registered.
    pub fn processed(&self) -> usize {
        self.count(|f| matches!(f.state, FileState::Registered | FileState::Archived))
    }

    pub fn skipped(&self) -> usize {
        self.count(|f| f.state == FileState::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(|f| f.state == FileState::Failed)
    }

    pub fn report(&self, name: &str) -> Option<&FileReport> {
        self.files.iter().find(|f| f.name == name)
    }
}

/// Runs admission → normalize → classify → write → register → archive over a source directory.
pub struct Pipeline {
    config: PipelineConfig,
    registry: Arc<dyn ProcessedRegistry>,
    lookup: LocationLookup,
    engine: ExecutionEngine,
    observer: Option<Arc<dyn PipelineObserver>>,
}

impl Pipeline {
    /// Assemble a pipeline from already-loaded collaborators.
    pub fn new(
        config: PipelineConfig,
        registry: Arc<dyn ProcessedRegistry>,
        lookup: LocationLookup,
    ) -> PipelineResult<Self> {
        config.validate()?;
        let engine = ExecutionEngine::new(config.execution.clone())?
            .with_observer(Arc::new(TracingExecutionObserver));
        Ok(Self {
            config,
            registry,
            lookup,
            engine,
            observer: None,
        })
    }

    /// Build a pipeline backed by the configured registry file, loading the lookup set.
    pub fn from_config(config: PipelineConfig) -> PipelineResult<Self> {
        let options = IngestionOptions {
            format: None,
            sheet: config.lookup_sheet.clone(),
        };
        let lookup = LocationLookup::load(&config.lookup_path, &options)?;
        info!(
            path = %config.lookup_path.display(),
            areas = lookup.len(),
            "loaded location lookup"
        );
        let registry = Arc::new(FileRegistry::new(&config.registry_path));
        Self::new(config, registry, lookup)
    }

    /// Attach an observer for per-file outcomes.
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process every candidate in the source directory.
    ///
    /// Only a failure to list the source directory is returned as an error; per-file
    /// failures are recorded in the summary.
    pub fn run(&self) -> PipelineResult<RunSummary> {
        let candidates = discover(&self.config.source_dir)?;
        info!(
            source_dir = %self.config.source_dir.display(),
            candidates = candidates.len(),
            "discovered candidate files"
        );

        let files: Vec<FileReport> = candidates
            .iter()
            .map(|c| self.process_candidate(c))
            .collect();
        let summary = RunSummary { files };

        info!(
            processed = summary.processed(),
            skipped = summary.skipped(),
            failed = summary.failed(),
            "run finished"
        );
        Ok(summary)
    }

    /// Drive one candidate to a terminal state.
    pub fn process_candidate(&self, candidate: &CandidateFile) -> FileReport {
        let span = info_span!("file", name = %candidate.name);
        let _enter = span.enter();

        let ctx = FileContext {
            name: candidate.name.clone(),
            path: candidate.path.clone(),
        };
        let mut report = FileReport::discovered(candidate);

        match admit(
            candidate,
            self.registry.as_ref(),
            &self.config.expected_extension,
        ) {
            Ok(Admission::Admitted) => {
                report.state = FileState::Admitted;
                info!(size = candidate.size, "admitted");
            }
            Ok(Admission::Skipped(reason)) => {
                info!(%reason, "skipping");
                report.state = FileState::Skipped;
                report.skip_reason = Some(reason.to_string());
                if let Some(obs) = &self.observer {
                    obs.on_skipped(&ctx, &reason);
                }
                return report;
            }
            Err(e) => {
                // Never admitted, so it stays in the source directory.
                warn!(error = %e, "admission check failed, skipping");
                report.state = FileState::Skipped;
                report.skip_reason = Some("admission check failed".to_string());
                self.notify_failure(&ctx, &e);
                report.error = Some(e.to_string());
                return report;
            }
        }

        let outcome = self
            .transform(candidate, &mut report)
            .and_then(|counts| {
                self.registry.record(&candidate.name)?;
                Ok(counts)
            });

        match outcome {
            Ok(counts) => {
                report.state = FileState::Registered;
                info!(
                    accepted = counts.accepted,
                    rejected = counts.rejected,
                    invalid_location = counts.invalid_location,
                    "processing completed"
                );
                if let Some(obs) = &self.observer {
                    obs.on_completed(&ctx, counts);
                }
            }
            Err(e) => {
                error!(stage = ?report.state, error = %e, "processing failed");
                report.failed_at = Some(report.state);
                report.state = FileState::Failed;
                report.error = Some(e.to_string());
                self.notify_failure(&ctx, &e);
            }
        }

        match archive_file(&candidate.path, &self.config.archive_dir) {
            Ok(dest) => {
                info!(dest = %dest.display(), "archived");
                report.archived = true;
                if report.state == FileState::Registered {
                    report.state = FileState::Archived;
                }
                if let Some(obs) = &self.observer {
                    obs.on_archived(&ctx, Ok(&dest));
                }
            }
            Err(e) => {
                error!(error = %e, "archival failed");
                if let Some(obs) = &self.observer {
                    obs.on_archived(&ctx, Err(&e));
                }
            }
        }

        report
    }

    fn transform(
        &self,
        candidate: &CandidateFile,
        report: &mut FileReport,
    ) -> PipelineResult<ClassificationCounts> {
        let raw = read_listing(&candidate.path)?;
        debug!(rows = raw.row_count(), columns = raw.schema.fields.len(), "read listing");

        let cleaned = normalize(&self.engine, &raw);
        report.state = FileState::Normalized;

        let classification = classify(&self.engine, &cleaned, &self.lookup);
        report.state = FileState::Classified;
        let counts = classification.counts();
        debug_assert_eq!(counts.accepted + counts.rejected, cleaned.row_count());

        let dir = output_dir_for(&self.config.output_dir, &candidate.path);
        let artifacts = write_partitions(&dir, &classification)?;
        debug!(dir = %artifacts.dir.display(), "wrote artifacts");
        report.state = FileState::Written;
        report.output_dir = Some(artifacts.dir);
        report.counts = Some(counts);

        Ok(counts)
    }

    fn notify_failure(&self, ctx: &FileContext, e: &PipelineError) {
        let Some(obs) = &self.observer else {
            return;
        };
        let severity = severity_for_error(e);
        obs.on_failed(ctx, severity, e);
        if severity >= self.config.alert_at_or_above {
            obs.on_alert(ctx, severity, e);
        }
    }
}
