use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use listing_pipeline::config::PipelineConfig;
use listing_pipeline::logging::{init_logging, LogFormat};
use listing_pipeline::observability::{CompositeObserver, FileObserver, PipelineObserver, TracingObserver};
use listing_pipeline::pipeline::Pipeline;
use listing_pipeline::PipelineResult;

#[derive(Parser, Debug)]
#[command(name = "listing-pipeline")]
#[command(about = "Validate and partition restaurant-listing CSV drops")]
#[command(version)]
struct Cli {
    /// TOML config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory scanned for candidate files
    #[arg(long)]
    source_dir: Option<PathBuf>,
    /// Directory processed files are moved to
    #[arg(long)]
    archive_dir: Option<PathBuf>,
    /// Lookup file with an `Area` column (.csv or workbook)
    #[arg(long)]
    lookup: Option<PathBuf>,
    /// Root directory for per-file outputs
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Processed-file registry
    #[arg(long)]
    registry: Option<PathBuf>,
    /// Required extension of candidate files
    #[arg(long)]
    extension: Option<String>,
    /// Engine worker threads
    #[arg(long)]
    threads: Option<usize>,
    /// Append one line per pipeline event to this file
    #[arg(long)]
    audit_log: Option<PathBuf>,
    /// Print the run summary as JSON on stdout
    #[arg(long)]
    summary_json: bool,
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

impl Cli {
    fn resolve_config(&self) -> PipelineResult<PipelineConfig> {
        let mut cfg = match &self.config {
            Some(path) => PipelineConfig::from_toml_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(v) = &self.source_dir {
            cfg.source_dir = v.clone();
        }
        if let Some(v) = &self.archive_dir {
            cfg.archive_dir = v.clone();
        }
        if let Some(v) = &self.lookup {
            cfg.lookup_path = v.clone();
        }
        if let Some(v) = &self.output_dir {
            cfg.output_dir = v.clone();
        }
        if let Some(v) = &self.registry {
            cfg.registry_path = v.clone();
        }
        if let Some(v) = &self.extension {
            cfg.expected_extension = v.clone();
        }
        if let Some(n) = self.threads {
            cfg.execution.num_threads = Some(n);
        }
        if let Some(v) = &self.audit_log {
            cfg.audit_log = Some(v.clone());
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn run(cli: &Cli) -> PipelineResult<()> {
    let config = cli.resolve_config()?;

    let mut observers: Vec<Arc<dyn PipelineObserver>> = vec![Arc::new(TracingObserver)];
    if let Some(path) = &config.audit_log {
        observers.push(Arc::new(FileObserver::new(path)));
    }

    let pipeline = Pipeline::from_config(config)?
        .with_observer(Arc::new(CompositeObserver::new(observers)));
    let summary = pipeline.run()?;

    if cli.summary_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    info!(
        processed = summary.processed(),
        skipped = summary.skipped(),
        failed = summary.failed(),
        "done"
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "run aborted");
            ExitCode::FAILURE
        }
    }
}
