use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use listing_pipeline::admission::SkipReason;
use listing_pipeline::classify::ClassificationCounts;
use listing_pipeline::config::PipelineConfig;
use listing_pipeline::lookup::LocationLookup;
use listing_pipeline::observability::{
    CompositeObserver, FileContext, FileObserver, PipelineObserver, Severity,
};
use listing_pipeline::pipeline::Pipeline;
use listing_pipeline::registry::InMemoryRegistry;
use listing_pipeline::PipelineError;

#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_skipped(&self, ctx: &FileContext, reason: &SkipReason) {
        self.push(format!("skipped:{}:{reason}", ctx.name));
    }

    fn on_completed(&self, ctx: &FileContext, counts: ClassificationCounts) {
        self.push(format!("completed:{}:{}", ctx.name, counts.accepted));
    }

    fn on_failed(&self, ctx: &FileContext, severity: Severity, _error: &PipelineError) {
        self.push(format!("failed:{}:{severity:?}", ctx.name));
    }

    fn on_alert(&self, ctx: &FileContext, severity: Severity, _error: &PipelineError) {
        self.push(format!("alert:{}:{severity:?}", ctx.name));
    }

    fn on_archived(&self, ctx: &FileContext, result: Result<&Path, &PipelineError>) {
        self.push(format!("archived:{}:{}", ctx.name, result.is_ok()));
    }
}

fn tmp_root(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("listing-pipeline-obs-{name}-{nanos}"))
}

fn config_under(root: &Path) -> PipelineConfig {
    let config = PipelineConfig {
        source_dir: root.join("files"),
        archive_dir: root.join("processed_files"),
        output_dir: root.join("output"),
        registry_path: root.join("processed_files.txt"),
        ..PipelineConfig::default()
    };
    fs::create_dir_all(&config.source_dir).unwrap();
    config
}

fn lookup() -> LocationLookup {
    ["Banashankari", "Basavanagudi"].into_iter().collect()
}

#[test]
fn observer_sees_every_outcome_in_order() {
    let root = tmp_root("order");
    let mut config = config_under(&root);
    config.alert_at_or_above = Severity::Error;
    fs::copy("tests/fixtures/listings_missing_phone_column.csv", config.source_dir.join("a.csv")).unwrap();
    fs::copy("tests/fixtures/listings_5.csv", config.source_dir.join("b.csv")).unwrap();
    fs::write(config.source_dir.join("c.txt"), "x").unwrap();

    let rec = Arc::new(RecordingObserver::default());
    let pipeline = Pipeline::new(config, Arc::new(InMemoryRegistry::new()), lookup())
        .unwrap()
        .with_observer(rec.clone());
    pipeline.run().unwrap();

    assert_eq!(
        rec.events(),
        [
            "failed:a.csv:Error",
            "alert:a.csv:Error",
            "archived:a.csv:true",
            "completed:b.csv:4",
            "archived:b.csv:true",
            "skipped:c.txt:unexpected extension '.txt'",
        ]
    );

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn failures_below_threshold_do_not_alert() {
    let root = tmp_root("threshold");
    let config = config_under(&root);
    assert_eq!(config.alert_at_or_above, Severity::Critical);
    fs::copy("tests/fixtures/listings_missing_phone_column.csv", config.source_dir.join("a.csv")).unwrap();

    let rec = Arc::new(RecordingObserver::default());
    let pipeline = Pipeline::new(config, Arc::new(InMemoryRegistry::new()), lookup())
        .unwrap()
        .with_observer(rec.clone());
    pipeline.run().unwrap();

    let events = rec.events();
    assert!(events.contains(&"failed:a.csv:Error".to_string()));
    assert!(!events.iter().any(|e| e.starts_with("alert:")));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn file_observer_appends_audit_lines_through_composite() {
    let root = tmp_root("audit");
    let config = config_under(&root);
    let audit = root.join("audit.log");
    fs::copy("tests/fixtures/listings_5.csv", config.source_dir.join("b.csv")).unwrap();
    fs::write(config.source_dir.join("empty.csv"), "").unwrap();

    let rec = Arc::new(RecordingObserver::default());
    let composite = CompositeObserver::new(vec![
        rec.clone() as Arc<dyn PipelineObserver>,
        Arc::new(FileObserver::new(&audit)),
    ]);
    let pipeline = Pipeline::new(config, Arc::new(InMemoryRegistry::new()), lookup())
        .unwrap()
        .with_observer(Arc::new(composite));
    pipeline.run().unwrap();

    assert_eq!(rec.events().len(), 3);
    let text = fs::read_to_string(&audit).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("completed file=b.csv accepted=4 rejected=1 invalid_location=1"));
    assert!(lines[1].contains("archived file=b.csv"));
    assert!(lines[2].contains("skipped file=empty.csv reason=file is empty"));

    let _ = fs::remove_dir_all(&root);
}
