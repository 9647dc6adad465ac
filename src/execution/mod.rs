//! Execution engine for record-set operations with configurable parallelism.
//!
//! This module sits "above" [`crate::processing`] and provides:
//!
//! - Parallel (chunked) execution for filtering and column derivation
//! - Throttling of in-flight chunks
//! - Real-time metrics + observer hooks for monitoring
//!
//! Every call blocks until the whole dataset has been processed; callers never see partial
//! results. Output rows keep input order.

mod observer;
mod semaphore;

use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Deserialize;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{DataSet, Field, Value};

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, TracingExecutionObserver,
};

use semaphore::Semaphore;

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExecutionOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Number of rows per chunk.
    pub chunk_size: usize,
    /// Upper bound on concurrently executing chunks.
    ///
    /// This is an additional throttle on top of `num_threads`.
    pub max_in_flight_chunks: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        let n = available_threads();
        Self {
            num_threads: None,
            chunk_size: 4_096,
            max_in_flight_chunks: n,
        }
    }
}

fn available_threads() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// A configurable execution engine for in-memory [`DataSet`] operations.
pub struct ExecutionEngine {
    pool: ThreadPool,
    opts: ExecutionOptions,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    ///
    /// Fails if `chunk_size == 0`, `max_in_flight_chunks == 0`, `num_threads == Some(0)`, or
    /// the thread pool cannot be built.
    pub fn new(opts: ExecutionOptions) -> PipelineResult<Self> {
        if opts.chunk_size == 0 {
            return Err(PipelineError::Config("chunk_size must be > 0".to_string()));
        }
        if opts.max_in_flight_chunks == 0 {
            return Err(PipelineError::Config(
                "max_in_flight_chunks must be > 0".to_string(),
            ));
        }
        if opts.num_threads == Some(0) {
            return Err(PipelineError::Config(
                "num_threads must be > 0 when set".to_string(),
            ));
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(opts.num_threads.unwrap_or_else(available_threads))
            .thread_name(|i| format!("listing-engine-{i}"))
            .build()
            .map_err(|e| PipelineError::Config(format!("failed to build thread pool: {e}")))?;

        Ok(Self {
            pool,
            opts,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        })
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Execute a parallel filter over the dataset.
    pub fn filter_parallel<F>(&self, dataset: &DataSet, predicate: F) -> DataSet
    where
        F: Fn(&[Value]) -> bool + Send + Sync,
    {
        let rows = self.run_chunks("filter", dataset, &|row: &[Value]| {
            predicate(row).then(|| row.to_vec())
        });
        DataSet::new(dataset.schema.clone(), rows)
    }

    /// Derive (or replace) a column in parallel; see [`DataSet::with_column`].
    pub fn with_column_parallel<F>(&self, dataset: &DataSet, field: Field, derive: F) -> DataSet
    where
        F: Fn(&[Value]) -> Value + Send + Sync,
    {
        let values = self.run_chunks("with_column", dataset, &|row: &[Value]| Some(derive(row)));
        let mut values = values.into_iter();
        dataset.with_column(field, |_| values.next().unwrap_or(Value::Null))
    }

    fn run_chunks<T: Send>(
        &self,
        op: &'static str,
        dataset: &DataSet,
        per_row: &(dyn Fn(&[Value]) -> Option<T> + Send + Sync),
    ) -> Vec<T> {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(ExecutionEvent::RunStarted {
            op,
            rows: dataset.row_count(),
        });

        let sem = Semaphore::new(self.opts.max_in_flight_chunks);
        let ranges = chunk_ranges(dataset.row_count(), self.opts.chunk_size);

        let per_chunk: Vec<Vec<T>> = self.pool.install(|| {
            ranges
                .into_par_iter()
                .map(|range| {
                    let waited = sem.acquire();
                    if waited > Duration::ZERO {
                        self.metrics.on_throttle_wait(waited);
                        self.emit(ExecutionEvent::ThrottleWaited { duration: waited });
                    }

                    self.metrics.on_chunk_start();
                    self.emit(ExecutionEvent::ChunkStarted {
                        start_row: range.start,
                        row_count: range.len(),
                    });

                    let rows = &dataset.rows[range];
                    let out: Vec<T> = rows.iter().filter_map(|row| per_row(row.as_slice())).collect();
                    self.metrics.on_rows_processed(rows.len());

                    self.emit(ExecutionEvent::ChunkFinished {
                        output_rows: out.len(),
                    });
                    self.metrics.on_chunk_end();
                    sem.release();
                    out
                })
                .collect()
        });

        self.metrics.end_run(start.elapsed());
        self.emit(ExecutionEvent::RunFinished {
            op,
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });

        per_chunk.into_iter().flatten().collect()
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

fn chunk_ranges(row_count: usize, chunk_size: usize) -> Vec<Range<usize>> {
    (0..row_count)
        .step_by(chunk_size)
        .map(|start| start..(start + chunk_size).min(row_count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{chunk_ranges, ExecutionEngine, ExecutionOptions};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use crate::execution::{ExecutionEvent, ExecutionObserver};
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn dataset_of_n(n: usize) -> DataSet {
        let schema = Schema::new(vec![Field::new("row_num", DataType::Int64)]);
        let rows = (0..n as i64).map(|i| vec![Value::Int64(i)]).collect();
        DataSet::new(schema, rows)
    }

    fn engine(threads: usize, chunk_size: usize, in_flight: usize) -> ExecutionEngine {
        ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(threads),
            chunk_size,
            max_in_flight_chunks: in_flight,
        })
        .unwrap()
    }

    #[test]
    fn chunk_ranges_cover_all_rows() {
        assert!(chunk_ranges(0, 4).is_empty());
        assert_eq!(chunk_ranges(10, 4), vec![0..4, 4..8, 8..10]);
    }

    #[test]
    fn invalid_options_are_config_errors() {
        let err = ExecutionEngine::new(ExecutionOptions {
            chunk_size: 0,
            ..Default::default()
        })
        .err()
        .unwrap();
        assert!(err.to_string().contains("chunk_size"));
    }

    #[test]
    fn filter_parallel_preserves_row_order() {
        let ds = dataset_of_n(1_000);
        let out = engine(4, 7, 4).filter_parallel(&ds, |row| {
            matches!(row[0], Value::Int64(v) if v % 3 == 0)
        });
        let expected: Vec<Vec<Value>> = (0..1_000i64)
            .filter(|v| v % 3 == 0)
            .map(|v| vec![Value::Int64(v)])
            .collect();
        assert_eq!(out.rows, expected);
    }

    #[test]
    fn with_column_parallel_lines_values_up_with_rows() {
        let ds = dataset_of_n(500);
        let out = engine(4, 3, 4).with_column_parallel(
            &ds,
            Field::new("even", DataType::Bool),
            |row| Value::Bool(matches!(row[0], Value::Int64(v) if v % 2 == 0)),
        );
        assert_eq!(out.schema.fields.len(), 2);
        for row in &out.rows {
            let Value::Int64(v) = row[0] else { panic!("row_num") };
            assert_eq!(row[1], Value::Bool(v % 2 == 0));
        }
    }

    struct ConcurrencyObserver {
        active_chunks: AtomicUsize,
        max_active_chunks: AtomicUsize,
    }

    impl ExecutionObserver for ConcurrencyObserver {
        fn on_event(&self, event: &ExecutionEvent) {
            match event {
                ExecutionEvent::ChunkStarted { .. } => {
                    let now = self.active_chunks.fetch_add(1, Ordering::SeqCst) + 1;
                    self.max_active_chunks.fetch_max(now, Ordering::SeqCst);
                }
                ExecutionEvent::ChunkFinished { .. } => {
                    self.active_chunks.fetch_sub(1, Ordering::SeqCst);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn max_in_flight_chunks_throttles_chunk_concurrency() {
        let ds = dataset_of_n(100);
        let observer = Arc::new(ConcurrencyObserver {
            active_chunks: AtomicUsize::new(0),
            max_active_chunks: AtomicUsize::new(0),
        });
        let obs_trait: Arc<dyn ExecutionObserver> = observer.clone();
        let engine = engine(4, 1, 1).with_observer(obs_trait);

        let out = engine.with_column_parallel(&ds, Field::new("one", DataType::Int64), |_row| {
            std::thread::sleep(Duration::from_millis(1));
            Value::Int64(1)
        });

        assert_eq!(out.row_count(), ds.row_count());
        assert_eq!(observer.max_active_chunks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn metrics_are_available_after_run() {
        let ds = dataset_of_n(60);
        let engine = engine(4, 1, 1);
        let metrics = engine.metrics();

        let out = engine.with_column_parallel(&ds, Field::new("one", DataType::Int64), |_row| {
            std::thread::sleep(Duration::from_millis(2));
            Value::Int64(1)
        });

        assert_eq!(out.row_count(), ds.row_count());

        let snap = metrics.snapshot();
        assert_eq!(snap.rows_processed, ds.row_count() as u64);
        assert_eq!(snap.chunks_started, ds.row_count() as u64);
        assert_eq!(snap.chunks_finished, ds.row_count() as u64);
        assert_eq!(snap.max_active_chunks, 1);
        assert!(snap.throttle_wait > Duration::ZERO);
        assert!(snap.elapsed.is_some());
    }
}
