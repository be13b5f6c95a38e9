//! Bounded-parallelism batch scheduling.
//!
//! Items are processed in batches of `workers` OS threads; each thread runs
//! the whole per-item pipeline as one scheduled unit. Mesh generation and
//! decimation for different items are embarrassingly parallel; the rig
//! engine is serialized across workers by a shared lock, so a slow rig
//! holds its worker slot but never runs concurrently with another rig.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use tracing::{info, warn};

use crate::batch::BatchReport;
use crate::config::PipelineConfig;
use crate::discover::WorkItem;
use crate::pipeline::{run_item, Engines, ItemOutcome};
use crate::telemetry::PipelineMetrics;

/// Schedules the per-item pipeline across a bounded worker pool.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    workers: usize,
}

impl BatchRunner {
    /// Create a runner with the given worker count (minimum 1).
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Worker count this runner schedules with.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Process every item and build the batch report.
    ///
    /// Individual failures never abort the batch: the report always
    /// contains exactly one outcome per input item.
    pub fn run(
        &self,
        items: &[WorkItem],
        config: &PipelineConfig,
        engines: &Engines,
        metrics: Option<Arc<PipelineMetrics>>,
    ) -> BatchReport {
        let started = Instant::now();
        let rig_lock = Arc::new(Mutex::new(()));

        info!(items = items.len(), workers = self.workers, "starting batch");

        let outcomes = if self.workers <= 1 {
            self.run_sequential(items, config, engines, &rig_lock, metrics.as_deref())
        } else {
            self.run_parallel(items, config, engines, &rig_lock, metrics)
        };

        BatchReport::build(outcomes, started.elapsed())
    }

    /// Strict sequential processing in discovery order.
    fn run_sequential(
        &self,
        items: &[WorkItem],
        config: &PipelineConfig,
        engines: &Engines,
        rig_lock: &Mutex<()>,
        metrics: Option<&PipelineMetrics>,
    ) -> Vec<ItemOutcome> {
        let mut outcomes = Vec::with_capacity(items.len());
        for item in items {
            if let Some(m) = metrics {
                m.item_started();
            }
            let outcome = run_item(item, config, engines, rig_lock);
            if let Some(m) = metrics {
                m.record_outcome(outcome.succeeded());
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Fan items out in batches of `workers` threads.
    fn run_parallel(
        &self,
        items: &[WorkItem],
        config: &PipelineConfig,
        engines: &Engines,
        rig_lock: &Arc<Mutex<()>>,
        metrics: Option<Arc<PipelineMetrics>>,
    ) -> Vec<ItemOutcome> {
        let collected = Arc::new(Mutex::new(Vec::with_capacity(items.len())));

        for batch in items.chunks(self.workers) {
            let mut handles = Vec::with_capacity(batch.len());

            for item in batch {
                let item = item.clone();
                let config = config.clone();
                let engines = engines.clone();
                let rig_lock = Arc::clone(rig_lock);
                let collected = Arc::clone(&collected);
                let metrics = metrics.clone();

                let name = item.name.clone();
                let image = item.image_path.clone();
                let handle = thread::spawn(move || {
                    if let Some(m) = &metrics {
                        m.item_started();
                    }
                    let outcome = run_item(&item, &config, &engines, &rig_lock);
                    if let Some(m) = &metrics {
                        m.record_outcome(outcome.succeeded());
                    }
                    let mut guard = collected.lock().unwrap_or_else(|e| e.into_inner());
                    guard.push(outcome);
                });
                handles.push((name, image, handle));
            }

            for (name, image, handle) in handles {
                if handle.join().is_err() {
                    // run_item contains panics, so this is nearly
                    // unreachable; still, the report must have one outcome
                    // per item.
                    warn!(item = %name, "worker thread died");
                    let mut outcome = ItemOutcome::new(name, image.display().to_string());
                    outcome.error = "worker thread panicked".to_string();
                    let mut guard = collected.lock().unwrap_or_else(|e| e.into_inner());
                    guard.push(outcome);
                }
            }
        }

        let mut guard = collected.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *guard)
    }
}
