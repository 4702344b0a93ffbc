//! Independent replications of a simulation, run concurrently
//!
//! Every replication is a complete [`Simulation`] with its own lines, counters
//! and worker threads; nothing is shared between them. Because the engine runs
//! on the wall clock, a batch of replications finishes in roughly the time of
//! one run as long as the pool has a thread per replication.
//!
//! # Example
//!
//! ```rust,no_run
//! use des::SimulationConfig;
//! use des::parallel::{ReplicationRunner, simple_progress_reporter};
//!
//! let results = ReplicationRunner::new(8, |_replication| {
//!     SimulationConfig::grocery().with_minutes(2)
//! })
//! .progress(simple_progress_reporter(2))
//! .run();
//!
//! for (id, result) in results.iter().enumerate() {
//!     match result {
//!         Ok(report) => println!("Replication {} served {}", id, report.snapshot.served),
//!         Err(e) => eprintln!("Replication {} failed: {}", id, e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! Invalid configurations, spawn failures and panics inside a replication are
//! all returned as `Err(String)` for that replication. The others carry on.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::info;

use crate::config::SimulationConfig;
use crate::controller::Simulation;
use crate::report::SimulationReport;

/// Runs many replications on a rayon pool and collects their reports in
/// replication order.
pub struct ReplicationRunner<F>
where
    F: Fn(usize) -> SimulationConfig + Send + Sync,
{
    replications: usize,
    builder: F,
    num_threads: Option<usize>,
    progress_callback: Option<Arc<dyn Fn(usize, usize) + Send + Sync>>,
}

impl<F> ReplicationRunner<F>
where
    F: Fn(usize) -> SimulationConfig + Send + Sync,
{
    /// `builder` produces the configuration for each replication id.
    pub fn new(replications: usize, builder: F) -> Self {
        ReplicationRunner {
            replications,
            builder,
            num_threads: None,
            progress_callback: None,
        }
    }

    /// Pool size. Defaults to one thread per replication, since each
    /// replication spends nearly all its time asleep on the wall clock.
    pub fn num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n);
        self
    }

    /// Called with `(completed, total)` after each replication finishes.
    pub fn progress<P>(mut self, callback: P) -> Self
    where
        P: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    pub fn run(self) -> Vec<Result<SimulationReport, String>> {
        let progress_counter = AtomicUsize::new(0);
        let threads = self.num_threads.unwrap_or(self.replications).max(1);

        let execute = || {
            (0..self.replications)
                .into_par_iter()
                .map(|replication| {
                    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                        let config = (self.builder)(replication);
                        Simulation::new(config)
                            .map_err(|e| e.to_string())?
                            .run()
                            .map_err(|e| e.to_string())
                    }));

                    let completed = progress_counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback(completed, self.replications);
                    }

                    result.unwrap_or_else(|panic| {
                        if let Some(s) = panic.downcast_ref::<&str>() {
                            Err(s.to_string())
                        } else if let Some(s) = panic.downcast_ref::<String>() {
                            Err(s.clone())
                        } else {
                            Err("Unknown panic".to_string())
                        }
                    })
                })
                .collect()
        };

        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(execute),
            Err(e) => {
                info!(error = %e, "falling back to the global rayon pool");
                execute()
            }
        }
    }
}

/// Run `replications` copies of `config` with default settings.
pub fn run_replications(
    replications: usize,
    config: SimulationConfig,
) -> Vec<Result<SimulationReport, String>> {
    ReplicationRunner::new(replications, move |_| config.clone()).run()
}

/// Means across the successful replications of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReplicationSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub mean_arrived: f64,
    pub mean_served: f64,
    pub mean_left: f64,
    pub mean_service_ms: f64,
}

impl ReplicationSummary {
    pub fn from_results(results: &[Result<SimulationReport, String>]) -> Self {
        let reports: Vec<&SimulationReport> =
            results.iter().filter_map(|r| r.as_ref().ok()).collect();
        let succeeded = reports.len();
        let failed = results.len() - succeeded;
        if succeeded == 0 {
            return ReplicationSummary {
                failed,
                ..Default::default()
            };
        }

        ReplicationSummary {
            succeeded,
            failed,
            mean_arrived: mean_of(&reports, |r| r.snapshot.arrived as f64),
            mean_served: mean_of(&reports, |r| r.snapshot.served as f64),
            mean_left: mean_of(&reports, |r| r.snapshot.left as f64),
            mean_service_ms: mean_of(&reports, |r| r.snapshot.average_service_ms()),
        }
    }
}

fn mean_of<F>(reports: &[&SimulationReport], f: F) -> f64
where
    F: Fn(&SimulationReport) -> f64,
{
    reports.iter().map(|r| f(*r)).sum::<f64>() / reports.len() as f64
}

/// Progress callback that logs every `interval` completed replications.
pub fn simple_progress_reporter(interval: usize) -> impl Fn(usize, usize) + Send + Sync {
    let interval = interval.max(1);
    move |completed, total| {
        if completed % interval == 0 || completed == total {
            info!(completed, total, "replications finished");
        }
    }
}
