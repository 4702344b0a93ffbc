use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::arrival::ArrivalGenerator;
use crate::config::{ConfigError, SimulationConfig};
use crate::line::{BoundedLine, Occupancy};
use crate::report::SimulationReport;
use crate::run_state::RunState;
use crate::server::Server;
use crate::stats::StatisticsRegister;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to spawn {worker}: {source}")]
    Spawn {
        worker: String,
        #[source]
        source: io::Error,
    },
}

/// Why a worker could not be joined cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinFailure {
    TimedOut,
    Panicked,
}

/// A spawned worker thread and the channel that disconnects when it exits.
struct Worker {
    name: String,
    grace: Duration,
    handle: JoinHandle<()>,
    done: Receiver<()>,
}

impl Worker {
    fn spawn<F>(name: String, grace: Duration, body: F) -> Result<Worker, SimulationError>
    where
        F: FnOnce() + Send + 'static,
    {
        let (done_tx, done): (Sender<()>, Receiver<()>) = channel::bounded(0);
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                // dropped on return or unwind, which disconnects `done`
                let _done_tx = done_tx;
                body();
            })
            .map_err(|source| SimulationError::Spawn {
                worker: name.clone(),
                source,
            })?;
        Ok(Worker {
            name,
            grace,
            handle,
            done,
        })
    }

    /// Wait at most this worker's grace period for it to exit.
    fn join(self) -> Result<(), JoinFailure> {
        match self.done.recv_timeout(self.grace) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                self.handle.join().map_err(|_| JoinFailure::Panicked)
            }
            Err(RecvTimeoutError::Timeout) => Err(JoinFailure::TimedOut),
        }
    }
}

/// Owns one run: the shared lines and counters, the arrival generator and
/// the server pool.
pub struct Simulation {
    config: SimulationConfig,
    lines: Arc<Vec<BoundedLine>>,
    stats: Arc<StatisticsRegister>,
    run_state: Arc<RunState>,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Simulation, ConfigError> {
        config.validate()?;
        let lines = (0..config.lines)
            .map(|i| BoundedLine::new(i, config.capacity))
            .collect();
        Ok(Simulation {
            config,
            lines: Arc::new(lines),
            stats: Arc::new(StatisticsRegister::new()),
            run_state: Arc::new(RunState::new()),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn stats(&self) -> &StatisticsRegister {
        &self.stats
    }

    pub fn lines(&self) -> &[BoundedLine] {
        &self.lines
    }

    /// Run for the configured duration, shut down, drain and report.
    pub fn run(self) -> Result<SimulationReport, SimulationError> {
        let config = &self.config;
        info!(
            name = %config.name,
            minutes = config.minutes,
            servers = config.servers,
            lines = config.lines,
            capacity = config.capacity,
            "starting simulation"
        );

        let workers = match self.start() {
            Ok(workers) => workers,
            Err(e) => {
                self.run_state.stop();
                self.run_state.close_arrivals();
                return Err(e);
            }
        };

        thread::sleep(config.run_duration());
        self.run_state.stop();
        info!("simulation time elapsed, draining lines");

        let mut stragglers = Vec::new();
        for worker in workers {
            let name = worker.name.clone();
            match worker.join() {
                Ok(()) => {}
                Err(JoinFailure::TimedOut) => {
                    warn!(worker = %name, "still running after grace period");
                    stragglers.push(name);
                }
                Err(JoinFailure::Panicked) => {
                    error!(worker = %name, "worker panicked");
                    stragglers.push(name);
                }
            }
        }

        Ok(self.report(stragglers))
    }

    /// Spawn the server pool, then the arrival generator. The generator comes
    /// first in the returned list so it is joined first; its grace period also
    /// covers one retry wait, since an arrival caught mid-retry at shutdown is
    /// allowed to finish.
    fn start(&self) -> Result<Vec<Worker>, SimulationError> {
        let grace = self.config.grace_period();
        let mut servers = Vec::with_capacity(self.config.servers);
        for id in 0..self.config.servers {
            let server = Server::new(
                id,
                &self.config,
                Arc::clone(&self.lines),
                Arc::clone(&self.stats),
                Arc::clone(&self.run_state),
            )?;
            servers.push(Worker::spawn(
                format!("server-{}", id + 1),
                grace,
                move || server.run(),
            )?);
        }

        let generator = ArrivalGenerator::new(
            &self.config,
            Arc::clone(&self.lines),
            Arc::clone(&self.stats),
            Arc::clone(&self.run_state),
        )?;
        let arrivals = Worker::spawn(
            "arrivals".to_string(),
            self.config.retry_wait() + grace,
            move || generator.run(),
        )?;

        let mut workers = Vec::with_capacity(servers.len() + 1);
        workers.push(arrivals);
        workers.extend(servers);
        Ok(workers)
    }

    /// Snapshot the counters and line sizes as they stand now.
    pub fn report(&self, stragglers: Vec<String>) -> SimulationReport {
        SimulationReport {
            name: self.config.name.clone(),
            snapshot: self.stats.snapshot(),
            occupancy: Occupancy::of(&self.lines),
            stragglers,
        }
    }
}
