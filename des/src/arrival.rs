use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::RngCore;
use rand_distr::{Distribution, Uniform};
use tracing::{info, warn};

use crate::config::{ConfigError, SimulationConfig};
use crate::line::{BoundedLine, Customer, Occupancy};
use crate::run_state::RunState;
use crate::selector::{LineSelector, selector_for};
use crate::stats::StatisticsRegister;

/// How a single arrival ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted { customer: Customer, line: usize },
    AdmittedAfterRetry { customer: Customer, line: usize },
    Left { customer: Customer },
}

impl Admission {
    pub fn customer(&self) -> Customer {
        match *self {
            Admission::Admitted { customer, .. }
            | Admission::AdmittedAfterRetry { customer, .. }
            | Admission::Left { customer } => customer,
        }
    }

    pub fn line(&self) -> Option<usize> {
        match *self {
            Admission::Admitted { line, .. } | Admission::AdmittedAfterRetry { line, .. } => {
                Some(line)
            }
            Admission::Left { .. } => None,
        }
    }
}

/// Synthesizes customers for as long as the run lasts.
///
/// A customer that finds no room waits once for `retry_wait` and tries again;
/// if that fails too it is recorded as having left. The retry wait is never
/// cut short by shutdown, so an arrival in progress always reaches a decision.
pub struct ArrivalGenerator {
    lines: Arc<Vec<BoundedLine>>,
    selector: Box<dyn LineSelector>,
    stats: Arc<StatisticsRegister>,
    run_state: Arc<RunState>,
    arrival_interval: Uniform<u64>,
    retry_wait: Duration,
}

impl ArrivalGenerator {
    pub fn new(
        config: &SimulationConfig,
        lines: Arc<Vec<BoundedLine>>,
        stats: Arc<StatisticsRegister>,
        run_state: Arc<RunState>,
    ) -> Result<ArrivalGenerator, ConfigError> {
        Ok(ArrivalGenerator {
            selector: selector_for(lines.len()),
            lines,
            stats,
            run_state,
            arrival_interval: config.arrival_interval_ms.distribution("arrival_interval_ms")?,
            retry_wait: config.retry_wait(),
        })
    }

    fn draw_arrival_interval(&self, rng: &mut dyn RngCore) -> Duration {
        Duration::from_millis(self.arrival_interval.sample(rng))
    }

    /// Generate arrivals until stopped, then close arrivals. Closing also
    /// happens if this unwinds, so servers never wait on a dead generator.
    pub fn run(&self) {
        let _closed = CloseArrivalsOnDrop(&self.run_state);
        let mut rng = rand::rng();
        while self.run_state.is_running() {
            let interval = self.draw_arrival_interval(&mut rng);
            if !self.run_state.sleep(interval) {
                break;
            }
            self.arrive(&mut rng);
        }
    }

    /// Synthesize one customer and carry it through admission, including the
    /// single retry.
    pub fn arrive(&self, rng: &mut dyn RngCore) -> Admission {
        let customer = Customer::new(self.stats.next_arrival());

        if let Some(line) = self.attempt(customer, rng) {
            info!(
                customer = customer.id,
                line = line + 1,
                occupancy = %Occupancy::of(&self.lines),
                "joined line"
            );
            return Admission::Admitted { customer, line };
        }

        warn!(customer = customer.id, "no room in any line, waiting");
        thread::sleep(self.retry_wait);

        match self.attempt(customer, rng) {
            Some(line) => {
                info!(
                    customer = customer.id,
                    line = line + 1,
                    occupancy = %Occupancy::of(&self.lines),
                    "joined line after waiting"
                );
                Admission::AdmittedAfterRetry { customer, line }
            }
            None => {
                self.stats.record_left();
                warn!(customer = customer.id, "left unserved");
                Admission::Left { customer }
            }
        }
    }

    fn attempt(&self, customer: Customer, rng: &mut dyn RngCore) -> Option<usize> {
        let line = self.selector.select(&self.lines, rng)?;
        self.lines[line].try_admit(customer).then_some(line)
    }
}

struct CloseArrivalsOnDrop<'a>(&'a RunState);

impl Drop for CloseArrivalsOnDrop<'_> {
    fn drop(&mut self) {
        self.0.close_arrivals();
    }
}
