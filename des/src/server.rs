use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::RngCore;
use rand_distr::{Distribution, Uniform};
use tracing::{debug, info};

use crate::config::{ConfigError, SimulationConfig};
use crate::line::{BoundedLine, Customer};
use crate::run_state::RunState;
use crate::stats::StatisticsRegister;

/// One worker of the server pool, permanently bound to a single line.
///
/// With one line every server is bound to it and they compete for customers;
/// with several lines each server owns its own.
pub struct Server {
    id: usize,
    line: usize,
    lines: Arc<Vec<BoundedLine>>,
    stats: Arc<StatisticsRegister>,
    run_state: Arc<RunState>,
    service: Uniform<u64>,
    poll_timeout: Duration,
}

impl Server {
    /// Server `id` (zero-based) bound to the line the configuration assigns it.
    pub fn new(
        id: usize,
        config: &SimulationConfig,
        lines: Arc<Vec<BoundedLine>>,
        stats: Arc<StatisticsRegister>,
        run_state: Arc<RunState>,
    ) -> Result<Server, ConfigError> {
        Ok(Server {
            id,
            line: config.line_for_server(id),
            lines,
            stats,
            run_state,
            service: config.service_ms.distribution("service_ms")?,
            poll_timeout: config.poll_timeout(),
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn line(&self) -> usize {
        self.line
    }

    fn draw_service_duration(&self, rng: &mut dyn RngCore) -> Duration {
        Duration::from_millis(self.service.sample(rng))
    }

    /// Serve until the run is stopped, arrivals are closed and the bound line
    /// has been drained.
    pub fn run(&self) {
        let mut rng = rand::rng();
        let line = &self.lines[self.line];
        loop {
            match line.remove_until_stopped(self.poll_timeout, &self.run_state) {
                Some(customer) => {
                    self.serve(customer, &mut rng);
                }
                None if self.run_state.is_finished() && line.is_empty() => break,
                None => {}
            }
        }
        debug!(server = self.id + 1, line = self.line + 1, "server finished");
    }

    /// Hold `customer` for a random service duration and record the result.
    pub fn serve(&self, customer: Customer, rng: &mut dyn RngCore) -> Duration {
        let service_time = self.draw_service_duration(rng);
        info!(
            server = self.id + 1,
            customer = customer.id,
            service_ms = service_time.as_millis() as u64,
            queued = self.lines[self.line].size(),
            "serving"
        );
        thread::sleep(service_time);
        self.stats.record_served(service_time);
        info!(server = self.id + 1, customer = customer.id, "finished");
        service_time
    }
}
