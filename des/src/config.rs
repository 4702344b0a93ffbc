use std::time::Duration;

use rand_distr::Uniform;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a configuration is refused before any worker starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{lines} lines need at least as many servers, got {servers}")]
    UnstaffedLines { lines: usize, servers: usize },

    #[error("{field} range is inverted: {min}..={max} ms")]
    InvertedRange { field: &'static str, min: u64, max: u64 },
}

/// Inclusive range of whole milliseconds, sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MillisRange {
    pub min: u64,
    pub max: u64,
}

impl MillisRange {
    pub const fn new(min: u64, max: u64) -> MillisRange {
        MillisRange { min, max }
    }

    pub fn distribution(&self, field: &'static str) -> Result<Uniform<u64>, ConfigError> {
        Uniform::new_inclusive(self.min, self.max).map_err(|_| ConfigError::InvertedRange {
            field,
            min: self.min,
            max: self.max,
        })
    }
}

/// Every tunable of a run, in wall-clock milliseconds.
///
/// `minutes` is the simulated duration; `minute_ms` is how long one simulated
/// minute lasts on the wall clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub name: String,
    pub servers: usize,
    pub lines: usize,
    pub capacity: usize,
    pub minutes: u64,
    pub minute_ms: u64,
    pub arrival_interval_ms: MillisRange,
    pub service_ms: MillisRange,
    pub retry_wait_ms: u64,
    pub poll_timeout_ms: u64,
    pub grace_period_ms: u64,
}

impl SimulationConfig {
    /// Two tellers sharing one waiting line of six.
    pub fn bank() -> Self {
        SimulationConfig {
            name: "bank".to_string(),
            servers: 2,
            lines: 1,
            capacity: 6,
            ..Self::defaults()
        }
    }

    /// Three checkout counters, each with its own line of four.
    pub fn grocery() -> Self {
        SimulationConfig {
            name: "grocery".to_string(),
            servers: 3,
            lines: 3,
            capacity: 4,
            ..Self::defaults()
        }
    }

    fn defaults() -> Self {
        SimulationConfig {
            name: String::new(),
            servers: 1,
            lines: 1,
            capacity: 1,
            minutes: 1,
            minute_ms: 1000,
            arrival_interval_ms: MillisRange::new(500, 1000),
            service_ms: MillisRange::new(300, 600),
            retry_wait_ms: 6000,
            poll_timeout_ms: 100,
            grace_period_ms: 2000,
        }
    }

    pub fn with_minutes(mut self, minutes: u64) -> Self {
        self.minutes = minutes;
        self
    }

    pub fn with_servers(mut self, servers: usize, lines: usize) -> Self {
        self.servers = servers;
        self.lines = lines;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("servers", self.servers as u64),
            ("lines", self.lines as u64),
            ("capacity", self.capacity as u64),
            ("minutes", self.minutes),
            ("minute_ms", self.minute_ms),
            ("poll_timeout_ms", self.poll_timeout_ms),
        ];
        if let Some(&(field, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Zero { field });
        }
        if self.lines > self.servers {
            return Err(ConfigError::UnstaffedLines {
                lines: self.lines,
                servers: self.servers,
            });
        }
        self.arrival_interval_ms.distribution("arrival_interval_ms")?;
        self.service_ms.distribution("service_ms")?;
        Ok(())
    }

    pub fn run_duration(&self) -> Duration {
        Duration::from_millis(self.minutes.saturating_mul(self.minute_ms))
    }

    pub fn retry_wait(&self) -> Duration {
        Duration::from_millis(self.retry_wait_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    /// Line served by server `server` (zero-based).
    pub fn line_for_server(&self, server: usize) -> usize {
        server % self.lines.max(1)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig::grocery()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert_eq!(SimulationConfig::bank().validate(), Ok(()));
        assert_eq!(SimulationConfig::grocery().validate(), Ok(()));
    }

    #[test]
    fn bank_has_one_shared_line() {
        let config = SimulationConfig::bank();
        assert_eq!(config.lines, 1);
        assert_eq!(config.line_for_server(0), 0);
        assert_eq!(config.line_for_server(1), 0);
    }

    #[test]
    fn grocery_binds_one_server_per_line() {
        let config = SimulationConfig::grocery();
        let bound: Vec<usize> = (0..config.servers).map(|s| config.line_for_server(s)).collect();
        assert_eq!(bound, vec![0, 1, 2]);
    }

    #[test]
    fn zero_minutes_rejected() {
        let config = SimulationConfig::bank().with_minutes(0);
        assert_eq!(config.validate(), Err(ConfigError::Zero { field: "minutes" }));
    }

    #[test]
    fn more_lines_than_servers_rejected() {
        let config = SimulationConfig::grocery().with_servers(2, 3);
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnstaffedLines { lines: 3, servers: 2 })
        );
    }

    #[test]
    fn inverted_range_rejected() {
        let mut config = SimulationConfig::bank();
        config.service_ms = MillisRange::new(600, 300);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedRange {
                field: "service_ms",
                min: 600,
                max: 300
            })
        );
    }

    #[test]
    fn minute_length_scales_run_duration() {
        let mut config = SimulationConfig::bank().with_minutes(3);
        config.minute_ms = 50;
        assert_eq!(config.run_duration(), Duration::from_millis(150));
    }
}
