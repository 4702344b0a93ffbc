use std::fmt;

use crate::line::Occupancy;
use crate::stats::Snapshot;

/// Final statistics of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub name: String,
    pub snapshot: Snapshot,
    pub occupancy: Occupancy,
    /// Workers that had not finished when their grace period ran out.
    pub stragglers: Vec<String>,
}

impl SimulationReport {
    /// Every worker finished inside its grace period.
    pub fn is_complete(&self) -> bool {
        self.stragglers.is_empty()
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== {} SIMULATION RESULTS ===",
            self.name.to_uppercase()
        )?;
        writeln!(f, "Total customers arrived: {}", self.snapshot.arrived)?;
        writeln!(f, "Total customers served: {}", self.snapshot.served)?;
        writeln!(f, "Customers who left unserved: {}", self.snapshot.left)?;
        writeln!(
            f,
            "Average service time: {:.2} ms",
            self.snapshot.average_service_ms()
        )?;
        write!(f, "Final queue status: {}", self.occupancy)?;
        if !self.is_complete() {
            write!(
                f,
                "\nStill running after grace period: {}",
                self.stragglers.join(", ")
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn report(served: usize, stragglers: Vec<String>) -> SimulationReport {
        SimulationReport {
            name: "grocery".to_string(),
            snapshot: Snapshot {
                arrived: 10,
                served,
                left: 10 - served,
                total_service_time: Duration::from_millis(450 * served as u64),
            },
            occupancy: Occupancy(vec![0, 1, 0]),
            stragglers,
        }
    }

    #[test]
    fn summary_block_lists_every_figure() {
        let text = report(8, vec![]).to_string();
        assert!(text.starts_with("=== GROCERY SIMULATION RESULTS ==="));
        assert!(text.contains("Total customers arrived: 10"));
        assert!(text.contains("Total customers served: 8"));
        assert!(text.contains("Customers who left unserved: 2"));
        assert!(text.contains("Average service time: 450.00 ms"));
        assert!(text.contains("Final queue status: Q1:0, Q2:1, Q3:0"));
        assert!(!text.contains("grace period"));
    }

    #[test]
    fn nobody_served_prints_zero_average() {
        let text = report(0, vec![]).to_string();
        assert!(text.contains("Average service time: 0.00 ms"));
    }

    #[test]
    fn stragglers_are_listed() {
        let report = report(5, vec!["arrivals".to_string(), "server-2".to_string()]);
        assert!(!report.is_complete());
        assert!(
            report
                .to_string()
                .ends_with("Still running after grace period: arrivals, server-2")
        );
    }
}
