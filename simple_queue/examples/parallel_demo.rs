//! Demonstration of concurrent replications
//!
//! Runs several independent bank and grocery simulations side by side on a
//! shortened clock and compares how many customers each deployment turns away.
//!
//! Run with:
//!   cargo run --example parallel_demo -p simple_queue

use des::parallel::{ReplicationRunner, ReplicationSummary, simple_progress_reporter};
use des::SimulationConfig;

/// Shrink a preset so one replication takes about two seconds.
fn short_clock(config: SimulationConfig) -> SimulationConfig {
    SimulationConfig {
        minutes: 20,
        minute_ms: 100,
        ..config
    }
}

fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    println!("=== Parallel Replication Demo ===\n");

    for preset in [SimulationConfig::bank(), SimulationConfig::grocery()] {
        let name = preset.name.clone();
        let start = std::time::Instant::now();

        let results = ReplicationRunner::new(6, |_| short_clock(preset.clone()))
            .progress(simple_progress_reporter(3))
            .run();

        let summary = ReplicationSummary::from_results(&results);
        println!("{}: {} replications in {:.2}s", name, results.len(), start.elapsed().as_secs_f64());
        println!("  Mean arrived: {:.1}", summary.mean_arrived);
        println!("  Mean served:  {:.1}", summary.mean_served);
        println!("  Mean left:    {:.1}", summary.mean_left);
        println!("  Mean service: {:.1} ms\n", summary.mean_service_ms);
    }
}
