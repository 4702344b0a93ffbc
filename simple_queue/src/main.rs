use std::process::ExitCode;

use clap::Parser;
use des::Simulation;
use des::parallel::{ReplicationRunner, ReplicationSummary, simple_progress_reporter};
use simple_queue::{Args, build_config};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("=== {} SIMULATION ===", config.name.to_uppercase());
    println!("Simulation Time: {} minutes", config.minutes);
    println!("Servers: {}", config.servers);
    println!("Lines: {}", config.lines);
    println!("Line Capacity: {} customers\n", config.capacity);

    if args.replications > 1 {
        let results = ReplicationRunner::new(args.replications, |_| config.clone())
            .progress(simple_progress_reporter(1))
            .run();

        for (id, result) in results.iter().enumerate() {
            match result {
                Ok(report) => println!("\n--- Replication {} ---\n{}", id + 1, report),
                Err(e) => error!(replication = id + 1, error = %e, "replication failed"),
            }
        }

        let summary = ReplicationSummary::from_results(&results);
        println!("\n=== ACROSS {} REPLICATIONS ===", summary.succeeded);
        println!("Mean customers arrived: {:.2}", summary.mean_arrived);
        println!("Mean customers served: {:.2}", summary.mean_served);
        println!("Mean customers left unserved: {:.2}", summary.mean_left);
        println!("Mean service time: {:.2} ms", summary.mean_service_ms);
        return if summary.failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE };
    }

    let simulation = match Simulation::new(config) {
        Ok(simulation) => simulation,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match simulation.run() {
        Ok(report) => {
            println!("\n{}", report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "simulation could not start");
            ExitCode::FAILURE
        }
    }
}
