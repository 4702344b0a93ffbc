//! Concurrent queueing simulation engine
//!
//! Customers arrive at random intervals, join one of a set of bounded waiting
//! lines, and are served by a fixed pool of servers. Every actor is a real
//! thread running on the wall clock:
//!
//! - [`ArrivalGenerator`]: one thread synthesizing customers, with a single
//!   retry before a customer gives up
//! - [`Server`]: one thread per server, each bound to one line
//! - [`Simulation`]: starts both, stops them after the configured duration,
//!   joins them within a grace period and produces a [`SimulationReport`]
//!
//! One line shared by every server models a bank; one line per server models
//! grocery checkout counters. Both are the same engine with a different
//! [`SimulationConfig`].

pub mod arrival;
pub mod config;
pub mod controller;
pub mod line;
pub mod parallel;
pub mod report;
pub mod run_state;
pub mod selector;
pub mod server;
pub mod stats;

pub use arrival::{Admission, ArrivalGenerator};
pub use config::{ConfigError, MillisRange, SimulationConfig};
pub use controller::{Simulation, SimulationError};
pub use line::{BoundedLine, Customer, Occupancy};
pub use report::SimulationReport;
pub use run_state::RunState;
pub use selector::{LineSelector, ShortestLine, SingleLine, selector_for};
pub use server::Server;
pub use stats::{Snapshot, StatisticsRegister};
