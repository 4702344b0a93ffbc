use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Shared counters updated by the generator and every server.
///
/// Each counter is atomic on its own; there is no transaction across
/// counters, so a snapshot taken mid-run may count a customer as arrived
/// before it is counted as served or left.
#[derive(Debug, Default)]
pub struct StatisticsRegister {
    arrived: AtomicUsize,
    served: AtomicUsize,
    left: AtomicUsize,
    service_nanos: AtomicU64,
}

impl StatisticsRegister {
    pub fn new() -> StatisticsRegister {
        StatisticsRegister::default()
    }

    /// Count a new arrival and return its customer id (starting at 1).
    pub fn next_arrival(&self) -> usize {
        self.arrived.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn record_served(&self, service_time: Duration) {
        let nanos = u64::try_from(service_time.as_nanos()).unwrap_or(u64::MAX);
        self.service_nanos.fetch_add(nanos, Ordering::SeqCst);
        self.served.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_left(&self) {
        self.left.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            arrived: self.arrived.load(Ordering::SeqCst),
            served: self.served.load(Ordering::SeqCst),
            left: self.left.load(Ordering::SeqCst),
            total_service_time: Duration::from_nanos(self.service_nanos.load(Ordering::SeqCst)),
        }
    }
}

/// Point-in-time copy of the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub arrived: usize,
    pub served: usize,
    pub left: usize,
    pub total_service_time: Duration,
}

impl Snapshot {
    /// Zero when nobody was served.
    pub fn average_service_time(&self) -> Duration {
        if self.served == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total_service_time.as_nanos() / self.served as u128;
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    pub fn average_service_ms(&self) -> f64 {
        if self.served == 0 {
            return 0.0;
        }
        self.total_service_time.as_secs_f64() * 1000.0 / self.served as f64
    }

    /// Customers that arrived but have neither been served nor left yet.
    pub fn in_flight(&self) -> usize {
        self.arrived.saturating_sub(self.served + self.left)
    }

    pub fn is_balanced(&self) -> bool {
        self.arrived == self.served + self.left
    }
}
