use std::fmt;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Select, Sender, TrySendError};

use crate::run_state::RunState;

/// A customer waiting for service. Ids are handed out in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Customer {
    pub id: usize,
}

impl Customer {
    pub fn new(id: usize) -> Customer {
        Customer { id }
    }
}

/// Fixed-capacity FIFO waiting line shared between the arrival generator and
/// the servers.
///
/// Backed by a bounded crossbeam channel, so the capacity check and the insert
/// happen as one atomic step: two concurrent admitters can never push the line
/// past its capacity, and a free slot is never refused.
pub struct BoundedLine {
    id: usize,
    capacity: usize,
    sender: Sender<Customer>,
    receiver: Receiver<Customer>,
}

impl BoundedLine {
    /// Create line `id` holding at most `capacity` customers.
    ///
    /// A zero capacity is rejected by `SimulationConfig::validate` before any
    /// line is built; here it is clamped to one so the channel never becomes a
    /// rendezvous channel.
    pub fn new(id: usize, capacity: usize) -> BoundedLine {
        let capacity = capacity.max(1);
        let (sender, receiver) = channel::bounded(capacity);
        BoundedLine {
            id,
            capacity,
            sender,
            receiver,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append `customer` if there is room. Never blocks.
    pub fn try_admit(&self, customer: Customer) -> bool {
        match self.sender.try_send(customer) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Wait up to `timeout` for the oldest customer.
    pub fn try_remove(&self, timeout: Duration) -> Option<Customer> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Like `try_remove`, but also wakes as soon as `run_state` is stopped.
    ///
    /// Once stopped this is a plain `try_remove`, which still hands out
    /// whatever is queued so the caller can drain the line.
    pub fn remove_until_stopped(&self, timeout: Duration, run_state: &RunState) -> Option<Customer> {
        if !run_state.is_running() {
            return self.try_remove(timeout);
        }

        let mut select = Select::new();
        let line_op = select.recv(&self.receiver);
        let stop_op = select.recv(run_state.signal());

        match select.select_timeout(timeout) {
            Ok(op) if op.index() == line_op => op.recv(&self.receiver).ok(),
            Ok(op) => {
                debug_assert_eq!(op.index(), stop_op);
                // the stop signal is a closed channel, so this is always Err
                let _ = op.recv(run_state.signal());
                self.receiver.try_recv().ok()
            }
            Err(_) => None,
        }
    }

    /// Instantaneous length. May be stale by the time the caller uses it.
    pub fn size(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.size() >= self.capacity
    }
}

impl fmt::Debug for BoundedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedLine")
            .field("id", &self.id)
            .field("capacity", &self.capacity)
            .field("size", &self.size())
            .finish()
    }
}

/// Observed sizes of a set of lines, printed as `Q1:2, Q2:0`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Occupancy(pub Vec<usize>);

impl Occupancy {
    pub fn of(lines: &[BoundedLine]) -> Occupancy {
        Occupancy(lines.iter().map(BoundedLine::size).collect())
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }
}

impl fmt::Display for Occupancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, size) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "Q{}:{}", i + 1, size)?;
        }
        Ok(())
    }
}
