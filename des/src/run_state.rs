use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

/// Shared "still running" flag plus a wake-up signal for blocked workers.
///
/// The flag flips from running to stopped exactly once. Stopping also drops
/// the only sender of an otherwise silent channel, so every worker parked on
/// `signal()` wakes immediately instead of waiting out its timeout.
///
/// Separately, the arrival side closes once it will admit nobody else, which
/// tells servers that an empty line is going to stay empty.
pub struct RunState {
    running: AtomicBool,
    arrivals_closed: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    signal: Receiver<()>,
}

impl RunState {
    pub fn new() -> RunState {
        let (trigger, signal) = channel::bounded(0);
        RunState {
            running: AtomicBool::new(true),
            arrivals_closed: AtomicBool::new(false),
            trigger: Mutex::new(Some(trigger)),
            signal,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the run. Returns `true` only for the call that performed the stop.
    pub fn stop(&self) -> bool {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        let mut trigger = match self.trigger.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        trigger.take();
        was_running
    }

    /// No further customer will be admitted to any line.
    pub fn close_arrivals(&self) {
        self.arrivals_closed.store(true, Ordering::SeqCst);
    }

    pub fn arrivals_closed(&self) -> bool {
        self.arrivals_closed.load(Ordering::SeqCst)
    }

    /// Stopped, and nothing can arrive any more.
    pub fn is_finished(&self) -> bool {
        !self.is_running() && self.arrivals_closed()
    }

    /// Sleep for `duration` or until stopped, whichever comes first.
    ///
    /// Returns `true` if the full duration elapsed while still running.
    pub fn sleep(&self, duration: Duration) -> bool {
        if !self.is_running() {
            return false;
        }
        match self.signal.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => self.is_running(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Channel that disconnects when the run stops. Nothing is ever sent on it.
    pub fn signal(&self) -> &Receiver<()> {
        &self.signal
    }
}

impl Default for RunState {
    fn default() -> Self {
        RunState::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn stops_exactly_once() {
        let run_state = RunState::new();
        assert!(run_state.is_running());
        assert!(run_state.stop());
        assert!(!run_state.stop());
        assert!(!run_state.is_running());
    }

    #[test]
    fn finished_needs_stop_and_closed_arrivals() {
        let run_state = RunState::new();
        run_state.close_arrivals();
        assert!(!run_state.is_finished());
        run_state.stop();
        assert!(run_state.is_finished());
    }

    #[test]
    fn sleep_runs_to_completion_while_running() {
        let run_state = RunState::new();
        let start = Instant::now();
        assert!(run_state.sleep(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn stop_interrupts_sleep() {
        let run_state = Arc::new(RunState::new());
        let sleeper = {
            let run_state = Arc::clone(&run_state);
            thread::spawn(move || {
                let start = Instant::now();
                (run_state.sleep(Duration::from_secs(10)), start.elapsed())
            })
        };

        thread::sleep(Duration::from_millis(30));
        run_state.stop();
        let (completed, elapsed) = sleeper.join().unwrap();
        assert!(!completed);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn sleep_after_stop_returns_immediately() {
        let run_state = RunState::new();
        run_state.stop();
        assert!(!run_state.sleep(Duration::from_secs(10)));
    }
}
