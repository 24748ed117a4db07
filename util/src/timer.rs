use std::time::{Duration, Instant};

/// Keeps track of how long a pipeline stage took.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Create a new `Timer` started now.
    pub fn now() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Restart the timer.
    pub fn reset(&mut self) {
        self.start = Instant::now();
    }

    /// Time since the timer was last reset.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Print a message with the elapsed time since the timer was last reset.
    pub fn print_elapsed(&self, stage: &str) {
        let elapsed = self.elapsed();
        log::debug!("{stage} took {elapsed:?}");
        eprintln!("{} took {:.2?}", stage, elapsed);
    }
}
