use std::sync::atomic::{AtomicU32, Ordering};

/// Counts consecutive failures of a shared resource across targets.
///
/// Any success resets the count. Once the count reaches `threshold` the
/// streak is tripped; a threshold of `0` never trips.
#[derive(Debug)]
pub struct FailureStreak {
    consecutive: AtomicU32,
    threshold: u32,
}

impl FailureStreak {
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self {
            consecutive: AtomicU32::new(0),
            threshold,
        }
    }

    /// Records a failure and returns the new consecutive count.
    pub fn record_failure(&self) -> u32 {
        self.consecutive
            .fetch_add(1, Ordering::SeqCst)
            .saturating_add(1)
    }

    pub fn record_success(&self) {
        self.consecutive.store(0, Ordering::SeqCst);
    }

    #[must_use]
    pub fn consecutive(&self) -> u32 {
        self.consecutive.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_tripped(&self) -> bool {
        self.threshold > 0 && self.consecutive() >= self.threshold
    }
}
