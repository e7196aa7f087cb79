use std::time::Duration;

use slotwatch_core::{SlotCandidate, Target};
use tokio::time::Instant;

use crate::error::{PipelineError, PollerError};

/// Terminal result of one target's pipeline within a sweep.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The calendar was read; `slots` may be empty.
    Success {
        target: Target,
        slots: Vec<SlotCandidate>,
    },
    /// A retriable failure that was cut short by cancellation.
    TransientFailure { target: Target, cause: PipelineError },
    /// The target was given up on for this sweep.
    FatalFailure { target: Target, cause: PipelineError },
}

impl FetchOutcome {
    #[must_use]
    pub fn target(&self) -> Target {
        match self {
            FetchOutcome::Success { target, .. }
            | FetchOutcome::TransientFailure { target, .. }
            | FetchOutcome::FatalFailure { target, .. } => *target,
        }
    }

    /// Short label for log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            FetchOutcome::Success { .. } => "success",
            FetchOutcome::TransientFailure { .. } => "transient_failure",
            FetchOutcome::FatalFailure { .. } => "fatal_failure",
        }
    }

    #[must_use]
    pub fn slots(&self) -> &[SlotCandidate] {
        match self {
            FetchOutcome::Success { slots, .. } => slots,
            _ => &[],
        }
    }
}

/// Per-sweep timing context shared by every target in the sweep.
#[derive(Debug, Clone, Copy)]
pub struct SweepContext {
    pub sweep: u64,
    pub started: Instant,
}

impl SweepContext {
    #[must_use]
    pub fn start(sweep: u64) -> Self {
        Self {
            sweep,
            started: Instant::now(),
        }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Why a sweep stopped pulling targets before the enumeration ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    TransportBroken { consecutive: u32 },
    ResultLogBroken { consecutive: u32 },
}

impl From<HaltReason> for PollerError {
    fn from(reason: HaltReason) -> Self {
        match reason {
            HaltReason::TransportBroken { consecutive } => PollerError::TransportBroken { consecutive },
            HaltReason::ResultLogBroken { consecutive } => PollerError::ResultLogBroken { consecutive },
        }
    }
}

/// Tally of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub sweep: u64,
    pub succeeded: usize,
    pub interrupted: usize,
    pub fatal_failures: usize,
    pub slots_found: usize,
    pub notification_failures: usize,
    pub log_failures: usize,
    pub cancelled: bool,
    pub halted: Option<HaltReason>,
    pub elapsed: Duration,
}

impl SweepReport {
    #[must_use]
    pub fn new(sweep: u64) -> Self {
        Self {
            sweep,
            ..Self::default()
        }
    }

    /// Targets that reached a terminal outcome.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.succeeded + self.interrupted + self.fatal_failures
    }

    pub(crate) fn record(&mut self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Success { slots, .. } => {
                self.succeeded += 1;
                self.slots_found += slots.len();
            }
            FetchOutcome::TransientFailure { .. } => self.interrupted += 1,
            FetchOutcome::FatalFailure { .. } => self.fatal_failures += 1,
        }
    }
}
