//! Fixed-cadence sweep loop.
//!
//! `Idle → SweepRunning → Sleeping → SweepRunning → … → Stopped`. The limit
//! is checked only between sweeps: a sweep that crosses the boundary
//! completes, and no further sweep starts.

use std::time::Duration;

use slotwatch_core::{AppConfig, TargetEnumerator};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::PollerError;
use crate::outcome::{SweepContext, SweepReport};
use crate::pool::FetchWorkerPool;

const DEFAULT_POLLING_DELAY: Duration = Duration::from_secs(30);
const DEFAULT_LIMIT: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub polling_delay: Duration,
    pub limit: Duration,
}

impl Default for SchedulerConfig {
    /// Thirty seconds between sweeps, for up to 365 days.
    fn default() -> Self {
        Self {
            polling_delay: DEFAULT_POLLING_DELAY,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl SchedulerConfig {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            polling_delay: Duration::from_secs(config.polling_delay_secs),
            limit: Duration::from_secs(config.limit_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    SweepRunning { sweep: u64 },
    Sleeping { after_sweep: u64 },
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    LimitReached,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub sweeps: u64,
    pub slots_found: usize,
    pub elapsed: Duration,
    pub stop_reason: StopReason,
}

pub struct PollingScheduler {
    pool: FetchWorkerPool,
    enumerator: TargetEnumerator,
    config: SchedulerConfig,
    state: watch::Sender<SchedulerState>,
}

impl PollingScheduler {
    #[must_use]
    pub fn new(pool: FetchWorkerPool, enumerator: TargetEnumerator, config: SchedulerConfig) -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);
        Self {
            pool,
            enumerator,
            config,
            state,
        }
    }

    /// Observes state transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Runs a single sweep and stops.
    ///
    /// # Errors
    ///
    /// Returns [`PollerError`] if the sweep halted on a broken transport or
    /// result log.
    pub async fn run_once(&self, cancel: &CancellationToken) -> Result<SweepReport, PollerError> {
        let report = self.sweep(1, cancel).await;
        self.set_state(SchedulerState::Stopped);
        match report.halted {
            Some(reason) => Err(reason.into()),
            None => Ok(report),
        }
    }

    /// Sweeps until the limit elapses or `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns [`PollerError`] as soon as a sweep halts on a broken transport
    /// or result log; no further sweep is started.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<RunSummary, PollerError> {
        let started = Instant::now();
        let mut sweeps = 0u64;
        let mut slots_found = 0usize;

        let stop_reason = loop {
            sweeps += 1;
            let report = self.sweep(sweeps, cancel).await;
            slots_found += report.slots_found;

            if let Some(reason) = report.halted {
                self.set_state(SchedulerState::Stopped);
                let err = PollerError::from(reason);
                tracing::error!(sweep = sweeps, error = %err, "stopping scheduler");
                return Err(err);
            }
            if cancel.is_cancelled() {
                break StopReason::Cancelled;
            }
            if started.elapsed() >= self.config.limit {
                break StopReason::LimitReached;
            }

            self.set_state(SchedulerState::Sleeping {
                after_sweep: sweeps,
            });
            tracing::debug!(
                delay_secs = self.config.polling_delay.as_secs(),
                "sleeping until next sweep"
            );
            tokio::select! {
                biased;
                () = cancel.cancelled() => break StopReason::Cancelled,
                () = tokio::time::sleep(self.config.polling_delay) => {}
            }

            if started.elapsed() >= self.config.limit {
                break StopReason::LimitReached;
            }
        };

        self.set_state(SchedulerState::Stopped);
        let summary = RunSummary {
            sweeps,
            slots_found,
            elapsed: started.elapsed(),
            stop_reason,
        };
        tracing::info!(
            sweeps = summary.sweeps,
            slots_found = summary.slots_found,
            elapsed_secs = summary.elapsed.as_secs(),
            reason = ?summary.stop_reason,
            "scheduler stopped"
        );
        Ok(summary)
    }

    async fn sweep(&self, sweep: u64, cancel: &CancellationToken) -> SweepReport {
        self.set_state(SchedulerState::SweepRunning { sweep });
        tracing::info!(
            sweep,
            targets = self.enumerator.len(),
            workers = self.pool.workers(),
            "sweep started"
        );

        let ctx = SweepContext::start(sweep);
        let report = self
            .pool
            .run_sweep(self.enumerator.enumerate(), &ctx, cancel)
            .await;

        tracing::info!(
            sweep,
            succeeded = report.succeeded,
            fatal_failures = report.fatal_failures,
            interrupted = report.interrupted,
            slots_found = report.slots_found,
            notification_failures = report.notification_failures,
            log_failures = report.log_failures,
            cancelled = report.cancelled,
            elapsed_secs = report.elapsed.as_secs_f64(),
            "sweep finished"
        );
        report
    }

    fn set_state(&self, state: SchedulerState) {
        self.state.send_replace(state);
    }
}
