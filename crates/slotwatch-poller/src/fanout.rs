//! Delivery of discovered slots to the notifier and the result log.
//!
//! A notifier failure never prevents the result log write, and vice versa.
//! Consecutive log write failures across targets are tracked so a
//! persistently broken log can stop the process.

use std::sync::Arc;

use chrono::Local;
use slotwatch_core::{SlotCandidate, Target};
use slotwatch_notify::{Notifier, ResultLog, SlotRecord};

use crate::streak::FailureStreak;

/// What happened while fanning out one target's slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutReport {
    pub notified: bool,
    pub records_written: usize,
    pub log_failures: usize,
}

pub struct NotificationFanout {
    notifier: Arc<dyn Notifier>,
    log: Arc<dyn ResultLog>,
    log_streak: FailureStreak,
}

impl NotificationFanout {
    /// `max_log_failures` consecutive write failures mark the log broken;
    /// `0` never does.
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>, log: Arc<dyn ResultLog>, max_log_failures: u32) -> Self {
        Self {
            notifier,
            log,
            log_streak: FailureStreak::new(max_log_failures),
        }
    }

    #[must_use]
    pub fn log_broken(&self) -> bool {
        self.log_streak.is_tripped()
    }

    #[must_use]
    pub fn consecutive_log_failures(&self) -> u32 {
        self.log_streak.consecutive()
    }

    /// Notifies about `slots` and appends one log record per slot.
    pub async fn deliver(&self, target: &Target, slots: &[SlotCandidate]) -> FanoutReport {
        let mut report = FanoutReport::default();
        if slots.is_empty() {
            return report;
        }

        match self.notifier.notify(target, slots).await {
            Ok(()) => report.notified = true,
            Err(e) => tracing::error!(
                channel = self.notifier.channel_name(),
                location_id = target.location_id,
                service_id = target.service_id,
                slots = slots.len(),
                error = %e,
                "notification failed"
            ),
        }

        let discovered_at = Local::now().naive_local();
        for slot in slots {
            let record = SlotRecord::new(discovered_at, target, slot);
            match self.log.append(&record).await {
                Ok(()) => {
                    self.log_streak.record_success();
                    report.records_written += 1;
                }
                Err(e) => {
                    let consecutive = self.log_streak.record_failure();
                    report.log_failures += 1;
                    tracing::error!(
                        location_id = target.location_id,
                        service_id = target.service_id,
                        date = %record.date,
                        consecutive,
                        error = %e,
                        "failed to write result log record"
                    );
                }
            }
        }

        report
    }
}
