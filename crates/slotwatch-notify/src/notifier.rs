//! Notifier trait and the log-only implementation.

use async_trait::async_trait;
use slotwatch_core::{SlotCandidate, Target};

use crate::error::NotifyError;

/// Tells the operator about newly discovered slots of one target.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one message per slot.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if rendering or delivery fails. Slots already
    /// delivered before the failure stay delivered.
    async fn notify(&self, target: &Target, slots: &[SlotCandidate]) -> Result<(), NotifyError>;

    /// Short channel name used in log fields.
    fn channel_name(&self) -> &str;
}

/// Writes notifications to the `tracing` log instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, target: &Target, slots: &[SlotCandidate]) -> Result<(), NotifyError> {
        for slot in slots {
            tracing::info!(
                channel = "log",
                location_id = target.location_id,
                service_id = target.service_id,
                date = %slot.display_date(),
                url = %slot.source_url,
                "slot available"
            );
        }
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "log"
    }
}
