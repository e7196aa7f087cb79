//! One target's fetch pipeline: rotate identity, fetch, check status,
//! extract. Retried as a whole per [`RetryPolicy`].

use std::sync::Arc;

use slotwatch_core::{SlotCandidate, Target};
use slotwatch_scraper::{SlotExtractor, Transport};
use tokio_util::sync::CancellationToken;

use crate::error::PipelineError;
use crate::outcome::FetchOutcome;
use crate::retry::{retry_with_backoff, RetryError, RetryPolicy};
use crate::streak::FailureStreak;

pub struct TargetPipeline {
    transport: Arc<dyn Transport>,
    extractor: Arc<dyn SlotExtractor>,
    base_url: String,
    retry: RetryPolicy,
    rotation_streak: FailureStreak,
}

impl TargetPipeline {
    /// `max_rotation_failures` consecutive rotation failures, counted across
    /// targets, mark the transport broken; `0` never does.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        extractor: Arc<dyn SlotExtractor>,
        base_url: impl Into<String>,
        retry: RetryPolicy,
        max_rotation_failures: u32,
    ) -> Self {
        Self {
            transport,
            extractor,
            base_url: base_url.into(),
            retry,
            rotation_streak: FailureStreak::new(max_rotation_failures),
        }
    }

    #[must_use]
    pub fn url_for(&self, target: Target) -> String {
        target.url(&self.base_url)
    }

    #[must_use]
    pub fn transport_broken(&self) -> bool {
        self.rotation_streak.is_tripped()
    }

    #[must_use]
    pub fn consecutive_rotation_failures(&self) -> u32 {
        self.rotation_streak.consecutive()
    }

    /// Runs the pipeline for `target` until it reaches a terminal outcome.
    ///
    /// `cancel` only interrupts back-off waits; an attempt already in flight
    /// always completes.
    pub async fn run(&self, target: Target, cancel: &CancellationToken) -> FetchOutcome {
        let url = self.url_for(target);
        let result = retry_with_backoff(&self.retry, cancel, |attempt| {
            let url = url.as_str();
            async move {
                tracing::debug!(%target, attempt, "fetching calendar");
                self.attempt(url).await
            }
        })
        .await;

        match result {
            Ok(slots) => FetchOutcome::Success { target, slots },
            Err(RetryError::Fatal(cause)) => {
                tracing::warn!(%target, url = %url, error = %cause, "giving up on target for this sweep");
                FetchOutcome::FatalFailure { target, cause }
            }
            Err(RetryError::Interrupted(cause)) => {
                tracing::info!(%target, error = %cause, "retry interrupted by shutdown");
                FetchOutcome::TransientFailure { target, cause }
            }
        }
    }

    async fn attempt(&self, url: &str) -> Result<Vec<SlotCandidate>, PipelineError> {
        match self.transport.rotate_identity().await {
            Ok(()) => self.rotation_streak.record_success(),
            Err(e) => {
                let consecutive = self.rotation_streak.record_failure();
                tracing::error!(consecutive, error = %e, "identity rotation failed");
                return Err(e.into());
            }
        }

        let response = self.transport.fetch(url).await?;
        if !response.is_ok() {
            return Err(PipelineError::HttpStatus {
                status: response.status,
                url: url.to_owned(),
            });
        }

        Ok(self.extractor.extract(&response.body, url)?)
    }
}
