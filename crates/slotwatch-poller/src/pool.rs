//! Bounded-concurrency execution of one sweep.
//!
//! Targets are pulled lazily from the enumeration, so no more than
//! `workers` pipelines are in flight and a halted or cancelled sweep simply
//! stops pulling while in-flight targets drain. Completion order is not
//! enumeration order.

use std::sync::{Arc, OnceLock};

use futures::{future, stream, StreamExt};
use slotwatch_core::{AppConfig, Target};
use slotwatch_notify::{Notifier, ResultLog};
use slotwatch_scraper::{SlotExtractor, Transport};
use tokio_util::sync::CancellationToken;

use crate::fanout::{FanoutReport, NotificationFanout};
use crate::outcome::{FetchOutcome, HaltReason, SweepContext, SweepReport};
use crate::pipeline::TargetPipeline;
use crate::retry::RetryPolicy;

pub struct FetchWorkerPool {
    pipeline: TargetPipeline,
    fanout: NotificationFanout,
    workers: usize,
}

impl FetchWorkerPool {
    /// A `workers` value of `0` is treated as `1`.
    #[must_use]
    pub fn new(pipeline: TargetPipeline, fanout: NotificationFanout, workers: usize) -> Self {
        Self {
            pipeline,
            fanout,
            workers: workers.max(1),
        }
    }

    /// Wires the pool from the app config and its four collaborators.
    #[must_use]
    pub fn from_config(
        config: &AppConfig,
        transport: Arc<dyn Transport>,
        extractor: Arc<dyn SlotExtractor>,
        notifier: Arc<dyn Notifier>,
        log: Arc<dyn ResultLog>,
    ) -> Self {
        let pipeline = TargetPipeline::new(
            transport,
            extractor,
            config.base_url.clone(),
            RetryPolicy::from_config(config),
            config.max_rotation_failures,
        );
        let fanout = NotificationFanout::new(notifier, log, config.max_log_failures);
        Self::new(pipeline, fanout, config.workers)
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs every target through its pipeline with at most `workers` in
    /// flight, then returns once all pulled targets are terminal.
    pub async fn run_sweep<I>(
        &self,
        targets: I,
        ctx: &SweepContext,
        cancel: &CancellationToken,
    ) -> SweepReport
    where
        I: IntoIterator<Item = Target>,
    {
        let halt = OnceLock::new();

        let mut report = stream::iter(targets)
            .take_while(|_| {
                if let Some(reason) = self.halt_reason() {
                    let _ = halt.set(reason);
                    return future::ready(false);
                }
                future::ready(!cancel.is_cancelled())
            })
            .map(|target| self.process(target, ctx, cancel))
            .buffer_unordered(self.workers)
            .fold(
                SweepReport::new(ctx.sweep),
                |mut report, (outcome, fanout)| async move {
                    report.record(&outcome);
                    if !outcome.slots().is_empty() && !fanout.notified {
                        report.notification_failures += 1;
                    }
                    report.log_failures += fanout.log_failures;
                    report
                },
            )
            .await;

        report.cancelled = cancel.is_cancelled();
        report.halted = halt.get().copied().or_else(|| self.halt_reason());
        report.elapsed = ctx.elapsed();
        report
    }

    async fn process(
        &self,
        target: Target,
        ctx: &SweepContext,
        cancel: &CancellationToken,
    ) -> (FetchOutcome, FanoutReport) {
        let outcome = self.pipeline.run(target, cancel).await;
        let fanout = self.fanout.deliver(&target, outcome.slots()).await;

        tracing::info!(
            sweep = ctx.sweep,
            url = %self.pipeline.url_for(target),
            outcome = outcome.kind(),
            slots = outcome.slots().len(),
            elapsed_secs = ctx.elapsed().as_secs_f64(),
            "target done"
        );

        (outcome, fanout)
    }

    fn halt_reason(&self) -> Option<HaltReason> {
        if self.pipeline.transport_broken() {
            Some(HaltReason::TransportBroken {
                consecutive: self.pipeline.consecutive_rotation_failures(),
            })
        } else if self.fanout.log_broken() {
            Some(HaltReason::ResultLogBroken {
                consecutive: self.fanout.consecutive_log_failures(),
            })
        } else {
            None
        }
    }
}
