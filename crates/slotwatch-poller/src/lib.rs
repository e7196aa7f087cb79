//! Polling orchestration: per-target fetch pipeline with bounded retries,
//! a bounded-concurrency worker pool per sweep, notification fan-out, and
//! the fixed-cadence scheduler that drives sweeps.

pub mod error;
pub mod fanout;
pub mod outcome;
pub mod pipeline;
pub mod pool;
pub mod retry;
pub mod scheduler;
pub mod streak;

pub use error::{PipelineError, PollerError};
pub use fanout::{FanoutReport, NotificationFanout};
pub use outcome::{FetchOutcome, HaltReason, SweepContext, SweepReport};
pub use pipeline::TargetPipeline;
pub use pool::FetchWorkerPool;
pub use retry::{Backoff, RetryPolicy};
pub use scheduler::{PollingScheduler, RunSummary, SchedulerConfig, SchedulerState, StopReason};
pub use streak::FailureStreak;
