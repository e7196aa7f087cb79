//! Downstream sinks for discovered slots: operator notification and the
//! durable append-only result log.

pub mod email;
pub mod error;
pub mod notifier;
pub mod result_log;
pub mod template;

pub use email::EmailNotifier;
pub use error::{LogWriteError, NotifyError};
pub use notifier::{Notifier, TracingNotifier};
pub use result_log::{JsonLinesLog, ResultLog, SlotRecord};
pub use template::{MessageTemplate, DEFAULT_TEMPLATE};
