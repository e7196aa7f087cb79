//! Domain types, configuration, and target enumeration shared by every
//! `slotwatch` crate.

pub mod app_config;
pub mod config;
pub mod enumerator;
pub mod error;
pub mod targets;
pub mod types;

pub use app_config::{AppConfig, BackoffStrategy, MailConfig, TorConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use enumerator::TargetEnumerator;
pub use error::ConfigError;
pub use targets::{load_targets, TargetConfig};
pub use types::{SlotCandidate, Target, SLOT_DATE_FORMAT};
