//! Message body template for slot notifications.
//!
//! Templates are `minijinja` strings with four variables: `location_id`,
//! `service_id`, `date` (`dd.mm.yyyy`) and `url`. Undefined variables are a
//! rendering error rather than silently empty.

use std::path::Path;

use serde::Serialize;
use slotwatch_core::{SlotCandidate, Target};

use crate::error::NotifyError;

/// Body used when no template file is configured.
pub const DEFAULT_TEMPLATE: &str = "\
An appointment slot is available.

Office: {{ location_id }}
Service: {{ service_id }}
Date: {{ date }}

Book here: {{ url }}
";

#[derive(Debug, Serialize)]
struct MessageContext<'a> {
    location_id: u32,
    service_id: u32,
    date: String,
    url: &'a str,
}

/// A validated message template.
#[derive(Debug, Clone)]
pub struct MessageTemplate {
    source: String,
}

impl MessageTemplate {
    /// Parses `source`, rejecting syntax errors up front.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] if the template does not parse.
    pub fn new(source: impl Into<String>) -> Result<Self, NotifyError> {
        let source = source.into();
        build_env()
            .template_from_str(&source)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        Ok(Self { source })
    }

    /// Reads and parses a template file.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Config`] if the file cannot be read and
    /// [`NotifyError::Template`] if it does not parse.
    pub fn from_file(path: &Path) -> Result<Self, NotifyError> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            NotifyError::Config(format!("cannot read template {}: {e}", path.display()))
        })?;
        Self::new(source)
    }

    /// Renders the message for one slot of `target`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] if rendering fails, e.g. because
    /// the template references an unknown variable.
    pub fn render(&self, target: &Target, slot: &SlotCandidate) -> Result<String, NotifyError> {
        let ctx = MessageContext {
            location_id: target.location_id,
            service_id: target.service_id,
            date: slot.display_date(),
            url: &slot.source_url,
        };
        build_env()
            .render_str(&self.source, ctx)
            .map_err(|e| NotifyError::Template(e.to_string()))
    }
}

impl Default for MessageTemplate {
    fn default() -> Self {
        Self {
            source: DEFAULT_TEMPLATE.to_owned(),
        }
    }
}

fn build_env() -> minijinja::Environment<'static> {
    let mut env = minijinja::Environment::new();
    env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);
    env
}
