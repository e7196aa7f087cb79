use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// The two ordered identifier lists whose cross-product forms the targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Office (location) identifiers, polled in this order.
    pub locations: Vec<u32>,
    /// Service identifiers, polled in this order for every location.
    pub services: Vec<u32>,
}

impl TargetConfig {
    #[must_use]
    pub fn new(locations: Vec<u32>, services: Vec<u32>) -> Self {
        Self {
            locations,
            services,
        }
    }
}

/// Load and validate the target configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_targets(path: &Path) -> Result<TargetConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TargetsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_targets(&content)
}

/// Parse and validate target configuration from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the text is not valid YAML or fails validation.
pub fn parse_targets(content: &str) -> Result<TargetConfig, ConfigError> {
    let config: TargetConfig = serde_yaml::from_str(content)?;
    validate_targets(&config)?;
    Ok(config)
}

fn validate_targets(config: &TargetConfig) -> Result<(), ConfigError> {
    validate_id_list("locations", &config.locations)?;
    validate_id_list("services", &config.services)
}

fn validate_id_list(field: &str, ids: &[u32]) -> Result<(), ConfigError> {
    if ids.is_empty() {
        return Err(ConfigError::Validation(format!(
            "{field} must contain at least one identifier"
        )));
    }

    let mut seen = HashSet::new();
    for &id in ids {
        if id == 0 {
            return Err(ConfigError::Validation(format!(
                "{field} contains 0; identifiers must be positive"
            )));
        }
        if !seen.insert(id) {
            return Err(ConfigError::Validation(format!(
                "duplicate identifier {id} in {field}"
            )));
        }
    }

    Ok(())
}
