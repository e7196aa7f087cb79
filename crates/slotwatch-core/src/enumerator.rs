//! Lazy cross-product of configured location and service identifiers.

use std::sync::Arc;

use crate::{Target, TargetConfig};

/// Produces the sweep order over all targets.
///
/// Iteration is location-major: every service of the first location, then
/// every service of the second, and so on. `enumerate` can be called any
/// number of times and always yields the same sequence.
#[derive(Debug, Clone)]
pub struct TargetEnumerator {
    config: Arc<TargetConfig>,
}

impl TargetEnumerator {
    #[must_use]
    pub fn new(config: TargetConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Returns a fresh iterator over every target.
    ///
    /// The iterator owns a handle to the configuration, so it can be moved
    /// into a sweep without borrowing the enumerator.
    #[must_use]
    pub fn enumerate(&self) -> Targets {
        Targets {
            config: Arc::clone(&self.config),
            location: 0,
            service: 0,
        }
    }

    /// Number of targets in one sweep.
    #[must_use]
    pub fn len(&self) -> usize {
        self.config.locations.len() * self.config.services.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Iterator returned by [`TargetEnumerator::enumerate`].
#[derive(Debug, Clone)]
pub struct Targets {
    config: Arc<TargetConfig>,
    location: usize,
    service: usize,
}

impl Iterator for Targets {
    type Item = Target;

    fn next(&mut self) -> Option<Target> {
        if self.config.services.is_empty() {
            return None;
        }
        let location_id = *self.config.locations.get(self.location)?;
        let service_id = self.config.services[self.service];

        self.service += 1;
        if self.service == self.config.services.len() {
            self.service = 0;
            self.location += 1;
        }

        Some(Target::new(location_id, service_id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let services = self.config.services.len();
        let remaining = if services == 0 {
            0
        } else {
            self.config
                .locations
                .len()
                .saturating_sub(self.location)
                .saturating_mul(services)
                .saturating_sub(self.service)
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Targets {}
