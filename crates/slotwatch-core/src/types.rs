use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// `strftime` pattern used wherever a slot date is shown to a human or
/// written to the result log (`01.06.2024`).
pub const SLOT_DATE_FORMAT: &str = "%d.%m.%Y";

/// One (location, service) pair to poll.
///
/// Targets are derived once from [`crate::TargetConfig`] and never change for
/// the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub location_id: u32,
    pub service_id: u32,
}

impl Target {
    #[must_use]
    pub fn new(location_id: u32, service_id: u32) -> Self {
        Self {
            location_id,
            service_id,
        }
    }

    /// Renders the calendar page URL for this target under `base_url`.
    ///
    /// The `anliegen[]` key is written literally: the booking site does not
    /// accept the percent-encoded form.
    #[must_use]
    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{base}?termin=1&dienstleister={location}&anliegen[]={service}",
            base = base_url.trim_end_matches(['?', '/']),
            location = self.location_id,
            service = self.service_id,
        )
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.location_id, self.service_id)
    }
}

/// An available appointment date discovered on one calendar page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotCandidate {
    pub date: NaiveDate,
    pub source_url: String,
}

impl SlotCandidate {
    #[must_use]
    pub fn new(date: NaiveDate, source_url: impl Into<String>) -> Self {
        Self {
            date,
            source_url: source_url.into(),
        }
    }

    /// The slot date as `dd.mm.yyyy`.
    #[must_use]
    pub fn display_date(&self) -> String {
        self.date.format(SLOT_DATE_FORMAT).to_string()
    }
}
