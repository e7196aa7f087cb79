//! Bookable-date extraction from the appointment calendar page.
//!
//! The page renders one `calendar-month-table` widget per month, starting
//! with the current month. Days that can be booked are `td.buchbar` cells
//! wrapping a link whose text is the day of month.

use std::sync::LazyLock;

use chrono::{Datelike, Months, NaiveDate};
use regex::Regex;
use slotwatch_core::SlotCandidate;

use crate::error::ExtractionError;

static MONTH_TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)class\s*=\s*["'](?:[^"']*\s)?calendar-month-table(?:\s[^"']*)?["']"#)
        .expect("valid month table regex")
});

static DAY_CELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<td\b([^>]*)>\s*<a\b([^>]*)>(.*?)</a>").expect("valid day cell regex")
});

static CLASS_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bclass\s*=\s*["']([^"']*)["']"#).expect("valid class regex")
});

static HREF_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bhref\s*=\s*["']([^"']*)["']"#).expect("valid href regex")
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));

/// Turns a fetched page body into slot candidates.
pub trait SlotExtractor: Send + Sync {
    /// Extracts every bookable date from `body`, tagging each with `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError`] if the page does not have the expected
    /// structure.
    fn extract(&self, body: &str, url: &str) -> Result<Vec<SlotCandidate>, ExtractionError>;
}

/// [`SlotExtractor`] for the Berlin appointment calendar markup.
#[derive(Debug, Default, Clone, Copy)]
pub struct CalendarExtractor;

impl CalendarExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Extracts slots relative to `today`: the first widget is `today`'s
    /// month, the n-th widget the n-th following month.
    ///
    /// # Errors
    ///
    /// - [`ExtractionError::MissingCalendar`] if no month widget is present
    ///   (error or challenge page).
    /// - [`ExtractionError::UnparsableDay`] if a bookable cell's link text is
    ///   not a number.
    /// - [`ExtractionError::InvalidDay`] if the day does not exist in its month.
    pub fn extract_on(
        &self,
        body: &str,
        url: &str,
        today: NaiveDate,
    ) -> Result<Vec<SlotCandidate>, ExtractionError> {
        let starts: Vec<usize> = MONTH_TABLE_RE.find_iter(body).map(|m| m.start()).collect();
        if starts.is_empty() {
            return Err(ExtractionError::MissingCalendar {
                url: url.to_owned(),
            });
        }

        let first_of_month = today.with_day(1).unwrap_or(today);
        let mut slots = Vec::new();

        for (index, &start) in starts.iter().enumerate() {
            let end = starts.get(index + 1).copied().unwrap_or(body.len());
            let widget = &body[start..end];

            let offset = u32::try_from(index).unwrap_or(u32::MAX);
            let Some(month) = first_of_month.checked_add_months(Months::new(offset)) else {
                break;
            };

            for day in bookable_days(widget, url)? {
                let date = NaiveDate::from_ymd_opt(month.year(), month.month(), day).ok_or_else(
                    || ExtractionError::InvalidDay {
                        url: url.to_owned(),
                        year: month.year(),
                        month: month.month(),
                        day,
                    },
                )?;
                slots.push(SlotCandidate::new(date, url));
            }
        }

        Ok(slots)
    }
}

impl SlotExtractor for CalendarExtractor {
    fn extract(&self, body: &str, url: &str) -> Result<Vec<SlotCandidate>, ExtractionError> {
        self.extract_on(body, url, chrono::Local::now().date_naive())
    }
}

/// Day numbers of every bookable cell in one month widget.
///
/// Cells without a link target, and a day text of `0`, are skipped.
fn bookable_days(widget: &str, url: &str) -> Result<Vec<u32>, ExtractionError> {
    let mut days = Vec::new();

    for cell in DAY_CELL_RE.captures_iter(widget) {
        let td_attrs = cell.get(1).map_or("", |m| m.as_str());
        if !has_class(td_attrs, "buchbar") {
            continue;
        }

        let anchor_attrs = cell.get(2).map_or("", |m| m.as_str());
        let has_link = HREF_ATTR_RE
            .captures(anchor_attrs)
            .and_then(|c| c.get(1))
            .is_some_and(|m| !m.as_str().trim().is_empty());
        if !has_link {
            continue;
        }

        let inner = cell.get(3).map_or("", |m| m.as_str());
        let text = TAG_RE.replace_all(inner, "");
        let text = text.trim();
        let day = text
            .parse::<u32>()
            .map_err(|_| ExtractionError::UnparsableDay {
                url: url.to_owned(),
                text: text.to_owned(),
            })?;
        if day > 0 {
            days.push(day);
        }
    }

    Ok(days)
}

fn has_class(attrs: &str, class: &str) -> bool {
    CLASS_ATTR_RE
        .captures(attrs)
        .and_then(|c| c.get(1))
        .is_some_and(|m| m.as_str().split_whitespace().any(|c| c == class))
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
