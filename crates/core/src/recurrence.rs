//! Recurring event arithmetic.
//!
//! Used by the recurrence background job to compute the successor of an
//! event whose target date has passed. Patterns are persisted as lowercase
//! text in `events.recurrence_pattern`.

use chrono::{Months, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

pub const PATTERN_MONTHLY: &str = "monthly";
pub const PATTERN_YEARLY: &str = "yearly";
pub const PATTERN_UNIQUE: &str = "unique";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePattern {
    Monthly,
    Yearly,
    Unique,
}

impl RecurrencePattern {
    pub const fn as_str(self) -> &'static str {
        match self {
            RecurrencePattern::Monthly => PATTERN_MONTHLY,
            RecurrencePattern::Yearly => PATTERN_YEARLY,
            RecurrencePattern::Unique => PATTERN_UNIQUE,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            PATTERN_MONTHLY => Some(RecurrencePattern::Monthly),
            PATTERN_YEARLY => Some(RecurrencePattern::Yearly),
            PATTERN_UNIQUE => Some(RecurrencePattern::Unique),
            _ => None,
        }
    }

    /// Target date of the next occurrence, or `None` for one-off events.
    ///
    /// Month arithmetic clamps to the last day of shorter months
    /// (Jan 31 + 1 month = Feb 28/29).
    pub fn next_occurrence(self, target: Timestamp) -> Option<Timestamp> {
        match self {
            RecurrencePattern::Monthly => target.checked_add_months(Months::new(1)),
            RecurrencePattern::Yearly => target.checked_add_months(Months::new(12)),
            RecurrencePattern::Unique => None,
        }
    }
}

/// Midnight UTC of the day containing `now`.
///
/// Events whose target date is strictly before this instant are due for a
/// successor.
pub fn start_of_day(now: Timestamp) -> Timestamp {
    Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN))
}
