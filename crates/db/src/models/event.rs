//! Event entity model and DTOs.

use evently_core::error::CoreError;
use evently_core::recurrence::RecurrencePattern;
use evently_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// An event row from the `events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: DbId,
    pub owner_id: DbId,
    pub folder_id: Option<DbId>,
    pub category_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub target_date: Timestamp,
    /// One of `monthly`, `yearly`, `unique`.
    pub recurrence_pattern: String,
    pub recurrence_interval: Option<i32>,
    /// Set once the recurrence job has created the successor.
    pub child_created: bool,
    pub invite_token: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Event {
    pub fn recurrence(&self) -> Option<RecurrencePattern> {
        RecurrencePattern::parse(&self.recurrence_pattern)
    }
}

/// A member of an event as shown in API responses.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EventMemberView {
    pub user_id: DbId,
    pub username: String,
    pub invitation_status: String,
}

/// An event with its member list.
#[derive(Debug, Clone, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub members: Vec<EventMemberView>,
}

/// A pending or postponed invitation of the current user.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Invitation {
    pub event_id: DbId,
    pub event_name: String,
    pub target_date: Timestamp,
    pub category_id: Option<DbId>,
    pub owner_id: DbId,
    pub owner_username: String,
    pub invitation_status: String,
    pub joined_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Body of `POST /events`.
///
/// `name`, `recurrence_pattern` and `target_date` are required; they are
/// optional here so that every missing field can be reported at once.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateEvent {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub target_date: Option<Timestamp>,
    pub recurrence_pattern: Option<String>,
    #[validate(range(min = 1))]
    pub recurrence_interval: Option<i32>,
    pub category_id: Option<DbId>,
    pub folder_id: Option<DbId>,
    /// Usernames to invite.
    pub friends: Option<Vec<String>>,
    #[validate(length(min = 1, max = 64))]
    pub invite_token: Option<String>,
}

impl CreateEvent {
    /// Check required fields and the recurrence pattern.
    pub fn required(&self) -> Result<(String, Timestamp, RecurrencePattern), CoreError> {
        let mut missing = Vec::new();
        if self.name.is_none() {
            missing.push("name");
        }
        if self.recurrence_pattern.is_none() {
            missing.push("recurrence_pattern");
        }
        if self.target_date.is_none() {
            missing.push("target_date");
        }
        match (&self.name, self.target_date, &self.recurrence_pattern) {
            (Some(name), Some(target_date), Some(pattern)) => {
                Ok((name.clone(), target_date, parse_pattern(pattern)?))
            }
            _ => Err(CoreError::missing_fields(&missing)),
        }
    }
}

/// Body of `PUT /events/{id}`.
///
/// Scalar fields are patched when present. `folder_id` and `friends` are
/// replaced: omitting them detaches the folder and removes every member.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateEvent {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub target_date: Option<Timestamp>,
    pub recurrence_pattern: Option<String>,
    #[validate(range(min = 1))]
    pub recurrence_interval: Option<i32>,
    pub category_id: Option<DbId>,
    pub folder_id: Option<DbId>,
    pub friends: Option<Vec<String>>,
}

impl UpdateEvent {
    /// Validate the recurrence pattern if one was supplied.
    pub fn pattern(&self) -> Result<Option<RecurrencePattern>, CoreError> {
        self.recurrence_pattern
            .as_deref()
            .map(parse_pattern)
            .transpose()
    }
}

/// Body of `POST /events/join` and `POST /folders/join`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct JoinByToken {
    #[validate(length(min = 1, max = 64))]
    pub invite_token: Option<String>,
}

/// Body of `PUT /events/{id}/invitation`.
#[derive(Debug, Clone, Deserialize)]
pub struct RespondInvitation {
    /// `accepted`, `pending` or `refused`.
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// Insert row
// ---------------------------------------------------------------------------

/// Fully resolved values for an `events` insert.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub owner_id: DbId,
    pub folder_id: Option<DbId>,
    pub category_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub target_date: Timestamp,
    pub recurrence_pattern: RecurrencePattern,
    pub recurrence_interval: Option<i32>,
    pub invite_token: String,
}

impl NewEvent {
    /// The next occurrence of a recurring `parent`, or `None` when the
    /// pattern does not repeat.
    pub fn successor_of(parent: &Event, invite_token: String) -> Option<Self> {
        let pattern = parent.recurrence()?;
        let target_date = pattern.next_occurrence(parent.target_date)?;
        Some(Self {
            owner_id: parent.owner_id,
            folder_id: parent.folder_id,
            category_id: parent.category_id,
            name: parent.name.clone(),
            description: parent.description.clone(),
            location: parent.location.clone(),
            target_date,
            recurrence_pattern: pattern,
            recurrence_interval: parent.recurrence_interval,
            invite_token,
        })
    }
}

fn parse_pattern(value: &str) -> Result<RecurrencePattern, CoreError> {
    RecurrencePattern::parse(value).ok_or_else(|| {
        CoreError::Validation(format!(
            "Invalid recurrence_pattern '{value}': expected monthly, yearly or unique"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    fn event(pattern: &str) -> Event {
        let at = Utc.with_ymd_and_hms(2026, 1, 31, 18, 0, 0).unwrap();
        Event {
            id: 1,
            owner_id: 2,
            folder_id: Some(3),
            category_id: None,
            name: "Book club".into(),
            description: None,
            location: Some("Library".into()),
            target_date: at,
            recurrence_pattern: pattern.into(),
            recurrence_interval: None,
            child_created: false,
            invite_token: Some("abc".into()),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let err = CreateEvent::default().required().unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg
            == "Missing required fields: name, recurrence_pattern, target_date");
    }

    #[test]
    fn unknown_pattern_is_rejected() {
        let input = CreateEvent {
            name: Some("x".into()),
            target_date: Some(Utc::now()),
            recurrence_pattern: Some("weekly".into()),
            ..Default::default()
        };
        assert_matches!(input.required(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn successor_keeps_folder_and_advances_date() {
        let next = NewEvent::successor_of(&event("monthly"), "tok".into()).unwrap();
        assert_eq!(next.folder_id, Some(3));
        assert_eq!(next.target_date, Utc.with_ymd_and_hms(2026, 2, 28, 18, 0, 0).unwrap());
        assert_eq!(next.invite_token, "tok");
    }

    #[test]
    fn unique_events_have_no_successor() {
        assert!(NewEvent::successor_of(&event("unique"), "tok".into()).is_none());
    }
}
