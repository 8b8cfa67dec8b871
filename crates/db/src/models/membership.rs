//! Event and folder membership rows.

use evently_core::membership::InvitationStatus;
use evently_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from `event_members`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EventMember {
    pub id: DbId,
    pub event_id: DbId,
    pub user_id: DbId,
    /// One of `invited`, `pending`, `accepted`.
    pub invitation_status: String,
    pub joined_at: Timestamp,
    pub updated_at: Timestamp,
}

impl EventMember {
    pub fn status(&self) -> Option<InvitationStatus> {
        InvitationStatus::parse(&self.invitation_status)
    }
}

/// A row from `folder_members`. Presence alone makes the user a member.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FolderMember {
    pub id: DbId,
    pub folder_id: DbId,
    pub user_id: DbId,
    pub joined_at: Timestamp,
}
