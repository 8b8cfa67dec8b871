//! Real-time "please reload" signals.
//!
//! A signal tells connected clients which entity changed so they can
//! re-fetch it. Signals are idempotent triggers, not diffs.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// Which client-side collection a signal refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RealtimeContext {
    #[serde(rename = "event")]
    Event,
    #[serde(rename = "event-invite")]
    EventInvite,
    #[serde(rename = "folder")]
    Folder,
    #[serde(rename = "friend")]
    Friend,
    #[serde(rename = "friendRequest")]
    FriendRequest,
}

impl RealtimeContext {
    pub const fn as_str(self) -> &'static str {
        match self {
            RealtimeContext::Event => "event",
            RealtimeContext::EventInvite => "event-invite",
            RealtimeContext::Folder => "folder",
            RealtimeContext::Friend => "friend",
            RealtimeContext::FriendRequest => "friendRequest",
        }
    }
}

/// Kind of mutation that produced a notification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    #[default]
    Create,
    Update,
    Delete,
}

impl ChangeAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            ChangeAction::Create => "create",
            ChangeAction::Update => "update",
            ChangeAction::Delete => "delete",
        }
    }
}

/// Body of the `update` frame sent to every targeted identity.
///
/// `action` is omitted for creations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeMessage {
    pub context: RealtimeContext,
    pub id: DbId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ChangeAction>,
}

impl RealtimeMessage {
    pub fn new(context: RealtimeContext, id: DbId, action: ChangeAction) -> Self {
        let action = match action {
            ChangeAction::Create => None,
            other => Some(other),
        };
        Self {
            context,
            id,
            action,
        }
    }
}
