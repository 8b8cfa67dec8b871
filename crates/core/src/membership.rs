//! Event and folder membership model.
//!
//! Event memberships carry an [`InvitationStatus`]; folder memberships are
//! plain presence rows and have no status. Ownership is never a membership
//! row: an event or folder owner is implied by the `owner_id` column.
//!
//! Statuses are persisted as lowercase text in `event_members.invitation_status`
//! and must match the CHECK constraint in the `event_members` migration.

use serde::{Deserialize, Serialize};

pub const STATUS_INVITED: &str = "invited";
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_ACCEPTED: &str = "accepted";

/// Wire value of an invitation response that removes the membership.
pub const RESPONSE_REFUSED: &str = "refused";

// ---------------------------------------------------------------------------
// InvitationStatus
// ---------------------------------------------------------------------------

/// Persisted state of an event membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    /// Named by the owner, no answer yet.
    Invited,
    /// The member postponed the decision.
    Pending,
    /// Full participant.
    Accepted,
}

impl InvitationStatus {
    /// Status of a membership created because the owner named a friend.
    pub const fn for_named_invite() -> Self {
        InvitationStatus::Invited
    }

    /// Status of a membership created by redeeming an invite token.
    pub const fn for_token_join() -> Self {
        InvitationStatus::Accepted
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            InvitationStatus::Invited => STATUS_INVITED,
            InvitationStatus::Pending => STATUS_PENDING,
            InvitationStatus::Accepted => STATUS_ACCEPTED,
        }
    }

    /// Parse the persisted text form. Returns `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            STATUS_INVITED => Some(InvitationStatus::Invited),
            STATUS_PENDING => Some(InvitationStatus::Pending),
            STATUS_ACCEPTED => Some(InvitationStatus::Accepted),
            _ => None,
        }
    }

    /// Whether the member still owes the owner a decision.
    ///
    /// Both `invited` and `pending` members belong to the invite audience.
    pub const fn awaits_decision(self) -> bool {
        matches!(self, InvitationStatus::Invited | InvitationStatus::Pending)
    }

    /// Check whether a status change is allowed.
    ///
    /// `invited -> accepted`, `invited -> pending` and `pending <-> accepted`
    /// are valid. Re-applying the current status is a no-op and allowed.
    /// Nothing ever moves back to `invited`.
    pub fn can_transition_to(self, next: InvitationStatus) -> bool {
        use InvitationStatus::*;
        match (self, next) {
            (from, to) if from == to => true,
            (Invited, Accepted) | (Invited, Pending) => true,
            (Pending, Accepted) | (Accepted, Pending) => true,
            _ => false,
        }
    }

    /// Validate a status change, returning a human-readable error for invalid ones.
    pub fn validate_transition(self, next: InvitationStatus) -> Result<(), String> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(format!(
                "Invalid invitation transition: {} -> {}",
                self.as_str(),
                next.as_str()
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// InvitationResponse
// ---------------------------------------------------------------------------

/// What a member answers to an invitation.
///
/// `Refused` is not a persisted state: it deletes the membership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationResponse {
    Accept,
    Postpone,
    Refuse,
}

impl InvitationResponse {
    /// Parse the wire value (`accepted`, `pending`, `refused`).
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            STATUS_ACCEPTED => Some(InvitationResponse::Accept),
            STATUS_PENDING => Some(InvitationResponse::Postpone),
            RESPONSE_REFUSED => Some(InvitationResponse::Refuse),
            _ => None,
        }
    }

    /// The status the membership moves to, or `None` when the row is removed.
    pub const fn target_status(self) -> Option<InvitationStatus> {
        match self {
            InvitationResponse::Accept => Some(InvitationStatus::Accepted),
            InvitationResponse::Postpone => Some(InvitationStatus::Pending),
            InvitationResponse::Refuse => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Member list diff
// ---------------------------------------------------------------------------

/// Outcome of diffing a desired member list against the current one.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemberDiff<T> {
    /// Present in the desired list but not a member yet.
    pub to_add: Vec<T>,
    /// Current members absent from the desired list.
    pub to_remove: Vec<T>,
}

/// Diff the desired member ids against the current ones.
///
/// `owner` is never added: ownership is implicit. Order of `desired` is kept
/// for additions and duplicates collapse to their first occurrence.
pub fn diff_members<T>(current: &[T], desired: &[T], owner: &T) -> MemberDiff<T>
where
    T: PartialEq + Clone,
{
    let mut to_add: Vec<T> = Vec::new();
    for id in desired {
        if id == owner || current.contains(id) || to_add.contains(id) {
            continue;
        }
        to_add.push(id.clone());
    }

    let to_remove = current
        .iter()
        .filter(|id| !desired.contains(id))
        .cloned()
        .collect();

    MemberDiff { to_add, to_remove }
}
