//! Entity graph consumed by the audience resolver.
//!
//! The persistence layer loads one of these freshly after every committed
//! mutation. Everything the resolver needs is here, so resolution itself is a
//! pure function with no I/O.

use crate::device::DevicePlatform;
use crate::membership::InvitationStatus;
use crate::types::DbId;

/// A registered device of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEndpoint {
    pub platform: DevicePlatform,
    pub token: String,
}

/// A user together with their live devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub user_id: DbId,
    pub devices: Vec<PushEndpoint>,
}

impl Participant {
    pub fn new(user_id: DbId) -> Self {
        Self {
            user_id,
            devices: Vec::new(),
        }
    }

    pub fn with_device(mut self, platform: DevicePlatform, token: impl Into<String>) -> Self {
        self.devices.push(PushEndpoint {
            platform,
            token: token.into(),
        });
        self
    }

    /// Tokens of the devices that currently receive push notifications.
    pub fn push_tokens(&self) -> impl Iterator<Item = &str> {
        self.devices
            .iter()
            .filter(|d| d.platform.receives_push())
            .map(|d| d.token.as_str())
    }
}

/// An event membership with its invitation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphMember {
    pub participant: Participant,
    pub status: InvitationStatus,
}

impl GraphMember {
    pub fn user_id(&self) -> DbId {
        self.participant.user_id
    }
}

/// The folder an event belongs to, with owner and members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderGraph {
    pub id: DbId,
    pub name: String,
    pub owner: Participant,
    pub members: Vec<Participant>,
}

/// An event with everything needed to compute its notification audience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventGraph {
    pub id: DbId,
    pub name: String,
    pub category_id: Option<DbId>,
    pub owner: Participant,
    pub members: Vec<GraphMember>,
    pub folder: Option<FolderGraph>,
}

impl EventGraph {
    /// Ids of every member row, regardless of status.
    pub fn member_ids(&self) -> Vec<DbId> {
        self.members.iter().map(GraphMember::user_id).collect()
    }

    pub fn status_of(&self, user_id: DbId) -> Option<InvitationStatus> {
        self.members
            .iter()
            .find(|m| m.user_id() == user_id)
            .map(|m| m.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_apple_devices_yield_push_tokens() {
        let p = Participant::new(1)
            .with_device(DevicePlatform::Apple, "a1")
            .with_device(DevicePlatform::Web, "w1")
            .with_device(DevicePlatform::Apple, "a2");
        assert_eq!(p.push_tokens().collect::<Vec<_>>(), vec!["a1", "a2"]);
    }

    #[test]
    fn member_ids_and_statuses_ignore_the_folder() {
        let graph = EventGraph {
            id: 1,
            name: "Dinner".into(),
            category_id: None,
            owner: Participant::new(10),
            members: vec![GraphMember {
                participant: Participant::new(11),
                status: InvitationStatus::Invited,
            }],
            folder: Some(FolderGraph {
                id: 5,
                name: "Weekly".into(),
                owner: Participant::new(10),
                members: vec![Participant::new(12)],
            }),
        };
        assert_eq!(graph.member_ids(), vec![11]);
        assert_eq!(graph.status_of(11), Some(InvitationStatus::Invited));
        assert_eq!(graph.status_of(12), None);
    }
}
