//! Push notification kinds and their human-readable templates.
//!
//! The push sink turns a [`PushMessage`] into a provider payload. Bodies are
//! rendered here so every provider shows the same text, and `loc_key` /
//! `loc_args` let the client localise on-device.

use serde::Serialize;

use crate::realtime::ChangeAction;
use crate::types::DbId;

/// Provider-side time-to-live of a push notification.
pub const PUSH_EXPIRY_SECS: i64 = 3600;

/// Fixed badge count shown on the app icon.
pub const PUSH_BADGE: u32 = 3;

/// Bundled notification sound.
pub const PUSH_SOUND: &str = "ping.aiff";

// ---------------------------------------------------------------------------
// PushKind
// ---------------------------------------------------------------------------

/// Machine-readable push type, echoed to the client in the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PushKind {
    #[serde(rename = "event")]
    Event,
    #[serde(rename = "event-invite")]
    EventInvite,
    #[serde(rename = "event-update")]
    EventUpdate,
}

impl PushKind {
    /// Push kind for accepted participants, or `None` when the action has no
    /// push variant (deletions).
    pub const fn for_action(action: ChangeAction) -> Option<Self> {
        match action {
            ChangeAction::Create => Some(PushKind::Event),
            ChangeAction::Update => Some(PushKind::EventUpdate),
            ChangeAction::Delete => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            PushKind::Event => "event",
            PushKind::EventInvite => "event-invite",
            PushKind::EventUpdate => "event-update",
        }
    }
}

// ---------------------------------------------------------------------------
// PushMessage
// ---------------------------------------------------------------------------

/// One push for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub kind: PushKind,
    pub event_id: DbId,
    pub device_token: String,
    pub event_name: Option<String>,
    pub folder_name: Option<String>,
}

/// Visible part of a push notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub body: String,
    #[serde(rename = "loc-key")]
    pub loc_key: &'static str,
    #[serde(rename = "loc-args")]
    pub loc_args: Vec<String>,
}

/// Machine part of a push notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    pub event_id: DbId,
    #[serde(rename = "type")]
    pub kind: PushKind,
}

impl PushMessage {
    pub fn payload(&self) -> PushPayload {
        PushPayload {
            event_id: self.event_id,
            kind: self.kind,
        }
    }

    /// Render the alert text for this message.
    pub fn alert(&self) -> Alert {
        let event = self.event_name.as_deref();
        let folder = self.folder_name.as_deref();

        match (self.kind, event, folder) {
            (PushKind::EventInvite, Some(event), _) => Alert {
                body: format!("You have been invited to \"{event}\"!"),
                loc_key: "EVENT_INVITE_NAMED",
                loc_args: vec![event.to_string()],
            },
            (PushKind::EventInvite, None, _) => Alert {
                body: "You have been invited to an event!".to_string(),
                loc_key: "EVENT_INVITE",
                loc_args: Vec::new(),
            },
            (PushKind::Event, Some(event), Some(folder)) => Alert {
                body: format!("\"{event}\" was added to the folder \"{folder}\""),
                loc_key: "FOLDER_EVENT_CREATED",
                loc_args: vec![event.to_string(), folder.to_string()],
            },
            (PushKind::EventUpdate, Some(event), Some(folder)) => Alert {
                body: format!("\"{event}\" in the folder \"{folder}\" was updated"),
                loc_key: "FOLDER_EVENT_UPDATED",
                loc_args: vec![event.to_string(), folder.to_string()],
            },
            (PushKind::Event, Some(event), None) => Alert {
                body: format!("An event you belong to was created: \"{event}\""),
                loc_key: "EVENT_CREATED",
                loc_args: vec![event.to_string()],
            },
            (PushKind::EventUpdate, Some(event), None) => Alert {
                body: format!("An event you belong to was updated: \"{event}\""),
                loc_key: "EVENT_UPDATED",
                loc_args: vec![event.to_string()],
            },
            (PushKind::Event, None, _) => Alert {
                body: "An event you belong to was created!".to_string(),
                loc_key: "EVENT_CREATED",
                loc_args: Vec::new(),
            },
            (PushKind::EventUpdate, None, _) => Alert {
                body: "An event you belong to was updated!".to_string(),
                loc_key: "EVENT_UPDATED",
                loc_args: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(kind: PushKind, event: Option<&str>, folder: Option<&str>) -> PushMessage {
        PushMessage {
            kind,
            event_id: 9,
            device_token: "tok".to_string(),
            event_name: event.map(str::to_string),
            folder_name: folder.map(str::to_string),
        }
    }

    #[test]
    fn deletions_have_no_push_variant() {
        assert_eq!(PushKind::for_action(ChangeAction::Create), Some(PushKind::Event));
        assert_eq!(
            PushKind::for_action(ChangeAction::Update),
            Some(PushKind::EventUpdate)
        );
        assert_eq!(PushKind::for_action(ChangeAction::Delete), None);
    }

    #[test]
    fn folder_alert_interpolates_both_names() {
        let alert = message(PushKind::Event, Some("Picnic"), Some("Summer")).alert();
        assert_eq!(alert.loc_key, "FOLDER_EVENT_CREATED");
        assert_eq!(alert.loc_args, vec!["Picnic", "Summer"]);
        assert!(alert.body.contains("Picnic"));
        assert!(alert.body.contains("Summer"));
    }

    #[test]
    fn invite_alert_without_name_is_generic() {
        let alert = message(PushKind::EventInvite, None, None).alert();
        assert_eq!(alert.loc_key, "EVENT_INVITE");
        assert!(alert.loc_args.is_empty());
    }

    #[test]
    fn payload_serializes_event_id_and_type() {
        let json = serde_json::to_value(message(PushKind::EventUpdate, None, None).payload())
            .unwrap();
        assert_eq!(json, serde_json::json!({"eventId": 9, "type": "event-update"}));
    }
}
