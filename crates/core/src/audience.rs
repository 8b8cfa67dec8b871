//! Audience resolution.
//!
//! Given a freshly loaded [`EventGraph`] and the [`ChangeAction`] that
//! produced it, [`resolve`] computes every realtime signal and every push
//! message that must go out. It performs no I/O: the dispatcher delivers the
//! returned [`FanOut`].
//!
//! Partitioning rules:
//!
//! - members with status `accepted` hear about the event on the `event`
//!   context and get the action-flavoured push;
//! - members with status `invited` or `pending` hear about it on the
//!   `event-invite` context and get the `event-invite` push;
//! - when the event lives in a folder owned by the event owner, the folder
//!   members (owner excluded) get a folder-flavoured push;
//! - when the event lives in a folder owned by someone else, the event owner
//!   gets the folder-flavoured push as confirmation;
//! - deletions produce realtime signals only.
//!
//! The event owner never receives a realtime signal from a resolver pass.
//! Resolution is deterministic and does not deduplicate across calls.

use crate::graph::{EventGraph, GraphMember, Participant};
use crate::push::{PushKind, PushMessage};
use crate::realtime::{ChangeAction, RealtimeContext, RealtimeMessage};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One realtime message addressed to a group of users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub user_ids: Vec<DbId>,
    pub message: RealtimeMessage,
}

/// Everything one notification pass must deliver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOut {
    pub signals: Vec<Signal>,
    pub pushes: Vec<PushMessage>,
}

impl FanOut {
    /// A fan-out holding a single signal. Empty audiences yield an empty fan-out.
    pub fn signal(
        user_ids: impl IntoIterator<Item = DbId>,
        context: RealtimeContext,
        id: DbId,
        action: ChangeAction,
    ) -> Self {
        let mut fan_out = Self::default();
        fan_out.push_signal(user_ids, context, id, action);
        fan_out
    }

    /// Append a signal unless its audience is empty.
    pub fn push_signal(
        &mut self,
        user_ids: impl IntoIterator<Item = DbId>,
        context: RealtimeContext,
        id: DbId,
        action: ChangeAction,
    ) {
        let user_ids: Vec<DbId> = user_ids.into_iter().collect();
        if user_ids.is_empty() {
            return;
        }
        self.signals.push(Signal {
            user_ids,
            message: RealtimeMessage::new(context, id, action),
        });
    }

    pub fn extend(&mut self, other: FanOut) {
        self.signals.extend(other.signals);
        self.pushes.extend(other.pushes);
    }

    /// Drop every push, keeping realtime signals only.
    pub fn without_pushes(mut self) -> Self {
        self.pushes.clear();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty() && self.pushes.is_empty()
    }

    /// Number of (user, message) deliveries across all signals.
    pub fn signal_deliveries(&self) -> usize {
        self.signals.iter().map(|s| s.user_ids.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Audience
// ---------------------------------------------------------------------------

/// Event members split by how they are notified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Audience<'a> {
    pub accepted: Vec<&'a Participant>,
    /// `invited` and `pending` members.
    pub awaiting: Vec<&'a Participant>,
}

impl<'a> Audience<'a> {
    /// Partition the members of `graph`. The owner is skipped should a
    /// membership row for them ever exist.
    pub fn of(graph: &'a EventGraph) -> Self {
        let owner = graph.owner.user_id;
        let (awaiting, accepted): (Vec<&GraphMember>, Vec<&GraphMember>) = graph
            .members
            .iter()
            .filter(|m| m.user_id() != owner)
            .partition(|m| m.status.awaits_decision());

        Self {
            accepted: accepted.into_iter().map(|m| &m.participant).collect(),
            awaiting: awaiting.into_iter().map(|m| &m.participant).collect(),
        }
    }

    pub fn accepted_ids(&self) -> Vec<DbId> {
        self.accepted.iter().map(|p| p.user_id).collect()
    }

    pub fn awaiting_ids(&self) -> Vec<DbId> {
        self.awaiting.iter().map(|p| p.user_id).collect()
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Compute the full fan-out (realtime and push) for `action` on `graph`.
pub fn resolve(graph: &EventGraph, action: ChangeAction) -> FanOut {
    let audience = Audience::of(graph);
    let mut fan_out = realtime_fan_out(graph, &audience, action);

    let Some(member_kind) = PushKind::for_action(action) else {
        return fan_out;
    };

    let event_name = Some(graph.name.clone());

    for participant in &audience.accepted {
        push_to(&mut fan_out, participant, member_kind, graph.id, &event_name, &None);
    }
    for participant in &audience.awaiting {
        push_to(
            &mut fan_out,
            participant,
            PushKind::EventInvite,
            graph.id,
            &event_name,
            &None,
        );
    }

    if let Some(folder) = &graph.folder {
        let folder_name = Some(folder.name.clone());
        let owner_id = graph.owner.user_id;

        if folder.owner.user_id == owner_id {
            // Event members who also follow the folder get both pushes.
            for member in &folder.members {
                if member.user_id == owner_id {
                    continue;
                }
                push_to(&mut fan_out, member, member_kind, graph.id, &event_name, &folder_name);
            }
        } else {
            push_to(
                &mut fan_out,
                &graph.owner,
                member_kind,
                graph.id,
                &event_name,
                &folder_name,
            );
        }
    }

    fan_out
}

/// Compute the realtime part only. Used by membership triggers, which must
/// not re-send pushes to the whole audience.
pub fn resolve_signals(graph: &EventGraph, action: ChangeAction) -> FanOut {
    let audience = Audience::of(graph);
    realtime_fan_out(graph, &audience, action)
}

fn realtime_fan_out(graph: &EventGraph, audience: &Audience<'_>, action: ChangeAction) -> FanOut {
    let mut fan_out = FanOut::default();
    fan_out.push_signal(audience.accepted_ids(), RealtimeContext::Event, graph.id, action);
    fan_out.push_signal(
        audience.awaiting_ids(),
        RealtimeContext::EventInvite,
        graph.id,
        action,
    );
    fan_out
}

fn push_to(
    fan_out: &mut FanOut,
    participant: &Participant,
    kind: PushKind,
    event_id: DbId,
    event_name: &Option<String>,
    folder_name: &Option<String>,
) {
    for token in participant.push_tokens() {
        fan_out.pushes.push(PushMessage {
            kind,
            event_id,
            device_token: token.to_string(),
            event_name: event_name.clone(),
            folder_name: folder_name.clone(),
        });
    }
}
