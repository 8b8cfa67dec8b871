//! Post-commit change triggers.
//!
//! Handlers call one of these after their write has committed. Each trigger
//! reloads whatever the audience resolver needs straight from the database,
//! resolves the fan-out and hands it to the dispatcher. Loading happens
//! before the trigger returns; delivery does not.
//!
//! A trigger never fails the caller. Load errors are logged at `warn` and
//! the notification pass is skipped. The returned [`JoinHandle`] lets tests
//! wait for delivery and is dropped by production callers.

use evently_core::audience::{resolve, resolve_signals, FanOut};
use evently_core::graph::EventGraph;
use evently_core::realtime::{ChangeAction, RealtimeContext};
use evently_core::types::DbId;
use evently_db::repositories::{EventRepo, FolderMemberRepo, FolderRepo};
use evently_db::DbPool;
use tokio::task::JoinHandle;

use crate::dispatcher::{DispatchReport, NotificationDispatcher};

/// Handle returned by triggers that load state first. `None` when nothing
/// could be loaded and so nothing was dispatched.
pub type Dispatched = Option<JoinHandle<DispatchReport>>;

/// Mutation hooks shared by every handler.
#[derive(Clone)]
pub struct ChangeTriggers {
    pool: DbPool,
    dispatcher: NotificationDispatcher,
}

impl ChangeTriggers {
    pub fn new(pool: DbPool, dispatcher: NotificationDispatcher) -> Self {
        Self { pool, dispatcher }
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    // -----------------------------------------------------------------------
    // Event lifecycle
    // -----------------------------------------------------------------------

    /// Load the entity graph of an event, logging and swallowing errors.
    pub async fn load_graph(&self, event_id: DbId) -> Option<EventGraph> {
        match EventRepo::find_graph(&self.pool, event_id).await {
            Ok(Some(graph)) => Some(graph),
            Ok(None) => {
                tracing::warn!(event_id, "Event vanished before its notification pass");
                None
            }
            Err(e) => {
                tracing::warn!(event_id, error = %e, "Failed to load event graph for notification");
                None
            }
        }
    }

    pub async fn event_created(&self, event_id: DbId) -> Dispatched {
        self.resolve_and_dispatch(event_id, ChangeAction::Create).await
    }

    /// One pass for the whole edit, run against the state after every member
    /// add and removal has been applied.
    pub async fn event_updated(&self, event_id: DbId) -> Dispatched {
        self.resolve_and_dispatch(event_id, ChangeAction::Update).await
    }

    /// Deletion notifies the audience captured before the soft delete. The
    /// resolver emits realtime signals only.
    pub fn event_deleted(&self, graph: &EventGraph) -> JoinHandle<DispatchReport> {
        self.dispatcher.dispatch(resolve(graph, ChangeAction::Delete))
    }

    // -----------------------------------------------------------------------
    // Memberships
    // -----------------------------------------------------------------------

    /// An invitation was answered with `accepted`/`pending`, or someone joined
    /// by token. Members are re-signalled without push, and the owner hears
    /// about the change on the `event` context.
    pub async fn membership_changed(&self, event_id: DbId) -> Dispatched {
        let graph = self.load_graph(event_id).await?;
        let mut fan_out = resolve_signals(&graph, ChangeAction::Update);
        fan_out.push_signal(
            [graph.owner.user_id],
            RealtimeContext::Event,
            graph.id,
            ChangeAction::Update,
        );
        Some(self.dispatcher.dispatch(fan_out))
    }

    /// A member declined or left. Only the owner is told.
    pub fn notify_owner(&self, owner_id: DbId, event_id: DbId) -> JoinHandle<DispatchReport> {
        self.signal(
            [owner_id],
            RealtimeContext::Event,
            event_id,
            ChangeAction::Update,
        )
    }

    // -----------------------------------------------------------------------
    // Folders
    // -----------------------------------------------------------------------

    /// Owner and live members of a folder. Call before a delete, while the
    /// folder row is still visible.
    pub async fn folder_audience(&self, folder_id: DbId) -> Vec<DbId> {
        let folder = match FolderRepo::find_by_id(&self.pool, folder_id).await {
            Ok(Some(folder)) => folder,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(folder_id, error = %e, "Failed to load folder for notification");
                return Vec::new();
            }
        };
        let mut user_ids = vec![folder.owner_id];
        match FolderMemberRepo::list_user_ids(&self.pool, folder_id).await {
            Ok(members) => user_ids.extend(members),
            Err(e) => {
                tracing::warn!(folder_id, error = %e, "Failed to load folder members for notification");
            }
        }
        user_ids
    }

    /// Signal a folder change to `audience`, leaving out the user who made it.
    pub fn folder_changed(
        &self,
        folder_id: DbId,
        audience: Vec<DbId>,
        actor_id: DbId,
        action: ChangeAction,
    ) -> JoinHandle<DispatchReport> {
        self.signal(
            audience.into_iter().filter(|id| *id != actor_id),
            RealtimeContext::Folder,
            folder_id,
            action,
        )
    }

    /// Events lost their folder. Their participants are re-signalled so
    /// clients drop the folder grouping; nobody is pushed.
    pub async fn events_detached(&self, event_ids: &[DbId]) -> JoinHandle<DispatchReport> {
        let mut fan_out = FanOut::default();
        for &event_id in event_ids {
            if let Some(graph) = self.load_graph(event_id).await {
                fan_out.extend(resolve_signals(&graph, ChangeAction::Update));
            }
        }
        self.dispatcher.dispatch(fan_out)
    }

    // -----------------------------------------------------------------------
    // Plain signals
    // -----------------------------------------------------------------------

    /// Send one realtime message to `user_ids`. An empty audience dispatches
    /// nothing; duplicates are collapsed on delivery.
    pub fn signal(
        &self,
        user_ids: impl IntoIterator<Item = DbId>,
        context: RealtimeContext,
        id: DbId,
        action: ChangeAction,
    ) -> JoinHandle<DispatchReport> {
        self.dispatcher
            .dispatch(FanOut::signal(user_ids, context, id, action))
    }

    async fn resolve_and_dispatch(&self, event_id: DbId, action: ChangeAction) -> Dispatched {
        let graph = self.load_graph(event_id).await?;
        let fan_out = resolve(&graph, action);
        tracing::debug!(
            event_id,
            action = action.as_str(),
            signals = fan_out.signal_deliveries(),
            pushes = fan_out.pushes.len(),
            "Resolved event audience",
        );
        Some(self.dispatcher.dispatch(fan_out))
    }
}
