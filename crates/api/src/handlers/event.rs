//! Handlers for the `/events` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use evently_core::error::CoreError;
use evently_core::invite_token::generate_invite_token;
use evently_core::membership::{diff_members, InvitationStatus};
use evently_core::types::DbId;
use evently_db::models::event::{CreateEvent, Event, EventDetail, NewEvent, UpdateEvent};
use evently_db::repositories::{EventMemberRepo, EventRepo};
use evently_db::DbPool;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::{ensure_category_access, ensure_folder_access, resolve_usernames};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Event", id })
}

/// Load a live event owned by `user_id`.
pub(crate) async fn find_owned(pool: &DbPool, id: DbId, user_id: DbId) -> AppResult<Event> {
    let event = EventRepo::find_by_id(pool, id).await?.ok_or_else(|| not_found(id))?;
    if event.owner_id != user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the event owner can do this".into(),
        )));
    }
    Ok(event)
}

pub(crate) async fn detail(pool: &DbPool, event: Event) -> AppResult<EventDetail> {
    let members = EventMemberRepo::list_views(pool, event.id).await?;
    Ok(EventDetail { event, members })
}

/// GET /api/v1/events
///
/// Events the caller owns, has accepted, or sees through a folder.
pub async fn list(auth: AuthUser, State(state): State<AppState>) -> AppResult<Json<Vec<Event>>> {
    let events = EventRepo::list_visible(&state.pool, auth.user_id).await?;
    Ok(Json(events))
}

/// GET /api/v1/events/{id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<EventDetail>> {
    // Invisible events are reported as missing rather than forbidden.
    let event = EventRepo::find_visible(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(detail(&state.pool, event).await?))
}

/// POST /api/v1/events
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateEvent>,
) -> AppResult<(StatusCode, Json<EventDetail>)> {
    input.validate()?;
    let (name, target_date, recurrence_pattern) = input.required()?;

    if let Some(folder_id) = input.folder_id {
        ensure_folder_access(&state.pool, folder_id, auth.user_id).await?;
    }
    if let Some(category_id) = input.category_id {
        ensure_category_access(&state.pool, category_id, auth.user_id).await?;
    }
    let member_ids = resolve_usernames(
        &state.pool,
        input.friends.as_deref().unwrap_or_default(),
        auth.user_id,
    )
    .await?;

    let new_event = NewEvent {
        owner_id: auth.user_id,
        folder_id: input.folder_id,
        category_id: input.category_id,
        name,
        description: input.description,
        location: input.location,
        target_date,
        recurrence_pattern,
        recurrence_interval: input.recurrence_interval,
        invite_token: input.invite_token.unwrap_or_else(generate_invite_token),
    };
    let event = EventRepo::create(
        &state.pool,
        &new_event,
        &member_ids,
        InvitationStatus::for_named_invite(),
    )
    .await?;

    tracing::info!(
        event_id = event.id,
        user_id = auth.user_id,
        members = member_ids.len(),
        "Event created"
    );
    state.triggers.event_created(event.id).await;

    Ok((StatusCode::CREATED, Json(detail(&state.pool, event).await?)))
}

/// PUT /api/v1/events/{id}
///
/// Scalars are patched. `folder_id` and `friends` are replaced as a whole:
/// members missing from `friends` are removed, new ones are invited, and a
/// single notification pass runs once the batch is committed.
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateEvent>,
) -> AppResult<Json<EventDetail>> {
    input.validate()?;
    input.pattern()?;
    let event = find_owned(&state.pool, id, auth.user_id).await?;

    if let Some(folder_id) = input.folder_id {
        ensure_folder_access(&state.pool, folder_id, auth.user_id).await?;
    }
    if let Some(category_id) = input.category_id {
        ensure_category_access(&state.pool, category_id, auth.user_id).await?;
    }
    let desired = resolve_usernames(
        &state.pool,
        input.friends.as_deref().unwrap_or_default(),
        event.owner_id,
    )
    .await?;
    let current = EventMemberRepo::list_user_ids(&state.pool, id).await?;
    let diff = diff_members(&current, &desired, &event.owner_id);

    let updated = EventRepo::apply_update(&state.pool, id, &input, input.folder_id, &diff)
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(
        event_id = id,
        added = diff.to_add.len(),
        removed = diff.to_remove.len(),
        "Event updated"
    );
    state.triggers.event_updated(id).await;

    Ok(Json(detail(&state.pool, updated).await?))
}

/// DELETE /api/v1/events/{id}
///
/// The audience is captured before the soft delete so members still hear
/// about it.
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    find_owned(&state.pool, id, auth.user_id).await?;

    let graph = state.triggers.load_graph(id).await;
    if !EventRepo::soft_delete(&state.pool, id).await? {
        return Err(not_found(id));
    }

    tracing::info!(event_id = id, user_id = auth.user_id, "Event deleted");
    if let Some(graph) = graph {
        state.triggers.event_deleted(&graph);
    }
    Ok(StatusCode::NO_CONTENT)
}
