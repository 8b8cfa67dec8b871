//! Handlers for joining, leaving and answering event invitations.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use evently_core::error::CoreError;
use evently_core::membership::{InvitationResponse, InvitationStatus};
use evently_core::types::DbId;
use evently_db::models::event::{EventDetail, Invitation, JoinByToken, RespondInvitation};
use evently_db::repositories::{EventMemberRepo, EventRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::event::detail;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

fn membership_not_found(event_id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Invitation",
        id: event_id,
    })
}

/// GET /api/v1/events/invitations
///
/// The caller's memberships still awaiting a final answer.
pub async fn list_invitations(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Invitation>>> {
    let invitations = EventMemberRepo::list_invitations(&state.pool, auth.user_id).await?;
    Ok(Json(invitations))
}

/// POST /api/v1/events/join
///
/// Self-service join through an invite link. The member starts `accepted`.
pub async fn join(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<JoinByToken>,
) -> AppResult<(StatusCode, Json<EventDetail>)> {
    input.validate()?;
    let token = input
        .invite_token
        .ok_or_else(|| CoreError::missing_fields(&["invite_token"]))?;

    let event = EventRepo::find_by_invite_token(&state.pool, &token)
        .await?
        .ok_or_else(|| AppError::NotFound("No event matches this invite token".into()))?;
    if event.owner_id == auth.user_id {
        return Err(AppError::Core(CoreError::Conflict(
            "You already own this event".into(),
        )));
    }
    if EventMemberRepo::find(&state.pool, event.id, auth.user_id)
        .await?
        .is_some()
    {
        return Err(AppError::Core(CoreError::Conflict(
            "You are already a member of this event".into(),
        )));
    }

    EventMemberRepo::add(
        &state.pool,
        event.id,
        auth.user_id,
        InvitationStatus::for_token_join(),
    )
    .await?;

    tracing::info!(event_id = event.id, user_id = auth.user_id, "Joined event by token");
    state.triggers.membership_changed(event.id).await;

    Ok((StatusCode::CREATED, Json(detail(&state.pool, event).await?)))
}

/// POST /api/v1/events/{id}/leave
///
/// Only the owner is told.
pub async fn leave(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let event = EventRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Event", id }))?;
    if event.owner_id == auth.user_id {
        return Err(AppError::BadRequest(
            "The owner cannot leave their own event".into(),
        ));
    }
    if !EventMemberRepo::remove(&state.pool, id, auth.user_id).await? {
        return Err(membership_not_found(id));
    }

    tracing::info!(event_id = id, user_id = auth.user_id, "Left event");
    state.triggers.notify_owner(event.owner_id, id);
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/events/{id}/invitation
///
/// `accepted` and `pending` update the membership and re-signal everyone on
/// the event. `refused` deletes the membership and tells the owner only.
pub async fn respond(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RespondInvitation>,
) -> AppResult<Response> {
    let raw = input
        .status
        .ok_or_else(|| CoreError::missing_fields(&["status"]))?;
    let response = InvitationResponse::parse(&raw).ok_or_else(|| {
        CoreError::Validation(format!(
            "Invalid status '{raw}': expected accepted, pending or refused"
        ))
    })?;

    let event = EventRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Event", id }))?;
    let member = EventMemberRepo::find(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| membership_not_found(id))?;

    let Some(next) = response.target_status() else {
        EventMemberRepo::remove(&state.pool, id, auth.user_id).await?;
        tracing::info!(event_id = id, user_id = auth.user_id, "Invitation refused");
        state.triggers.notify_owner(event.owner_id, id);
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let current = member.status().ok_or_else(|| {
        AppError::InternalError(format!(
            "Unknown invitation status '{}'",
            member.invitation_status
        ))
    })?;
    current
        .validate_transition(next)
        .map_err(CoreError::Validation)?;

    let updated = EventMemberRepo::update_status(&state.pool, id, auth.user_id, next)
        .await?
        .ok_or_else(|| membership_not_found(id))?;

    tracing::info!(
        event_id = id,
        user_id = auth.user_id,
        status = next.as_str(),
        "Invitation answered"
    );
    state.triggers.membership_changed(id).await;

    Ok(Json(updated).into_response())
}
