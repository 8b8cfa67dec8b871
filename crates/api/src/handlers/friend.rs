//! Handlers for friend requests and friendships.
//!
//! Friend signals carry no entity id; clients reload the whole list.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use evently_core::error::CoreError;
use evently_core::realtime::{ChangeAction, RealtimeContext};
use evently_core::types::{DbId, NO_ENTITY_ID};
use evently_db::models::friend::{
    CreateFriendRequest, FriendRequest, Friendship, RespondFriendRequest,
};
use evently_db::repositories::{FriendRepo, FriendRequestRepo, UserRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

fn request_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "FriendRequest",
        id,
    })
}

/// POST /api/v1/friend-requests
pub async fn send_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateFriendRequest>,
) -> AppResult<(StatusCode, Json<FriendRequest>)> {
    input.validate()?;
    let receiver = UserRepo::find_by_username(&state.pool, &input.username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", input.username)))?;

    if receiver.id == auth.user_id {
        return Err(AppError::BadRequest(
            "You cannot send a friend request to yourself".into(),
        ));
    }
    if FriendRepo::are_friends(&state.pool, auth.user_id, receiver.id).await? {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "You are already friends with '{}'",
            receiver.username
        ))));
    }
    if FriendRequestRepo::exists_between(&state.pool, auth.user_id, receiver.id).await? {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "A friend request with '{}' is already pending",
            receiver.username
        ))));
    }

    let request = FriendRequestRepo::create(&state.pool, auth.user_id, receiver.id).await?;

    tracing::info!(
        request_id = request.id,
        sender_id = auth.user_id,
        receiver_id = receiver.id,
        "Friend request sent"
    );
    state.triggers.signal(
        [receiver.id],
        RealtimeContext::FriendRequest,
        NO_ENTITY_ID,
        ChangeAction::Create,
    );

    Ok((StatusCode::CREATED, Json(request)))
}

/// GET /api/v1/friend-requests
pub async fn list_received(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<FriendRequest>>> {
    let requests = FriendRequestRepo::list_received(&state.pool, auth.user_id).await?;
    Ok(Json(requests))
}

/// GET /api/v1/friend-requests/sent
pub async fn list_sent(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<FriendRequest>>> {
    let requests = FriendRequestRepo::list_sent(&state.pool, auth.user_id).await?;
    Ok(Json(requests))
}

/// DELETE /api/v1/friend-requests/sent/{id}
pub async fn withdraw(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !FriendRequestRepo::delete_sent(&state.pool, id, auth.user_id).await? {
        return Err(request_not_found(id));
    }
    tracing::info!(request_id = id, sender_id = auth.user_id, "Friend request withdrawn");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/friend-requests/{id}
///
/// Accepting returns the new friendship; declining returns 204.
pub async fn respond(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RespondFriendRequest>,
) -> AppResult<Response> {
    let request = FriendRequestRepo::find_received(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| request_not_found(id))?;

    if !input.accept {
        if !FriendRequestRepo::decline(&state.pool, id).await? {
            return Err(request_not_found(id));
        }
        tracing::info!(request_id = id, receiver_id = auth.user_id, "Friend request declined");
        state.triggers.signal(
            [request.sender_id],
            RealtimeContext::FriendRequest,
            NO_ENTITY_ID,
            ChangeAction::Delete,
        );
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let friendship: Friendship = FriendRequestRepo::accept(&state.pool, &request).await?;

    tracing::info!(
        request_id = id,
        friendship_id = friendship.id,
        "Friend request accepted"
    );
    state.triggers.signal(
        [request.sender_id],
        RealtimeContext::Friend,
        NO_ENTITY_ID,
        ChangeAction::Create,
    );

    Ok((StatusCode::CREATED, Json(friendship)).into_response())
}

/// DELETE /api/v1/friends/{username}
pub async fn remove_friend(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<StatusCode> {
    let friend = UserRepo::find_by_username(&state.pool, &username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User '{username}' not found")))?;

    if !FriendRepo::delete(&state.pool, auth.user_id, friend.id).await? {
        return Err(AppError::NotFound(format!(
            "You are not friends with '{username}'"
        )));
    }

    tracing::info!(user_id = auth.user_id, friend_id = friend.id, "Friend removed");
    state.triggers.signal(
        [auth.user_id, friend.id],
        RealtimeContext::Friend,
        NO_ENTITY_ID,
        ChangeAction::Delete,
    );
    Ok(StatusCode::NO_CONTENT)
}
