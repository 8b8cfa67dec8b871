//! Handlers for the caller's own account.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use evently_core::error::CoreError;
use evently_db::models::user::{User, UserSummary};
use evently_db::repositories::{FriendRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// GET /api/v1/users/me
pub async fn me(auth: AuthUser, State(state): State<AppState>) -> AppResult<Json<User>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;
    Ok(Json(user))
}

/// GET /api/v1/users/me/friends
pub async fn friends(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<UserSummary>>> {
    let friends = FriendRepo::list_friends(&state.pool, auth.user_id).await?;
    Ok(Json(friends))
}

/// DELETE /api/v1/users/me
///
/// Soft delete. The account drops out of every audience from then on.
pub async fn delete_me(auth: AuthUser, State(state): State<AppState>) -> AppResult<StatusCode> {
    if !UserRepo::soft_delete(&state.pool, auth.user_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }));
    }
    tracing::info!(user_id = auth.user_id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
