//! Handlers for the `/folders` resource.
//!
//! Folder changes are signalled on the `folder` context to the owner and
//! every member, except whoever made the change.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use evently_core::error::CoreError;
use evently_core::invite_token::generate_invite_token;
use evently_core::realtime::ChangeAction;
use evently_core::types::DbId;
use evently_db::models::event::JoinByToken;
use evently_db::models::folder::{CreateFolder, Folder, FolderDetail, UpdateFolder};
use evently_db::repositories::{FolderMemberRepo, FolderRepo};
use evently_db::DbPool;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::resolve_usernames;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Folder", id })
}

async fn find_owned(pool: &DbPool, id: DbId, user_id: DbId) -> AppResult<Folder> {
    let folder = FolderRepo::find_by_id(pool, id).await?.ok_or_else(|| not_found(id))?;
    if folder.owner_id != user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the folder owner can do this".into(),
        )));
    }
    Ok(folder)
}

async fn detail(pool: &DbPool, folder: Folder) -> AppResult<FolderDetail> {
    let members = FolderMemberRepo::list_members(pool, folder.id).await?;
    Ok(FolderDetail { folder, members })
}

/// Signal the current folder audience, leaving out `actor_id`.
async fn signal_change(state: &AppState, folder_id: DbId, actor_id: DbId, action: ChangeAction) {
    let audience = state.triggers.folder_audience(folder_id).await;
    state
        .triggers
        .folder_changed(folder_id, audience, actor_id, action);
}

/// GET /api/v1/folders
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<FolderDetail>>> {
    let folders = FolderRepo::list_for_user(&state.pool, auth.user_id).await?;
    let mut details = Vec::with_capacity(folders.len());
    for folder in folders {
        details.push(detail(&state.pool, folder).await?);
    }
    Ok(Json(details))
}

/// POST /api/v1/folders
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateFolder>,
) -> AppResult<(StatusCode, Json<FolderDetail>)> {
    input.validate()?;
    let name = input
        .name
        .as_deref()
        .ok_or_else(|| CoreError::missing_fields(&["name"]))?;
    let member_ids = resolve_usernames(
        &state.pool,
        input.friends.as_deref().unwrap_or_default(),
        auth.user_id,
    )
    .await?;

    let folder = FolderRepo::create(
        &state.pool,
        auth.user_id,
        name,
        &generate_invite_token(),
        &member_ids,
    )
    .await?;

    tracing::info!(folder_id = folder.id, user_id = auth.user_id, "Folder created");
    signal_change(&state, folder.id, auth.user_id, ChangeAction::Create).await;

    Ok((StatusCode::CREATED, Json(detail(&state.pool, folder).await?)))
}

/// PUT /api/v1/folders/{id}
///
/// Renames the folder and adds the listed friends. Nobody is removed.
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateFolder>,
) -> AppResult<Json<FolderDetail>> {
    input.validate()?;
    let mut folder = find_owned(&state.pool, id, auth.user_id).await?;

    let member_ids = resolve_usernames(
        &state.pool,
        input.friends.as_deref().unwrap_or_default(),
        folder.owner_id,
    )
    .await?;

    if let Some(name) = input.name.as_deref() {
        folder = FolderRepo::rename(&state.pool, id, name)
            .await?
            .ok_or_else(|| not_found(id))?;
    }
    let added = FolderMemberRepo::add_many(&state.pool, id, &member_ids).await?;

    tracing::info!(folder_id = id, added, "Folder updated");
    signal_change(&state, id, auth.user_id, ChangeAction::Update).await;

    Ok(Json(detail(&state.pool, folder).await?))
}

/// DELETE /api/v1/folders/{id}
///
/// Events inside the folder survive, detached from it.
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    find_owned(&state.pool, id, auth.user_id).await?;

    let audience = state.triggers.folder_audience(id).await;
    let detached = FolderRepo::soft_delete(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(folder_id = id, detached = detached.len(), "Folder deleted");
    state
        .triggers
        .folder_changed(id, audience, auth.user_id, ChangeAction::Delete);
    if !detached.is_empty() {
        state.triggers.events_detached(&detached).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/folders/{id}/leave
pub async fn leave(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let folder = FolderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    if folder.owner_id == auth.user_id {
        return Err(AppError::BadRequest(
            "The owner cannot leave their own folder".into(),
        ));
    }
    if !FolderMemberRepo::remove(&state.pool, id, auth.user_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "FolderMember",
            id,
        }));
    }

    tracing::info!(folder_id = id, user_id = auth.user_id, "Left folder");
    signal_change(&state, id, auth.user_id, ChangeAction::Update).await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/folders/{id}/share
///
/// Issues a fresh invite token; links built on the old one stop working.
pub async fn share(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Folder>> {
    find_owned(&state.pool, id, auth.user_id).await?;

    let folder = FolderRepo::set_invite_token(&state.pool, id, &generate_invite_token())
        .await?
        .ok_or_else(|| not_found(id))?;

    signal_change(&state, id, auth.user_id, ChangeAction::Update).await;
    Ok(Json(folder))
}

/// POST /api/v1/folders/join
pub async fn join(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<JoinByToken>,
) -> AppResult<(StatusCode, Json<FolderDetail>)> {
    input.validate()?;
    let token = input
        .invite_token
        .ok_or_else(|| CoreError::missing_fields(&["invite_token"]))?;

    let folder = FolderRepo::find_by_invite_token(&state.pool, &token)
        .await?
        .ok_or_else(|| AppError::NotFound("No folder matches this invite token".into()))?;
    if folder.owner_id == auth.user_id {
        return Err(AppError::Core(CoreError::Conflict(
            "You already own this folder".into(),
        )));
    }
    if FolderMemberRepo::is_member(&state.pool, folder.id, auth.user_id).await? {
        return Err(AppError::Core(CoreError::Conflict(
            "You are already a member of this folder".into(),
        )));
    }

    FolderMemberRepo::add(&state.pool, folder.id, auth.user_id).await?;

    tracing::info!(folder_id = folder.id, user_id = auth.user_id, "Joined folder by token");
    signal_change(&state, folder.id, auth.user_id, ChangeAction::Update).await;

    Ok((StatusCode::CREATED, Json(detail(&state.pool, folder).await?)))
}
