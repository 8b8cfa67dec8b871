//! Request handlers, one module per resource.
//!
//! Handlers validate input and check ownership before writing. Every write
//! that changes what other users see is followed by a call into
//! [`ChangeTriggers`](evently_events::ChangeTriggers) once it has committed.

pub mod category;
pub mod event;
pub mod folder;
pub mod friend;
pub mod invitation;
pub mod notification;
pub mod user;

use std::collections::BTreeSet;

use evently_core::error::CoreError;
use evently_core::types::DbId;
use evently_db::repositories::{CategoryRepo, FolderMemberRepo, FolderRepo, UserRepo};
use evently_db::DbPool;

use crate::error::{AppError, AppResult};

/// Resolve usernames to user ids, dropping `exclude` (the caller).
///
/// Every name must belong to a live user; the first unknown one is reported
/// as not found before anything is written.
pub(crate) async fn resolve_usernames(
    pool: &DbPool,
    usernames: &[String],
    exclude: DbId,
) -> AppResult<Vec<DbId>> {
    let wanted: BTreeSet<&str> = usernames.iter().map(String::as_str).collect();
    if wanted.is_empty() {
        return Ok(Vec::new());
    }

    let names: Vec<String> = wanted.iter().map(|s| s.to_string()).collect();
    let found = UserRepo::find_by_usernames(pool, &names).await?;
    if let Some(missing) = wanted
        .iter()
        .find(|name| !found.iter().any(|u| u.username == **name))
    {
        return Err(AppError::NotFound(format!("User '{missing}' not found")));
    }

    Ok(found
        .into_iter()
        .map(|u| u.id)
        .filter(|id| *id != exclude)
        .collect())
}

/// Ensure `user_id` may file events into `folder_id`: the folder owner or a
/// folder member.
pub(crate) async fn ensure_folder_access(
    pool: &DbPool,
    folder_id: DbId,
    user_id: DbId,
) -> AppResult<()> {
    let folder = FolderRepo::find_by_id(pool, folder_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Folder",
            id: folder_id,
        }))?;
    if folder.owner_id != user_id && !FolderMemberRepo::is_member(pool, folder_id, user_id).await? {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the folder owner or its members can add events to this folder".into(),
        )));
    }
    Ok(())
}

/// Ensure `category_id` is a default category or one owned by `user_id`.
pub(crate) async fn ensure_category_access(
    pool: &DbPool,
    category_id: DbId,
    user_id: DbId,
) -> AppResult<()> {
    match CategoryRepo::find_by_id(pool, category_id).await? {
        Some(category) if category.owner_id.is_none() || category.owner_id == Some(user_id) => {
            Ok(())
        }
        _ => Err(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id: category_id,
        })),
    }
}
