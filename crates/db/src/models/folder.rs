//! Folder entity model and DTOs.

use evently_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::user::UserSummary;

/// A folder row from the `folders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Folder {
    pub id: DbId,
    pub owner_id: DbId,
    pub name: String,
    pub invite_token: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A folder with its members.
#[derive(Debug, Clone, Serialize)]
pub struct FolderDetail {
    #[serde(flatten)]
    pub folder: Folder,
    pub members: Vec<UserSummary>,
}

/// Body of `POST /folders`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFolder {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    /// Usernames added as members straight away.
    pub friends: Option<Vec<String>>,
}

/// Body of `PUT /folders/{id}`. Listed friends are added; nobody is removed.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateFolder {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub friends: Option<Vec<String>>,
}
