//! Category entity model and DTOs.

use evently_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A category row. Default categories have no owner and are shared.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: DbId,
    pub owner_id: Option<DbId>,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub is_default: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a category.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub icon: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub color: Option<String>,
}

impl CreateCategory {
    /// Names of the required fields absent from the request.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.is_none() {
            missing.push("name");
        }
        if self.icon.is_none() {
            missing.push("icon");
        }
        if self.color.is_none() {
            missing.push("color");
        }
        missing
    }
}

/// DTO for updating a category. All fields are optional.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCategory {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub icon: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub color: Option<String>,
}
