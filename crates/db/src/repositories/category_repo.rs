//! Repository for the `categories` table.

use evently_core::types::DbId;
use sqlx::PgPool;

use crate::models::category::{Category, UpdateCategory};

const COLUMNS: &str = "id, owner_id, name, icon, color, is_default, created_at, updated_at";

/// Provides CRUD for user categories and read access to the shared defaults.
pub struct CategoryRepo;

impl CategoryRepo {
    /// Insert a category owned by `owner_id`.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        name: &str,
        icon: &str,
        color: &str,
    ) -> Result<Category, sqlx::Error> {
        let query = format!(
            "INSERT INTO categories (owner_id, name, icon, color, is_default)
             VALUES ($1, $2, $3, $4, FALSE)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(owner_id)
            .bind(name)
            .bind(icon)
            .bind(color)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1");
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Categories created by `owner_id`, ordered by name.
    pub async fn list_for_owner(
        pool: &PgPool,
        owner_id: DbId,
    ) -> Result<Vec<Category>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM categories WHERE owner_id = $1 ORDER BY name ASC"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// The shared default categories.
    pub async fn list_defaults(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE is_default ORDER BY id");
        sqlx::query_as::<_, Category>(&query).fetch_all(pool).await
    }

    /// Patch a category owned by `owner_id`. Returns `None` if it is not theirs.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        owner_id: DbId,
        input: &UpdateCategory,
    ) -> Result<Option<Category>, sqlx::Error> {
        let query = format!(
            "UPDATE categories SET
                name = COALESCE($3, name),
                icon = COALESCE($4, icon),
                color = COALESCE($5, color)
             WHERE id = $1 AND owner_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .bind(owner_id)
            .bind(&input.name)
            .bind(&input.icon)
            .bind(&input.color)
            .fetch_optional(pool)
            .await
    }

    /// Delete a category owned by `owner_id`. Events keep existing with no category.
    pub async fn delete(pool: &PgPool, id: DbId, owner_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
