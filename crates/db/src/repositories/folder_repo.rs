//! Repository for the `folders` table.

use evently_core::types::DbId;
use sqlx::PgPool;

use crate::models::folder::Folder;

const COLUMNS: &str = "id, owner_id, name, invite_token, created_at, updated_at";

/// Provides CRUD for folders.
pub struct FolderRepo;

impl FolderRepo {
    /// Insert a folder and its initial members in one transaction.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        name: &str,
        invite_token: &str,
        member_ids: &[DbId],
    ) -> Result<Folder, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO folders (owner_id, name, invite_token)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        let folder = sqlx::query_as::<_, Folder>(&query)
            .bind(owner_id)
            .bind(name)
            .bind(invite_token)
            .fetch_one(&mut *tx)
            .await?;

        if !member_ids.is_empty() {
            sqlx::query(
                "INSERT INTO folder_members (folder_id, user_id)
                 SELECT $1, UNNEST($2::BIGINT[])
                 ON CONFLICT (folder_id, user_id) DO NOTHING",
            )
            .bind(folder.id)
            .bind(member_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(folder)
    }

    /// Find a folder by ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Folder>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM folders WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Folder>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_invite_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<Folder>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM folders WHERE invite_token = $1 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Folder>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Folders `user_id` owns or belongs to, ordered by name.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Folder>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM folders f
             WHERE f.deleted_at IS NULL AND (
                 f.owner_id = $1
                 OR EXISTS (
                     SELECT 1 FROM folder_members fm
                     WHERE fm.folder_id = f.id AND fm.user_id = $1))
             ORDER BY f.name ASC, f.id ASC"
        );
        sqlx::query_as::<_, Folder>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Rename a folder. Returns `None` if it does not exist.
    pub async fn rename(pool: &PgPool, id: DbId, name: &str) -> Result<Option<Folder>, sqlx::Error> {
        let query = format!(
            "UPDATE folders SET name = $2
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Folder>(&query)
            .bind(id)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Replace the invite token, invalidating previously shared links.
    pub async fn set_invite_token(
        pool: &PgPool,
        id: DbId,
        token: &str,
    ) -> Result<Option<Folder>, sqlx::Error> {
        let query = format!(
            "UPDATE folders SET invite_token = $2
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Folder>(&query)
            .bind(id)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a folder and detach its events. Returns the ids of the
    /// detached events, or `None` if the folder did not exist.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<Option<Vec<DbId>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            "UPDATE folders SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let detached = sqlx::query_scalar::<_, DbId>(
            "UPDATE events SET folder_id = NULL
             WHERE folder_id = $1 AND deleted_at IS NULL
             RETURNING id",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(detached))
    }
}
