//! Repository for the `folder_members` table.

use evently_core::types::DbId;
use sqlx::PgPool;

use crate::models::membership::FolderMember;
use crate::models::user::UserSummary;

const COLUMNS: &str = "id, folder_id, user_id, joined_at";

/// Provides membership reads and writes for folders.
pub struct FolderMemberRepo;

impl FolderMemberRepo {
    /// Add one member. Fails with `uq_folder_members_folder_user` if present.
    pub async fn add(
        pool: &PgPool,
        folder_id: DbId,
        user_id: DbId,
    ) -> Result<FolderMember, sqlx::Error> {
        let query = format!(
            "INSERT INTO folder_members (folder_id, user_id)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FolderMember>(&query)
            .bind(folder_id)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Add several members, skipping existing ones. Returns how many were new.
    pub async fn add_many(
        pool: &PgPool,
        folder_id: DbId,
        user_ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "INSERT INTO folder_members (folder_id, user_id)
             SELECT $1, UNNEST($2::BIGINT[])
             ON CONFLICT (folder_id, user_id) DO NOTHING",
        )
        .bind(folder_id)
        .bind(user_ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn is_member(pool: &PgPool, folder_id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM folder_members WHERE folder_id = $1 AND user_id = $2)",
        )
        .bind(folder_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// User ids of the live members of a folder.
    pub async fn list_user_ids(pool: &PgPool, folder_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT fm.user_id FROM folder_members fm
             JOIN users u ON u.id = fm.user_id AND u.deleted_at IS NULL
             WHERE fm.folder_id = $1
             ORDER BY fm.id",
        )
        .bind(folder_id)
        .fetch_all(pool)
        .await
    }

    /// Members with public profile fields, for API responses.
    pub async fn list_members(
        pool: &PgPool,
        folder_id: DbId,
    ) -> Result<Vec<UserSummary>, sqlx::Error> {
        sqlx::query_as::<_, UserSummary>(
            "SELECT u.id, u.username, u.first_name, u.last_name
             FROM folder_members fm
             JOIN users u ON u.id = fm.user_id AND u.deleted_at IS NULL
             WHERE fm.folder_id = $1
             ORDER BY fm.id",
        )
        .bind(folder_id)
        .fetch_all(pool)
        .await
    }

    /// Delete a membership. Returns `true` if a row was removed.
    pub async fn remove(pool: &PgPool, folder_id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM folder_members WHERE folder_id = $1 AND user_id = $2")
            .bind(folder_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
