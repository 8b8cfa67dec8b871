//! Repository for the `users` table.

use evently_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{CreateUser, User, UserSummary};

const COLUMNS: &str = "id, username, first_name, last_name, email, created_at, updated_at";

const SUMMARY_COLUMNS: &str = "id, username, first_name, last_name";

/// Provides lookups for users. Soft-deleted users are invisible everywhere.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (username, first_name, last_name, email)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.username)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .fetch_one(pool)
            .await
    }

    /// Find a user by ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by exact username. Excludes soft-deleted rows.
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<UserSummary>, sqlx::Error> {
        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM users WHERE username = $1 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, UserSummary>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Resolve a batch of usernames. Unknown names are simply absent from
    /// the result; callers compare lengths to detect them.
    pub async fn find_by_usernames(
        pool: &PgPool,
        usernames: &[String],
    ) -> Result<Vec<UserSummary>, sqlx::Error> {
        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM users
             WHERE username = ANY($1) AND deleted_at IS NULL
             ORDER BY id"
        );
        sqlx::query_as::<_, UserSummary>(&query)
            .bind(usernames)
            .fetch_all(pool)
            .await
    }

    /// Soft-delete a user. Returns `true` if a row was marked deleted.
    ///
    /// Their devices are retired in the same statement so no push reaches
    /// a deleted account.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result =
            sqlx::query("UPDATE users SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(&mut *tx)
                .await?;

        sqlx::query(
            "UPDATE devices SET deleted_at = NOW() WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
