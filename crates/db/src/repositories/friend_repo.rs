//! Repository for the `friendships` table.

use evently_core::types::DbId;
use sqlx::PgPool;

use crate::models::friend::Friendship;
use crate::models::user::UserSummary;

const COLUMNS: &str = "id, user_low_id, user_high_id, created_at";

/// Provides the symmetric friendship edge.
pub struct FriendRepo;

impl FriendRepo {
    pub async fn find(pool: &PgPool, a: DbId, b: DbId) -> Result<Option<Friendship>, sqlx::Error> {
        let (low, high) = Friendship::ordered(a, b);
        let query = format!(
            "SELECT {COLUMNS} FROM friendships WHERE user_low_id = $1 AND user_high_id = $2"
        );
        sqlx::query_as::<_, Friendship>(&query)
            .bind(low)
            .bind(high)
            .fetch_optional(pool)
            .await
    }

    pub async fn are_friends(pool: &PgPool, a: DbId, b: DbId) -> Result<bool, sqlx::Error> {
        Ok(Self::find(pool, a, b).await?.is_some())
    }

    /// Delete the friendship between `a` and `b`. Returns `true` if one existed.
    pub async fn delete(pool: &PgPool, a: DbId, b: DbId) -> Result<bool, sqlx::Error> {
        let (low, high) = Friendship::ordered(a, b);
        let result =
            sqlx::query("DELETE FROM friendships WHERE user_low_id = $1 AND user_high_id = $2")
                .bind(low)
                .bind(high)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Live friends of `user_id`, ordered by username.
    pub async fn list_friends(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<UserSummary>, sqlx::Error> {
        sqlx::query_as::<_, UserSummary>(
            "SELECT u.id, u.username, u.first_name, u.last_name
             FROM friendships f
             JOIN users u ON u.id = CASE WHEN f.user_low_id = $1
                                         THEN f.user_high_id ELSE f.user_low_id END
             WHERE (f.user_low_id = $1 OR f.user_high_id = $1) AND u.deleted_at IS NULL
             ORDER BY u.username ASC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
