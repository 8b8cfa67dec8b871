//! Repository for the `friend_requests` table.

use evently_core::types::DbId;
use sqlx::PgPool;

use crate::models::friend::{FriendRequest, Friendship};

/// Select list producing a [`FriendRequest`] from `fr` joined with sender `s`
/// and receiver `r`.
const VIEW_COLUMNS: &str = "fr.id, fr.sender_id, s.username AS sender_username, \
     fr.receiver_id, r.username AS receiver_username, fr.created_at";

const VIEW_FROM: &str = "friend_requests fr \
     JOIN users s ON s.id = fr.sender_id \
     JOIN users r ON r.id = fr.receiver_id";

/// Provides directed friend requests and their acceptance.
pub struct FriendRequestRepo;

impl FriendRequestRepo {
    /// Insert a request from `sender_id` to `receiver_id`.
    pub async fn create(
        pool: &PgPool,
        sender_id: DbId,
        receiver_id: DbId,
    ) -> Result<FriendRequest, sqlx::Error> {
        let query = format!(
            "WITH fr AS (
                 INSERT INTO friend_requests (sender_id, receiver_id)
                 VALUES ($1, $2)
                 RETURNING id, sender_id, receiver_id, created_at
             )
             SELECT {VIEW_COLUMNS}
             FROM fr
             JOIN users s ON s.id = fr.sender_id
             JOIN users r ON r.id = fr.receiver_id"
        );
        sqlx::query_as::<_, FriendRequest>(&query)
            .bind(sender_id)
            .bind(receiver_id)
            .fetch_one(pool)
            .await
    }

    /// Whether a request exists between the two users in either direction.
    pub async fn exists_between(pool: &PgPool, a: DbId, b: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (
                 SELECT 1 FROM friend_requests
                 WHERE (sender_id = $1 AND receiver_id = $2)
                    OR (sender_id = $2 AND receiver_id = $1))",
        )
        .bind(a)
        .bind(b)
        .fetch_one(pool)
        .await
    }

    /// Find a request addressed to `receiver_id`.
    pub async fn find_received(
        pool: &PgPool,
        id: DbId,
        receiver_id: DbId,
    ) -> Result<Option<FriendRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {VIEW_COLUMNS} FROM {VIEW_FROM} WHERE fr.id = $1 AND fr.receiver_id = $2"
        );
        sqlx::query_as::<_, FriendRequest>(&query)
            .bind(id)
            .bind(receiver_id)
            .fetch_optional(pool)
            .await
    }

    /// Requests received by `user_id`, newest first.
    pub async fn list_received(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<FriendRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {VIEW_COLUMNS} FROM {VIEW_FROM}
             WHERE fr.receiver_id = $1 AND s.deleted_at IS NULL
             ORDER BY fr.created_at DESC, fr.id DESC"
        );
        sqlx::query_as::<_, FriendRequest>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Requests sent by `user_id` and not yet answered, newest first.
    pub async fn list_sent(pool: &PgPool, user_id: DbId) -> Result<Vec<FriendRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {VIEW_COLUMNS} FROM {VIEW_FROM}
             WHERE fr.sender_id = $1 AND r.deleted_at IS NULL
             ORDER BY fr.created_at DESC, fr.id DESC"
        );
        sqlx::query_as::<_, FriendRequest>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Withdraw a request sent by `sender_id`. Returns `true` if one was removed.
    pub async fn delete_sent(pool: &PgPool, id: DbId, sender_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM friend_requests WHERE id = $1 AND sender_id = $2")
            .bind(id)
            .bind(sender_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Decline a request: the row is removed and no friendship is created.
    pub async fn decline(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM friend_requests WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Accept a request: the row is removed and the friendship created in
    /// the same transaction.
    pub async fn accept(pool: &PgPool, request: &FriendRequest) -> Result<Friendship, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM friend_requests WHERE id = $1")
            .bind(request.id)
            .execute(&mut *tx)
            .await?;

        let (low, high) = Friendship::ordered(request.sender_id, request.receiver_id);
        let friendship = sqlx::query_as::<_, Friendship>(
            "INSERT INTO friendships (user_low_id, user_high_id)
             VALUES ($1, $2)
             ON CONFLICT (user_low_id, user_high_id) DO UPDATE SET user_low_id = EXCLUDED.user_low_id
             RETURNING id, user_low_id, user_high_id, created_at",
        )
        .bind(low)
        .bind(high)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(friendship)
    }
}
