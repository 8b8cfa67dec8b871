//! Repository for the `event_members` table.
//!
//! Rows are removed physically: declining, leaving and owner-side removal
//! all delete the membership.

use evently_core::membership::InvitationStatus;
use evently_core::types::DbId;
use sqlx::PgPool;

use crate::models::event::{EventMemberView, Invitation};
use crate::models::membership::EventMember;

const COLUMNS: &str = "id, event_id, user_id, invitation_status, joined_at, updated_at";

/// Provides membership reads and single-row writes for events.
pub struct EventMemberRepo;

impl EventMemberRepo {
    /// Add one member with the given status.
    ///
    /// Fails with a `uq_event_members_event_user` violation when the user
    /// is already a member.
    pub async fn add(
        pool: &PgPool,
        event_id: DbId,
        user_id: DbId,
        status: InvitationStatus,
    ) -> Result<EventMember, sqlx::Error> {
        let query = format!(
            "INSERT INTO event_members (event_id, user_id, invitation_status)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EventMember>(&query)
            .bind(event_id)
            .bind(user_id)
            .bind(status.as_str())
            .fetch_one(pool)
            .await
    }

    pub async fn find(
        pool: &PgPool,
        event_id: DbId,
        user_id: DbId,
    ) -> Result<Option<EventMember>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM event_members WHERE event_id = $1 AND user_id = $2"
        );
        sqlx::query_as::<_, EventMember>(&query)
            .bind(event_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// User ids of every member row of an event.
    pub async fn list_user_ids(pool: &PgPool, event_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT user_id FROM event_members WHERE event_id = $1 ORDER BY id",
        )
        .bind(event_id)
        .fetch_all(pool)
        .await
    }

    /// Members with usernames, for API responses.
    pub async fn list_views(
        pool: &PgPool,
        event_id: DbId,
    ) -> Result<Vec<EventMemberView>, sqlx::Error> {
        sqlx::query_as::<_, EventMemberView>(
            "SELECT em.user_id, u.username, em.invitation_status
             FROM event_members em
             JOIN users u ON u.id = em.user_id AND u.deleted_at IS NULL
             WHERE em.event_id = $1
             ORDER BY em.id",
        )
        .bind(event_id)
        .fetch_all(pool)
        .await
    }

    /// Set the status of an existing membership. Returns `None` if there is none.
    pub async fn update_status(
        pool: &PgPool,
        event_id: DbId,
        user_id: DbId,
        status: InvitationStatus,
    ) -> Result<Option<EventMember>, sqlx::Error> {
        let query = format!(
            "UPDATE event_members SET invitation_status = $3
             WHERE event_id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EventMember>(&query)
            .bind(event_id)
            .bind(user_id)
            .bind(status.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Delete a membership. Returns `true` if a row was removed.
    pub async fn remove(pool: &PgPool, event_id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM event_members WHERE event_id = $1 AND user_id = $2")
            .bind(event_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Invitations of `user_id` still waiting for an answer (`invited` or
    /// `pending`), soonest event first.
    pub async fn list_invitations(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Invitation>, sqlx::Error> {
        sqlx::query_as::<_, Invitation>(
            "SELECT e.id AS event_id, e.name AS event_name, e.target_date, e.category_id,
                    e.owner_id, o.username AS owner_username,
                    em.invitation_status, em.joined_at
             FROM event_members em
             JOIN events e ON e.id = em.event_id AND e.deleted_at IS NULL
             JOIN users o ON o.id = e.owner_id
             WHERE em.user_id = $1 AND em.invitation_status IN ('invited', 'pending')
             ORDER BY e.target_date ASC, e.id ASC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
