//! Repository for the `events` table.

use evently_core::membership::{InvitationStatus, MemberDiff};
use evently_core::types::{DbId, Timestamp};
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::event::{Event, NewEvent, UpdateEvent};

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str = "id, owner_id, folder_id, category_id, name, description, \
     location, target_date, recurrence_pattern, recurrence_interval, child_created, \
     invite_token, created_at, updated_at";

/// Provides CRUD for events plus the batch writes behind event edits and
/// the recurrence job.
pub struct EventRepo;

impl EventRepo {
    /// Insert an event and its initial members in one transaction.
    ///
    /// `member_ids` must not contain the owner.
    pub async fn create(
        pool: &PgPool,
        input: &NewEvent,
        member_ids: &[DbId],
        status: InvitationStatus,
    ) -> Result<Event, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let event = Self::insert(&mut tx, input).await?;
        insert_members(&mut tx, event.id, member_ids, status).await?;
        tx.commit().await?;
        Ok(event)
    }

    /// Find an event by ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an event by its invite token. Excludes soft-deleted rows.
    pub async fn find_by_invite_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events WHERE invite_token = $1 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Events `user_id` takes part in: owned, accepted, or reachable through
    /// a folder they own or belong to. Ordered by target date.
    pub async fn list_visible(pool: &PgPool, user_id: DbId) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events e
             WHERE e.deleted_at IS NULL AND (
                 e.owner_id = $1
                 OR EXISTS (
                     SELECT 1 FROM event_members em
                     WHERE em.event_id = e.id AND em.user_id = $1
                       AND em.invitation_status = 'accepted')
                 OR EXISTS (
                     SELECT 1 FROM folders f
                     WHERE f.id = e.folder_id AND f.deleted_at IS NULL
                       AND (f.owner_id = $1 OR EXISTS (
                           SELECT 1 FROM folder_members fm
                           WHERE fm.folder_id = f.id AND fm.user_id = $1)))
             )
             ORDER BY e.target_date ASC, e.id ASC"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Find an event `user_id` may open: its owner, any member whatever the
    /// status, or a participant of its folder. Excludes soft-deleted rows.
    pub async fn find_visible(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events e
             WHERE e.id = $1 AND e.deleted_at IS NULL AND (
                 e.owner_id = $2
                 OR EXISTS (
                     SELECT 1 FROM event_members em
                     WHERE em.event_id = e.id AND em.user_id = $2)
                 OR EXISTS (
                     SELECT 1 FROM folders f
                     WHERE f.id = e.folder_id AND f.deleted_at IS NULL
                       AND (f.owner_id = $2 OR EXISTS (
                           SELECT 1 FROM folder_members fm
                           WHERE fm.folder_id = f.id AND fm.user_id = $2)))
             )"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Apply an edit as one batch: patch scalars, replace the folder, then
    /// remove and add members. Returns `None` if the event is gone.
    ///
    /// Added members start as `invited`.
    pub async fn apply_update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateEvent,
        folder_id: Option<DbId>,
        members: &MemberDiff<DbId>,
    ) -> Result<Option<Event>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE events SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                location = COALESCE($4, location),
                target_date = COALESCE($5, target_date),
                recurrence_pattern = COALESCE($6, recurrence_pattern),
                recurrence_interval = COALESCE($7, recurrence_interval),
                category_id = COALESCE($8, category_id),
                folder_id = $9
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        let Some(event) = sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.location)
            .bind(input.target_date)
            .bind(&input.recurrence_pattern)
            .bind(input.recurrence_interval)
            .bind(input.category_id)
            .bind(folder_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        if !members.to_remove.is_empty() {
            sqlx::query("DELETE FROM event_members WHERE event_id = $1 AND user_id = ANY($2)")
                .bind(id)
                .bind(&members.to_remove)
                .execute(&mut *tx)
                .await?;
        }
        insert_members(&mut tx, id, &members.to_add, InvitationStatus::for_named_invite()).await?;

        tx.commit().await?;
        Ok(Some(event))
    }

    /// Soft-delete an event. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE events SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Recurring events whose date is before `before` and that have no
    /// successor yet, oldest first.
    pub async fn list_due_for_recurrence(
        pool: &PgPool,
        before: Timestamp,
        limit: i64,
    ) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events
             WHERE deleted_at IS NULL
               AND child_created = FALSE
               AND recurrence_pattern <> 'unique'
               AND target_date < $1
             ORDER BY target_date ASC, id ASC
             LIMIT $2"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(before)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Mark `parent_id` as having a successor and insert `successor`.
    ///
    /// Returns `None` without inserting when another run already created
    /// the successor.
    pub async fn create_successor(
        pool: &PgPool,
        parent_id: DbId,
        successor: &NewEvent,
    ) -> Result<Option<Event>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let claimed = sqlx::query(
            "UPDATE events SET child_created = TRUE
             WHERE id = $1 AND child_created = FALSE AND deleted_at IS NULL",
        )
        .bind(parent_id)
        .execute(&mut *tx)
        .await?;
        if claimed.rows_affected() == 0 {
            return Ok(None);
        }

        let event = Self::insert(&mut tx, successor).await?;
        tx.commit().await?;
        Ok(Some(event))
    }

    async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        input: &NewEvent,
    ) -> Result<Event, sqlx::Error> {
        let query = format!(
            "INSERT INTO events (owner_id, folder_id, category_id, name, description, location,
                                 target_date, recurrence_pattern, recurrence_interval, invite_token)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(input.owner_id)
            .bind(input.folder_id)
            .bind(input.category_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.location)
            .bind(input.target_date)
            .bind(input.recurrence_pattern.as_str())
            .bind(input.recurrence_interval)
            .bind(&input.invite_token)
            .fetch_one(&mut **tx)
            .await
    }
}

async fn insert_members(
    tx: &mut Transaction<'_, Postgres>,
    event_id: DbId,
    user_ids: &[DbId],
    status: InvitationStatus,
) -> Result<(), sqlx::Error> {
    if user_ids.is_empty() {
        return Ok(());
    }
    sqlx::query(
        "INSERT INTO event_members (event_id, user_id, invitation_status)
         SELECT $1, UNNEST($2::BIGINT[]), $3
         ON CONFLICT (event_id, user_id) DO NOTHING",
    )
    .bind(event_id)
    .bind(user_ids)
    .bind(status.as_str())
    .execute(&mut **tx)
    .await?;
    Ok(())
}
