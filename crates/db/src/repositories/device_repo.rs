//! Repository for the `devices` table.

use evently_core::device::DevicePlatform;
use evently_core::types::DbId;
use sqlx::PgPool;

use crate::models::device::Device;

const COLUMNS: &str = "id, user_id, platform, token, created_at";

/// Provides device registration. A user has at most one live device per platform.
pub struct DeviceRepo;

impl DeviceRepo {
    /// Register `token` as the user's `platform` device, retiring the
    /// previous one.
    pub async fn subscribe(
        pool: &PgPool,
        user_id: DbId,
        platform: DevicePlatform,
        token: &str,
    ) -> Result<Device, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "UPDATE devices SET deleted_at = NOW()
             WHERE user_id = $1 AND platform = $2 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .bind(platform.as_str())
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO devices (user_id, platform, token)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        let device = sqlx::query_as::<_, Device>(&query)
            .bind(user_id)
            .bind(platform.as_str())
            .bind(token)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(device)
    }

    /// List the live devices of a user, oldest first.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Device>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM devices
             WHERE user_id = $1 AND deleted_at IS NULL
             ORDER BY id"
        );
        sqlx::query_as::<_, Device>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
