//! Device registration model.

use evently_core::device::DevicePlatform;
use evently_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A device row from the `devices` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Device {
    pub id: DbId,
    pub user_id: DbId,
    /// One of `apple`, `android`, `electron`, `web`.
    pub platform: String,
    pub token: String,
    pub created_at: Timestamp,
}

impl Device {
    pub fn platform(&self) -> Option<DevicePlatform> {
        DevicePlatform::parse(&self.platform)
    }
}

/// Body of `POST /notifications/subscribe/ios`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubscribeDevice {
    #[validate(length(min = 1, max = 512))]
    pub device_token: String,
}
