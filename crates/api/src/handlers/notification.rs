//! Device registration for push notifications.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use evently_core::device::DevicePlatform;
use evently_db::models::device::{Device, SubscribeDevice};
use evently_db::repositories::DeviceRepo;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// POST /api/v1/notifications/subscribe/ios
///
/// Replaces whatever Apple device the caller registered before.
pub async fn subscribe_ios(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<SubscribeDevice>,
) -> AppResult<(StatusCode, Json<Device>)> {
    input.validate()?;
    let device = DeviceRepo::subscribe(
        &state.pool,
        auth.user_id,
        DevicePlatform::Apple,
        &input.device_token,
    )
    .await?;

    tracing::info!(device_id = device.id, user_id = auth.user_id, "Apple device subscribed");
    Ok((StatusCode::CREATED, Json(device)))
}
