//! Route definitions for the `/notifications` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::notification;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// POST   /subscribe/ios   -> subscribe_ios
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/subscribe/ios", post(notification::subscribe_ios))
}
