//! Route definitions for friend requests and friendships.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::friend;
use crate::state::AppState;

/// Routes merged at the `/api/v1` root.
///
/// ```text
/// POST   /friend-requests              -> send_request
/// GET    /friend-requests              -> list_received
/// GET    /friend-requests/sent         -> list_sent
/// DELETE /friend-requests/sent/{id}    -> withdraw
/// PUT    /friend-requests/{id}         -> respond
/// DELETE /friends/{username}           -> remove_friend
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/friend-requests",
            post(friend::send_request).get(friend::list_received),
        )
        .route("/friend-requests/sent", get(friend::list_sent))
        .route("/friend-requests/sent/{id}", delete(friend::withdraw))
        .route("/friend-requests/{id}", put(friend::respond))
        .route("/friends/{username}", delete(friend::remove_friend))
}
