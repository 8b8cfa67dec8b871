//! Route definitions for the `/events` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{event, invitation};
use crate::state::AppState;

/// Routes mounted at `/events`.
///
/// ```text
/// GET    /                   -> list
/// POST   /                   -> create
/// POST   /join               -> join
/// GET    /invitations        -> list_invitations
/// GET    /{id}               -> get_by_id
/// PUT    /{id}               -> update
/// DELETE /{id}               -> delete
/// POST   /{id}/leave         -> leave
/// PUT    /{id}/invitation    -> respond
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(event::list).post(event::create))
        .route("/join", post(invitation::join))
        .route("/invitations", get(invitation::list_invitations))
        .route(
            "/{id}",
            get(event::get_by_id).put(event::update).delete(event::delete),
        )
        .route("/{id}/leave", post(invitation::leave))
        .route("/{id}/invitation", put(invitation::respond))
}
