//! Route definitions for the `/folders` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::folder;
use crate::state::AppState;

/// Routes mounted at `/folders`.
///
/// ```text
/// GET    /              -> list
/// POST   /              -> create
/// POST   /join          -> join
/// PUT    /{id}          -> update
/// DELETE /{id}          -> delete
/// POST   /{id}/leave    -> leave
/// POST   /{id}/share    -> share
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(folder::list).post(folder::create))
        .route("/join", post(folder::join))
        .route("/{id}", put(folder::update).delete(folder::delete))
        .route("/{id}/leave", post(folder::leave))
        .route("/{id}/share", post(folder::share))
}
