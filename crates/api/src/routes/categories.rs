//! Route definitions for the `/categories` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::category;
use crate::state::AppState;

/// Routes mounted at `/categories`.
///
/// ```text
/// GET    /          -> list
/// POST   /          -> create
/// GET    /default   -> list_defaults
/// PUT    /{id}      -> update
/// DELETE /{id}      -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(category::list).post(category::create))
        .route("/default", get(category::list_defaults))
        .route("/{id}", put(category::update).delete(category::delete))
}
