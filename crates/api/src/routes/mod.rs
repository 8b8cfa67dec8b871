pub mod categories;
pub mod events;
pub mod folders;
pub mod friends;
pub mod health;
pub mod notifications;
pub mod users;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Every route except `/ws` authenticates with `Authorization: Bearer`;
/// `/ws` takes the same token as `?token=`.
///
/// ```text
/// /ws                                   WebSocket (realtime signals)
///
/// /events                               list, create
/// /events/join                          join by invite token (POST)
/// /events/invitations                   own open invitations (GET)
/// /events/{id}                          get, update, delete
/// /events/{id}/leave                    leave (POST)
/// /events/{id}/invitation               answer invitation (PUT)
///
/// /folders                              list, create
/// /folders/join                         join by invite token (POST)
/// /folders/{id}                         update, delete
/// /folders/{id}/leave                   leave (POST)
/// /folders/{id}/share                   regenerate invite token (POST)
///
/// /friend-requests                      send, list received
/// /friend-requests/sent                 list sent (GET)
/// /friend-requests/sent/{id}            withdraw (DELETE)
/// /friend-requests/{id}                 accept or decline (PUT)
/// /friends/{username}                   unfriend (DELETE)
///
/// /categories                           list, create
/// /categories/default                   built-in categories (GET)
/// /categories/{id}                      update, delete
///
/// /notifications/subscribe/ios          register an Apple device (POST)
///
/// /users/me                             profile, delete account
/// /users/me/friends                     friend list (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/events", events::router())
        .nest("/folders", folders::router())
        .merge(friends::router())
        .nest("/categories", categories::router())
        .nest("/notifications", notifications::router())
        .nest("/users", users::router())
}
