//! WebSocket hub: the realtime sink of the notification dispatcher.
//!
//! Provides connection management with the single-session policy, heartbeat
//! pings, and the authenticated HTTP upgrade handler.

mod handler;
mod heartbeat;
pub mod manager;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
