use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::ws::Message;
use evently_core::realtime::RealtimeMessage;
use evently_core::types::{DbId, Timestamp};
use evently_events::RealtimeSink;
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Authenticated user the connection belongs to.
    pub user_id: DbId,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// When this connection was established.
    pub connected_at: Timestamp,
}

/// Outbound frame wrapping every realtime signal.
#[derive(Debug, Serialize)]
pub struct UpdateFrame<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: &'a RealtimeMessage,
}

impl<'a> UpdateFrame<'a> {
    pub fn new(data: &'a RealtimeMessage) -> Self {
        Self {
            kind: "update",
            data,
        }
    }
}

/// Manages all active WebSocket connections.
///
/// At most one connection per user is live: registering a new one closes
/// and forgets the previous ones. Thread-safe via interior `RwLock`;
/// designed to be wrapped in `Arc` and shared across the application.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    /// Create a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection for `user_id`, evicting any older one.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(&self, conn_id: String, user_id: DbId) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            user_id,
            sender: tx,
            connected_at: chrono::Utc::now(),
        };

        let mut conns = self.connections.write().await;
        let stale: Vec<String> = conns
            .iter()
            .filter(|(_, c)| c.user_id == user_id)
            .map(|(id, _)| id.clone())
            .collect();
        for id in stale {
            if let Some(old) = conns.remove(&id) {
                let _ = old.sender.send(Message::Close(None));
                tracing::info!(user_id, conn_id = %id, "Evicted previous WebSocket session");
            }
        }
        conns.insert(conn_id, conn);
        rx
    }

    /// Remove a connection by its ID. Unknown ids (already evicted) are ignored.
    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Connection IDs associated with a given user.
    pub async fn get_by_user(&self, user_id: DbId) -> Vec<String> {
        self.connections
            .read()
            .await
            .iter()
            .filter(|(_, conn)| conn.user_id == user_id)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Send a message to every connection whose user is in `user_ids`.
    ///
    /// Returns the number of connections the message was queued on. Closed
    /// channels are skipped; their receive loops clean them up.
    pub async fn send_to_users(&self, user_ids: &[DbId], message: Message) -> usize {
        let targets: HashSet<DbId> = user_ids.iter().copied().collect();
        let conns = self.connections.read().await;
        let mut count = 0;
        for conn in conns.values() {
            if targets.contains(&conn.user_id) && conn.sender.send(message.clone()).is_ok() {
                count += 1;
            }
        }
        count
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    ///
    /// Used during graceful shutdown.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RealtimeSink for WsManager {
    async fn notify(&self, user_ids: &[DbId], message: &RealtimeMessage) -> usize {
        if user_ids.is_empty() {
            return 0;
        }
        let text = match serde_json::to_string(&UpdateFrame::new(message)) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode realtime frame");
                return 0;
            }
        };
        self.send_to_users(user_ids, Message::Text(text.into())).await
    }
}
