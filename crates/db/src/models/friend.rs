//! Friendship and friend request models.

use evently_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from `friendships`, stored once per pair with `user_low_id < user_high_id`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Friendship {
    pub id: DbId,
    pub user_low_id: DbId,
    pub user_high_id: DbId,
    pub created_at: Timestamp,
}

impl Friendship {
    /// Order a pair of user ids the way `friendships` stores them.
    pub fn ordered(a: DbId, b: DbId) -> (DbId, DbId) {
        if a < b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn user_ids(&self) -> [DbId; 2] {
        [self.user_low_id, self.user_high_id]
    }
}

/// A friend request joined with both usernames.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FriendRequest {
    pub id: DbId,
    pub sender_id: DbId,
    pub sender_username: String,
    pub receiver_id: DbId,
    pub receiver_username: String,
    pub created_at: Timestamp,
}

/// Body of `POST /friend-requests`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFriendRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
}

/// Body of `PUT /friend-requests/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RespondFriendRequest {
    pub accept: bool,
}
