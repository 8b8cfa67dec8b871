//! Fixtures shared by the repository integration tests.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use evently_core::device::DevicePlatform;
use evently_core::membership::InvitationStatus;
use evently_core::recurrence::RecurrencePattern;
use evently_core::types::DbId;
use evently_db::models::event::{Event, NewEvent};
use evently_db::models::user::{CreateUser, User};
use evently_db::repositories::{DeviceRepo, EventRepo, UserRepo};
use sqlx::PgPool;

pub async fn user(pool: &PgPool, username: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            first_name: None,
            last_name: None,
            email: None,
        },
    )
    .await
    .expect("create user")
}

pub async fn apple_device(pool: &PgPool, user_id: DbId, token: &str) {
    DeviceRepo::subscribe(pool, user_id, DevicePlatform::Apple, token)
        .await
        .expect("subscribe device");
}

pub fn new_event(owner_id: DbId, name: &str, token: &str) -> NewEvent {
    NewEvent {
        owner_id,
        folder_id: None,
        category_id: None,
        name: name.to_string(),
        description: None,
        location: None,
        target_date: Utc::now() + Duration::days(7),
        recurrence_pattern: RecurrencePattern::Unique,
        recurrence_interval: None,
        invite_token: token.to_string(),
    }
}

pub async fn event_with_members(
    pool: &PgPool,
    input: &NewEvent,
    members: &[DbId],
    status: InvitationStatus,
) -> Event {
    EventRepo::create(pool, input, members, status)
        .await
        .expect("create event")
}
