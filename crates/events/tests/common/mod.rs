//! Recording sinks and fixtures for the trigger tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use evently_core::device::DevicePlatform;
use evently_core::membership::InvitationStatus;
use evently_core::push::PushMessage;
use evently_core::realtime::RealtimeMessage;
use evently_core::recurrence::RecurrencePattern;
use evently_core::types::DbId;
use evently_db::models::event::{Event, NewEvent};
use evently_db::models::user::{CreateUser, User};
use evently_db::repositories::{DeviceRepo, EventRepo, UserRepo};
use evently_events::{ChangeTriggers, NotificationDispatcher, PushError, PushSink, RealtimeSink};
use sqlx::PgPool;

/// Every realtime delivery, one entry per user.
#[derive(Default)]
pub struct RecordedSessions {
    pub deliveries: Mutex<Vec<(DbId, RealtimeMessage)>>,
}

impl RecordedSessions {
    pub fn for_user(&self, user_id: DbId) -> Vec<RealtimeMessage> {
        self.deliveries
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == user_id)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn total(&self) -> usize {
        self.deliveries.lock().unwrap().len()
    }
}

#[async_trait]
impl RealtimeSink for RecordedSessions {
    async fn notify(&self, user_ids: &[DbId], message: &RealtimeMessage) -> usize {
        let mut deliveries = self.deliveries.lock().unwrap();
        for id in user_ids {
            deliveries.push((*id, message.clone()));
        }
        user_ids.len()
    }
}

#[derive(Default)]
pub struct RecordedPushes {
    pub sent: Mutex<Vec<PushMessage>>,
}

impl RecordedPushes {
    pub fn for_token(&self, token: &str) -> Vec<PushMessage> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.device_token == token)
            .cloned()
            .collect()
    }

    pub fn total(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl PushSink for RecordedPushes {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub struct Harness {
    pub triggers: ChangeTriggers,
    pub sessions: Arc<RecordedSessions>,
    pub pushes: Arc<RecordedPushes>,
}

pub fn harness(pool: &PgPool) -> Harness {
    let sessions = Arc::new(RecordedSessions::default());
    let pushes = Arc::new(RecordedPushes::default());
    let dispatcher = NotificationDispatcher::new(sessions.clone(), pushes.clone());
    Harness {
        triggers: ChangeTriggers::new(pool.clone(), dispatcher),
        sessions,
        pushes,
    }
}

pub async fn user_with_phone(pool: &PgPool, username: &str) -> User {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            first_name: None,
            last_name: None,
            email: None,
        },
    )
    .await
    .expect("create user");
    DeviceRepo::subscribe(pool, user.id, DevicePlatform::Apple, &format!("{username}-phone"))
        .await
        .expect("subscribe device");
    user
}

pub async fn event(
    pool: &PgPool,
    owner_id: DbId,
    folder_id: Option<DbId>,
    name: &str,
    members: &[DbId],
) -> Event {
    let input = NewEvent {
        owner_id,
        folder_id,
        category_id: None,
        name: name.to_string(),
        description: None,
        location: None,
        target_date: Utc::now() + Duration::days(3),
        recurrence_pattern: RecurrencePattern::Unique,
        recurrence_interval: None,
        invite_token: format!("tok-{name}"),
    };
    EventRepo::create(pool, &input, members, InvitationStatus::Invited)
        .await
        .expect("create event")
}
