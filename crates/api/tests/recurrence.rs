//! The recurring-event job, one tick at a time.

mod common;

use chrono::{Duration, Utc};
use evently_api::background::recurrence::run_once;
use evently_core::membership::InvitationStatus;
use evently_core::recurrence::RecurrencePattern;
use evently_core::types::DbId;
use evently_db::models::event::NewEvent;
use evently_db::repositories::{EventMemberRepo, EventRepo};
use sqlx::PgPool;

use common::{build_test_app, user};

fn past_event(owner_id: DbId, name: &str, pattern: RecurrencePattern) -> NewEvent {
    NewEvent {
        owner_id,
        folder_id: None,
        category_id: None,
        name: name.to_string(),
        description: None,
        location: None,
        target_date: Utc::now() - Duration::days(20),
        recurrence_pattern: pattern,
        recurrence_interval: None,
        invite_token: format!("tok-{name}"),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn monthly_event_gets_exactly_one_successor(pool: PgPool) {
    let owner = user(&pool, "owner").await;
    let guest = user(&pool, "guest").await;
    let app = build_test_app(pool.clone());

    let parent = EventRepo::create(
        &pool,
        &past_event(owner.id, "rent", RecurrencePattern::Monthly),
        &[guest.id],
        InvitationStatus::Invited,
    )
    .await
    .unwrap();

    let created = run_once(&pool, &app.state.triggers).await.unwrap();
    assert_eq!(created, 1);

    let parent = EventRepo::find_by_id(&pool, parent.id).await.unwrap().unwrap();
    assert!(parent.child_created);

    let owned = EventRepo::list_visible(&pool, owner.id).await.unwrap();
    let successor = owned
        .iter()
        .find(|e| e.id != parent.id)
        .expect("successor created");
    assert_eq!(successor.name, "rent");
    assert!(successor.target_date > parent.target_date);
    assert_ne!(successor.invite_token, parent.invite_token);
    assert!(EventMemberRepo::list_user_ids(&pool, successor.id)
        .await
        .unwrap()
        .is_empty());

    // Already handled: a second tick creates nothing.
    assert_eq!(run_once(&pool, &app.state.triggers).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unique_events_never_repeat(pool: PgPool) {
    let owner = user(&pool, "owner").await;
    let app = build_test_app(pool.clone());

    EventRepo::create(
        &pool,
        &past_event(owner.id, "wedding", RecurrencePattern::Unique),
        &[],
        InvitationStatus::Invited,
    )
    .await
    .unwrap();

    assert_eq!(run_once(&pool, &app.state.triggers).await.unwrap(), 0);
}
