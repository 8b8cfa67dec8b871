//! Integration tests for event edits, invitations and recurrence writes.

mod common;

use chrono::{Duration, Utc};
use evently_core::membership::{diff_members, InvitationStatus};
use evently_core::recurrence::RecurrencePattern;
use evently_db::models::event::{NewEvent, UpdateEvent};
use evently_db::repositories::{EventMemberRepo, EventRepo, FolderMemberRepo, FolderRepo};
use sqlx::PgPool;

use common::{event_with_members, new_event, user};

#[sqlx::test(migrations = "../../db/migrations")]
async fn apply_update_replaces_members_in_one_batch(pool: PgPool) {
    let owner = user(&pool, "owner").await;
    let a = user(&pool, "a").await;
    let b = user(&pool, "b").await;
    let c = user(&pool, "c").await;

    let event = event_with_members(
        &pool,
        &new_event(owner.id, "Dinner", "tok-1"),
        &[a.id, b.id],
        InvitationStatus::Invited,
    )
    .await;
    EventMemberRepo::update_status(&pool, event.id, b.id, InvitationStatus::Accepted)
        .await
        .unwrap();

    let current = EventMemberRepo::list_user_ids(&pool, event.id).await.unwrap();
    let diff = diff_members(&current, &[b.id, c.id], &owner.id);
    let input = UpdateEvent {
        name: Some("Late dinner".into()),
        ..Default::default()
    };

    let updated = EventRepo::apply_update(&pool, event.id, &input, None, &diff)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.name, "Late dinner");
    assert_eq!(updated.invite_token.as_deref(), Some("tok-1"));
    assert!(EventMemberRepo::find(&pool, event.id, a.id).await.unwrap().is_none());
    let kept = EventMemberRepo::find(&pool, event.id, b.id).await.unwrap().unwrap();
    assert_eq!(kept.status(), Some(InvitationStatus::Accepted));
    let added = EventMemberRepo::find(&pool, event.id, c.id).await.unwrap().unwrap();
    assert_eq!(added.status(), Some(InvitationStatus::Invited));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invitations_list_invited_and_pending_only(pool: PgPool) {
    let owner = user(&pool, "owner").await;
    let guest = user(&pool, "guest").await;

    let mut events = Vec::new();
    for (name, token) in [("First", "tok-1"), ("Second", "tok-2"), ("Third", "tok-3")] {
        events.push(
            event_with_members(
                &pool,
                &new_event(owner.id, name, token),
                &[guest.id],
                InvitationStatus::Invited,
            )
            .await,
        );
    }
    EventMemberRepo::update_status(&pool, events[1].id, guest.id, InvitationStatus::Pending)
        .await
        .unwrap();
    EventMemberRepo::update_status(&pool, events[2].id, guest.id, InvitationStatus::Accepted)
        .await
        .unwrap();

    let invitations = EventMemberRepo::list_invitations(&pool, guest.id).await.unwrap();
    let ids: Vec<_> = invitations.iter().map(|i| i.event_id).collect();

    assert_eq!(invitations.len(), 2);
    assert!(ids.contains(&events[0].id));
    assert!(ids.contains(&events[1].id));
    assert!(invitations.iter().all(|i| i.owner_username == "owner"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_membership_violates_unique_constraint(pool: PgPool) {
    let owner = user(&pool, "owner").await;
    let guest = user(&pool, "guest").await;
    let event = event_with_members(
        &pool,
        &new_event(owner.id, "Party", "tok-1"),
        &[guest.id],
        InvitationStatus::Invited,
    )
    .await;

    let err = EventMemberRepo::add(&pool, event.id, guest.id, InvitationStatus::Accepted)
        .await
        .unwrap_err();
    let constraint = err
        .as_database_error()
        .and_then(|e| e.constraint())
        .map(str::to_string);
    assert_eq!(constraint.as_deref(), Some("uq_event_members_event_user"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn visible_events_follow_ownership_acceptance_and_folders(pool: PgPool) {
    let owner = user(&pool, "owner").await;
    let invited = user(&pool, "invited").await;
    let folder_member = user(&pool, "folder-member").await;

    let folder = FolderRepo::create(&pool, owner.id, "Club", "folder-tok", &[folder_member.id])
        .await
        .unwrap();
    let mut in_folder = new_event(owner.id, "Meeting", "tok-1");
    in_folder.folder_id = Some(folder.id);
    let folder_event = event_with_members(&pool, &in_folder, &[], InvitationStatus::Invited).await;
    let invite_event = event_with_members(
        &pool,
        &new_event(owner.id, "Lunch", "tok-2"),
        &[invited.id],
        InvitationStatus::Invited,
    )
    .await;

    let owner_ids: Vec<_> = EventRepo::list_visible(&pool, owner.id)
        .await
        .unwrap()
        .iter()
        .map(|e| e.id)
        .collect();
    assert!(owner_ids.contains(&folder_event.id));
    assert!(owner_ids.contains(&invite_event.id));

    let member_ids: Vec<_> = EventRepo::list_visible(&pool, folder_member.id)
        .await
        .unwrap()
        .iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(member_ids, vec![folder_event.id]);

    assert!(EventRepo::list_visible(&pool, invited.id).await.unwrap().is_empty());
    EventMemberRepo::update_status(&pool, invite_event.id, invited.id, InvitationStatus::Accepted)
        .await
        .unwrap();
    assert_eq!(EventRepo::list_visible(&pool, invited.id).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn single_event_visibility_covers_every_participant(pool: PgPool) {
    let owner = user(&pool, "owner").await;
    let invited = user(&pool, "invited").await;
    let folder_member = user(&pool, "folder-member").await;
    let stranger = user(&pool, "stranger").await;

    let folder = FolderRepo::create(&pool, owner.id, "Club", "folder-tok", &[folder_member.id])
        .await
        .unwrap();
    let mut input = new_event(owner.id, "Meeting", "tok-1");
    input.folder_id = Some(folder.id);
    let event = event_with_members(&pool, &input, &[invited.id], InvitationStatus::Invited).await;

    for viewer in [owner.id, invited.id, folder_member.id] {
        let found = EventRepo::find_visible(&pool, event.id, viewer).await.unwrap();
        assert_eq!(found.map(|e| e.id), Some(event.id));
    }
    assert!(EventRepo::find_visible(&pool, event.id, stranger.id)
        .await
        .unwrap()
        .is_none());

    // Detaching the folder takes its members' view with it.
    FolderRepo::soft_delete(&pool, folder.id).await.unwrap();
    assert!(EventRepo::find_visible(&pool, event.id, folder_member.id)
        .await
        .unwrap()
        .is_none());
    assert!(EventRepo::find_visible(&pool, event.id, invited.id)
        .await
        .unwrap()
        .is_some());

    EventRepo::soft_delete(&pool, event.id).await.unwrap();
    assert!(EventRepo::find_visible(&pool, event.id, owner.id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn folder_delete_detaches_events(pool: PgPool) {
    let owner = user(&pool, "owner").await;
    let folder = FolderRepo::create(&pool, owner.id, "Trips", "folder-tok", &[])
        .await
        .unwrap();
    let mut input = new_event(owner.id, "Hike", "tok-1");
    input.folder_id = Some(folder.id);
    let event = event_with_members(&pool, &input, &[], InvitationStatus::Invited).await;

    let detached = FolderRepo::soft_delete(&pool, folder.id).await.unwrap();

    assert_eq!(detached, Some(vec![event.id]));
    let reloaded = EventRepo::find_by_id(&pool, event.id).await.unwrap().unwrap();
    assert_eq!(reloaded.folder_id, None);
    assert_eq!(FolderRepo::soft_delete(&pool, folder.id).await.unwrap(), None);
    assert_eq!(FolderMemberRepo::add_many(&pool, folder.id, &[]).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn successor_is_created_once(pool: PgPool) {
    let owner = user(&pool, "owner").await;
    let mut input = new_event(owner.id, "Rent", "tok-1");
    input.recurrence_pattern = RecurrencePattern::Monthly;
    input.target_date = Utc::now() - Duration::days(40);
    let parent = event_with_members(&pool, &input, &[], InvitationStatus::Invited).await;

    let due = EventRepo::list_due_for_recurrence(&pool, Utc::now(), 10).await.unwrap();
    assert_eq!(due.iter().map(|e| e.id).collect::<Vec<_>>(), vec![parent.id]);

    let successor = NewEvent::successor_of(&parent, "tok-2".into()).unwrap();
    let created = EventRepo::create_successor(&pool, parent.id, &successor)
        .await
        .unwrap()
        .expect("first claim wins");
    assert_eq!(created.recurrence_pattern, "monthly");
    assert!(created.target_date > parent.target_date);

    let again = NewEvent::successor_of(&parent, "tok-3".into()).unwrap();
    assert!(EventRepo::create_successor(&pool, parent.id, &again)
        .await
        .unwrap()
        .is_none());

    let due = EventRepo::list_due_for_recurrence(&pool, Utc::now(), 10).await.unwrap();
    assert!(due.iter().all(|e| e.id != parent.id));
}
