//! Loader for the entity graph the audience resolver consumes.

use std::collections::HashMap;

use evently_core::device::DevicePlatform;
use evently_core::graph::{EventGraph, FolderGraph, GraphMember, Participant, PushEndpoint};
use evently_core::membership::InvitationStatus;
use evently_core::types::DbId;
use sqlx::{FromRow, PgPool};

use crate::repositories::EventRepo;

#[derive(Debug, FromRow)]
struct EventHead {
    id: DbId,
    name: String,
    owner_id: DbId,
    folder_id: Option<DbId>,
    category_id: Option<DbId>,
}

#[derive(Debug, FromRow)]
struct MemberRow {
    user_id: DbId,
    invitation_status: String,
}

#[derive(Debug, FromRow)]
struct FolderHead {
    id: DbId,
    name: String,
    owner_id: DbId,
}

#[derive(Debug, FromRow)]
struct DeviceRow {
    user_id: DbId,
    platform: String,
    token: String,
}

impl EventRepo {
    /// Load an event with owner, members, folder and every live device.
    ///
    /// Soft-deleted users are left out of member lists and soft-deleted
    /// devices are left out entirely. A soft-deleted folder counts as no
    /// folder. Returns `None` for a missing or soft-deleted event.
    pub async fn find_graph(
        pool: &PgPool,
        event_id: DbId,
    ) -> Result<Option<EventGraph>, sqlx::Error> {
        let Some(head) = sqlx::query_as::<_, EventHead>(
            "SELECT id, name, owner_id, folder_id, category_id
             FROM events WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(event_id)
        .fetch_optional(pool)
        .await?
        else {
            return Ok(None);
        };

        let member_rows = sqlx::query_as::<_, MemberRow>(
            "SELECT em.user_id, em.invitation_status
             FROM event_members em
             JOIN users u ON u.id = em.user_id AND u.deleted_at IS NULL
             WHERE em.event_id = $1
             ORDER BY em.id",
        )
        .bind(head.id)
        .fetch_all(pool)
        .await?;

        let folder = match head.folder_id {
            Some(folder_id) => load_folder(pool, folder_id).await?,
            None => None,
        };

        let mut user_ids: Vec<DbId> = vec![head.owner_id];
        user_ids.extend(member_rows.iter().map(|m| m.user_id));
        if let Some((folder_head, folder_member_ids)) = &folder {
            user_ids.push(folder_head.owner_id);
            user_ids.extend(folder_member_ids.iter().copied());
        }
        user_ids.sort_unstable();
        user_ids.dedup();

        let devices = load_devices(pool, &user_ids).await?;
        let participant = |user_id: DbId| Participant {
            user_id,
            devices: devices.get(&user_id).cloned().unwrap_or_default(),
        };

        let members = member_rows
            .into_iter()
            .filter_map(|row| match InvitationStatus::parse(&row.invitation_status) {
                Some(status) => Some(GraphMember {
                    participant: participant(row.user_id),
                    status,
                }),
                None => {
                    tracing::warn!(
                        event_id = head.id,
                        user_id = row.user_id,
                        status = %row.invitation_status,
                        "Skipping member with unknown invitation status",
                    );
                    None
                }
            })
            .collect();

        let folder = folder.map(|(folder_head, member_ids)| FolderGraph {
            id: folder_head.id,
            name: folder_head.name,
            owner: participant(folder_head.owner_id),
            members: member_ids.into_iter().map(participant).collect(),
        });

        Ok(Some(EventGraph {
            id: head.id,
            name: head.name,
            category_id: head.category_id,
            owner: participant(head.owner_id),
            members,
            folder,
        }))
    }
}

async fn load_folder(
    pool: &PgPool,
    folder_id: DbId,
) -> Result<Option<(FolderHead, Vec<DbId>)>, sqlx::Error> {
    let Some(head) = sqlx::query_as::<_, FolderHead>(
        "SELECT id, name, owner_id FROM folders WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(folder_id)
    .fetch_optional(pool)
    .await?
    else {
        return Ok(None);
    };

    let member_ids = sqlx::query_scalar::<_, DbId>(
        "SELECT fm.user_id
         FROM folder_members fm
         JOIN users u ON u.id = fm.user_id AND u.deleted_at IS NULL
         WHERE fm.folder_id = $1
         ORDER BY fm.id",
    )
    .bind(head.id)
    .fetch_all(pool)
    .await?;

    Ok(Some((head, member_ids)))
}

async fn load_devices(
    pool: &PgPool,
    user_ids: &[DbId],
) -> Result<HashMap<DbId, Vec<PushEndpoint>>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DeviceRow>(
        "SELECT user_id, platform, token FROM devices
         WHERE user_id = ANY($1) AND deleted_at IS NULL
         ORDER BY id",
    )
    .bind(user_ids)
    .fetch_all(pool)
    .await?;

    let mut by_user: HashMap<DbId, Vec<PushEndpoint>> = HashMap::new();
    for row in rows {
        let Some(platform) = DevicePlatform::parse(&row.platform) else {
            continue;
        };
        by_user.entry(row.user_id).or_default().push(PushEndpoint {
            platform,
            token: row.token,
        });
    }
    Ok(by_user)
}
