//! Successor creation for recurring events.
//!
//! On every tick, events whose date lies before the start of today (UTC),
//! that repeat monthly or yearly and have no successor yet get one: same
//! owner, folder, category and details, date advanced by one period, a
//! fresh invite token and no members. The successor then goes through the
//! ordinary create trigger.

use std::time::Duration;

use chrono::Utc;
use evently_core::invite_token::generate_invite_token;
use evently_core::recurrence::start_of_day;
use evently_db::models::event::NewEvent;
use evently_db::repositories::EventRepo;
use evently_events::ChangeTriggers;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// Maximum parents handled per tick; the rest wait for the next one.
const BATCH_SIZE: i64 = 100;

/// Run the recurrence loop every `interval` until `cancel` is triggered.
pub async fn run(
    pool: PgPool,
    triggers: ChangeTriggers,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = interval.as_secs(), "Recurrence job started");

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Recurrence job stopping");
                break;
            }
            _ = ticker.tick() => {
                match run_once(&pool, &triggers).await {
                    Ok(0) => tracing::debug!("Recurrence: nothing due"),
                    Ok(created) => tracing::info!(created, "Recurrence: successors created"),
                    Err(e) => tracing::error!(error = %e, "Recurrence: batch failed"),
                }
            }
        }
    }
}

/// Create the successors of every due event. Returns how many were created.
///
/// A parent whose successor fails to insert is logged and left due, so the
/// next tick retries it.
pub async fn run_once(pool: &PgPool, triggers: &ChangeTriggers) -> Result<usize, sqlx::Error> {
    let due = EventRepo::list_due_for_recurrence(pool, start_of_day(Utc::now()), BATCH_SIZE).await?;
    let mut created = 0;

    for parent in &due {
        let Some(successor) = NewEvent::successor_of(parent, generate_invite_token()) else {
            tracing::warn!(event_id = parent.id, pattern = %parent.recurrence_pattern, "Recurrence: no next occurrence");
            continue;
        };
        match EventRepo::create_successor(pool, parent.id, &successor).await {
            Ok(Some(event)) => {
                tracing::debug!(parent_id = parent.id, event_id = event.id, "Recurrence: successor created");
                triggers.event_created(event.id).await;
                created += 1;
            }
            // Claimed concurrently by another instance.
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(parent_id = parent.id, error = %e, "Recurrence: successor insert failed");
            }
        }
    }

    Ok(created)
}
