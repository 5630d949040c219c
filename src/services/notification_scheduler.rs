//! Daily reminder dispatch. The only autonomous action in the system:
//! once per day at the configured local hour, every client is classified by
//! signed day-offset to its due date and the matching reminder template (if
//! any) is rendered and pushed through the WhatsApp gateway.

use chrono::{NaiveDate, Utc};
use renova::db::{DbError, DbPool};
use renova::models::{Client, NewDeliveryLogEntry};
use renova::templates::{reminder_template_name, render, RESERVED_OFFSETS};
use renova::{
    create_delivery_log_entry, find_template_by_name, get_all_clients, has_delivery_on_day,
    today_local, LOCAL_TZ,
};

use crate::whatsapp::{DispatchStatus, WhatsAppGateway};

const PREVIEW_MAX_CHARS: usize = 500;

pub async fn run_notification_scheduler(
    pool: DbPool,
    gateway: WhatsAppGateway,
    dispatch_hour: u32,
) {
    tracing::info!("Starting notification scheduler...");

    loop {
        let sleep_for = duration_until_next_run(dispatch_hour);
        tracing::info!(
            "Notification scheduler: next run in {} hours {} minutes",
            sleep_for.as_secs() / 3600,
            (sleep_for.as_secs() % 3600) / 60
        );

        tokio::time::sleep(sleep_for).await;

        let today = today_local();
        match run_daily_dispatch(&pool, &gateway, today).await {
            Ok(count) => tracing::info!("Daily dispatch done, {} reminders attempted", count),
            Err(e) => tracing::error!("Daily dispatch aborted: {}", e),
        }
    }
}

fn duration_until_next_run(dispatch_hour: u32) -> std::time::Duration {
    let now = Utc::now().with_timezone(&LOCAL_TZ);

    let today_run = now.date_naive().and_hms_opt(dispatch_hour, 0, 0);
    let tomorrow_run = (now.date_naive() + chrono::Duration::days(1)).and_hms_opt(dispatch_hour, 0, 0);

    let next = match (today_run, tomorrow_run) {
        (Some(today_at), _) if now.naive_local() < today_at => today_at,
        (_, Some(tomorrow_at)) => tomorrow_at,
        _ => return std::time::Duration::from_secs(86400),
    };

    match next.and_local_timezone(LOCAL_TZ).earliest() {
        Some(next_tz) => (next_tz - now)
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(86400)),
        None => {
            tracing::warn!("DST transition detected, using 24 hour fallback");
            std::time::Duration::from_secs(86400)
        }
    }
}

/// Maps a day-offset to the reserved template name it should fire, or None
/// when no reminder is due for that offset.
pub fn reminder_tag(offset: i64) -> Option<String> {
    if RESERVED_OFFSETS.contains(&offset) {
        Some(reminder_template_name(offset))
    } else {
        None
    }
}

/// One full pass over every client, regardless of owner. A failure on one
/// client never aborts the rest of the run. Returns the number of dispatch
/// attempts made.
pub async fn run_daily_dispatch(
    pool: &DbPool,
    gateway: &WhatsAppGateway,
    today: NaiveDate,
) -> Result<usize, DbError> {
    let clients = get_all_clients(pool)?;
    let mut attempted = 0;

    for client in &clients {
        let offset = (client.due_date - today).num_days();

        let Some(tag) = reminder_tag(offset) else {
            continue;
        };

        let template = match find_template_by_name(pool, &tag) {
            Ok(Some(t)) => t,
            Ok(None) => {
                tracing::debug!("No template named {}, skipping client {}", tag, client.id);
                continue;
            }
            Err(e) => {
                tracing::error!("Template lookup failed for client {}: {}", client.id, e);
                continue;
            }
        };

        // A double-invoked daily job must not double-fire the same reminder.
        match has_delivery_on_day(pool, client.id, &tag, today) {
            Ok(true) => {
                tracing::info!("Reminder {} already logged today for client {}", tag, client.id);
                continue;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!("Delivery log check failed for client {}: {}", client.id, e);
                continue;
            }
        }

        let rendered = render(&template.content, client, today);
        let status = dispatch_and_log(pool, gateway, client, &tag, &rendered).await;
        attempted += 1;

        tracing::info!(
            "Reminder {} for client {} ({}): {}",
            tag,
            client.id,
            client.name,
            status.as_str()
        );
    }

    Ok(attempted)
}

/// Sends one message and appends the outcome to the delivery log. Shared by
/// the scheduler and the operator-triggered send actions.
pub async fn dispatch_and_log(
    pool: &DbPool,
    gateway: &WhatsAppGateway,
    client: &Client,
    tag: &str,
    message: &str,
) -> DispatchStatus {
    let status = gateway.send(&client.phone, message).await;

    let preview = truncate_preview(message);
    let entry = NewDeliveryLogEntry {
        client_id: client.id,
        template_name: tag,
        recipient: &client.phone,
        status: status.as_str(),
        preview: &preview,
    };

    if let Err(e) = create_delivery_log_entry(pool, entry) {
        tracing::error!("Failed to log delivery for client {}: {}", client.id, e);
    }

    status
}

fn truncate_preview(message: &str) -> String {
    message.chars().take(PREVIEW_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reminder_tag_reserved_offsets() {
        assert_eq!(reminder_tag(-2).as_deref(), Some("reminder_-2"));
        assert_eq!(reminder_tag(-1).as_deref(), Some("reminder_-1"));
        assert_eq!(reminder_tag(0).as_deref(), Some("reminder_0"));
        assert_eq!(reminder_tag(1).as_deref(), Some("reminder_1"));
    }

    #[test]
    fn test_reminder_tag_outside_window() {
        assert_eq!(reminder_tag(-3), None);
        assert_eq!(reminder_tag(2), None);
        assert_eq!(reminder_tag(10), None);
    }

    #[test]
    fn test_offset_classification() {
        // today = 2025-06-10; due 2025-06-08 is offset -2, due 2025-06-20 is 10.
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let due_overdue = NaiveDate::from_ymd_opt(2025, 6, 8).unwrap();
        let due_far = NaiveDate::from_ymd_opt(2025, 6, 20).unwrap();

        assert_eq!(
            reminder_tag((due_overdue - today).num_days()).as_deref(),
            Some("reminder_-2")
        );
        assert_eq!(reminder_tag((due_far - today).num_days()), None);
    }

    #[test]
    fn test_truncate_preview() {
        let long = "x".repeat(600);
        assert_eq!(truncate_preview(&long).chars().count(), PREVIEW_MAX_CHARS);
        assert_eq!(truncate_preview("short"), "short");
    }
}
