use renova::db::DbPool;
use renova::models::{Client, DeliveryLogEntry};
use renova::normalize::{format_date, format_money, parse_money};
use renova::templates::PLACEHOLDERS;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, ParseMode};

use super::types::{ClientDraft, STATE_EXPIRY_MINUTES};

pub async fn send_message(bot: &Bot, chat_id: i64, message: &str) -> ResponseResult<()> {
    bot.send_message(ChatId(chat_id), message)
        .parse_mode(ParseMode::Html)
        .await?;

    Ok(())
}

pub async fn send_message_with_keyboard(
    bot: &Bot,
    chat_id: i64,
    message: &str,
    keyboard: InlineKeyboardMarkup,
) -> ResponseResult<()> {
    bot.send_message(ChatId(chat_id), message)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await?;

    Ok(())
}

pub fn set_state<T: serde::Serialize>(pool: &DbPool, operator_id: i64, new_state: &str, draft: &T) {
    let expires_at = chrono::Utc::now() + chrono::Duration::minutes(STATE_EXPIRY_MINUTES);
    if let Err(e) = renova::set_conversation_state(
        pool,
        operator_id,
        new_state,
        Some(serde_json::to_value(draft).unwrap_or_default()),
        expires_at,
    ) {
        tracing::error!("Failed to update conversation state: {}", e);
    }
}

pub fn load_draft<T: serde::de::DeserializeOwned + Default>(
    state_data: Option<&serde_json::Value>,
) -> T {
    state_data
        .and_then(|d| serde_json::from_value(d.clone()).ok())
        .unwrap_or_default()
}

pub fn escape(text: &str) -> String {
    html_escape::encode_text(text).to_string()
}

pub fn format_client_details(client: &Client) -> String {
    let payment_line = if client.is_paid() {
        let paid_on = client
            .payment_date
            .map(format_date)
            .unwrap_or_else(|| "-".to_string());
        format!("💵 <b>Payment:</b> paid on {}", paid_on)
    } else {
        "💵 <b>Payment:</b> pending".to_string()
    };

    let notes_line = match client.extra_notes.as_deref() {
        Some(notes) if !notes.is_empty() => format!("\n🗒️ <b>Notes:</b> {}", escape(notes)),
        _ => String::new(),
    };

    format!(
        "👤 <b>{}</b>\n\n📱 <b>Phone:</b> {}\n📦 <b>Package:</b> {}\n💰 <b>Value:</b> R$ {}\n📅 <b>Due:</b> {}\n🖥️ <b>Server:</b> {}\n{}{}",
        escape(&client.name),
        escape(&client.phone),
        escape(&client.package),
        format_money(&client.price),
        format_date(client.due_date),
        escape(&client.server),
        payment_line,
        notes_line,
    )
}

pub fn format_draft_summary(draft: &ClientDraft) -> String {
    let due_display = draft
        .due_date
        .as_deref()
        .and_then(renova::normalize::parse_date)
        .map(format_date)
        .unwrap_or_else(|| "-".to_string());

    format!(
        "📋 <b>CONFIRM NEW CLIENT</b>\n\n📝 <b>Name:</b> {}\n📱 <b>Phone:</b> {}\n📦 <b>Package:</b> {}\n💰 <b>Value:</b> R$ {}\n📅 <b>Due:</b> {}\n🖥️ <b>Server:</b> {}\n🗒️ <b>Notes:</b> {}\n\nIs everything correct?",
        escape(draft.name.as_deref().unwrap_or("-")),
        escape(draft.phone.as_deref().unwrap_or("-")),
        escape(draft.package.as_deref().unwrap_or("-")),
        draft
            .price
            .as_deref()
            .map(|p| format_money(&parse_money(p)))
            .unwrap_or_else(|| "-".to_string()),
        due_display,
        escape(draft.server.as_deref().unwrap_or("-")),
        escape(draft.extra_notes.as_deref().unwrap_or("-")),
    )
}

/// Delivery log rendered newest-first, timestamps in the business timezone.
pub fn format_delivery_history(client_name: &str, entries: &[DeliveryLogEntry]) -> String {
    if entries.is_empty() {
        return format!(
            "📋 <b>HISTORY: {}</b>\n\nNo messages sent yet.",
            escape(client_name)
        );
    }

    let mut lines = vec![format!("📋 <b>HISTORY: {}</b>\n", escape(client_name))];
    for entry in entries {
        let mark = match entry.status.as_str() {
            "sent" => "✅",
            "timeout" => "⏱️",
            _ => "❌",
        };
        let when = entry
            .created_at
            .with_timezone(&renova::LOCAL_TZ)
            .format("%d/%m/%Y %H:%M");
        lines.push(format!(
            "{} {} <code>{}</code> ({})",
            mark,
            when,
            escape(&entry.template_name),
            entry.status
        ));
    }

    lines.join("\n")
}

pub fn placeholder_help() -> String {
    let list = PLACEHOLDERS
        .iter()
        .map(|p| format!("<code>{{{}}}</code>", p))
        .collect::<Vec<_>>()
        .join(" ");

    format!("Available placeholders:\n{}", list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_draft_summary_price_uses_grouped_format() {
        let draft = ClientDraft {
            price: Some("1234.00".to_string()),
            ..Default::default()
        };
        let summary = format_draft_summary(&draft);
        assert!(summary.contains("R$ 1.234,00"), "summary was: {}", summary);
    }

    #[test]
    fn test_delivery_history_renders_local_time() {
        // 01:00Z is 22:00 of the previous day in São Paulo.
        let entry = DeliveryLogEntry {
            id: 1,
            client_id: 7,
            template_name: "reminder_0".to_string(),
            recipient: "11999999999".to_string(),
            status: "sent".to_string(),
            preview: "Olá".to_string(),
            created_at: chrono::Utc.with_ymd_and_hms(2025, 6, 11, 1, 0, 0).unwrap(),
        };

        let history = format_delivery_history("João", &[entry]);
        assert!(history.contains("10/06/2025 22:00"), "history was: {}", history);
        assert!(history.contains("✅"));
        assert!(history.contains("reminder_0"));
    }

    #[test]
    fn test_delivery_history_empty() {
        let history = format_delivery_history("João", &[]);
        assert!(history.contains("No messages sent yet"));
    }
}
