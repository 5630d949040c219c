use renova::db::DbPool;
use renova::finance::monthly_revenue;
use renova::normalize::format_money;
use renova::{
    clear_conversation_state, count_due_between, count_overdue, find_clients_by_owner,
    find_clients_by_phone, list_templates, today_local,
};
use teloxide::macros::BotCommands;
use teloxide::prelude::*;

use super::super::keyboards::{
    build_clients_list_keyboard, build_menu_keyboard, build_templates_keyboard,
};
use super::super::types::normalize_phone;
use super::super::utils::{send_message, send_message_with_keyboard};
use crate::bots::client_bot::flows::intake::start_intake;

#[derive(BotCommands, Clone)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Show help information")]
    Help,
    #[command(description = "Register a new client")]
    Add,
    #[command(description = "List all clients")]
    List,
    #[command(description = "Find a client by phone")]
    Find(String),
    #[command(description = "Monthly revenue report")]
    Report,
    #[command(description = "Manage message templates")]
    Templates,
    #[command(description = "Cancel current operation")]
    Cancel,
}

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    command: Command,
    pool: DbPool,
) -> ResponseResult<()> {
    let user = match msg.from() {
        Some(u) => u,
        None => return Ok(()),
    };

    let operator_id = user.id.0 as i64;
    let chat_id = msg.chat.id.0;

    match command {
        Command::Start => handle_start(&bot, chat_id).await?,
        Command::Help => handle_help(&bot, chat_id).await?,
        Command::Add => start_intake(&pool, &bot, chat_id, operator_id).await?,
        Command::List => handle_list(&pool, &bot, chat_id, operator_id).await?,
        Command::Find(query) => handle_find(&pool, &bot, chat_id, operator_id, &query).await?,
        Command::Report => handle_report(&pool, &bot, chat_id, operator_id).await?,
        Command::Templates => handle_templates(&pool, &bot, chat_id).await?,
        Command::Cancel => handle_cancel(&pool, &bot, chat_id, operator_id).await?,
    };

    Ok(())
}

async fn handle_start(bot: &Bot, chat_id: i64) -> ResponseResult<()> {
    let message = "👋 <b>Welcome!</b>\n\nI track your subscription clients and remind them over WhatsApp as their due date approaches.\n\nWhat would you like to do?";
    send_message_with_keyboard(bot, chat_id, message, build_menu_keyboard()).await
}

async fn handle_help(bot: &Bot, chat_id: i64) -> ResponseResult<()> {
    let message = "🆘 <b>COMMANDS</b>\n\n\
        /add — register a new client step by step\n\
        /list — all clients with due-date markers\n\
        /find — look a client up by phone digits\n\
        /report — this month's projected and recognized revenue\n\
        /templates — create and edit reminder templates\n\
        /cancel — abort the current operation\n\n\
        Reminders go out automatically every day for clients due in 1 day, \
        due today, or overdue by 1-2 days (templates reminder_1, reminder_0, \
        reminder_-1, reminder_-2).";
    send_message(bot, chat_id, message).await
}

pub async fn handle_list(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
) -> ResponseResult<()> {
    let today = today_local();

    let clients = match find_clients_by_owner(pool, operator_id) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load clients: {}", e);
            send_message(bot, chat_id, "❌ Database error while loading clients.").await?;
            return Ok(());
        }
    };

    if clients.is_empty() {
        send_message(
            bot,
            chat_id,
            "📭 No clients yet. Use /add to register the first one.",
        )
        .await?;
        return Ok(());
    }

    let due_soon = count_due_between(pool, operator_id, today, today + chrono::Duration::days(3))
        .unwrap_or(0);
    let overdue = count_overdue(pool, operator_id, today).unwrap_or(0);
    let revenue = monthly_revenue(&clients, today);

    let message = format!(
        "👥 <b>CLIENTS</b> ({})\n\n⚠️ Due within 3 days: {}\n🔴 Overdue: {}\n\n💰 Month projected: R$ {}\n✅ Month recognized: R$ {}",
        clients.len(),
        due_soon,
        overdue,
        format_money(&revenue.projected),
        format_money(&revenue.recognized),
    );

    let keyboard = build_clients_list_keyboard(&clients, today);
    send_message_with_keyboard(bot, chat_id, &message, keyboard).await
}

/// Minimum digits for a phone search; anything shorter matches too much.
const MIN_SEARCH_DIGITS: usize = 4;

fn phone_query(text: &str) -> Option<String> {
    let digits = normalize_phone(text);
    if digits.len() < MIN_SEARCH_DIGITS {
        None
    } else {
        Some(digits)
    }
}

pub async fn handle_find(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    query: &str,
) -> ResponseResult<()> {
    let digits = match phone_query(query) {
        Some(d) => d,
        None => {
            send_message(
                bot,
                chat_id,
                "🔍 Usage: <code>/find 11999999999</code> (at least 4 digits, partial numbers work).",
            )
            .await?;
            return Ok(());
        }
    };

    let clients = match find_clients_by_phone(pool, operator_id, &digits) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Phone search failed: {}", e);
            send_message(bot, chat_id, "❌ Database error while searching.").await?;
            return Ok(());
        }
    };

    if clients.is_empty() {
        send_message(
            bot,
            chat_id,
            &format!("🔍 No client with a phone matching <code>{}</code>.", digits),
        )
        .await?;
        return Ok(());
    }

    let keyboard = build_clients_list_keyboard(&clients, today_local());
    send_message_with_keyboard(
        bot,
        chat_id,
        &format!("🔍 <b>RESULTS</b> ({})", clients.len()),
        keyboard,
    )
    .await
}

pub async fn handle_report(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
) -> ResponseResult<()> {
    let today = today_local();

    let clients = match find_clients_by_owner(pool, operator_id) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load clients for report: {}", e);
            send_message(bot, chat_id, "❌ Database error while building the report.").await?;
            return Ok(());
        }
    };

    let revenue = monthly_revenue(&clients, today);
    let due_today = clients.iter().filter(|c| c.due_date == today).count();
    let paid = clients.iter().filter(|c| c.is_paid()).count();

    let message = format!(
        "📊 <b>MONTHLY REPORT</b>\n\n👥 Total clients: {}\n⏰ Due today: {}\n💵 Marked paid: {}\n\n💰 Projected revenue: R$ {}\n✅ Recognized revenue: R$ {}\n\n📅 {}",
        clients.len(),
        due_today,
        paid,
        format_money(&revenue.projected),
        format_money(&revenue.recognized),
        today.format("%d/%m/%Y"),
    );

    send_message(bot, chat_id, &message).await
}

pub async fn handle_templates(pool: &DbPool, bot: &Bot, chat_id: i64) -> ResponseResult<()> {
    let templates = match list_templates(pool) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("Failed to load templates: {}", e);
            send_message(bot, chat_id, "❌ Database error while loading templates.").await?;
            return Ok(());
        }
    };

    let message = format!(
        "📄 <b>TEMPLATES</b>\n\nAvailable: {}\n\nNames reminder_-2, reminder_-1, reminder_0 and reminder_1 are sent automatically by day-offset from the due date.",
        templates.len()
    );

    send_message_with_keyboard(bot, chat_id, &message, build_templates_keyboard(&templates)).await
}

async fn handle_cancel(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
) -> ResponseResult<()> {
    match clear_conversation_state(pool, operator_id) {
        Ok(true) => send_message(bot, chat_id, "✅ Operation cancelled. Nothing was saved.").await?,
        Ok(false) => send_message(bot, chat_id, "Nothing to cancel.").await?,
        Err(e) => {
            tracing::error!("Failed to clear conversation state: {}", e);
            send_message(bot, chat_id, "❌ Database error while cancelling.").await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_query_strips_formatting() {
        assert_eq!(
            phone_query("(11) 99999-9999").as_deref(),
            Some("11999999999")
        );
        assert_eq!(phone_query("9999").as_deref(), Some("9999"));
    }

    #[test]
    fn test_phone_query_rejects_short_or_empty() {
        assert_eq!(phone_query(""), None);
        assert_eq!(phone_query("abc"), None);
        assert_eq!(phone_query("123"), None);
    }
}
