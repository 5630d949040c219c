//! Single-field client edits and renewals. Edits validate exactly like the
//! intake step for the same field; renewals go through the renewal module so
//! overdue clients restart their cycle from today.

use bigdecimal::BigDecimal;
use renova::db::DbPool;
use renova::normalize::{format_date, parse_date, parse_money};
use renova::renewal::{next_due_date, renew_by_days, RenewalMode};
use renova::{find_client_by_id, today_local, update_client, update_client_due_date};
use renova::models::UpdateClient;
use teloxide::prelude::*;

use super::super::keyboards::{build_cancel_keyboard, build_client_actions_keyboard};
use super::super::types::{
    normalize_phone, sanitize_input, states, EditDraft, RenewDraft, MIN_NAME_LEN,
    MIN_PHONE_DIGITS,
};
use super::super::utils::{
    format_client_details, send_message, send_message_with_keyboard, set_state,
};

pub async fn start_edit_field(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    client_id: i32,
    field: &str,
) -> ResponseResult<()> {
    let prompt = match field {
        "name" => "📝 Send the new name:",
        "phone" => "📱 Send the new WhatsApp number (digits only):",
        "package" => "📦 Send the new package name:",
        "price" => "💰 Send the new value (e.g. 45,00):",
        "due_date" => "📅 Send the new due date (DD/MM/YYYY):",
        "server" => "🖥️ Send the new server name:",
        "extra_notes" => "🗒️ Send the new notes (or a dash to clear them):",
        _ => {
            send_message(bot, chat_id, "⚠️ Unknown field.").await?;
            return Ok(());
        }
    };

    let draft = EditDraft {
        client_id,
        field: Some(field.to_string()),
    };
    set_state(pool, operator_id, states::EDIT_FIELD, &draft);

    send_message_with_keyboard(bot, chat_id, prompt, build_cancel_keyboard()).await
}

pub async fn handle_edit_input(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    draft: EditDraft,
    text: &str,
) -> ResponseResult<()> {
    let field = draft.field.as_deref().unwrap_or("");

    let mut updates = UpdateClient::default();

    match field {
        "name" => {
            let name = sanitize_input(text);
            if name.chars().count() < MIN_NAME_LEN {
                send_message(bot, chat_id, "⚠️ Name too short. Send at least 2 characters:")
                    .await?;
                return Ok(());
            }
            updates.name = Some(name);
        }
        "phone" => {
            let phone = normalize_phone(text);
            if phone.len() < MIN_PHONE_DIGITS {
                send_message(bot, chat_id, "⚠️ Send at least 10 digits:").await?;
                return Ok(());
            }
            updates.phone = Some(phone);
        }
        "package" => {
            let package = sanitize_input(text);
            if package.is_empty() {
                send_message(bot, chat_id, "⚠️ Package cannot be empty:").await?;
                return Ok(());
            }
            updates.package = Some(package);
        }
        "price" => {
            let price = parse_money(text);
            if price <= BigDecimal::from(0) {
                send_message(bot, chat_id, "⚠️ Invalid value. Send a positive amount:").await?;
                return Ok(());
            }
            updates.price = Some(price);
        }
        "due_date" => match parse_date(text.trim()) {
            Some(date) => updates.due_date = Some(date),
            None => {
                send_message(bot, chat_id, "⚠️ Invalid date. Use DD/MM/YYYY:").await?;
                return Ok(());
            }
        },
        "server" => {
            let server = sanitize_input(text);
            if server.is_empty() {
                send_message(bot, chat_id, "⚠️ Server cannot be empty:").await?;
                return Ok(());
            }
            updates.server = Some(server);
        }
        "extra_notes" => {
            let notes = sanitize_input(text);
            updates.extra_notes = if notes == "-" || notes.is_empty() {
                Some(None)
            } else {
                Some(Some(notes))
            };
        }
        _ => {
            send_message(bot, chat_id, "⚠️ Unknown field, edit cancelled.").await?;
            clear_state(pool, operator_id);
            return Ok(());
        }
    }

    let client = match update_client(pool, draft.client_id, operator_id, updates) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to update client {}: {}", draft.client_id, e);
            send_message(bot, chat_id, "❌ Database error while updating.").await?;
            return Ok(());
        }
    };

    clear_state(pool, operator_id);

    send_message_with_keyboard(
        bot,
        chat_id,
        &format!("✅ <b>Updated!</b>\n\n{}", format_client_details(&client)),
        build_client_actions_keyboard(&client),
    )
    .await
}

/// Renewal by cycle or fixed day count. Base date is the later of the current
/// due date and today, so overdue clients get a full new period.
pub async fn apply_renewal_days(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    client_id: i32,
    days: i64,
) -> ResponseResult<()> {
    let client = match find_client_by_id(pool, client_id, operator_id) {
        Ok(Some(c)) => c,
        Ok(None) => {
            send_message(bot, chat_id, "⚠️ Client not found.").await?;
            return Ok(());
        }
        Err(e) => {
            tracing::error!("Failed to load client {}: {}", client_id, e);
            send_message(bot, chat_id, "❌ Database error.").await?;
            return Ok(());
        }
    };

    let today = today_local();
    let new_due = renew_by_days(client.due_date, days, today);

    finish_renewal(pool, bot, chat_id, operator_id, &client, new_due).await
}

pub async fn apply_renewal_cycle(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    client_id: i32,
) -> ResponseResult<()> {
    let client = match find_client_by_id(pool, client_id, operator_id) {
        Ok(Some(c)) => c,
        Ok(None) => {
            send_message(bot, chat_id, "⚠️ Client not found.").await?;
            return Ok(());
        }
        Err(e) => {
            tracing::error!("Failed to load client {}: {}", client_id, e);
            send_message(bot, chat_id, "❌ Database error.").await?;
            return Ok(());
        }
    };

    let today = today_local();
    let new_due = next_due_date(client.due_date, &client.package, RenewalMode::SameCycle, today);

    finish_renewal(pool, bot, chat_id, operator_id, &client, new_due).await
}

pub async fn start_renew_date(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    client_id: i32,
) -> ResponseResult<()> {
    set_state(pool, operator_id, states::RENEW_DATE, &RenewDraft { client_id });

    send_message_with_keyboard(
        bot,
        chat_id,
        "📅 Send the new due date (DD/MM/YYYY). It will be used exactly as given:",
        build_cancel_keyboard(),
    )
    .await
}

pub async fn handle_renew_date_input(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    draft: RenewDraft,
    text: &str,
) -> ResponseResult<()> {
    let date = match parse_date(text.trim()) {
        Some(d) => d,
        None => {
            send_message(bot, chat_id, "⚠️ Invalid date. Use DD/MM/YYYY:").await?;
            return Ok(());
        }
    };

    let client = match find_client_by_id(pool, draft.client_id, operator_id) {
        Ok(Some(c)) => c,
        Ok(None) => {
            send_message(bot, chat_id, "⚠️ Client not found.").await?;
            clear_state(pool, operator_id);
            return Ok(());
        }
        Err(e) => {
            tracing::error!("Failed to load client {}: {}", draft.client_id, e);
            send_message(bot, chat_id, "❌ Database error.").await?;
            return Ok(());
        }
    };

    clear_state(pool, operator_id);

    // Explicit dates are taken verbatim, no max(due, today) base.
    let new_due = next_due_date(
        client.due_date,
        &client.package,
        RenewalMode::ExplicitDate(date),
        today_local(),
    );
    finish_renewal(pool, bot, chat_id, operator_id, &client, new_due).await
}

async fn finish_renewal(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    client: &renova::models::Client,
    new_due: chrono::NaiveDate,
) -> ResponseResult<()> {
    let updated = match update_client_due_date(pool, client.id, operator_id, new_due) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to renew client {}: {}", client.id, e);
            send_message(bot, chat_id, "❌ Database error while renewing.").await?;
            return Ok(());
        }
    };

    tracing::info!(
        "Client {} renewed: {} -> {}",
        client.id,
        client.due_date,
        new_due
    );

    send_message_with_keyboard(
        bot,
        chat_id,
        &format!(
            "🔄 <b>Renewed!</b> New due date: <b>{}</b>\n\n{}",
            format_date(new_due),
            format_client_details(&updated)
        ),
        build_client_actions_keyboard(&updated),
    )
    .await
}

fn clear_state(pool: &DbPool, operator_id: i64) {
    if let Err(e) = renova::clear_conversation_state(pool, operator_id) {
        tracing::error!("Failed to clear conversation state: {}", e);
    }
}
