//! Step-by-step client registration. Each step persists the draft and the
//! next expected state, so the flow survives restarts and never leaks between
//! operators.

use bigdecimal::BigDecimal;
use renova::db::DbPool;
use renova::models::{NewClient, PAYMENT_PENDING};
use renova::normalize::{format_date, parse_date, parse_money};
use renova::renewal::cycle_days;
use renova::{create_client, today_local};
use teloxide::prelude::*;

use super::super::keyboards::{
    build_cancel_keyboard, build_client_actions_keyboard, build_confirm_keyboard,
    build_due_keyboard, build_extra_keyboard, build_package_keyboard, build_server_keyboard,
    build_value_keyboard,
};
use super::super::types::{
    normalize_phone, sanitize_input, states, ClientDraft, MIN_NAME_LEN, MIN_PHONE_DIGITS,
};
use super::super::utils::{
    format_draft_summary, send_message, send_message_with_keyboard, set_state,
};

pub async fn start_intake(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
) -> ResponseResult<()> {
    set_state(pool, operator_id, states::ADD_NAME, &ClientDraft::default());
    prompt_name(bot, chat_id).await
}

async fn prompt_name(bot: &Bot, chat_id: i64) -> ResponseResult<()> {
    send_message_with_keyboard(
        bot,
        chat_id,
        "➕ <b>NEW CLIENT</b> (step 1/7)\n\n📝 Send the client's name:",
        build_cancel_keyboard(),
    )
    .await
}

async fn prompt_phone(bot: &Bot, chat_id: i64) -> ResponseResult<()> {
    send_message_with_keyboard(
        bot,
        chat_id,
        "📱 <b>Step 2/7</b>\n\nSend the WhatsApp number with area code (digits only, e.g. 11999999999):",
        build_cancel_keyboard(),
    )
    .await
}

async fn prompt_package(bot: &Bot, chat_id: i64) -> ResponseResult<()> {
    send_message_with_keyboard(
        bot,
        chat_id,
        "📦 <b>Step 3/7</b>\n\nPick a package or type your own:",
        build_package_keyboard(),
    )
    .await
}

async fn prompt_value(bot: &Bot, chat_id: i64) -> ResponseResult<()> {
    send_message_with_keyboard(
        bot,
        chat_id,
        "💰 <b>Step 4/7</b>\n\nPick a value or type one (e.g. 45,00):",
        build_value_keyboard(),
    )
    .await
}

async fn prompt_due(bot: &Bot, chat_id: i64, draft: &ClientDraft) -> ResponseResult<()> {
    let auto_display = draft
        .auto_due_date
        .as_deref()
        .and_then(parse_date)
        .map(format_date)
        .unwrap_or_else(|| format_date(today_local() + chrono::Duration::days(30)));

    send_message_with_keyboard(
        bot,
        chat_id,
        "📅 <b>Step 5/7</b>\n\nAccept the suggested due date or type one (DD/MM/YYYY):",
        build_due_keyboard(&auto_display),
    )
    .await
}

async fn prompt_server(bot: &Bot, chat_id: i64) -> ResponseResult<()> {
    send_message_with_keyboard(
        bot,
        chat_id,
        "🖥️ <b>Step 6/7</b>\n\nPick the server or type its name:",
        build_server_keyboard(),
    )
    .await
}

async fn prompt_extra(bot: &Bot, chat_id: i64) -> ResponseResult<()> {
    send_message_with_keyboard(
        bot,
        chat_id,
        "🗒️ <b>Step 7/7</b>\n\nSend extra notes for this client, or skip:",
        build_extra_keyboard(),
    )
    .await
}

async fn prompt_confirm(bot: &Bot, chat_id: i64, draft: &ClientDraft) -> ResponseResult<()> {
    send_message_with_keyboard(
        bot,
        chat_id,
        &format_draft_summary(draft),
        build_confirm_keyboard(),
    )
    .await
}

pub async fn handle_name_input(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    mut draft: ClientDraft,
    text: &str,
) -> ResponseResult<()> {
    let name = sanitize_input(text);
    if name.chars().count() < MIN_NAME_LEN {
        send_message(bot, chat_id, "⚠️ Name too short. Send at least 2 characters:").await?;
        return Ok(());
    }

    draft.name = Some(name);
    set_state(pool, operator_id, states::ADD_PHONE, &draft);
    prompt_phone(bot, chat_id).await
}

pub async fn handle_phone_input(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    mut draft: ClientDraft,
    text: &str,
) -> ResponseResult<()> {
    let phone = normalize_phone(text);
    if phone.len() < MIN_PHONE_DIGITS {
        send_message(
            bot,
            chat_id,
            "⚠️ That doesn't look like a full number. Send at least 10 digits:",
        )
        .await?;
        return Ok(());
    }

    draft.phone = Some(phone);
    set_state(pool, operator_id, states::ADD_PACKAGE, &draft);
    prompt_package(bot, chat_id).await
}

/// Preset callback keys map to display package names; free text goes in as-is.
pub fn preset_package_name(key: &str) -> Option<&'static str> {
    match key {
        "monthly" => Some("Monthly"),
        "quarterly" => Some("Quarterly"),
        "semiannual" => Some("Semiannual"),
        "annual" => Some("Annual"),
        _ => None,
    }
}

pub async fn apply_package(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    mut draft: ClientDraft,
    package: &str,
) -> ResponseResult<()> {
    let package = sanitize_input(package);
    if package.is_empty() {
        send_message(bot, chat_id, "⚠️ Package cannot be empty. Try again:").await?;
        return Ok(());
    }

    let auto_due = today_local() + chrono::Duration::days(cycle_days(&package));
    draft.auto_due_date = Some(auto_due.format("%Y-%m-%d").to_string());
    draft.package = Some(package);

    set_state(pool, operator_id, states::ADD_VALUE, &draft);
    prompt_value(bot, chat_id).await
}

pub async fn apply_value(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    mut draft: ClientDraft,
    text: &str,
) -> ResponseResult<()> {
    let price = parse_money(text);
    if price <= BigDecimal::from(0) {
        send_message(
            bot,
            chat_id,
            "⚠️ Invalid value. Send a positive amount (e.g. 45,00):",
        )
        .await?;
        return Ok(());
    }

    draft.price = Some(
        price
            .with_scale_round(2, bigdecimal::RoundingMode::HalfUp)
            .to_string(),
    );
    set_state(pool, operator_id, states::ADD_DUE, &draft);
    prompt_due(bot, chat_id, &draft).await
}

pub async fn apply_due_auto(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    mut draft: ClientDraft,
) -> ResponseResult<()> {
    draft.due_date = draft.auto_due_date.clone();
    if draft.due_date.is_none() {
        send_message(bot, chat_id, "⚠️ No suggested date available. Type one (DD/MM/YYYY):").await?;
        return Ok(());
    }

    set_state(pool, operator_id, states::ADD_SERVER, &draft);
    prompt_server(bot, chat_id).await
}

pub async fn apply_due_text(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    mut draft: ClientDraft,
    text: &str,
) -> ResponseResult<()> {
    let date = match parse_date(text.trim()) {
        Some(d) => d,
        None => {
            send_message(
                bot,
                chat_id,
                "⚠️ Invalid date. Use DD/MM/YYYY (e.g. 15/07/2025):",
            )
            .await?;
            return Ok(());
        }
    };

    if date < today_local() {
        send_message(bot, chat_id, "⚠️ Due date cannot be in the past. Try again:").await?;
        return Ok(());
    }

    draft.due_date = Some(date.format("%Y-%m-%d").to_string());
    set_state(pool, operator_id, states::ADD_SERVER, &draft);
    prompt_server(bot, chat_id).await
}

pub async fn apply_server(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    mut draft: ClientDraft,
    text: &str,
) -> ResponseResult<()> {
    let server = sanitize_input(text);
    if server.is_empty() {
        send_message(bot, chat_id, "⚠️ Server cannot be empty. Try again:").await?;
        return Ok(());
    }

    draft.server = Some(server);
    set_state(pool, operator_id, states::ADD_EXTRA, &draft);
    prompt_extra(bot, chat_id).await
}

pub async fn apply_extra(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    mut draft: ClientDraft,
    text: Option<&str>,
) -> ResponseResult<()> {
    draft.extra_notes = text.map(sanitize_input).filter(|t| !t.is_empty());
    set_state(pool, operator_id, states::ADD_CONFIRM, &draft);
    prompt_confirm(bot, chat_id, &draft).await
}

/// Confirm-screen edit buttons jump back to one step; the flow then runs
/// forward again from there.
pub async fn jump_to_step(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    draft: ClientDraft,
    field: &str,
) -> ResponseResult<()> {
    let new_state = match field {
        "name" => states::ADD_NAME,
        "phone" => states::ADD_PHONE,
        "package" => states::ADD_PACKAGE,
        "value" => states::ADD_VALUE,
        "due" => states::ADD_DUE,
        "server" => states::ADD_SERVER,
        _ => {
            send_message(bot, chat_id, "⚠️ Unknown step.").await?;
            return Ok(());
        }
    };

    set_state(pool, operator_id, new_state, &draft);

    match new_state {
        states::ADD_NAME => prompt_name(bot, chat_id).await,
        states::ADD_PHONE => prompt_phone(bot, chat_id).await,
        states::ADD_PACKAGE => prompt_package(bot, chat_id).await,
        states::ADD_VALUE => prompt_value(bot, chat_id).await,
        states::ADD_DUE => prompt_due(bot, chat_id, &draft).await,
        _ => prompt_server(bot, chat_id).await,
    }
}

/// Validated view of a finished draft; the only path into `create_client`.
struct CompleteDraft<'a> {
    name: &'a str,
    phone: &'a str,
    package: &'a str,
    price: BigDecimal,
    due_date: chrono::NaiveDate,
    server: &'a str,
}

/// None until every required field is present and parses; a cancelled or
/// half-filled draft can never produce a record.
fn complete_draft(draft: &ClientDraft) -> Option<CompleteDraft<'_>> {
    let name = draft.name.as_deref().filter(|s| !s.is_empty())?;
    let phone = draft.phone.as_deref().filter(|s| !s.is_empty())?;
    let package = draft.package.as_deref().filter(|s| !s.is_empty())?;
    let server = draft.server.as_deref().filter(|s| !s.is_empty())?;
    let due_date = parse_date(draft.due_date.as_deref()?)?;

    let price = parse_money(draft.price.as_deref()?);
    if price <= BigDecimal::from(0) {
        return None;
    }

    Some(CompleteDraft {
        name,
        phone,
        package,
        price,
        due_date,
        server,
    })
}

/// All-or-nothing save: nothing hits the clients table until every required
/// draft field validates.
pub async fn confirm_save(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    draft: ClientDraft,
) -> ResponseResult<()> {
    let record = match complete_draft(&draft) {
        Some(r) => r,
        None => {
            send_message(
                bot,
                chat_id,
                "⚠️ The draft is incomplete. Use the buttons to fill the missing step.",
            )
            .await?;
            return Ok(());
        }
    };

    let new_client = NewClient {
        owner_id: operator_id,
        name: record.name,
        phone: record.phone,
        package: record.package,
        price: record.price,
        due_date: record.due_date,
        server: record.server,
        extra_notes: draft.extra_notes.as_deref(),
        payment_status: PAYMENT_PENDING,
        payment_date: None,
    };

    let client = match create_client(pool, new_client) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to create client: {}", e);
            send_message(bot, chat_id, "❌ Database error while saving. Nothing was stored.")
                .await?;
            return Ok(());
        }
    };

    if let Err(e) = renova::clear_conversation_state(pool, operator_id) {
        tracing::error!("Failed to clear conversation state: {}", e);
    }

    tracing::info!("Client {} registered by operator {}", client.id, operator_id);

    send_message_with_keyboard(
        bot,
        chat_id,
        &format!(
            "✅ <b>Client saved!</b>\n\n{}",
            super::super::utils::format_client_details(&client)
        ),
        build_client_actions_keyboard(&client),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bots::client_bot::keyboards::PACKAGE_PRESETS;
    use std::str::FromStr;

    #[test]
    fn test_preset_package_names_cover_keyboard() {
        for (key, _) in PACKAGE_PRESETS {
            assert!(preset_package_name(key).is_some());
        }
        assert_eq!(preset_package_name("custom"), None);
    }

    fn full_draft() -> ClientDraft {
        ClientDraft {
            name: Some("João Silva".to_string()),
            phone: Some("11999999999".to_string()),
            package: Some("Monthly".to_string()),
            price: Some("45.00".to_string()),
            due_date: Some("2025-07-15".to_string()),
            auto_due_date: None,
            server: Some("Servidor 1".to_string()),
            extra_notes: None,
        }
    }

    #[test]
    fn test_empty_or_partial_draft_yields_no_record() {
        // A cancelled conversation leaves at most a partial draft behind;
        // none of these shapes may reach the clients table.
        assert!(complete_draft(&ClientDraft::default()).is_none());

        let mut partial = full_draft();
        partial.server = None;
        assert!(complete_draft(&partial).is_none());

        let mut no_due = full_draft();
        no_due.due_date = None;
        assert!(complete_draft(&no_due).is_none());
    }

    #[test]
    fn test_draft_with_invalid_values_yields_no_record() {
        let mut bad_price = full_draft();
        bad_price.price = Some("abc".to_string());
        assert!(complete_draft(&bad_price).is_none());

        let mut bad_date = full_draft();
        bad_date.due_date = Some("soon".to_string());
        assert!(complete_draft(&bad_date).is_none());
    }

    #[test]
    fn test_full_draft_yields_record() {
        let draft = full_draft();
        let record = complete_draft(&draft).unwrap();

        assert_eq!(record.name, "João Silva");
        assert_eq!(record.phone, "11999999999");
        assert_eq!(record.price, BigDecimal::from_str("45.00").unwrap());
        assert_eq!(
            record.due_date,
            chrono::NaiveDate::from_ymd_opt(2025, 7, 15).unwrap()
        );
    }
}
