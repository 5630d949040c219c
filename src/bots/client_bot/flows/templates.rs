//! Template management conversation steps plus the ad-hoc message flow. All
//! template bodies live in the templates table; operator input never becomes
//! an implicit template.

use renova::db::DbPool;
use renova::templates::render;
use renova::{
    find_client_by_id, find_template_by_id, find_template_by_name, today_local, upsert_template,
};
use teloxide::prelude::*;

use crate::bots::client_bot::keyboards::build_cancel_keyboard;
use crate::bots::client_bot::types::{sanitize_input, states, MessageDraft, TemplateDraft};
use crate::bots::client_bot::utils::{
    escape, placeholder_help, send_message, send_message_with_keyboard, set_state,
};
use crate::services::notification_scheduler::dispatch_and_log;
use crate::whatsapp::WhatsAppGateway;

pub const ADHOC_TAG: &str = "adhoc";

pub async fn start_template_creation(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
) -> ResponseResult<()> {
    set_state(
        pool,
        operator_id,
        states::TEMPLATE_NAME,
        &TemplateDraft::default(),
    );

    send_message_with_keyboard(
        bot,
        chat_id,
        "📄 <b>NEW TEMPLATE</b>\n\nSend the template name (e.g. <code>reminder_0</code> or <code>promo_june</code>):",
        build_cancel_keyboard(),
    )
    .await
}

pub async fn handle_template_name_input(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    mut draft: TemplateDraft,
    text: &str,
) -> ResponseResult<()> {
    let name = sanitize_input(text).to_lowercase().replace(' ', "_");
    if name.is_empty() {
        send_message(bot, chat_id, "⚠️ Name cannot be empty. Try again:").await?;
        return Ok(());
    }

    match find_template_by_name(pool, &name) {
        Ok(Some(_)) => {
            send_message(
                bot,
                chat_id,
                &format!(
                    "⚠️ A template named <code>{}</code> already exists. Its content will be replaced. Send the new content, or /cancel.\n\n{}",
                    escape(&name),
                    placeholder_help()
                ),
            )
            .await?;
        }
        Ok(None) => {
            send_message_with_keyboard(
                bot,
                chat_id,
                &format!("✏️ Now send the template content.\n\n{}", placeholder_help()),
                build_cancel_keyboard(),
            )
            .await?;
        }
        Err(e) => {
            tracing::error!("Template lookup failed: {}", e);
            send_message(bot, chat_id, "❌ Database error.").await?;
            return Ok(());
        }
    }

    draft.name = Some(name);
    set_state(pool, operator_id, states::TEMPLATE_CONTENT, &draft);
    Ok(())
}

pub async fn handle_template_content_input(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    draft: TemplateDraft,
    text: &str,
) -> ResponseResult<()> {
    let name = match draft.name.as_deref() {
        Some(n) => n,
        None => {
            send_message(bot, chat_id, "⚠️ Template name lost, start again with /templates.")
                .await?;
            clear_state(pool, operator_id);
            return Ok(());
        }
    };

    save_template(pool, bot, chat_id, operator_id, name, text).await
}

pub async fn start_template_edit(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    template_id: i32,
) -> ResponseResult<()> {
    let template = match find_template_by_id(pool, template_id) {
        Ok(Some(t)) => t,
        Ok(None) => {
            send_message(bot, chat_id, "⚠️ Template not found.").await?;
            return Ok(());
        }
        Err(e) => {
            tracing::error!("Template lookup failed: {}", e);
            send_message(bot, chat_id, "❌ Database error.").await?;
            return Ok(());
        }
    };

    let draft = TemplateDraft {
        template_id: Some(template.id),
        name: Some(template.name.clone()),
    };
    set_state(pool, operator_id, states::TEMPLATE_EDIT_CONTENT, &draft);

    send_message_with_keyboard(
        bot,
        chat_id,
        &format!(
            "✏️ <b>EDIT {}</b>\n\nCurrent content:\n<code>{}</code>\n\nSend the new content.\n\n{}",
            escape(&template.name),
            escape(&template.content),
            placeholder_help()
        ),
        build_cancel_keyboard(),
    )
    .await
}

pub async fn handle_template_edit_input(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    draft: TemplateDraft,
    text: &str,
) -> ResponseResult<()> {
    let name = match draft.name.as_deref() {
        Some(n) => n,
        None => {
            send_message(bot, chat_id, "⚠️ Template name lost, start again with /templates.")
                .await?;
            clear_state(pool, operator_id);
            return Ok(());
        }
    };

    save_template(pool, bot, chat_id, operator_id, name, text).await
}

async fn save_template(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    name: &str,
    text: &str,
) -> ResponseResult<()> {
    let content = text.trim();
    if content.is_empty() {
        send_message(bot, chat_id, "⚠️ Content cannot be empty. Try again:").await?;
        return Ok(());
    }

    match upsert_template(pool, name, content) {
        Ok(template) => {
            clear_state(pool, operator_id);
            send_message(
                bot,
                chat_id,
                &format!("✅ Template <code>{}</code> saved.", escape(&template.name)),
            )
            .await?;
        }
        Err(e) => {
            tracing::error!("Failed to save template {}: {}", name, e);
            send_message(bot, chat_id, "❌ Database error while saving the template.").await?;
        }
    }

    Ok(())
}

pub async fn start_adhoc_message(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    client_id: i32,
) -> ResponseResult<()> {
    set_state(
        pool,
        operator_id,
        states::MESSAGE_ADHOC,
        &MessageDraft { client_id },
    );

    send_message_with_keyboard(
        bot,
        chat_id,
        &format!(
            "📨 Send the message text. Placeholders are substituted before sending.\n\n{}",
            placeholder_help()
        ),
        build_cancel_keyboard(),
    )
    .await
}

pub async fn handle_adhoc_input(
    pool: &DbPool,
    bot: &Bot,
    gateway: &WhatsAppGateway,
    chat_id: i64,
    operator_id: i64,
    draft: MessageDraft,
    text: &str,
) -> ResponseResult<()> {
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

    let message = render(text, &client, today_local());
    let status = dispatch_and_log(pool, gateway, &client, ADHOC_TAG, &message).await;

    let feedback = if status.is_sent() {
        format!("✅ Message sent to <b>{}</b>.", escape(&client.name))
    } else {
        format!(
            "⚠️ Dispatch to <b>{}</b> ended with status <code>{}</code>. Check the delivery log.",
            escape(&client.name),
            status.as_str()
        )
    };

    send_message(bot, chat_id, &feedback).await
}

fn clear_state(pool: &DbPool, operator_id: i64) {
    if let Err(e) = renova::clear_conversation_state(pool, operator_id) {
        tracing::error!("Failed to clear conversation state: {}", e);
    }
}
