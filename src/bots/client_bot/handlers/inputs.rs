//! Free-text routing. The persisted per-operator state decides which flow
//! step consumes the message; typed text in a preset step overrides the
//! preset buttons.

use renova::db::DbPool;
use renova::get_conversation_state;
use teloxide::prelude::*;

use super::super::flows::{edit, intake, templates};
use super::super::keyboards::build_menu_keyboard;
use super::super::types::states;
use super::super::utils::{load_draft, send_message, send_message_with_keyboard};
use crate::whatsapp::WhatsAppGateway;

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    pool: DbPool,
    gateway: WhatsAppGateway,
) -> ResponseResult<()> {
    let user = match msg.from() {
        Some(u) => u,
        None => return Ok(()),
    };
    let text = match msg.text() {
        Some(t) => t,
        None => return Ok(()),
    };

    let operator_id = user.id.0 as i64;
    let chat_id = msg.chat.id.0;

    let conversation = match get_conversation_state(&pool, operator_id) {
        Ok(Some(c)) => c,
        Ok(None) => {
            send_message_with_keyboard(
                &bot,
                chat_id,
                "I wasn't expecting a message. What would you like to do?",
                build_menu_keyboard(),
            )
            .await?;
            return Ok(());
        }
        Err(e) => {
            tracing::error!("Failed to load conversation state: {}", e);
            return Ok(());
        }
    };

    let data = conversation.state_data.as_ref();

    match conversation.state.as_str() {
        states::ADD_NAME => {
            intake::handle_name_input(&pool, &bot, chat_id, operator_id, load_draft(data), text)
                .await
        }
        states::ADD_PHONE => {
            intake::handle_phone_input(&pool, &bot, chat_id, operator_id, load_draft(data), text)
                .await
        }
        states::ADD_PACKAGE | states::ADD_PACKAGE_CUSTOM => {
            intake::apply_package(&pool, &bot, chat_id, operator_id, load_draft(data), text).await
        }
        states::ADD_VALUE | states::ADD_VALUE_CUSTOM => {
            intake::apply_value(&pool, &bot, chat_id, operator_id, load_draft(data), text).await
        }
        states::ADD_DUE | states::ADD_DUE_CUSTOM => {
            intake::apply_due_text(&pool, &bot, chat_id, operator_id, load_draft(data), text).await
        }
        states::ADD_SERVER | states::ADD_SERVER_CUSTOM => {
            intake::apply_server(&pool, &bot, chat_id, operator_id, load_draft(data), text).await
        }
        states::ADD_EXTRA => {
            intake::apply_extra(&pool, &bot, chat_id, operator_id, load_draft(data), Some(text))
                .await
        }
        states::ADD_CONFIRM => {
            send_message(
                &bot,
                chat_id,
                "Use the buttons above to save, fix a step, or cancel.",
            )
            .await
        }
        states::EDIT_FIELD => {
            edit::handle_edit_input(&pool, &bot, chat_id, operator_id, load_draft(data), text).await
        }
        states::RENEW_DATE => {
            edit::handle_renew_date_input(&pool, &bot, chat_id, operator_id, load_draft(data), text)
                .await
        }
        states::TEMPLATE_NAME => {
            templates::handle_template_name_input(
                &pool,
                &bot,
                chat_id,
                operator_id,
                load_draft(data),
                text,
            )
            .await
        }
        states::TEMPLATE_CONTENT => {
            templates::handle_template_content_input(
                &pool,
                &bot,
                chat_id,
                operator_id,
                load_draft(data),
                text,
            )
            .await
        }
        states::TEMPLATE_EDIT_CONTENT => {
            templates::handle_template_edit_input(
                &pool,
                &bot,
                chat_id,
                operator_id,
                load_draft(data),
                text,
            )
            .await
        }
        states::MESSAGE_ADHOC => {
            templates::handle_adhoc_input(
                &pool,
                &bot,
                &gateway,
                chat_id,
                operator_id,
                load_draft(data),
                text,
            )
            .await
        }
        unknown => {
            tracing::warn!("Unknown conversation state {} for operator {}", unknown, operator_id);
            if let Err(e) = renova::clear_conversation_state(&pool, operator_id) {
                tracing::error!("Failed to clear conversation state: {}", e);
            }
            send_message_with_keyboard(
                &bot,
                chat_id,
                "That operation expired. What would you like to do?",
                build_menu_keyboard(),
            )
            .await
        }
    }
}
