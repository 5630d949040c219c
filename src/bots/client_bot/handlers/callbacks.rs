//! Inline keyboard dispatch. Callback data is a colon-separated path; the
//! first segment picks the flow, the rest are arguments.

use renova::db::DbPool;
use renova::templates::render;
use renova::{
    delete_client, delete_template, find_client_by_id, find_delivery_log_by_client,
    find_template_by_id, get_conversation_state, list_templates, mark_client_paid,
    mark_client_pending, today_local,
};
use teloxide::prelude::*;

use super::super::flows::{edit, intake, templates};
use super::super::keyboards::{
    build_cancel_keyboard, build_client_actions_keyboard, build_delete_confirm_keyboard,
    build_edit_fields_keyboard, build_renew_keyboard, build_send_keyboard,
    build_template_delete_confirm_keyboard, build_templates_keyboard,
};
use super::super::types::{states, ClientDraft};
use super::super::utils::{
    escape, format_client_details, format_delivery_history, load_draft, send_message,
    send_message_with_keyboard, set_state,
};
use super::commands::{handle_list, handle_report, handle_templates};
use crate::services::notification_scheduler::dispatch_and_log;
use crate::whatsapp::WhatsAppGateway;

pub async fn callback_handler(
    bot: Bot,
    query: CallbackQuery,
    pool: DbPool,
    gateway: WhatsAppGateway,
) -> ResponseResult<()> {
    bot.answer_callback_query(query.id.clone()).await?;

    let data = match query.data.as_deref() {
        Some(d) => d,
        None => return Ok(()),
    };
    let chat_id = match query.message.as_ref() {
        Some(m) => m.chat.id.0,
        None => return Ok(()),
    };
    let operator_id = query.from.id.0 as i64;

    let parts: Vec<&str> = data.split(':').collect();

    match parts.as_slice() {
        ["flow", "cancel"] => {
            if let Err(e) = renova::clear_conversation_state(&pool, operator_id) {
                tracing::error!("Failed to clear conversation state: {}", e);
            }
            send_message(&bot, chat_id, "✅ Operation cancelled. Nothing was saved.").await
        }

        ["menu", "add"] => intake::start_intake(&pool, &bot, chat_id, operator_id).await,
        ["menu", "list"] => handle_list(&pool, &bot, chat_id, operator_id).await,
        ["menu", "report"] => handle_report(&pool, &bot, chat_id, operator_id).await,
        ["menu", "templates"] => handle_templates(&pool, &bot, chat_id).await,

        ["add", "package", "custom"] => {
            request_custom_step(
                &pool,
                &bot,
                chat_id,
                operator_id,
                states::ADD_PACKAGE_CUSTOM,
                "📦 Type the package name:",
            )
            .await
        }
        ["add", "package", key] => {
            let draft = load_intake_draft(&pool, operator_id);
            match intake::preset_package_name(key) {
                Some(package) => {
                    intake::apply_package(&pool, &bot, chat_id, operator_id, draft, package).await
                }
                None => Ok(()),
            }
        }
        ["add", "value", "custom"] => {
            request_custom_step(
                &pool,
                &bot,
                chat_id,
                operator_id,
                states::ADD_VALUE_CUSTOM,
                "💰 Type the value (e.g. 45,00):",
            )
            .await
        }
        ["add", "value", value] => {
            let draft = load_intake_draft(&pool, operator_id);
            intake::apply_value(&pool, &bot, chat_id, operator_id, draft, value).await
        }
        ["add", "due", "auto"] => {
            let draft = load_intake_draft(&pool, operator_id);
            intake::apply_due_auto(&pool, &bot, chat_id, operator_id, draft).await
        }
        ["add", "due", "custom"] => {
            request_custom_step(
                &pool,
                &bot,
                chat_id,
                operator_id,
                states::ADD_DUE_CUSTOM,
                "📅 Type the due date (DD/MM/YYYY):",
            )
            .await
        }
        ["add", "server", "custom"] => {
            request_custom_step(
                &pool,
                &bot,
                chat_id,
                operator_id,
                states::ADD_SERVER_CUSTOM,
                "🖥️ Type the server name:",
            )
            .await
        }
        ["add", "server", server] => {
            let draft = load_intake_draft(&pool, operator_id);
            intake::apply_server(&pool, &bot, chat_id, operator_id, draft, server).await
        }
        ["add", "extra", "skip"] => {
            let draft = load_intake_draft(&pool, operator_id);
            intake::apply_extra(&pool, &bot, chat_id, operator_id, draft, None).await
        }
        ["add", "confirm"] => {
            let draft = load_intake_draft(&pool, operator_id);
            intake::confirm_save(&pool, &bot, chat_id, operator_id, draft).await
        }
        ["add", "editstep", field] => {
            let draft = load_intake_draft(&pool, operator_id);
            intake::jump_to_step(&pool, &bot, chat_id, operator_id, draft, field).await
        }

        ["client", "view", id] => match parse_id(id) {
            Some(client_id) => view_client(&pool, &bot, chat_id, operator_id, client_id).await,
            None => Ok(()),
        },
        ["client", "edit", id] => match parse_id(id) {
            Some(client_id) => {
                send_message_with_keyboard(
                    &bot,
                    chat_id,
                    "✏️ Which field do you want to change?",
                    build_edit_fields_keyboard(client_id),
                )
                .await
            }
            None => Ok(()),
        },
        ["client", "renew", id] => match parse_id(id) {
            Some(client_id) => {
                send_message_with_keyboard(
                    &bot,
                    chat_id,
                    "🔄 How should the due date advance?",
                    build_renew_keyboard(client_id),
                )
                .await
            }
            None => Ok(()),
        },
        ["client", "paid", id] => match parse_id(id) {
            Some(client_id) => {
                match mark_client_paid(&pool, client_id, operator_id, today_local()) {
                    Ok(client) => {
                        send_message_with_keyboard(
                            &bot,
                            chat_id,
                            &format!(
                                "💵 <b>Marked as paid.</b>\n\n{}",
                                format_client_details(&client)
                            ),
                            build_client_actions_keyboard(&client),
                        )
                        .await
                    }
                    Err(e) => {
                        tracing::error!("Failed to mark client {} paid: {}", client_id, e);
                        send_message(&bot, chat_id, "❌ Database error.").await
                    }
                }
            }
            None => Ok(()),
        },
        ["client", "pending", id] => match parse_id(id) {
            Some(client_id) => match mark_client_pending(&pool, client_id, operator_id) {
                Ok(client) => {
                    send_message_with_keyboard(
                        &bot,
                        chat_id,
                        &format!(
                            "↩️ <b>Back to pending.</b>\n\n{}",
                            format_client_details(&client)
                        ),
                        build_client_actions_keyboard(&client),
                    )
                    .await
                }
                Err(e) => {
                    tracing::error!("Failed to mark client {} pending: {}", client_id, e);
                    send_message(&bot, chat_id, "❌ Database error.").await
                }
            },
            None => Ok(()),
        },
        ["client", "send", id] => match parse_id(id) {
            Some(client_id) => {
                let templates = match list_templates(&pool) {
                    Ok(t) => t,
                    Err(e) => {
                        tracing::error!("Failed to load templates: {}", e);
                        send_message(&bot, chat_id, "❌ Database error.").await?;
                        return Ok(());
                    }
                };
                send_message_with_keyboard(
                    &bot,
                    chat_id,
                    "📨 Pick a template or write an ad-hoc message:",
                    build_send_keyboard(&templates, client_id),
                )
                .await
            }
            None => Ok(()),
        },
        ["client", "adhoc", id] => match parse_id(id) {
            Some(client_id) => {
                templates::start_adhoc_message(&pool, &bot, chat_id, operator_id, client_id).await
            }
            None => Ok(()),
        },
        ["client", "history", id] => match parse_id(id) {
            Some(client_id) => {
                view_delivery_history(&pool, &bot, chat_id, operator_id, client_id).await
            }
            None => Ok(()),
        },
        ["client", "delete", id] => match parse_id(id) {
            Some(client_id) => {
                send_message_with_keyboard(
                    &bot,
                    chat_id,
                    "🗑️ Delete this client and their delivery history? This cannot be undone.",
                    build_delete_confirm_keyboard(client_id),
                )
                .await
            }
            None => Ok(()),
        },
        ["client", "delete_yes", id] => match parse_id(id) {
            Some(client_id) => match delete_client(&pool, client_id, operator_id) {
                Ok(true) => send_message(&bot, chat_id, "🗑️ Client deleted.").await,
                Ok(false) => send_message(&bot, chat_id, "⚠️ Client not found.").await,
                Err(e) => {
                    tracing::error!("Failed to delete client {}: {}", client_id, e);
                    send_message(&bot, chat_id, "❌ Database error.").await
                }
            },
            None => Ok(()),
        },

        ["editf", field, id] => match parse_id(id) {
            Some(client_id) => {
                edit::start_edit_field(&pool, &bot, chat_id, operator_id, client_id, field).await
            }
            None => Ok(()),
        },

        ["renew", "cycle", id] => match parse_id(id) {
            Some(client_id) => {
                edit::apply_renewal_cycle(&pool, &bot, chat_id, operator_id, client_id).await
            }
            None => Ok(()),
        },
        ["renew", "days", days, id] => match (days.parse::<i64>().ok(), parse_id(id)) {
            (Some(days), Some(client_id)) => {
                edit::apply_renewal_days(&pool, &bot, chat_id, operator_id, client_id, days).await
            }
            _ => Ok(()),
        },
        ["renew", "date", id] => match parse_id(id) {
            Some(client_id) => {
                edit::start_renew_date(&pool, &bot, chat_id, operator_id, client_id).await
            }
            None => Ok(()),
        },

        ["sendtpl", template_id, client_id] => {
            match (parse_id(template_id), parse_id(client_id)) {
                (Some(template_id), Some(client_id)) => {
                    send_template(
                        &pool,
                        &bot,
                        &gateway,
                        chat_id,
                        operator_id,
                        template_id,
                        client_id,
                    )
                    .await
                }
                _ => Ok(()),
            }
        }

        ["tpl", "new"] => {
            templates::start_template_creation(&pool, &bot, chat_id, operator_id).await
        }
        ["tpl", "view", id] => match parse_id(id) {
            Some(template_id) => view_template(&pool, &bot, chat_id, template_id).await,
            None => Ok(()),
        },
        ["tpl", "edit", id] => match parse_id(id) {
            Some(template_id) => {
                templates::start_template_edit(&pool, &bot, chat_id, operator_id, template_id).await
            }
            None => Ok(()),
        },
        ["tpl", "delete", id] => match parse_id(id) {
            Some(template_id) => {
                send_message_with_keyboard(
                    &bot,
                    chat_id,
                    "🗑️ Delete this template? Scheduled reminders using its name will stop firing.",
                    build_template_delete_confirm_keyboard(template_id),
                )
                .await
            }
            None => Ok(()),
        },
        ["tpl", "delete_yes", id] => match parse_id(id) {
            Some(template_id) => match delete_template(&pool, template_id) {
                Ok(true) => send_message(&bot, chat_id, "🗑️ Template deleted.").await,
                Ok(false) => send_message(&bot, chat_id, "⚠️ Template not found.").await,
                Err(e) => {
                    tracing::error!("Failed to delete template {}: {}", template_id, e);
                    send_message(&bot, chat_id, "❌ Database error.").await
                }
            },
            None => Ok(()),
        },

        _ => {
            tracing::warn!("Unhandled callback data: {}", data);
            Ok(())
        }
    }
}

fn parse_id(raw: &str) -> Option<i32> {
    raw.parse::<i32>().ok()
}

fn load_intake_draft(pool: &DbPool, operator_id: i64) -> ClientDraft {
    match get_conversation_state(pool, operator_id) {
        Ok(Some(state)) => load_draft(state.state_data.as_ref()),
        Ok(None) => ClientDraft::default(),
        Err(e) => {
            tracing::error!("Failed to load conversation state: {}", e);
            ClientDraft::default()
        }
    }
}

async fn request_custom_step(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    state: &str,
    prompt: &str,
) -> ResponseResult<()> {
    let draft = load_intake_draft(pool, operator_id);
    set_state(pool, operator_id, state, &draft);
    send_message_with_keyboard(bot, chat_id, prompt, build_cancel_keyboard()).await
}

async fn view_client(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    operator_id: i64,
    client_id: i32,
) -> ResponseResult<()> {
    match find_client_by_id(pool, client_id, operator_id) {
        Ok(Some(client)) => {
            send_message_with_keyboard(
                bot,
                chat_id,
                &format_client_details(&client),
                build_client_actions_keyboard(&client),
            )
            .await
        }
        Ok(None) => send_message(bot, chat_id, "⚠️ Client not found.").await,
        Err(e) => {
            tracing::error!("Failed to load client {}: {}", client_id, e);
            send_message(bot, chat_id, "❌ Database error.").await
        }
    }
}

const HISTORY_PAGE_SIZE: i64 = 10;

async fn view_delivery_history(
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

    let entries = match find_delivery_log_by_client(pool, client.id, HISTORY_PAGE_SIZE) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!("Failed to load delivery log for client {}: {}", client.id, e);
            send_message(bot, chat_id, "❌ Database error.").await?;
            return Ok(());
        }
    };

    send_message_with_keyboard(
        bot,
        chat_id,
        &format_delivery_history(&client.name, &entries),
        build_client_actions_keyboard(&client),
    )
    .await
}

async fn view_template(
    pool: &DbPool,
    bot: &Bot,
    chat_id: i64,
    template_id: i32,
) -> ResponseResult<()> {
    match find_template_by_id(pool, template_id) {
        Ok(Some(template)) => {
            let templates = list_templates(pool).unwrap_or_default();
            send_message_with_keyboard(
                bot,
                chat_id,
                &format!(
                    "📄 <b>{}</b>\n\n<code>{}</code>",
                    escape(&template.name),
                    escape(&template.content)
                ),
                build_templates_keyboard(&templates),
            )
            .await
        }
        Ok(None) => send_message(bot, chat_id, "⚠️ Template not found.").await,
        Err(e) => {
            tracing::error!("Failed to load template {}: {}", template_id, e);
            send_message(bot, chat_id, "❌ Database error.").await
        }
    }
}

async fn send_template(
    pool: &DbPool,
    bot: &Bot,
    gateway: &WhatsAppGateway,
    chat_id: i64,
    operator_id: i64,
    template_id: i32,
    client_id: i32,
) -> ResponseResult<()> {
    let template = match find_template_by_id(pool, template_id) {
        Ok(Some(t)) => t,
        Ok(None) => {
            send_message(bot, chat_id, "⚠️ Template not found.").await?;
            return Ok(());
        }
        Err(e) => {
            tracing::error!("Failed to load template {}: {}", template_id, e);
            send_message(bot, chat_id, "❌ Database error.").await?;
            return Ok(());
        }
    };

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

    let message = render(&template.content, &client, today_local());
    let status = dispatch_and_log(pool, gateway, &client, &template.name, &message).await;

    let feedback = if status.is_sent() {
        format!(
            "✅ Template <code>{}</code> sent to <b>{}</b>.",
            escape(&template.name),
            escape(&client.name)
        )
    } else {
        format!(
            "⚠️ Dispatch to <b>{}</b> ended with status <code>{}</code>. Check the delivery log.",
            escape(&client.name),
            status.as_str()
        )
    };

    send_message(bot, chat_id, &feedback).await
}
