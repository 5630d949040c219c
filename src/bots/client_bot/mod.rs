use renova::db::DbPool;
use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
use teloxide::dptree;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;

mod flows;
mod handlers;
mod keyboards;
mod types;
pub mod utils;

use handlers::{callback_handler, command_handler, message_handler, Command};

use crate::whatsapp::WhatsAppGateway;

pub async fn run_bot(pool: DbPool, gateway: WhatsAppGateway, token: String) {
    tracing::info!("Starting client bot...");

    let bot = Bot::new(token);

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint({
                    let pool = pool.clone();
                    move |bot: Bot, msg: Message, cmd: Command| {
                        let pool = pool.clone();
                        async move { command_handler(bot, msg, cmd, pool).await }
                    }
                }),
        )
        .branch(Update::filter_message().endpoint({
            let pool = pool.clone();
            let gateway = gateway.clone();
            move |bot: Bot, msg: Message| {
                let pool = pool.clone();
                let gateway = gateway.clone();
                async move { message_handler(bot, msg, pool, gateway).await }
            }
        }))
        .branch(Update::filter_callback_query().endpoint({
            let pool = pool.clone();
            let gateway = gateway.clone();
            move |bot: Bot, q: CallbackQuery| {
                let pool = pool.clone();
                let gateway = gateway.clone();
                async move { callback_handler(bot, q, pool, gateway).await }
            }
        }));

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
