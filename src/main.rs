use anyhow::Context;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use dotenv::dotenv;
use renova::db::create_pool;
use renova::templates::DEFAULT_TEMPLATES;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod bots;
mod config;
mod services;
mod whatsapp;

use bots::client_bot::run_bot;
use config::AppConfig;
use services::notification_scheduler::run_notification_scheduler;
use whatsapp::WhatsAppGateway;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().map_err(|e| anyhow::anyhow!("{}", e))?;

    let pool = Arc::new(
        create_pool(&config.database_url).context("Failed to create database pool")?,
    );

    run_migrations(&pool)?;
    seed_default_templates(&pool);

    let gateway = WhatsAppGateway::new(config.whatsapp_api_url, config.whatsapp_api_key);

    tokio::spawn(run_notification_scheduler(
        pool.clone(),
        gateway.clone(),
        config.dispatch_hour,
    ));

    run_bot(pool, gateway, config.bot_token).await;

    Ok(())
}

fn run_migrations(pool: &renova::db::PgPool) -> anyhow::Result<()> {
    let mut conn = pool.get().context("Failed to get connection for migrations")?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Migrations failed: {}", e))?;
    Ok(())
}

/// Seeds the reserved reminder templates. Existing rows are left alone, so
/// operator edits survive restarts.
fn seed_default_templates(pool: &renova::db::PgPool) {
    for (name, content) in DEFAULT_TEMPLATES {
        match renova::create_template_if_missing(pool, name, content) {
            Ok(Some(_)) => tracing::info!("Seeded default template {}", name),
            Ok(None) => {}
            Err(e) => tracing::error!("Failed to seed template {}: {}", name, e),
        }
    }
}
