use teloxide::{prelude::*, utils::command::BotCommands};
use std::sync::Arc;
use anyhow::Context;

mod bot_state;
mod config;
mod database;
mod engine;
mod handlers;
mod models;

use crate::bot_state::{BotState, InMemorySessionStore};
use crate::config::AppConfig;
use crate::database::{Database, InMemoryLedger, Ledger};
use crate::engine::BookingEngine;
use crate::handlers::{callback_handler, command_handler, message_handler};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
enum Command {
    #[command(description = "open the main menu")]
    Start,
    #[command(description = "show help")]
    Help,
    #[command(description = "check availability and book the court")]
    Book,
    #[command(description = "list and cancel your bookings")]
    MyBookings,
}

async fn open_ledger(config: &AppConfig) -> anyhow::Result<Arc<dyn Ledger>> {
    match &config.database_url {
        Some(url) => {
            let db = Database::new(url)
                .await
                .context("failed to connect to the booking database")?;
            db.init().await.context("failed to create booking tables")?;
            log::info!("✅ Database initialized");
            Ok(Arc::new(db))
        }
        None => {
            log::warn!("DATABASE_URL is not set, bookings are kept in memory and lost on restart");
            Ok(Arc::new(InMemoryLedger::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Starting tennis court booking bot...");

    let config = AppConfig::from_env()?;
    let ledger = open_ledger(&config).await?;

    let sessions = InMemorySessionStore::new();
    let engine = BookingEngine::new(ledger, Arc::new(sessions.clone()), config.slots_per_page);

    // Фоновая задача для очистки черновиков
    tokio::spawn(handlers::cleanup_drafts_task(sessions.clone(), config.draft_ttl));

    let bot = Bot::new(&config.bot_token);
    let state = BotState::new(engine, config);

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(command_handler)
        )
        .branch(Update::filter_callback_query().endpoint(callback_handler))
        .branch(Update::filter_message().endpoint(message_handler));

    log::info!("🚀 Starting dispatcher...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
