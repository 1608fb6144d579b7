pub mod commands;
pub mod messages;
pub mod callbacks;
pub mod utils;

pub use commands::command_handler;
pub use messages::message_handler;
pub use callbacks::callback_handler;

use std::time::Duration;
use tokio::time;
use crate::bot_state::InMemorySessionStore;

/// Evicts abandoned drafts every ten minutes.
pub async fn cleanup_drafts_task(sessions: InMemorySessionStore, ttl: Duration) {
    let mut interval = time::interval(Duration::from_secs(600));

    loop {
        interval.tick().await;
        sessions.cleanup(ttl).await;
    }
}
