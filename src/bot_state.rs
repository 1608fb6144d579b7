use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use teloxide::types::{ChatId, UserId};
use tokio::sync::RwLock;

use crate::config::AppConfig;
use crate::engine::BookingEngine;
use crate::models::SelectionState;

/// Drafts are owned per user within a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub chat_id: ChatId,
    pub user_id: UserId,
}

impl SessionKey {
    pub fn new(chat_id: ChatId, user_id: UserId) -> Self {
        Self { chat_id, user_id }
    }
}

/// Keeps unconfirmed selections between button presses.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The stored draft, or a fresh empty one.
    async fn get_or_create(&self, key: SessionKey) -> SelectionState;

    async fn save(&self, key: SessionKey, state: SelectionState);

    /// Empties the selected slots of a draft, keeping its page cursor.
    async fn clear(&self, key: SessionKey);
}

type DraftCache = Arc<RwLock<HashMap<SessionKey, (SelectionState, SystemTime)>>>;

/// Drafts held in process memory; they do not survive a restart.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    cache: DraftCache,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops drafts that nobody touched for longer than `ttl`.
    pub async fn cleanup(&self, ttl: Duration) {
        let mut cache = self.cache.write().await;
        let now = SystemTime::now();
        let previous_count = cache.len();

        cache.retain(|_, (_, touched)| now.duration_since(*touched).unwrap_or_default() < ttl);

        log::debug!("🧹 Drafts cleaned: {} -> {} entries", previous_count, cache.len());
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, key: SessionKey) -> SelectionState {
        {
            let cache = self.cache.read().await;
            if let Some((state, _)) = cache.get(&key) {
                return state.clone();
            }
        }

        let mut cache = self.cache.write().await;
        cache
            .entry(key)
            .or_insert_with(|| (SelectionState::default(), SystemTime::now()))
            .0
            .clone()
    }

    async fn save(&self, key: SessionKey, state: SelectionState) {
        let mut cache = self.cache.write().await;
        cache.insert(key, (state, SystemTime::now()));
    }

    async fn clear(&self, key: SessionKey) {
        let mut cache = self.cache.write().await;
        if let Some((state, touched)) = cache.get_mut(&key) {
            state.clear();
            *touched = SystemTime::now();
        }
    }
}

/// Shared dependencies handed to every teloxide endpoint.
#[derive(Clone)]
pub struct BotState {
    pub engine: BookingEngine,
    pub config: Arc<AppConfig>,
}

impl BotState {
    pub fn new(engine: BookingEngine, config: AppConfig) -> Self {
        Self {
            engine,
            config: Arc::new(config),
        }
    }
}
