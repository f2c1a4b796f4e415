//! State storage implementation
//!
//! This module handles persistence of conversation state using Redis,
//! including serialization, deserialization, expiration, and cleanup.

use redis::AsyncCommands;
use tracing::{debug, warn, error, info};
use crate::utils::errors::Result;
use crate::config::RedisConfig;
use super::context::ConversationContext;

/// Redis-based state storage manager
#[derive(Clone)]
pub struct StateStorage {
    /// Redis connection manager
    connection_manager: redis::aio::ConnectionManager,
    /// Redis configuration
    config: RedisConfig,
}

impl StateStorage {
    /// Create a new state storage instance
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())?;
        let connection_manager = redis::aio::ConnectionManager::new(client).await?;

        Ok(Self {
            connection_manager,
            config,
        })
    }

    /// Save conversation context to Redis
    pub async fn save_context(&self, context: &ConversationContext) -> Result<()> {
        let key = self.get_context_key(context.user_id);
        debug!(user_id = context.user_id, key = %key, scenario = ?context.scenario,
               step = ?context.step, "Saving context to Redis");

        let serialized = match serde_json::to_string(context) {
            Ok(data) => data,
            Err(e) => {
                error!(user_id = context.user_id, error = %e, "Failed to serialize context");
                return Err(e.into());
            }
        };

        let mut conn = self.connection_manager.clone();

        let ttl_seconds = if let Some(expires_at) = context.expires_at {
            let now = chrono::Utc::now();
            let duration = expires_at - now;
            std::cmp::max(duration.num_seconds(), 60) as u64 // Minimum 60 seconds
        } else {
            self.config.ttl_seconds
        };

        match conn.set_ex::<_, _, ()>(&key, serialized, ttl_seconds).await {
            Ok(_) => Ok(()),
            Err(e) => {
                error!(user_id = context.user_id, error = %e, "Failed to save context to Redis");
                Err(e.into())
            }
        }
    }

    /// Load conversation context from Redis
    pub async fn load_context(&self, user_id: i64) -> Result<Option<ConversationContext>> {
        let key = self.get_context_key(user_id);
        let mut conn = self.connection_manager.clone();

        let serialized: Option<String> = match conn.get::<&str, Option<String>>(&key).await {
            Ok(data) => data,
            Err(e) => {
                error!(user_id = user_id, error = %e, "Failed to get context from Redis");
                return Err(e.into());
            }
        };

        match serialized {
            Some(data) => {
                let context: ConversationContext = match serde_json::from_str::<ConversationContext>(&data) {
                    Ok(ctx) => ctx,
                    Err(e) => {
                        error!(user_id = user_id, error = %e, "Failed to deserialize context");
                        return Err(e.into());
                    }
                };

                if context.is_expired() {
                    warn!(user_id = user_id, expires_at = ?context.expires_at, "Context has expired, removing");
                    self.delete_context(user_id).await?;
                    return Ok(None);
                }

                debug!(user_id = user_id, scenario = ?context.scenario, step = ?context.step,
                       "Context loaded successfully");
                Ok(Some(context))
            }
            None => {
                debug!(user_id = user_id, "No context found in Redis");
                Ok(None)
            }
        }
    }

    /// Delete conversation context from Redis
    pub async fn delete_context(&self, user_id: i64) -> Result<()> {
        let key = self.get_context_key(user_id);
        let mut conn = self.connection_manager.clone();

        let deleted: u32 = conn.del(&key).await?;

        if deleted > 0 {
            debug!("Deleted context for user {}", user_id);
        } else {
            debug!("No context to delete for user {}", user_id);
        }

        Ok(())
    }

    /// Check if context exists for a user
    pub async fn context_exists(&self, user_id: i64) -> Result<bool> {
        let key = self.get_context_key(user_id);
        let mut conn = self.connection_manager.clone();

        let exists: bool = conn.exists(&key).await?;
        Ok(exists)
    }

    /// Get all active user contexts (for cleanup/monitoring)
    pub async fn get_active_users(&self) -> Result<Vec<i64>> {
        let pattern = format!("{}context:*", self.config.prefix);
        let mut conn = self.connection_manager.clone();

        let keys: Vec<String> = conn.keys(&pattern).await?;

        let mut user_ids = Vec::new();
        for key in keys {
            if let Some(user_id_str) = key.strip_prefix(&format!("{}context:", self.config.prefix)) {
                if let Ok(user_id) = user_id_str.parse::<i64>() {
                    user_ids.push(user_id);
                }
            }
        }

        Ok(user_ids)
    }

    /// Clean up expired contexts
    pub async fn cleanup_expired_contexts(&self) -> Result<u32> {
        let active_users = self.get_active_users().await?;
        let mut cleaned_count = 0;

        for user_id in active_users {
            if let Ok(Some(context)) = self.load_context(user_id).await {
                if context.is_expired() {
                    self.delete_context(user_id).await?;
                    cleaned_count += 1;
                }
            }
        }

        if cleaned_count > 0 {
            info!("Cleaned up {} expired contexts", cleaned_count);
        }

        Ok(cleaned_count)
    }

    /// Get storage statistics
    pub async fn get_stats(&self) -> Result<StorageStats> {
        let active_users = self.get_active_users().await?;
        let total_contexts = active_users.len();

        let mut expired_contexts = 0;
        let mut scenarios_count = std::collections::HashMap::new();

        for user_id in &active_users {
            if let Ok(Some(context)) = self.load_context(*user_id).await {
                if context.is_expired() {
                    expired_contexts += 1;
                } else if let Some(scenario) = &context.scenario {
                    *scenarios_count.entry(scenario.clone()).or_insert(0) += 1;
                }
            }
        }

        Ok(StorageStats {
            total_contexts,
            expired_contexts,
            active_contexts: total_contexts - expired_contexts,
            scenarios_count,
        })
    }

    /// Get the Redis key for a user's context
    fn get_context_key(&self, user_id: i64) -> String {
        format!("{}context:{}", self.config.prefix, user_id)
    }

    /// Test Redis connection
    pub async fn test_connection(&self) -> Result<()> {
        let mut conn = self.connection_manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

impl std::fmt::Debug for StateStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStorage")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Storage statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct StorageStats {
    pub total_contexts: usize,
    pub active_contexts: usize,
    pub expired_contexts: usize,
    pub scenarios_count: std::collections::HashMap<String, u32>,
}
