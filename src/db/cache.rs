use std::fmt::Display;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::UserId;
use crate::services::sources::KeyValueCache;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Recommendations(UserId),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Recommendations(user_id) => write!(f, "recommendations:{}", user_id),
        }
    }
}

/// Typed JSON view over a key-value cache backend
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn KeyValueCache>,
}

impl Cache {
    pub fn new(backend: Arc<dyn KeyValueCache>) -> Self {
        Self { backend }
    }

    /// Retrieves a value from the cache by key
    ///
    /// A missing key yields `None`. Backend failures and payloads that no longer
    /// decode are returned as errors.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let cached = self.backend.get(&key.to_string()).await?;

        match cached {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Stores a value in the cache, logging failures instead of returning them
    pub async fn set_in_cache<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        if let Err(e) = self.backend.set_with_ttl(&key.to_string(), json, ttl).await {
            tracing::warn!(error = %e, key = %key, "Failed to store value in cache");
        }
    }
}
