use chrono::Duration;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use crate::store::{CacheEntry, CacheStore};

/// Read-through cache over a shared store
///
/// Two misses on the same key may both run the producer. Producers are
/// expected to be idempotent, so the later write simply wins.
#[derive(Clone)]
pub struct ReadThroughCache {
    store: Arc<dyn CacheStore>,
}

impl ReadThroughCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Return the fresh value under `key`, or run `producer` and store its result
    ///
    /// The key must encode every input that affects the value. A producer
    /// error is handed back untouched and nothing is stored.
    pub async fn cache_first<T, E, F, Fut>(
        &self,
        key: &str,
        ttl_minutes: i64,
        producer: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.lookup(key) {
            return Ok(value);
        }

        let value = producer().await?;
        self.insert(key, &value, ttl_minutes);
        Ok(value)
    }

    /// Fresh, decodable value under `key`
    pub fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry = self.store.get(key)?;
        if !entry.is_fresh(self.store.now()) {
            debug!("Cache stale for {}", key);
            return None;
        }

        match serde_json::from_value(entry.value) {
            Ok(value) => {
                debug!("Cache hit for {}", key);
                Some(value)
            }
            Err(e) => {
                debug!("Cached value for {} no longer decodes: {}", key, e);
                None
            }
        }
    }

    pub fn insert<T: Serialize>(&self, key: &str, value: &T, ttl_minutes: i64) {
        match serde_json::to_value(value) {
            Ok(value) => self.store.set(
                key,
                CacheEntry {
                    value,
                    stored_at: self.store.now(),
                    ttl: Duration::minutes(ttl_minutes),
                },
            ),
            Err(e) => debug!("Failed to cache {}: {}", key, e),
        }
    }
}
