use std::future::Future;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Explicit key -> (value, expiry) cache for evidence lookups. TTLs come
/// from configuration, not call sites.
pub struct TtlCache<V: Clone> {
    entries: DashMap<String, (V, Instant)>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let hit = self.entries.get(key).map(|e| e.value().clone());
        match hit {
            Some((value, expires)) if Instant::now() < expires => Some(value),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: &str, value: V) {
        self.entries
            .insert(key.to_string(), (value, Instant::now() + self.ttl));
    }

    /// Get-or-compute contract: a cached value short-circuits; otherwise the
    /// factory runs and a success is cached. Failures are never cached.
    pub async fn get_or_try_insert<F, Fut, E>(&self, key: &str, factory: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = factory().await?;
        self.insert(key, value.clone());
        Ok(value)
    }
}
