//! Process-wide revocation store for refresh tokens.
//!
//! The cache is the single source of truth for "is this refresh token still
//! live": issuing a new pair overwrites the entry, logout and password reset
//! delete it, and `refresh` honors a presented token only when it equals the
//! cached value. Process-local by construction; a multi-instance deployment
//! must swap in a shared implementation behind the same trait.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[async_trait]
pub trait RevocationCache: Send + Sync {
    /// Stores `value` under `key`, replacing any previous entry. Last set
    /// wins; concurrent writes are never merged.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> anyhow::Result<()>;
    /// Returns the live value for `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}

pub type SharedRevocationCache = Arc<dyn RevocationCache>;

/// Cache key holding the currently trusted refresh token for a principal.
pub fn refresh_token_key(email: &str) -> String {
    format!("refreshToken:{}", email)
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(deadline) if deadline <= now)
    }
}

/// In-memory implementation with per-entry optional TTL. Expired entries are
/// evicted lazily on read.
#[derive(Default)]
pub struct InMemoryRevocationCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryRevocationCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationCache for InMemoryRevocationCache {
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> anyhow::Result<()> {
        tracing::debug!(key, "cache set");
        let entry = CacheEntry {
            value: value.to_string(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // Expired: upgrade to a write lock and evict, re-checking in case a
        // concurrent set replaced the entry in between.
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key) {
            if entry.is_expired(Instant::now()) {
                entries.remove(key);
            } else {
                return Ok(Some(entry.value.clone()));
            }
        }
        Ok(None)
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        tracing::debug!(key, "cache delete");
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_delete_contract() {
        let cache = InMemoryRevocationCache::new();
        let key = refresh_token_key("alice@example.com");

        assert_eq!(cache.get(&key).await.unwrap(), None);

        cache.set(&key, "R1", None).await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap().as_deref(), Some("R1"));

        cache.delete(&key).await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn last_set_supersedes_previous_value() {
        let cache = InMemoryRevocationCache::new();
        let key = refresh_token_key("alice@example.com");

        cache.set(&key, "R1", None).await.unwrap();
        cache.set(&key, "R2", None).await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap().as_deref(), Some("R2"));
    }

    #[tokio::test]
    async fn expired_entries_read_as_absent() {
        let cache = InMemoryRevocationCache::new();
        let key = refresh_token_key("bob@example.com");

        cache
            .set(&key, "R1", Some(Duration::from_millis(10)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn keys_are_scoped_per_principal() {
        let cache = InMemoryRevocationCache::new();
        cache
            .set(&refresh_token_key("a@x.com"), "RA", None)
            .await
            .unwrap();
        cache
            .set(&refresh_token_key("b@x.com"), "RB", None)
            .await
            .unwrap();
        cache.delete(&refresh_token_key("a@x.com")).await.unwrap();
        assert_eq!(
            cache
                .get(&refresh_token_key("b@x.com"))
                .await
                .unwrap()
                .as_deref(),
            Some("RB")
        );
    }
}
