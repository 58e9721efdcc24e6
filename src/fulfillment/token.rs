use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// Provider tokens live about an hour; cache slightly inside that.
pub const TOKEN_TTL: Duration = Duration::from_secs(3600);

/// Process-wide single-entry cache for the provider bearer token.
///
/// Concurrent refreshes are not serialized: two requests that both miss will
/// both hit the token endpoint and the last write wins. Either token is valid
/// upstream, so the stampede is accepted rather than locked away.
#[derive(Clone, Debug, Default)]
pub struct TokenCache {
    inner: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Debug)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached token, unless it has passed its expiry.
    pub async fn get(&self) -> Option<String> {
        let guard = self.inner.read().await;
        guard
            .as_ref()
            .filter(|cached| cached.expires_at > Instant::now())
            .map(|cached| cached.token.clone())
    }

    pub async fn store(&self, token: String, ttl: Duration) {
        let mut guard = self.inner.write().await;
        *guard = Some(CachedToken {
            token,
            expires_at: Instant::now() + ttl,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_cache_misses() {
        let cache = TokenCache::new();
        assert_eq!(cache.get().await, None);
    }

    #[tokio::test]
    async fn stored_token_is_returned_until_expiry() {
        let cache = TokenCache::new();
        cache.store("tok-1".to_string(), Duration::from_secs(60)).await;
        assert_eq!(cache.get().await.as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn expired_token_is_not_returned() {
        let cache = TokenCache::new();
        cache.store("tok-1".to_string(), Duration::ZERO).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(cache.get().await, None);
    }

    #[tokio::test]
    async fn later_store_replaces_earlier_token() {
        let cache = TokenCache::new();
        cache.store("tok-1".to_string(), Duration::from_secs(60)).await;
        cache.store("tok-2".to_string(), Duration::from_secs(60)).await;
        assert_eq!(cache.get().await.as_deref(), Some("tok-2"));
    }
}
