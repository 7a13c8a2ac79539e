mod noop_store;
mod redis_store;

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use noop_store::NoopCacheStore;
use redis_store::RedisCacheStore;

pub const DEFAULT_LEADERBOARD_CACHE_TTL: Duration = Duration::from_secs(30);
pub const STAGE_LIST_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Clone, Debug)]
enum CacheBackend {
    Disabled(NoopCacheStore),
    Redis(RedisCacheStore),
}

#[derive(Clone, Debug)]
pub struct CacheService {
    key_prefix: String,
    backend: CacheBackend,
    leaderboard_ttl: Duration,
}

impl CacheService {
    pub fn disabled(prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Disabled(NoopCacheStore),
            leaderboard_ttl: DEFAULT_LEADERBOARD_CACHE_TTL,
        }
    }

    pub fn redis(redis_url: &str, prefix: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Redis(RedisCacheStore::from_url(redis_url)?),
            leaderboard_ttl: DEFAULT_LEADERBOARD_CACHE_TTL,
        })
    }

    pub fn is_redis_enabled(&self) -> bool {
        matches!(self.backend, CacheBackend::Redis(_))
    }

    pub fn configure_leaderboard_ttl(&mut self, ttl: Duration) {
        self.leaderboard_ttl = ttl.max(Duration::from_secs(1));
    }

    pub fn leaderboard_ttl(&self) -> Duration {
        self.leaderboard_ttl
    }

    pub fn key(&self, suffix: impl AsRef<str>) -> String {
        format!("{}:{}", self.key_prefix, suffix.as_ref())
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        match &self.backend {
            CacheBackend::Disabled(store) => store.ping().await,
            CacheBackend::Redis(store) => store.ping().await,
        }
    }

    pub async fn get_json<T>(&self, key: &str) -> anyhow::Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let value = match &self.backend {
            CacheBackend::Disabled(store) => store.get(key).await,
            CacheBackend::Redis(store) => store.get(key).await,
        }?;

        value
            .map(|bytes| {
                serde_json::from_slice(&bytes).map_err(|e| {
                    anyhow::anyhow!("failed to deserialize cache value for `{key}`: {e}")
                })
            })
            .transpose()
    }

    pub async fn set_json<T>(&self, key: &str, value: &T, ttl: Duration) -> anyhow::Result<()>
    where
        T: Serialize,
    {
        let ttl_seconds = ttl.as_secs().max(1);
        let payload = serde_json::to_vec(value)
            .map_err(|e| anyhow::anyhow!("failed to serialize cache value for `{key}`: {e}"))?;

        match &self.backend {
            CacheBackend::Disabled(store) => store.set(key, payload, ttl_seconds).await,
            CacheBackend::Redis(store) => store.set(key, payload, ttl_seconds).await,
        }
    }

    pub async fn del(&self, keys: &[String]) -> anyhow::Result<()> {
        match &self.backend {
            CacheBackend::Disabled(store) => store.del(keys).await,
            CacheBackend::Redis(store) => store.del(keys).await,
        }
    }

    /// Read-through helper. Cache errors are logged and bypassed; only
    /// loader errors reach the caller.
    pub async fn get_or_load_json<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        loader: F,
    ) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        match self.get_json::<T>(key).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => warn!(
                ?e,
                cache_key = key,
                "cache get failed; falling back to database"
            ),
        }

        let loaded = loader().await?;

        if let Err(e) = self.set_json(key, &loaded, ttl).await {
            warn!(
                ?e,
                cache_key = key,
                "cache set failed; returning database value"
            );
        }

        Ok(loaded)
    }

    /// Drop cached entries, logging instead of failing the caller's write.
    pub async fn invalidate(&self, keys: &[String]) {
        if let Err(e) = self.del(keys).await {
            warn!(?e, ?keys, "cache invalidation failed; entries expire by ttl");
        }
    }
}

pub fn leaderboard_key(cache: &CacheService, language: &str) -> String {
    cache.key(format!("leaderboard:{}", language.to_ascii_lowercase()))
}

pub fn vocabulary_stages_key(cache: &CacheService, language: &str) -> String {
    cache.key(format!("stages:vocabulary:{}", language.to_ascii_lowercase()))
}

pub fn quiz_stages_key(cache: &CacheService, language: &str) -> String {
    cache.key(format!("stages:quiz:{}", language.to_ascii_lowercase()))
}

pub async fn invalidate_leaderboard(cache: &CacheService, language: &str) {
    cache.invalidate(&[leaderboard_key(cache, language)]).await;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::{CacheService, leaderboard_key, quiz_stages_key, vocabulary_stages_key};

    #[test]
    fn keys_are_prefixed_and_lowercased() {
        let cache = CacheService::disabled("lingo:test");
        assert_eq!(leaderboard_key(&cache, "Hausa"), "lingo:test:leaderboard:hausa");
        assert_eq!(
            vocabulary_stages_key(&cache, "Yoruba"),
            "lingo:test:stages:vocabulary:yoruba"
        );
        assert_eq!(quiz_stages_key(&cache, "Igbo"), "lingo:test:stages:quiz:igbo");
    }

    #[test]
    fn leaderboard_ttl_has_floor() {
        let mut cache = CacheService::disabled("lingo:test");
        cache.configure_leaderboard_ttl(Duration::ZERO);
        assert_eq!(cache.leaderboard_ttl(), Duration::from_secs(1));
        assert!(!cache.is_redis_enabled());
    }

    #[tokio::test]
    async fn disabled_cache_always_loads() {
        let cache = CacheService::disabled("lingo:test");
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = Arc::clone(&calls);
            let value: Vec<i32> = cache
                .get_or_load_json("lingo:test:k", Duration::from_secs(5), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2, 3])
                })
                .await
                .unwrap();
            assert_eq!(value, vec![1, 2, 3]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        cache.invalidate(&["lingo:test:k".to_owned()]).await;
    }
}
