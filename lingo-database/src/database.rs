use sqlx::{PgPool, migrate::Migrator};

use crate::cache::CacheService;
use crate::realtime::{ChangeEvent, ChangeFeed};

/// Compile-time discovered SQLx migrations for the `lingo-database` crate.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Shared database handle passed across crates.
#[derive(Clone, Debug)]
pub struct Database {
    pool: PgPool,
    cache: CacheService,
    feed: ChangeFeed,
}

impl Database {
    /// Create a database handle from an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self::with_cache(pool, CacheService::disabled("lingo:prod"))
    }

    /// Create a database handle from an existing pool and cache service.
    pub fn with_cache(pool: PgPool, cache: CacheService) -> Self {
        Self {
            pool,
            cache,
            feed: ChangeFeed::default(),
        }
    }

    /// Expose the underlying pool for query modules.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Expose the cache service for query modules.
    pub fn cache(&self) -> &CacheService {
        &self.cache
    }

    /// Row-change notifications for realtime subscribers.
    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Publish a change after its write has been committed.
    pub(crate) fn notify(&self, event: ChangeEvent) {
        self.feed.publish(event);
    }
}
