mod config;

use tracing::{info, warn};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rustls::crypto::ring::default_provider;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use lingo_core::{AppState, AuthSettings};
use lingo_database::{CacheService, Database, MIGRATOR};
use lingo_utils::formatting::format_compact_duration;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(filter_fn(|metadata| {
        let target = metadata.target();

        let within_info_level = *metadata.level() <= tracing::Level::INFO;
        if !within_info_level {
            return false;
        }

        !target.starts_with("sqlx::query")
    }));

    tracing_subscriber::registry().with(fmt_layer).init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env()?;

    let db_pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    info!(max_connections = config.max_connections, "PostgreSQL connection established.");

    let prefix = config.redis_key_prefix.clone();
    let mut cache = if config.redis_enabled {
        match config.redis_url.as_deref() {
            Some(redis_url) => match CacheService::redis(redis_url, prefix.clone()) {
                Ok(cache) => {
                    info!(key_prefix = %prefix, "Redis cache enabled.");
                    cache
                }
                Err(err) => {
                    warn!(?err, key_prefix = %prefix, "Failed to initialize Redis cache; continuing with DB-only mode.");
                    CacheService::disabled(prefix.clone())
                }
            },
            None => {
                warn!(key_prefix = %prefix, "REDIS_ENABLED=true but REDIS_URL is missing; continuing with DB-only mode.");
                CacheService::disabled(prefix.clone())
            }
        }
    } else {
        info!("Redis cache disabled (set REDIS_ENABLED=true to enable).");
        CacheService::disabled(prefix.clone())
    };

    cache.configure_leaderboard_ttl(config.leaderboard_cache_ttl);
    info!(
        leaderboard_cache_seconds = cache.leaderboard_ttl().as_secs(),
        "Leaderboard cache configured."
    );

    if cache.is_redis_enabled() {
        if let Err(err) = cache.ping().await {
            warn!(
                ?err,
                "Redis cache ping failed; cache operations will continue with fallback behavior."
            );
        } else {
            info!("Redis cache health check passed.");
        }
    }

    let db = Database::with_cache(db_pool, cache);

    if config.auto_run_migrations {
        MIGRATOR.run(db.pool()).await?;
        info!("Database migrations applied.");
    } else {
        info!("Auto migrations disabled (set AUTO_RUN_MIGRATIONS=true to run at startup).");
    }

    let state = AppState {
        db,
        auth: AuthSettings::new(config.jwt_secret.as_bytes(), config.session_ttl),
    };
    info!(
        session_ttl = %format_compact_duration(config.session_ttl.as_secs()),
        "Session settings loaded."
    );

    let app = lingo_routes::build_router(state);
    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Lingo is listening.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Lingo has shut down.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(?err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received; draining connections.");
}
