use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context as _;

use lingo_database::cache::DEFAULT_LEADERBOARD_CACHE_TTL;
use lingo_utils::parse::{parse_duration_seconds, parse_flag};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
pub const DEFAULT_REDIS_KEY_PREFIX: &str = "lingo:prod";

/// Settings read from the environment at startup.
#[derive(Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub auto_run_migrations: bool,
    pub session_ttl: Duration,
    pub redis_enabled: bool,
    pub redis_url: Option<String>,
    pub redis_key_prefix: String,
    pub leaderboard_cache_ttl: Duration,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.trim().is_empty())
            .context("JWT_SECRET is not set")?;

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned())
            .parse::<SocketAddr>()
            .context("BIND_ADDR is not a valid socket address")?;

        let session_ttl = match lookup("SESSION_TTL") {
            Some(raw) => Duration::from_secs(
                parse_duration_seconds(&raw)
                    .with_context(|| format!("SESSION_TTL `{raw}` is not a valid duration"))?,
            ),
            None => DEFAULT_SESSION_TTL,
        };

        let max_connections = u32::try_from(env_u64(
            &lookup,
            "DATABASE_MAX_CONNECTIONS",
            u64::from(DEFAULT_MAX_CONNECTIONS),
        ))
        .unwrap_or(DEFAULT_MAX_CONNECTIONS)
        .max(1);

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            max_connections,
            auto_run_migrations: env_bool(&lookup, "AUTO_RUN_MIGRATIONS", true),
            session_ttl,
            redis_enabled: env_bool(&lookup, "REDIS_ENABLED", false),
            redis_url: lookup("REDIS_URL").filter(|url| !url.trim().is_empty()),
            redis_key_prefix: lookup("REDIS_KEY_PREFIX")
                .unwrap_or_else(|| DEFAULT_REDIS_KEY_PREFIX.to_owned()),
            leaderboard_cache_ttl: Duration::from_secs(env_u64(
                &lookup,
                "LEADERBOARD_CACHE_SECONDS",
                DEFAULT_LEADERBOARD_CACHE_TTL.as_secs(),
            )),
        })
    }
}

fn env_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    match lookup(key) {
        Some(value) => parse_flag(&value),
        None => default,
    }
}

fn env_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    match lookup(key) {
        Some(value) => value.trim().parse::<u64>().unwrap_or(default),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::{DEFAULT_SESSION_TTL, ServerConfig};

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost/lingo"),
        ("JWT_SECRET", "secret"),
    ];

    #[test]
    fn defaults_apply() {
        let config = config(&REQUIRED).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.max_connections, 5);
        assert!(config.auto_run_migrations);
        assert!(!config.redis_enabled);
        assert_eq!(config.session_ttl, DEFAULT_SESSION_TTL);
        assert_eq!(config.redis_key_prefix, "lingo:prod");
        assert_eq!(config.leaderboard_cache_ttl, Duration::from_secs(30));
    }

    #[test]
    fn overrides_are_parsed() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("SESSION_TTL", "12h"),
            ("REDIS_ENABLED", "yes"),
            ("AUTO_RUN_MIGRATIONS", "off"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("LEADERBOARD_CACHE_SECONDS", "bogus"),
        ]);
        let config = config(&vars).unwrap();
        assert_eq!(config.session_ttl, Duration::from_secs(12 * 3_600));
        assert!(config.redis_enabled);
        assert!(!config.auto_run_migrations);
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.leaderboard_cache_ttl, Duration::from_secs(30));
    }

    #[test]
    fn missing_or_invalid_required_values_fail() {
        assert!(config(&[("DATABASE_URL", "postgres://localhost/lingo")]).is_err());
        let mut vars = REQUIRED.to_vec();
        vars.push(("SESSION_TTL", "forever"));
        assert!(config(&vars).is_err());
    }
}
