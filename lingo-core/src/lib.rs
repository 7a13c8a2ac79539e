use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use lingo_database::Database;

/// Signing material and lifetime for session tokens.
#[derive(Clone)]
pub struct AuthSettings {
    pub jwt_secret: Arc<[u8]>,
    pub session_ttl: Duration,
}

impl AuthSettings {
    pub fn new(jwt_secret: impl AsRef<[u8]>, session_ttl: Duration) -> Self {
        Self {
            jwt_secret: Arc::from(jwt_secret.as_ref()),
            session_ttl,
        }
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("session_ttl", &self.session_ttl)
            .finish()
    }
}

/// State shared by every request handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: Database,
    pub auth: AuthSettings,
}
