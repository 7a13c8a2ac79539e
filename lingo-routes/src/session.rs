use anyhow::Context as _;
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use lingo_core::{AppState, AuthSettings};
use lingo_database::impls::profiles::ensure_profile;
use lingo_database::impls::sessions::find_active_session;
use lingo_utils::SESSION_COOKIE;
use lingo_utils::access::{Role, SessionState};

use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    sid: String,
    iat: usize,
    exp: usize,
}

/// Identity carried by a valid token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenIdentity {
    pub user_id: Uuid,
    pub session_id: Uuid,
}

pub fn issue_token(
    settings: &AuthSettings,
    identity: TokenIdentity,
    issued_at: u64,
) -> anyhow::Result<String> {
    let exp = issued_at.saturating_add(settings.session_ttl.as_secs());
    let claims = Claims {
        sub: identity.user_id.to_string(),
        sid: identity.session_id.to_string(),
        iat: usize::try_from(issued_at).context("iat out of usize range")?,
        exp: usize::try_from(exp).context("exp out of usize range")?,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&settings.jwt_secret),
    )
    .context("failed to sign session token")
}

/// Signature, expiry and id checks. Revocation is checked against the
/// sessions table separately.
pub fn verify_token(settings: &AuthSettings, token: &str) -> Option<TokenIdentity> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(&settings.jwt_secret),
        &validation,
    )
    .map_err(|err| debug!(?err, "rejected session token"))
    .ok()?;

    Some(TokenIdentity {
        user_id: Uuid::parse_str(&data.claims.sub).ok()?,
        session_id: Uuid::parse_str(&data.claims.sid).ok()?,
    })
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Token from `Authorization: Bearer` first, then the session cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_owned());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.trim().to_owned())
        .filter(|token| !token.is_empty())
}

pub fn session_cookie(token: &str, max_age_secs: u64) -> anyhow::Result<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}"
    ))
    .context("session token is not a valid header value")
}

pub fn cleared_session_cookie() -> HeaderValue {
    HeaderValue::from_static("lingo_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// The request's session, resolved once per request.
///
/// Missing, malformed, expired or revoked tokens all resolve to
/// [`SessionState::Absent`]; a valid session without a profile gets one
/// provisioned. A token that verifies while the session store cannot be
/// reached stays [`SessionState::Pending`], so pages render their loading
/// view instead of signing the learner out.
#[derive(Clone, Debug)]
pub struct CurrentSession {
    pub state: SessionState<Uuid>,
    pub session_id: Option<Uuid>,
}

impl CurrentSession {
    pub fn absent() -> Self {
        Self {
            state: SessionState::Absent,
            session_id: None,
        }
    }

    pub fn pending(session_id: Uuid) -> Self {
        Self {
            state: SessionState::Pending,
            session_id: Some(session_id),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.state.user_id().copied()
    }
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = token_from_headers(&parts.headers) else {
            return Ok(Self::absent());
        };

        let Some(identity) = verify_token(&state.auth, &token) else {
            return Ok(Self::absent());
        };

        let session = match find_active_session(&state.db, identity.session_id).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!(session_id = %identity.session_id, "session revoked or expired");
                return Ok(Self::absent());
            }
            Err(err) => {
                warn!(?err, session_id = %identity.session_id, "session lookup failed");
                return Ok(Self::pending(identity.session_id));
            }
        };

        if session.user_id != identity.user_id {
            return Ok(Self::absent());
        }

        let profile = match ensure_profile(&state.db, session.user_id).await {
            Ok(profile) => profile,
            Err(err) => {
                warn!(?err, user_id = %session.user_id, "profile lookup failed");
                return Ok(Self::pending(session.id));
            }
        };

        Ok(Self {
            state: SessionState::Established {
                user_id: profile.id,
                role: profile.role,
            },
            session_id: Some(session.id),
        })
    }
}

/// An established session; rejects with 401, or 503 while it is pending.
#[derive(Clone, Copy, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
    pub session_id: Uuid,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = CurrentSession::from_request_parts(parts, state).await?;
        match (session.state, session.session_id) {
            (SessionState::Established { user_id, role }, Some(session_id)) => Ok(Self {
                user_id,
                role,
                session_id,
            }),
            (SessionState::Pending, _) => Err(ApiError::SessionPending),
            _ => Err(ApiError::Unauthorized),
        }
    }
}

/// An established admin session; rejects with 401 or 403.
#[derive(Clone, Copy, Debug)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(ApiError::Forbidden(
                "You do not have permission to use the admin console.".to_owned(),
            ));
        }
        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::header::{AUTHORIZATION, COOKIE};
    use axum::http::{HeaderMap, HeaderValue};
    use uuid::Uuid;

    use lingo_core::AuthSettings;
    use lingo_utils::time::now_unix_secs;

    use super::{
        TokenIdentity, hash_password, issue_token, session_cookie, token_from_headers,
        verify_password, verify_token,
    };

    fn settings(secret: &str) -> AuthSettings {
        AuthSettings::new(secret, Duration::from_secs(3_600))
    }

    fn identity() -> TokenIdentity {
        TokenIdentity {
            user_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn tokens_verify_with_same_secret() {
        let settings = settings("test-secret");
        let identity = identity();
        let token = issue_token(&settings, identity, now_unix_secs()).unwrap();
        assert_eq!(verify_token(&settings, &token), Some(identity));
    }

    #[test]
    fn tokens_fail_with_other_secret_or_garbage() {
        let token = issue_token(&settings("one"), identity(), now_unix_secs()).unwrap();
        assert_eq!(verify_token(&settings("two"), &token), None);
        assert_eq!(verify_token(&settings("one"), "not-a-token"), None);
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let settings = settings("test-secret");
        let issued_long_ago = now_unix_secs() - 10 * 3_600;
        let token = issue_token(&settings, identity(), issued_long_ago).unwrap();
        assert_eq!(verify_token(&settings, &token), None);
    }

    #[test]
    fn passwords_hash_and_verify() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong password", &hash));
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(COOKIE, HeaderValue::from_static("lingo_session=xyz"));
        assert_eq!(token_from_headers(&headers), Some("abc".to_owned()));
    }

    #[test]
    fn cookie_token_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; lingo_session=xyz; lang=ha"),
        );
        assert_eq!(token_from_headers(&headers), Some("xyz".to_owned()));
        assert_eq!(token_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn cookie_attributes() {
        let cookie = session_cookie("tok", 60).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "lingo_session=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=60"
        );
    }
}
