use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use lingo_core::AppState;
use lingo_database::impls::accounts::{
    SignUpOutcome, create_account, find_account_by_email, update_password_hash,
};
use lingo_database::impls::profiles::{ProfileUpdate, get_profile, update_profile};
use lingo_database::impls::sessions::{
    consume_password_reset, create_password_reset, create_session, revoke_all_sessions,
    revoke_session,
};
use lingo_utils::access::SessionState;
use lingo_utils::time::now_unix_secs;

use crate::error::{ApiError, ApiResult};
use crate::session::{
    CurrentSession, TokenIdentity, cleared_session_cookie, hash_password, issue_token,
    session_cookie, verify_password,
};

pub const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetConfirmRequest {
    pub token: Uuid,
    pub password: String,
}

pub(crate) fn validate_email(email: &str) -> Result<(), ApiError> {
    let email = email.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        });

    if valid && !email.contains(char::is_whitespace) {
        Ok(())
    } else {
        Err(ApiError::BadRequest("Enter a valid email address.".to_owned()))
    }
}

pub(crate) fn validate_password(password: &str) -> Result<(), ApiError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        )));
    }
    if length > MAX_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at most {MAX_PASSWORD_LEN} characters."
        )));
    }
    Ok(())
}

/// Usernames are 3-32 characters of letters, digits, `_` or `.`.
pub(crate) fn validate_username(username: &str) -> Result<(), ApiError> {
    let username = username.trim();
    let length = username.chars().count();
    let allowed = username
        .chars()
        .all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '.');

    if (3..=32).contains(&length) && allowed {
        Ok(())
    } else {
        Err(ApiError::BadRequest(
            "Usernames are 3-32 characters of letters, digits, `_` or `.`.".to_owned(),
        ))
    }
}

/// Create a session row, sign its token and set the cookie.
async fn establish_session(state: &AppState, user_id: Uuid, status: StatusCode) -> ApiResult<Response> {
    let session = create_session(&state.db, user_id, state.auth.session_ttl).await?;
    let token = issue_token(
        &state.auth,
        TokenIdentity {
            user_id,
            session_id: session.id,
        },
        now_unix_secs(),
    )?;
    let cookie = session_cookie(&token, state.auth.session_ttl.as_secs())?;
    let profile = get_profile(&state.db, user_id).await?;

    info!(%user_id, session_id = %session.id, "session established");

    Ok((
        status,
        [(SET_COOKIE, cookie)],
        Json(json!({
            "token": token,
            "expires_at": session.expires_at,
            "profile": profile,
        })),
    )
        .into_response())
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> ApiResult<Response> {
    validate_email(&request.email)?;
    validate_password(&request.password)?;
    validate_username(&request.username)?;

    let password_hash = hash_password(&request.password)?;
    let outcome =
        create_account(&state.db, &request.email, &password_hash, &request.username).await?;

    let user_id = match outcome {
        SignUpOutcome::Created(user_id) => user_id,
        SignUpOutcome::EmailTaken => {
            return Err(ApiError::Conflict(
                "An account with this email already exists.".to_owned(),
            ));
        }
        SignUpOutcome::UsernameTaken => {
            return Err(ApiError::Conflict("That username is already taken.".to_owned()));
        }
    };

    if let Some(full_name) = request.full_name.as_deref().filter(|name| !name.trim().is_empty()) {
        update_profile(
            &state.db,
            user_id,
            ProfileUpdate {
                full_name: Some(full_name),
                ..ProfileUpdate::default()
            },
        )
        .await?;
    }

    establish_session(&state, user_id, StatusCode::CREATED).await
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> ApiResult<Response> {
    let invalid = || ApiError::InvalidCredentials("Invalid email or password.".to_owned());

    let account = find_account_by_email(&state.db, &request.email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&request.password, &account.password_hash) {
        info!(user_id = %account.id, "sign-in rejected");
        return Err(invalid());
    }

    establish_session(&state, account.id, StatusCode::OK).await
}

/// Revoke the current session, if any, and clear the cookie.
pub async fn sign_out(
    State(state): State<AppState>,
    session: CurrentSession,
) -> ApiResult<Response> {
    if let Some(session_id) = session.session_id {
        revoke_session(&state.db, session_id).await?;
        info!(%session_id, "session revoked");
    }

    Ok((
        [(SET_COOKIE, cleared_session_cookie())],
        Json(json!({ "signed_out": true })),
    )
        .into_response())
}

/// Always answers the same way so account existence is not revealed.
pub async fn request_reset(
    State(state): State<AppState>,
    Json(request): Json<ResetRequest>,
) -> ApiResult<Response> {
    validate_email(&request.email)?;

    if let Some(account) = find_account_by_email(&state.db, &request.email).await? {
        let token = create_password_reset(&state.db, account.id).await?;
        info!(user_id = %account.id, %token, "password reset requested");
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "requested": true,
            "notification": "If that email has an account, a reset link is on its way.",
        })),
    )
        .into_response())
}

pub async fn confirm_reset(
    State(state): State<AppState>,
    Json(request): Json<ResetConfirmRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    validate_password(&request.password)?;

    let user_id = consume_password_reset(&state.db, request.token)
        .await?
        .ok_or_else(|| ApiError::BadRequest("This reset link is invalid or has expired.".to_owned()))?;

    let password_hash = hash_password(&request.password)?;
    update_password_hash(&state.db, user_id, &password_hash).await?;
    let revoked = revoke_all_sessions(&state.db, user_id).await?;
    info!(%user_id, revoked, "password reset completed");

    Ok(Json(json!({
        "reset": true,
        "notification": "Your password has been updated. Please sign in again.",
    })))
}

pub async fn current_session(
    State(state): State<AppState>,
    session: CurrentSession,
) -> ApiResult<Json<serde_json::Value>> {
    match session.state {
        SessionState::Established { user_id, role } => {
            let profile = get_profile(&state.db, user_id).await?;
            Ok(Json(json!({
                "authenticated": true,
                "user_id": user_id,
                "role": role,
                "profile": profile,
            })))
        }
        SessionState::Absent | SessionState::Pending => Ok(Json(json!({
            "authenticated": false,
            "pending": session.state == SessionState::Pending,
            "user_id": null,
            "role": null,
            "profile": null,
        }))),
    }
}

#[cfg(test)]
mod tests {
    use super::{validate_email, validate_password, validate_username};

    #[test]
    fn emails_need_local_part_and_dotted_domain() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("  ada@example.com ").is_ok());
        assert!(validate_email("ada@localhost").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada example@x.com").is_err());
        assert!(validate_email("ada@.com").is_err());
    }

    #[test]
    fn passwords_have_length_bounds() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn usernames_are_restricted() {
        assert!(validate_username("ada_l").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("émile.k").is_ok());
    }
}
