use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use lingo_core::AppState;
use lingo_database::impls::profiles::{ProfileUpdate, get_profile, update_profile};
use lingo_database::impls::stats::get_user_stats;
use lingo_utils::formatting::{display_name, level_progress_label, streak_label};
use lingo_utils::points::LevelSummary;

use crate::api::auth::validate_username;
use crate::error::{ApiError, ApiResult};
use crate::session::AuthUser;

#[derive(Debug, Default, Deserialize)]
pub struct ProfileEdit {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

fn validate_avatar_url(url: &str) -> Result<(), ApiError> {
    let url = url.trim();
    if url.is_empty() || url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(ApiError::BadRequest("Avatar URL must start with http:// or https://.".to_owned()))
    }
}

pub(crate) async fn profile_payload(state: &AppState, user_id: Uuid) -> ApiResult<Value> {
    let profile = get_profile(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile"))?;
    let stats = get_user_stats(&state.db, user_id).await?;
    let summary = LevelSummary::from_points(profile.points);

    Ok(json!({
        "display_name": display_name(&profile.username, profile.full_name.as_deref()),
        "level": summary,
        "level_label": level_progress_label(&summary),
        "streak_label": streak_label(profile.streak_days),
        "stats": stats,
        "profile": profile,
    }))
}

pub async fn get_own_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Value>> {
    Ok(Json(profile_payload(&state, user.user_id).await?))
}

pub async fn update_own_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(edit): Json<ProfileEdit>,
) -> ApiResult<Json<Value>> {
    if let Some(username) = edit.username.as_deref() {
        validate_username(username)?;
    }
    if let Some(url) = edit.avatar_url.as_deref() {
        validate_avatar_url(url)?;
    }

    let update = ProfileUpdate {
        username: edit.username.as_deref(),
        full_name: edit.full_name.as_deref(),
        avatar_url: edit.avatar_url.as_deref(),
    };

    match update_profile(&state.db, user.user_id, update).await? {
        None => return Err(ApiError::not_found("Profile")),
        Some(false) => {
            return Err(ApiError::Conflict("That username is already taken.".to_owned()));
        }
        Some(true) => {}
    }

    Ok(Json(profile_payload(&state, user.user_id).await?))
}

pub async fn get_stats(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<Value>> {
    let stats = get_user_stats(&state.db, user.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Stats"))?;

    Ok(Json(json!({ "stats": stats })))
}

#[cfg(test)]
mod tests {
    use super::validate_avatar_url;

    #[test]
    fn avatar_urls_must_be_http() {
        assert!(validate_avatar_url("https://cdn.example.com/a.png").is_ok());
        assert!(validate_avatar_url("").is_ok());
        assert!(validate_avatar_url("javascript:alert(1)").is_err());
    }
}
