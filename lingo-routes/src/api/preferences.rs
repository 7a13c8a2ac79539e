use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use lingo_core::AppState;
use lingo_database::impls::preferences::{get_preferences, set_preferences};
use lingo_database::model::preferences::LanguagePreferences;
use lingo_utils::languages::{SUPPORTED_LANGUAGES, normalize_language, normalize_language_list};

use crate::error::{ApiError, ApiResult};
use crate::session::AuthUser;

#[derive(Debug, Deserialize)]
pub struct PreferencesRequest {
    pub spoken_languages: Vec<String>,
    pub learning_languages: Vec<String>,
    pub primary_spoken_language: String,
    pub primary_learning_language: String,
}

fn normalized_list(raw: &[String], what: &str) -> Result<Vec<String>, String> {
    let languages = normalize_language_list(raw)
        .map_err(|unsupported| format!("`{unsupported}` is not a supported language."))?;
    if languages.is_empty() {
        return Err(format!("Pick at least one language you {what}."));
    }
    Ok(languages.into_iter().map(str::to_owned).collect())
}

/// Normalize names and check that each primary belongs to its list and that
/// the learner is not studying their own primary language.
pub fn validate_preferences(
    user_id: Uuid,
    request: &PreferencesRequest,
) -> Result<LanguagePreferences, String> {
    let spoken = normalized_list(&request.spoken_languages, "speak")?;
    let learning = normalized_list(&request.learning_languages, "want to learn")?;

    let primary_spoken = normalize_language(&request.primary_spoken_language)
        .filter(|language| spoken.iter().any(|entry| entry == language))
        .ok_or_else(|| "Your primary spoken language must be one of the languages you speak.".to_owned())?;
    let primary_learning = normalize_language(&request.primary_learning_language)
        .filter(|language| learning.iter().any(|entry| entry == language))
        .ok_or_else(|| "Your primary learning language must be one of the languages you are learning.".to_owned())?;

    if primary_spoken == primary_learning {
        return Err("Pick a learning language different from the one you speak.".to_owned());
    }

    Ok(LanguagePreferences {
        user_id,
        spoken_languages: spoken,
        learning_languages: learning,
        primary_spoken_language: primary_spoken.to_owned(),
        primary_learning_language: primary_learning.to_owned(),
    })
}

pub async fn get_own_preferences(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Value>> {
    let preferences = get_preferences(&state.db, user.user_id).await?;
    let learning = preferences.as_ref().map(LanguagePreferences::learning_pair);

    Ok(Json(json!({
        "needs_setup": preferences.is_none(),
        "preferences": preferences,
        "learning": learning,
    })))
}

pub async fn save_preferences(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<PreferencesRequest>,
) -> ApiResult<Json<Value>> {
    let preferences = validate_preferences(user.user_id, &request).map_err(ApiError::BadRequest)?;
    set_preferences(&state.db, &preferences).await?;

    Ok(Json(json!({
        "needs_setup": false,
        "learning": preferences.learning_pair(),
        "preferences": preferences,
    })))
}

pub async fn list_languages() -> Json<Value> {
    Json(json!({ "languages": SUPPORTED_LANGUAGES }))
}
