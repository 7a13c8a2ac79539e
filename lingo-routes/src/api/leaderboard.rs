use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use lingo_core::AppState;
use lingo_database::impls::leaderboard::{DEFAULT_LEADERBOARD_LIMIT, top_learners};
use lingo_utils::languages::normalize_language;

use crate::api::learning_pair;
use crate::error::{ApiError, ApiResult};
use crate::session::AuthUser;
use crate::views::EMPTY_LEADERBOARD_MESSAGE;

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub language: Option<String>,
    pub limit: Option<usize>,
}

/// Requested language, falling back to the learner's target language.
pub(crate) async fn resolve_language(
    state: &AppState,
    user_id: Uuid,
    requested: Option<&str>,
) -> ApiResult<String> {
    match requested.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => normalize_language(raw)
            .map(str::to_owned)
            .ok_or_else(|| ApiError::BadRequest(format!("`{raw}` is not a supported language."))),
        None => Ok(learning_pair(state, user_id).await?.target),
    }
}

pub async fn get_leaderboard(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LeaderboardQuery>,
) -> ApiResult<Json<Value>> {
    let language = resolve_language(&state, user.user_id, query.language.as_deref()).await?;
    let limit = query.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
    let entries = top_learners(&state.db, &language, limit).await?;

    let message = entries.is_empty().then_some(EMPTY_LEADERBOARD_MESSAGE);
    Ok(Json(json!({
        "language": language,
        "entries": entries,
        "message": message,
    })))
}
