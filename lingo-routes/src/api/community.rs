use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use lingo_core::AppState;
use lingo_database::impls::profiles::community_members;

use crate::api::leaderboard::resolve_language;
use crate::error::ApiResult;
use crate::session::AuthUser;

pub const COMMUNITY_LIMIT: i64 = 50;

#[derive(Debug, Default, Deserialize)]
pub struct CommunityQuery {
    pub language: Option<String>,
}

/// Other learners studying the same language.
pub async fn list_members(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<CommunityQuery>,
) -> ApiResult<Json<Value>> {
    let language = resolve_language(&state, user.user_id, query.language.as_deref()).await?;
    let members = community_members(&state.db, &language, user.user_id, COMMUNITY_LIMIT).await?;

    Ok(Json(json!({
        "language": language,
        "members": members,
    })))
}
