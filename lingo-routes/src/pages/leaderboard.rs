use axum::extract::{Query, State};
use axum::http::Uri;
use axum::response::{IntoResponse, Response};

use lingo_core::AppState;
use lingo_database::impls::leaderboard::{DEFAULT_LEADERBOARD_LIMIT, top_learners};

use crate::api::leaderboard::{LeaderboardQuery, resolve_language};
use crate::error::ApiResult;
use crate::pages::{authorize, or_setup, page_query};
use crate::session::CurrentSession;
use crate::views::leaderboard_view;
use crate::{RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    path: "/leaderboard",
    page: "leaderboard",
    title: "Leaderboard",
    desc: "Top learners of a language ranked by points.",
    access: RouteAccess::Learner,
};

pub async fn page(
    State(state): State<AppState>,
    session: CurrentSession,
    uri: Uri,
) -> ApiResult<Response> {
    let viewer = match authorize(&session, &META) {
        Ok(viewer) => viewer,
        Err(response) => return Ok(response),
    };
    let Query(query) = page_query::<LeaderboardQuery>(&uri)?;

    let resolved = resolve_language(&state, viewer.user_id, query.language.as_deref()).await;
    let language = match or_setup(resolved, &META) {
        Ok(language) => language,
        Err(response) => return response,
    };
    let limit = query.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
    let entries = top_learners(&state.db, &language, limit).await?;

    Ok(leaderboard_view(&language, &entries).into_response())
}
