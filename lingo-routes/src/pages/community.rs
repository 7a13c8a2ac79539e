use axum::extract::{Query, State};
use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use lingo_core::AppState;
use lingo_database::impls::profiles::community_members;

use crate::api::community::{COMMUNITY_LIMIT, CommunityQuery};
use crate::api::leaderboard::resolve_language;
use crate::error::ApiResult;
use crate::pages::{authorize, or_setup, page_query};
use crate::session::CurrentSession;
use crate::views::{Notification, View};
use crate::{RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    path: "/community",
    page: "community",
    title: "Community",
    desc: "Other learners studying the same language.",
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
    let Query(query) = page_query::<CommunityQuery>(&uri)?;

    let resolved = resolve_language(&state, viewer.user_id, query.language.as_deref()).await;
    let language = match or_setup(resolved, &META) {
        Ok(language) => language,
        Err(response) => return response,
    };
    let members = community_members(&state.db, &language, viewer.user_id, COMMUNITY_LIMIT).await?;

    let mut view = View::new(META.page, format!("{language} community"));
    if members.is_empty() {
        view = view.notify(Notification::info("Nobody else is learning this language yet."));
    }

    Ok(view
        .data(json!({ "language": language, "members": members }))
        .into_response())
}
