use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use lingo_core::AppState;
use lingo_database::impls::profiles::get_profile;

use crate::api::achievements::achievement_statuses;
use crate::error::{ApiError, ApiResult};
use crate::pages::authorize;
use crate::session::CurrentSession;
use crate::views::View;
use crate::{RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    path: "/achievements",
    page: "achievements",
    title: "Achievements",
    desc: "Achievement catalog with the learner's unlocked badges.",
    access: RouteAccess::Learner,
};

pub async fn page(State(state): State<AppState>, session: CurrentSession) -> ApiResult<Response> {
    let viewer = match authorize(&session, &META) {
        Ok(viewer) => viewer,
        Err(response) => return Ok(response),
    };

    let profile = get_profile(&state.db, viewer.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile"))?;
    let statuses = achievement_statuses(&profile.achievements);
    let unlocked = statuses.iter().filter(|status| status.unlocked).count();

    Ok(View::new(META.page, META.title)
        .description(format!("{unlocked} of {} unlocked.", statuses.len()))
        .data(json!({ "achievements": statuses, "unlocked": unlocked }))
        .into_response())
}
