use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use lingo_core::AppState;
use lingo_utils::points::QUIZ_PASS_PERCENT;

use crate::api::quiz::listing;
use crate::error::ApiResult;
use crate::pages::{authorize, or_setup};
use crate::session::CurrentSession;
use crate::views::{Notification, View};
use crate::{RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    path: "/quiz",
    page: "quiz",
    title: "Quizzes",
    desc: "Quiz stages with completed, unlocked and locked status.",
    access: RouteAccess::Learner,
};

pub async fn page(State(state): State<AppState>, session: CurrentSession) -> ApiResult<Response> {
    let viewer = match authorize(&session, &META) {
        Ok(viewer) => viewer,
        Err(response) => return Ok(response),
    };

    let (pair, stages) = match or_setup(listing(&state, viewer.user_id).await, &META) {
        Ok(listing) => listing,
        Err(response) => return response,
    };

    let mut view = View::new(META.page, format!("{} quizzes", pair.target))
        .description(format!("Score {QUIZ_PASS_PERCENT}% or more to pass a stage."));
    if stages.is_empty() {
        view = view.notify(Notification::info("No quizzes have been published yet."));
    }

    Ok(view
        .data(json!({
            "language": pair.target,
            "pass_percent": QUIZ_PASS_PERCENT,
            "stages": stages,
        }))
        .into_response())
}
