use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use lingo_core::AppState;
use lingo_utils::stages::StageStatus;

use crate::api::{StageListing, quiz, vocabulary};
use crate::error::ApiResult;
use crate::pages::{authorize, or_setup};
use crate::session::CurrentSession;
use crate::views::View;
use crate::{RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    path: "/course",
    page: "course",
    title: "Course",
    desc: "Both stage tracks for the learner's target language.",
    access: RouteAccess::Learner,
};

fn completed_count(stages: &[StageListing]) -> usize {
    stages
        .iter()
        .filter(|stage| stage.status == StageStatus::Completed)
        .count()
}

pub async fn page(State(state): State<AppState>, session: CurrentSession) -> ApiResult<Response> {
    let viewer = match authorize(&session, &META) {
        Ok(viewer) => viewer,
        Err(response) => return Ok(response),
    };

    let (pair, vocabulary_stages) = match or_setup(vocabulary::listing(&state, viewer.user_id).await, &META) {
        Ok(listing) => listing,
        Err(response) => return response,
    };
    let (_, quiz_stages) = quiz::listing(&state, viewer.user_id).await?;

    let view = View::new(META.page, format!("{} course", pair.target))
        .description(format!("Learning {} from {}.", pair.target, pair.base))
        .data(json!({
            "language": pair,
            "vocabulary": {
                "completed": completed_count(&vocabulary_stages),
                "total": vocabulary_stages.len(),
                "stages": vocabulary_stages,
            },
            "quiz": {
                "completed": completed_count(&quiz_stages),
                "total": quiz_stages.len(),
                "stages": quiz_stages,
            },
        }));

    Ok(view.into_response())
}
