use axum::extract::State;
use axum::response::{IntoResponse, Response};

use lingo_core::AppState;
use lingo_database::impls::preferences::get_preferences;

use crate::api::profile::profile_payload;
use crate::error::ApiResult;
use crate::pages::authorize;
use crate::session::CurrentSession;
use crate::views::{Notification, View};
use crate::{RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    path: "/dashboard",
    page: "dashboard",
    title: "Dashboard",
    desc: "Points, level, streak and words learned at a glance.",
    access: RouteAccess::Learner,
};

pub async fn page(State(state): State<AppState>, session: CurrentSession) -> ApiResult<Response> {
    let viewer = match authorize(&session, &META) {
        Ok(viewer) => viewer,
        Err(response) => return Ok(response),
    };

    let mut payload = profile_payload(&state, viewer.user_id).await?;
    let needs_setup = get_preferences(&state.db, viewer.user_id).await?.is_none();
    payload["needs_setup"] = needs_setup.into();

    let mut view = View::new(META.page, META.title).data(payload);
    if needs_setup {
        view = view.notify(Notification::info(
            "Choose the languages you speak and want to learn to get started.",
        ));
    }

    Ok(view.into_response())
}
