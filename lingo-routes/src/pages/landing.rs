use axum::response::{IntoResponse, Response};
use serde_json::json;

use lingo_utils::languages::SUPPORTED_LANGUAGES;

use crate::session::CurrentSession;
use crate::views::View;
use crate::{RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    path: "/",
    page: "landing",
    title: "Learn a language, one stage at a time",
    desc: "Public landing page with the supported languages.",
    access: RouteAccess::Public,
};

pub async fn page(session: CurrentSession) -> Response {
    let signed_in = session.state.is_authenticated();
    let next = if signed_in { "/dashboard" } else { "/auth" };

    View::new(META.page, META.title)
        .description("Earn points for every word you learn and climb the leaderboard.")
        .data(json!({
            "signed_in": signed_in,
            "continue_to": next,
            "languages": SUPPORTED_LANGUAGES,
        }))
        .into_response()
}
