//! Axum router construction.

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::trace::TraceLayer;

use lingo_core::AppState;

use crate::api;
use crate::pages;

/// Build the complete router: page views, the JSON API and the 404 fallback.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Pages
        .route(pages::landing::META.path, get(pages::landing::page))
        .route(pages::auth::META.path, get(pages::auth::page))
        .route(pages::dashboard::META.path, get(pages::dashboard::page))
        .route(pages::course::META.path, get(pages::course::page))
        .route(pages::quiz::META.path, get(pages::quiz::page))
        .route(pages::leaderboard::META.path, get(pages::leaderboard::page))
        .route(pages::vocabulary::META.path, get(pages::vocabulary::page))
        .route(pages::achievements::META.path, get(pages::achievements::page))
        .route(pages::community::META.path, get(pages::community::page))
        .route(pages::admin::META.path, get(pages::admin::page))
        .route(pages::admin::SECTION_META.path, get(pages::admin::section))
        // Auth API
        .route("/api/auth/sign-up", post(api::auth::sign_up))
        .route("/api/auth/sign-in", post(api::auth::sign_in))
        .route("/api/auth/sign-out", post(api::auth::sign_out))
        .route("/api/auth/reset", post(api::auth::request_reset))
        .route("/api/auth/reset/confirm", post(api::auth::confirm_reset))
        .route("/api/auth/session", get(api::auth::current_session))
        // Learner API
        .route(
            "/api/profile",
            get(api::profile::get_own_profile).put(api::profile::update_own_profile),
        )
        .route("/api/stats", get(api::profile::get_stats))
        .route(
            "/api/preferences",
            get(api::preferences::get_own_preferences).put(api::preferences::save_preferences),
        )
        .route("/api/languages", get(api::preferences::list_languages))
        .route("/api/vocabulary/stages", get(api::vocabulary::list_stages))
        .route("/api/vocabulary/stages/{level}", get(api::vocabulary::get_stage))
        .route(
            "/api/vocabulary/stages/{level}/words/{index}/known",
            post(api::vocabulary::mark_known),
        )
        .route("/api/quiz/stages", get(api::quiz::list_stages))
        .route("/api/quiz/stages/{level}", get(api::quiz::get_stage))
        .route("/api/quiz/stages/{level}/submit", post(api::quiz::submit))
        .route("/api/leaderboard", get(api::leaderboard::get_leaderboard))
        .route("/api/achievements", get(api::achievements::list_achievements))
        .route("/api/community", get(api::community::list_members))
        .route("/api/realtime/{table}", get(api::realtime::subscribe))
        // Admin API
        .route("/api/admin/users", get(api::admin::list_users))
        .route("/api/admin/users/{id}/role", put(api::admin::change_role))
        .route("/api/admin/stats", get(api::admin::stats))
        .route(
            "/api/admin/vocabulary",
            get(api::admin::list_vocabulary).post(api::admin::create_vocabulary),
        )
        .route(
            "/api/admin/vocabulary/{id}",
            put(api::admin::update_vocabulary).delete(api::admin::delete_vocabulary),
        )
        .route(
            "/api/admin/quiz",
            get(api::admin::list_quiz).post(api::admin::create_quiz),
        )
        .route(
            "/api/admin/quiz/{id}",
            put(api::admin::update_quiz).delete(api::admin::delete_quiz),
        )
        .fallback(pages::not_found::page)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
