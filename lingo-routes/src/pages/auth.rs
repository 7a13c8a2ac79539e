use axum::response::{IntoResponse, Redirect, Response};
use serde_json::json;

use crate::api::auth::MIN_PASSWORD_LEN;
use crate::session::CurrentSession;
use crate::views::View;
use crate::{RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    path: "/auth",
    page: "auth",
    title: "Sign in",
    desc: "Sign-in, sign-up and password reset forms.",
    access: RouteAccess::Public,
};

/// Signed-in visitors go straight to their dashboard.
pub async fn page(session: CurrentSession) -> Response {
    if session.state.is_authenticated() {
        return Redirect::to("/dashboard").into_response();
    }

    View::new(META.page, META.title)
        .description("Sign in or create an account to start learning.")
        .data(json!({
            "sign_in": "/api/auth/sign-in",
            "sign_up": "/api/auth/sign-up",
            "reset": "/api/auth/reset",
            "reset_confirm": "/api/auth/reset/confirm",
            "min_password_length": MIN_PASSWORD_LEN,
        }))
        .into_response()
}
