use axum::http::{StatusCode, Uri};
use axum::response::Response;

use crate::views::not_found_view;
use crate::{RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    path: "*",
    page: "not_found",
    title: "Page not found",
    desc: "Catch-all for unknown paths.",
    access: RouteAccess::Public,
};

pub async fn page(uri: Uri) -> Response {
    not_found_view(uri.path()).with_status(StatusCode::NOT_FOUND)
}
