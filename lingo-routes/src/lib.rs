pub mod api;
pub mod error;
pub mod pages;
pub mod router;
pub mod session;
pub mod views;

use lingo_utils::access::Role;

pub use router::build_router;

/// Who may open a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    Learner,
    Admin,
}

impl RouteAccess {
    /// Role the route predicate requires; `None` for any signed-in learner.
    pub fn required_role(self) -> Option<Role> {
        match self {
            RouteAccess::Public | RouteAccess::Learner => None,
            RouteAccess::Admin => Some(Role::Admin),
        }
    }
}

pub struct RouteMeta {
    pub path: &'static str,
    pub page: &'static str,
    pub title: &'static str,
    pub desc: &'static str,
    pub access: RouteAccess,
}

pub const ROUTES: &[RouteMeta] = &[
    pages::landing::META,
    pages::auth::META,
    pages::dashboard::META,
    pages::course::META,
    pages::quiz::META,
    pages::leaderboard::META,
    pages::vocabulary::META,
    pages::achievements::META,
    pages::community::META,
    pages::admin::META,
    pages::admin::SECTION_META,
    pages::not_found::META,
];

pub fn find_route(path: &str) -> Option<&'static RouteMeta> {
    ROUTES.iter().find(|route| route.path == path)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{ROUTES, RouteAccess, find_route};

    #[test]
    fn route_paths_are_unique() {
        let paths: HashSet<_> = ROUTES.iter().map(|route| route.path).collect();
        assert_eq!(paths.len(), ROUTES.len());
    }

    #[test]
    fn admin_routes_require_admin_role() {
        for route in ROUTES.iter().filter(|route| route.path.starts_with("/admin")) {
            assert_eq!(route.access, RouteAccess::Admin, "{}", route.path);
        }
        assert_eq!(find_route("/dashboard").map(|route| route.access), Some(RouteAccess::Learner));
        assert_eq!(find_route("/").map(|route| route.access), Some(RouteAccess::Public));
    }
}
