pub mod achievements;
pub mod admin;
pub mod auth;
pub mod community;
pub mod course;
pub mod dashboard;
pub mod landing;
pub mod leaderboard;
pub mod not_found;
pub mod quiz;
pub mod vocabulary;

use axum::extract::Query;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use lingo_utils::access::{AccessDecision, Role, SIGNED_OUT_REDIRECT, SessionState, route_access};

use crate::RouteMeta;
use crate::error::{ApiError, ApiResult};
use crate::session::CurrentSession;
use crate::views::{access_denied_view, loading_view, setup_required_view};

/// Signed-in learner allowed onto a page.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Viewer {
    pub user_id: Uuid,
    pub role: Role,
}

/// Apply the route predicate. The error side is the response to send
/// instead of the page: a redirect, a loading view or access denied.
pub(crate) fn authorize(session: &CurrentSession, meta: &RouteMeta) -> Result<Viewer, Response> {
    match route_access(&session.state, meta.access.required_role()) {
        AccessDecision::Allow => match session.state {
            SessionState::Established { user_id, role } => Ok(Viewer { user_id, role }),
            _ => Err(Redirect::to(SIGNED_OUT_REDIRECT).into_response()),
        },
        AccessDecision::Wait => Err(loading_view(meta.page).into_response()),
        AccessDecision::Redirect(to) => Err(Redirect::to(to).into_response()),
        AccessDecision::Denied => Err(access_denied_view().with_status(StatusCode::FORBIDDEN)),
    }
}

/// Parse a page's query string. Pages call this after [`authorize`] so
/// signed-out visitors are redirected whatever the query holds.
pub(crate) fn page_query<T: DeserializeOwned>(uri: &Uri) -> ApiResult<Query<T>> {
    Query::try_from_uri(uri).map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// Turn a missing-preferences failure into the language setup view.
pub(crate) fn or_setup<T>(result: ApiResult<T>, meta: &RouteMeta) -> Result<T, ApiResult<Response>> {
    match result {
        Ok(value) => Ok(value),
        Err(ApiError::SetupRequired) => {
            Err(Ok(setup_required_view(meta.page, meta.title).into_response()))
        }
        Err(err) => Err(Err(err)),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{StatusCode, Uri};
    use axum::http::header::LOCATION;
    use uuid::Uuid;

    use lingo_utils::access::{Role, SessionState};

    use serde::Deserialize;

    use super::{authorize, page_query};
    use crate::error::ApiError;
    use crate::session::CurrentSession;
    use crate::{RouteAccess, RouteMeta};

    const LEARNER_PAGE: RouteMeta = RouteMeta {
        path: "/dashboard",
        page: "dashboard",
        title: "Dashboard",
        desc: "",
        access: RouteAccess::Learner,
    };

    const ADMIN_PAGE: RouteMeta = RouteMeta {
        path: "/admin",
        page: "admin",
        title: "Admin",
        desc: "",
        access: RouteAccess::Admin,
    };

    fn session(role: Role) -> CurrentSession {
        CurrentSession {
            state: SessionState::Established {
                user_id: Uuid::new_v4(),
                role,
            },
            session_id: Some(Uuid::new_v4()),
        }
    }

    #[test]
    fn absent_session_redirects_to_landing() {
        let response = authorize(&CurrentSession::absent(), &LEARNER_PAGE).unwrap_err();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/");
    }

    #[test]
    fn learners_are_denied_admin_pages() {
        let response = authorize(&session(Role::User), &ADMIN_PAGE).unwrap_err();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(authorize(&session(Role::User), &LEARNER_PAGE).is_ok());
        assert!(authorize(&session(Role::Admin), &ADMIN_PAGE).is_ok());
    }

    #[derive(Debug, Deserialize)]
    struct Paging {
        page: Option<usize>,
    }

    #[test]
    fn page_queries_parse_or_reject() {
        let uri: Uri = "/admin/users?page=3".parse().unwrap();
        assert_eq!(page_query::<Paging>(&uri).unwrap().0.page, Some(3));

        let uri: Uri = "/admin/users".parse().unwrap();
        assert_eq!(page_query::<Paging>(&uri).unwrap().0.page, None);

        let uri: Uri = "/admin/users?page=x".parse().unwrap();
        assert!(matches!(page_query::<Paging>(&uri), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn pending_session_renders_loading() {
        let pending = CurrentSession {
            state: SessionState::Pending,
            session_id: None,
        };
        let response = authorize(&pending, &LEARNER_PAGE).unwrap_err();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
