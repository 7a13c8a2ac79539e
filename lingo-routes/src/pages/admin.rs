use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;

use lingo_core::AppState;
use lingo_database::impls::admin::platform_totals;
use lingo_database::impls::quizzes::list_quiz_stages;
use lingo_database::impls::vocabulary::list_vocabulary_stages;
use lingo_utils::languages::{SUPPORTED_LANGUAGES, normalize_language};

use crate::api::admin::user_page;
use crate::error::ApiResult;
use crate::pages::{authorize, page_query};
use crate::session::CurrentSession;
use crate::views::{View, not_found_view};
use crate::{RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    path: "/admin",
    page: "admin",
    title: "Admin console",
    desc: "Platform totals for administrators.",
    access: RouteAccess::Admin,
};

pub const SECTION_META: RouteMeta = RouteMeta {
    path: "/admin/{*rest}",
    page: "admin",
    title: "Admin console",
    desc: "Users, vocabulary and quiz management.",
    access: RouteAccess::Admin,
};

#[derive(Debug, Default, Deserialize)]
pub struct SectionQuery {
    pub page: Option<usize>,
    pub search: Option<String>,
    pub language: Option<String>,
}

/// Admin sections reachable under `/admin/`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Users,
    Vocabulary,
    Quiz,
    Stats,
}

impl Section {
    pub fn parse(rest: &str) -> Option<Self> {
        match rest.trim_matches('/') {
            "users" => Some(Section::Users),
            "vocabulary" => Some(Section::Vocabulary),
            "quiz" => Some(Section::Quiz),
            "stats" | "" => Some(Section::Stats),
            _ => None,
        }
    }
}

pub async fn page(State(state): State<AppState>, session: CurrentSession) -> ApiResult<Response> {
    if let Err(response) = authorize(&session, &META) {
        return Ok(response);
    }

    let totals = platform_totals(&state.db).await?;
    Ok(View::new(META.page, META.title)
        .description("Manage learners and course content.")
        .data(json!({
            "totals": totals,
            "sections": ["/admin/users", "/admin/vocabulary", "/admin/quiz", "/admin/stats"],
        }))
        .into_response())
}

pub async fn section(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(rest): Path<String>,
    uri: Uri,
) -> ApiResult<Response> {
    if let Err(response) = authorize(&session, &SECTION_META) {
        return Ok(response);
    }
    let Query(query) = page_query::<SectionQuery>(&uri)?;

    let Some(section) = Section::parse(&rest) else {
        return Ok(not_found_view(&format!("/admin/{rest}")).with_status(StatusCode::NOT_FOUND));
    };

    let language = query
        .language
        .as_deref()
        .and_then(normalize_language)
        .unwrap_or(SUPPORTED_LANGUAGES[0]);

    let view = match section {
        Section::Users => {
            let data = user_page(&state, query.page.unwrap_or(1), query.search.as_deref()).await?;
            View::new("admin_users", "Users").data(data)
        }
        Section::Vocabulary => {
            let stages = list_vocabulary_stages(&state.db, language).await?;
            View::new("admin_vocabulary", format!("{language} vocabulary")).data(json!({
                "language": language,
                "languages": SUPPORTED_LANGUAGES,
                "stages": stages,
            }))
        }
        Section::Quiz => {
            let stages = list_quiz_stages(&state.db, language).await?;
            View::new("admin_quiz", format!("{language} quizzes")).data(json!({
                "language": language,
                "languages": SUPPORTED_LANGUAGES,
                "stages": stages,
            }))
        }
        Section::Stats => {
            let totals = platform_totals(&state.db).await?;
            View::new("admin_stats", "Platform stats").data(json!({ "totals": totals }))
        }
    };

    Ok(view.into_response())
}

#[cfg(test)]
mod tests {
    use super::Section;

    #[test]
    fn sections_parse_with_slashes() {
        assert_eq!(Section::parse("users/"), Some(Section::Users));
        assert_eq!(Section::parse("quiz"), Some(Section::Quiz));
        assert_eq!(Section::parse(""), Some(Section::Stats));
        assert_eq!(Section::parse("billing"), None);
    }
}
