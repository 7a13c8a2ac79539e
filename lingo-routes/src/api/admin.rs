use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use lingo_core::AppState;
use lingo_database::impls::ContentWrite;
use lingo_database::impls::admin::platform_totals;
use lingo_database::impls::profiles::{count_profiles, list_profiles, set_role};
use lingo_database::impls::quizzes::{
    create_quiz_stage, delete_quiz_stage, list_quiz_stages, update_quiz_stage,
};
use lingo_database::impls::vocabulary::{
    create_vocabulary_stage, delete_vocabulary_stage, list_vocabulary_stages,
    update_vocabulary_stage,
};
use lingo_database::model::content::{NewQuizStage, NewVocabularyStage};
use lingo_utils::access::Role;
use lingo_utils::languages::normalize_language;
use lingo_utils::pagination::{DEFAULT_PAGE_SIZE, limit_offset, total_pages};

use crate::error::{ApiError, ApiResult};
use crate::session::AdminUser;

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub page: Option<usize>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoleChange {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    pub language: String,
}

fn supported_language(raw: &str) -> ApiResult<&'static str> {
    normalize_language(raw)
        .ok_or_else(|| ApiError::BadRequest(format!("`{}` is not a supported language.", raw.trim())))
}

fn content_result<T: serde::Serialize>(
    write: ContentWrite<T>,
    created: bool,
) -> ApiResult<(StatusCode, Json<Value>)> {
    match write {
        ContentWrite::Saved(stage) => {
            let status = if created { StatusCode::CREATED } else { StatusCode::OK };
            Ok((status, Json(json!({ "stage": stage }))))
        }
        ContentWrite::Conflict => Err(ApiError::Conflict(
            "A stage with this language and level already exists.".to_owned(),
        )),
        ContentWrite::NotFound => Err(ApiError::not_found("Stage")),
    }
}

pub(crate) async fn user_page(
    state: &AppState,
    page: usize,
    search: Option<&str>,
) -> ApiResult<Value> {
    let page = page.max(1);
    let (limit, offset) = limit_offset(DEFAULT_PAGE_SIZE, page);
    let users = list_profiles(&state.db, search, limit, offset).await?;
    let total = count_profiles(&state.db, search).await?;
    let total = usize::try_from(total).unwrap_or(0);

    Ok(json!({
        "users": users,
        "page": page,
        "per_page": DEFAULT_PAGE_SIZE,
        "total": total,
        "total_pages": total_pages(total, DEFAULT_PAGE_SIZE),
        "search": search,
    }))
}

pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<Value>> {
    let search = query.search.as_deref();
    Ok(Json(user_page(&state, query.page.unwrap_or(1), search).await?))
}

pub async fn change_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<Uuid>,
    Json(change): Json<RoleChange>,
) -> ApiResult<Json<Value>> {
    let role = Role::parse(&change.role)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown role `{}`.", change.role.trim())))?;

    if user_id == admin.user_id && role != Role::Admin {
        return Err(ApiError::BadRequest("You cannot remove your own admin role.".to_owned()));
    }

    if !set_role(&state.db, user_id, role).await? {
        return Err(ApiError::not_found("User"));
    }
    info!(admin_id = %admin.user_id, %user_id, role = %role, "admin changed user role");

    Ok(Json(json!({ "user_id": user_id, "role": role })))
}

pub async fn stats(State(state): State<AppState>, AdminUser(_admin): AdminUser) -> ApiResult<Json<Value>> {
    let totals = platform_totals(&state.db).await?;
    Ok(Json(json!({ "totals": totals })))
}

pub async fn list_vocabulary(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<ContentQuery>,
) -> ApiResult<Json<Value>> {
    let language = supported_language(&query.language)?;
    let stages = list_vocabulary_stages(&state.db, language).await?;
    Ok(Json(json!({ "language": language, "stages": stages })))
}

fn prepare_vocabulary(mut stage: NewVocabularyStage) -> ApiResult<NewVocabularyStage> {
    stage.language = supported_language(&stage.language)?.to_owned();
    stage.validate().map_err(ApiError::BadRequest)?;
    Ok(stage)
}

pub async fn create_vocabulary(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(stage): Json<NewVocabularyStage>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let stage = prepare_vocabulary(stage)?;
    let write = create_vocabulary_stage(&state.db, &stage).await?;
    info!(admin_id = %admin.user_id, language = %stage.language, level = stage.level, "vocabulary stage created");
    content_result(write, true)
}

pub async fn update_vocabulary(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
    Json(stage): Json<NewVocabularyStage>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let stage = prepare_vocabulary(stage)?;
    content_result(update_vocabulary_stage(&state.db, id, &stage).await?, false)
}

pub async fn delete_vocabulary(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if delete_vocabulary_stage(&state.db, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Stage"))
    }
}

pub async fn list_quiz(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<ContentQuery>,
) -> ApiResult<Json<Value>> {
    let language = supported_language(&query.language)?;
    let stages = list_quiz_stages(&state.db, language).await?;
    Ok(Json(json!({ "language": language, "stages": stages })))
}

fn prepare_quiz(mut stage: NewQuizStage) -> ApiResult<NewQuizStage> {
    stage.language = supported_language(&stage.language)?.to_owned();
    stage.validate().map_err(ApiError::BadRequest)?;
    Ok(stage)
}

pub async fn create_quiz(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(stage): Json<NewQuizStage>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let stage = prepare_quiz(stage)?;
    let write = create_quiz_stage(&state.db, &stage).await?;
    info!(admin_id = %admin.user_id, language = %stage.language, level = stage.level, "quiz stage created");
    content_result(write, true)
}

pub async fn update_quiz(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
    Json(stage): Json<NewQuizStage>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let stage = prepare_quiz(stage)?;
    content_result(update_quiz_stage(&state.db, id, &stage).await?, false)
}

pub async fn delete_quiz(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if delete_quiz_stage(&state.db, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Stage"))
    }
}

#[cfg(test)]
mod tests {
    use lingo_database::model::content::{NewVocabularyStage, VocabularyWord};

    use super::{prepare_vocabulary, supported_language};

    #[test]
    fn content_languages_are_normalized() {
        assert_eq!(supported_language(" yoruba ").unwrap(), "Yoruba");
        assert!(supported_language("Latin").is_err());

        let stage = prepare_vocabulary(NewVocabularyStage {
            language: "hausa".to_owned(),
            level: 1,
            name: "Greetings".to_owned(),
            words: vec![VocabularyWord {
                word: "sannu".to_owned(),
                translation: "hello".to_owned(),
                difficulty: "easy".to_owned(),
                audio_url: None,
            }],
        })
        .unwrap();
        assert_eq!(stage.language, "Hausa");
    }
}
