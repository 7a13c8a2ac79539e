use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;
use serde_json::{Value, json};
use uuid::Uuid;

use lingo_core::AppState;
use lingo_database::impls::achievements::evaluate_achievements;
use lingo_database::impls::progress::{
    ActivityTotals, completed_levels, learned_word_indices, record_activity, record_learned_word,
};
use lingo_database::impls::stats::{get_user_stats, increment_words_learned};
use lingo_database::impls::vocabulary::{get_vocabulary_stage, list_vocabulary_stages};
use lingo_database::model::preferences::LearningPair;
use lingo_utils::achievements;
use lingo_utils::points::vocabulary_award;
use lingo_utils::stages::{MarkOutcome, StageProgress, Track, gate, next_stage, settle_stage};
use lingo_utils::time::today_utc;

use crate::api::{StageListing, learning_pair, persist_completion};
use crate::error::{ApiError, ApiResult};
use crate::session::AuthUser;
use crate::views::Notification;

/// Vocabulary stages of the learner's target language with their status.
pub(crate) async fn listing(
    state: &AppState,
    user_id: Uuid,
) -> ApiResult<(LearningPair, Vec<StageListing>)> {
    let pair = learning_pair(state, user_id).await?;
    let completed = completed_levels(&state.db, user_id, Track::Vocabulary).await?;
    let stages = list_vocabulary_stages(&state.db, &pair.target).await?;

    let listing = stages
        .iter()
        .map(|stage| StageListing::new(stage.id, stage.level, &stage.name, stage.words.len(), &completed))
        .collect();

    Ok((pair, listing))
}

pub async fn list_stages(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<Value>> {
    let (pair, stages) = listing(&state, user.user_id).await?;
    Ok(Json(json!({ "language": pair.target, "stages": stages })))
}

pub async fn get_stage(
    State(state): State<AppState>,
    user: AuthUser,
    Path(level): Path<i32>,
) -> ApiResult<Json<Value>> {
    let pair = learning_pair(&state, user.user_id).await?;
    let completed = completed_levels(&state.db, user.user_id, Track::Vocabulary).await?;
    gate(&completed, level)?;

    let stage = get_vocabulary_stage(&state.db, &pair.target, level)
        .await?
        .ok_or_else(|| ApiError::not_found("Stage"))?;
    let known = learned_word_indices(&state.db, user.user_id, stage.id).await?;
    let progress = StageProgress::with_known(stage.words.len(), known);

    Ok(Json(json!({
        "stage": stage,
        "known_indices": progress.known_indices(),
        "known_count": progress.known_count(),
        "total": progress.total(),
        "completed": completed.contains(&level),
    })))
}

#[derive(Debug, Serialize)]
pub struct MarkKnownResponse {
    pub level: i32,
    pub word_index: usize,
    pub newly_known: bool,
    pub points_awarded: i64,
    pub totals: ActivityTotals,
    pub words_learned: i64,
    pub known_count: usize,
    pub total: usize,
    pub stage_complete: bool,
    pub next_stage: Option<i32>,
    pub unlocked_achievements: Vec<&'static str>,
    pub notifications: Vec<Notification>,
}

/// Mark one word as known. Points are awarded the first time only; the
/// stage completes once every word is known after the write.
pub async fn mark_known(
    State(state): State<AppState>,
    user: AuthUser,
    Path((level, word_index)): Path<(i32, usize)>,
) -> ApiResult<Json<MarkKnownResponse>> {
    let user_id = user.user_id;
    let pair = learning_pair(&state, user_id).await?;
    let mut completed = completed_levels(&state.db, user_id, Track::Vocabulary).await?;
    gate(&completed, level)?;

    let stage = get_vocabulary_stage(&state.db, &pair.target, level)
        .await?
        .ok_or_else(|| ApiError::not_found("Stage"))?;
    let known = learned_word_indices(&state.db, user_id, stage.id).await?;
    let outcome = StageProgress::with_known(stage.words.len(), known).mark_known(word_index);
    let word = match (outcome, stage.words.get(word_index)) {
        (MarkOutcome::OutOfRange, _) | (_, None) => return Err(ApiError::not_found("Word")),
        (_, Some(word)) => word,
    };

    let mut notifications = Vec::new();

    // A concurrent request may have recorded the same word first.
    let newly_known = outcome != MarkOutcome::AlreadyKnown
        && record_learned_word(&state.db, user_id, stage.id, word_index).await?;

    let points_awarded = if newly_known {
        vocabulary_award(word.difficulty())
    } else {
        0
    };
    if newly_known {
        increment_words_learned(&state.db, user_id, 1).await?;
        notifications.push(Notification::success(format!(
            "+{points_awarded} XP for learning \"{}\".",
            word.word
        )));
    }

    let totals = record_activity(&state.db, user_id, points_awarded, today_utc()).await?;

    // Re-read so a concurrent mark of another word counts toward completion.
    let known = learned_word_indices(&state.db, user_id, stage.id).await?;
    let (progress, completion) = settle_stage(stage.words.len(), known, &mut completed, level);

    let stage_complete = completion.is_some();
    let mut next = None;
    if let Some(completion) = completion {
        if persist_completion(&state, user_id, Track::Vocabulary, level, completion).await? {
            notifications.push(Notification::success(format!("Stage {level} complete!")));
        }
        let levels: Vec<i32> = list_vocabulary_stages(&state.db, &pair.target)
            .await?
            .iter()
            .map(|stage| stage.level)
            .collect();
        next = next_stage(&levels, level);
        if let Some(next) = next {
            notifications.push(Notification::info(format!("Stage {next} is now unlocked.")));
        }
    }

    let unlocked = evaluate_achievements(&state.db, user_id).await?;
    for key in &unlocked {
        if let Some(achievement) = achievements::find(key) {
            notifications.push(Notification::success(format!(
                "Achievement unlocked: {}",
                achievement.title
            )));
        }
    }

    let words_learned = get_user_stats(&state.db, user_id)
        .await?
        .map_or(0, |stats| stats.words_learned);

    Ok(Json(MarkKnownResponse {
        level,
        word_index,
        newly_known,
        points_awarded,
        totals,
        words_learned,
        known_count: progress.known_count(),
        total: progress.total(),
        stage_complete,
        next_stage: next,
        unlocked_achievements: unlocked,
        notifications,
    }))
}
