use std::collections::BTreeSet;

use anyhow::Context as _;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use lingo_utils::points::{accumulate, level_for_points};
use lingo_utils::stages::Track;
use lingo_utils::streak::next_streak;

use crate::cache::invalidate_leaderboard;
use crate::database::Database;
use crate::impls::preferences::get_preferences;
use crate::model::profile::StagesCompleted;
use crate::realtime::{ChangeEvent, ChangeOp, Table};

/// Balance after an award has been applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ActivityTotals {
    pub points: i64,
    pub level: i64,
    pub streak_days: i32,
}

pub async fn stages_completed(db: &Database, user_id: Uuid) -> anyhow::Result<StagesCompleted> {
    let rows: Vec<(String, i32)> = sqlx::query_as(
        "SELECT track, level FROM stage_completions WHERE user_id = $1 ORDER BY level ASC",
    )
    .bind(user_id)
    .fetch_all(db.pool())
    .await?;

    let mut completed = StagesCompleted::default();
    for (track, level) in rows {
        match Track::parse(&track) {
            Some(Track::Vocabulary) => completed.vocabulary.push(level),
            Some(Track::Quiz) => completed.quiz.push(level),
            None => debug!(%user_id, track, "skipping completion with unknown track"),
        }
    }

    Ok(completed)
}

pub async fn completed_levels(
    db: &Database,
    user_id: Uuid,
    track: Track,
) -> anyhow::Result<BTreeSet<i32>> {
    let levels: Vec<i32> = sqlx::query_scalar(
        "SELECT level FROM stage_completions WHERE user_id = $1 AND track = $2",
    )
    .bind(user_id)
    .bind(track.as_str())
    .fetch_all(db.pool())
    .await?;

    Ok(levels.into_iter().collect())
}

/// Persist a completed stage. Returns `false` when it was already recorded,
/// so repeated completion handlers never append twice.
pub async fn append_completed_stage(
    db: &Database,
    user_id: Uuid,
    track: Track,
    level: i32,
) -> anyhow::Result<bool> {
    let inserted = sqlx::query(
        "INSERT INTO stage_completions (user_id, track, level)
         VALUES ($1, $2, $3)
         ON CONFLICT (user_id, track, level) DO NOTHING",
    )
    .bind(user_id)
    .bind(track.as_str())
    .bind(level)
    .execute(db.pool())
    .await?
    .rows_affected();

    if inserted > 0 {
        let completed = stages_completed(db, user_id).await?;
        db.notify(ChangeEvent::new(
            Table::Profiles,
            ChangeOp::Update,
            Some(user_id),
            serde_json::json!({ "id": user_id, "stages_completed": completed }),
        ));
    }

    Ok(inserted > 0)
}

pub async fn learned_word_indices(
    db: &Database,
    user_id: Uuid,
    stage_id: i64,
) -> anyhow::Result<Vec<usize>> {
    let indices: Vec<i32> = sqlx::query_scalar(
        "SELECT word_index FROM learned_words
         WHERE user_id = $1 AND stage_id = $2
         ORDER BY word_index ASC",
    )
    .bind(user_id)
    .bind(stage_id)
    .fetch_all(db.pool())
    .await?;

    indices
        .into_iter()
        .map(|index| usize::try_from(index).context("word_index out of usize range"))
        .collect()
}

/// Record a word as known. Returns `true` only the first time.
pub async fn record_learned_word(
    db: &Database,
    user_id: Uuid,
    stage_id: i64,
    word_index: usize,
) -> anyhow::Result<bool> {
    let word_index_i32 = i32::try_from(word_index).context("word_index out of i32 range")?;

    let inserted = sqlx::query(
        "INSERT INTO learned_words (user_id, stage_id, word_index)
         VALUES ($1, $2, $3)
         ON CONFLICT (user_id, stage_id, word_index) DO NOTHING",
    )
    .bind(user_id)
    .bind(stage_id)
    .bind(word_index_i32)
    .execute(db.pool())
    .await?
    .rows_affected();

    Ok(inserted > 0)
}

/// Credit correctly answered quiz questions. Returns the indices newly
/// credited by this call; questions credited on an earlier attempt are
/// skipped, so their points are never awarded twice.
pub async fn credit_quiz_answers(
    db: &Database,
    user_id: Uuid,
    stage_id: i64,
    question_indices: &[usize],
) -> anyhow::Result<Vec<usize>> {
    if question_indices.is_empty() {
        return Ok(Vec::new());
    }

    let indices = question_indices
        .iter()
        .map(|index| i32::try_from(*index).context("question_index out of i32 range"))
        .collect::<anyhow::Result<Vec<i32>>>()?;

    let credited: Vec<i32> = sqlx::query_scalar(
        "INSERT INTO quiz_answers (user_id, stage_id, question_index)
         SELECT $1, $2, UNNEST($3::INTEGER[])
         ON CONFLICT (user_id, stage_id, question_index) DO NOTHING
         RETURNING question_index",
    )
    .bind(user_id)
    .bind(stage_id)
    .bind(&indices)
    .fetch_all(db.pool())
    .await?;

    credited
        .into_iter()
        .map(|index| usize::try_from(index).context("question_index out of usize range"))
        .collect()
}

/// Add points and roll the daily streak forward for activity on `today`.
///
/// The row is locked for the duration so concurrent awards from several tabs
/// are applied one after another.
pub async fn record_activity(
    db: &Database,
    user_id: Uuid,
    awarded: i64,
    today: NaiveDate,
) -> anyhow::Result<ActivityTotals> {
    let mut tx = db.pool().begin().await?;

    let (points, streak_days, last_active_on): (i64, i32, Option<NaiveDate>) = sqlx::query_as(
        "SELECT points, streak_days, last_active_on FROM profiles WHERE id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .with_context(|| format!("no profile for user {user_id}"))?;

    let points = accumulate(points, awarded);
    let streak_days = next_streak(streak_days, last_active_on, today);

    sqlx::query(
        "UPDATE profiles
         SET points = $2, streak_days = $3, last_active_on = $4, updated_at = NOW()
         WHERE id = $1",
    )
    .bind(user_id)
    .bind(points)
    .bind(streak_days)
    .bind(today)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let totals = ActivityTotals {
        points,
        level: level_for_points(points),
        streak_days,
    };

    db.notify(ChangeEvent::new(
        Table::Profiles,
        ChangeOp::Update,
        Some(user_id),
        serde_json::json!({
            "id": user_id,
            "points": totals.points,
            "level": totals.level,
            "streak_days": totals.streak_days,
        }),
    ));

    if awarded > 0 {
        if let Some(preferences) = get_preferences(db, user_id).await? {
            invalidate_leaderboard(db.cache(), &preferences.primary_learning_language).await;
        }
    }

    Ok(totals)
}
