use uuid::Uuid;

use lingo_utils::points::level_for_points;

use crate::database::Database;
use crate::model::stats::UserStats;
use crate::realtime::{ChangeEvent, ChangeOp, Table};

#[derive(sqlx::FromRow)]
struct UserStatsRow {
    user_id: Uuid,
    words_learned: Option<i64>,
    streak_days: i32,
    points: i64,
    primary_spoken_language: Option<String>,
    primary_learning_language: Option<String>,
}

/// Aggregate view joining profile totals, learned words and languages.
pub async fn get_user_stats(db: &Database, user_id: Uuid) -> anyhow::Result<Option<UserStats>> {
    let row = sqlx::query_as::<_, UserStatsRow>(
        "SELECT p.id AS user_id, s.words_learned, p.streak_days, p.points,
                lp.primary_spoken_language, lp.primary_learning_language
         FROM profiles p
         LEFT JOIN user_stats s ON s.user_id = p.id
         LEFT JOIN language_preferences lp ON lp.user_id = p.id
         WHERE p.id = $1",
    )
    .bind(user_id)
    .fetch_optional(db.pool())
    .await?;

    Ok(row.map(|row| UserStats {
        user_id: row.user_id,
        words_learned: row.words_learned.unwrap_or(0),
        streak: row.streak_days,
        points: row.points,
        level: level_for_points(row.points),
        base_language: row.primary_spoken_language,
        target_language: row.primary_learning_language,
    }))
}

pub async fn ensure_user_stats(db: &Database, user_id: Uuid) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO user_stats (user_id) VALUES ($1)
         ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()",
    )
    .bind(user_id)
    .execute(db.pool())
    .await?;

    if let Some(stats) = get_user_stats(db, user_id).await? {
        db.notify(ChangeEvent::new(
            Table::UserStats,
            ChangeOp::Update,
            Some(user_id),
            stats,
        ));
    }

    Ok(())
}

/// Add newly learned words and return the new total.
pub async fn increment_words_learned(
    db: &Database,
    user_id: Uuid,
    by: i64,
) -> anyhow::Result<i64> {
    let total: i64 = sqlx::query_scalar(
        "INSERT INTO user_stats (user_id, words_learned) VALUES ($1, $2)
         ON CONFLICT (user_id) DO UPDATE
         SET words_learned = user_stats.words_learned + EXCLUDED.words_learned,
             updated_at = NOW()
         RETURNING words_learned",
    )
    .bind(user_id)
    .bind(by.max(0))
    .fetch_one(db.pool())
    .await?;

    db.notify(ChangeEvent::new(
        Table::UserStats,
        ChangeOp::Update,
        Some(user_id),
        serde_json::json!({ "user_id": user_id, "words_learned": total }),
    ));

    Ok(total)
}
