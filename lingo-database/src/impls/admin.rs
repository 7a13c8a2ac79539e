use serde::Serialize;

use crate::database::Database;
use crate::impls::quizzes::count_quiz_stages;
use crate::impls::vocabulary::count_vocabulary_stages;

/// Platform-wide counters for the admin dashboard.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PlatformTotals {
    pub users: i64,
    pub admins: i64,
    pub vocabulary_stages: i64,
    pub quiz_stages: i64,
    pub stage_completions: i64,
    pub words_learned: i64,
}

pub async fn platform_totals(db: &Database) -> anyhow::Result<PlatformTotals> {
    let (users, admins): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE role = 'admin') FROM profiles",
    )
    .fetch_one(db.pool())
    .await?;

    let stage_completions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stage_completions")
        .fetch_one(db.pool())
        .await?;

    let words_learned: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(words_learned), 0)::BIGINT FROM user_stats")
            .fetch_one(db.pool())
            .await?;

    Ok(PlatformTotals {
        users,
        admins,
        vocabulary_stages: count_vocabulary_stages(db).await?,
        quiz_stages: count_quiz_stages(db).await?,
        stage_completions,
        words_learned,
    })
}
