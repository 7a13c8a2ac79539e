use uuid::Uuid;

use lingo_utils::points::level_for_points;

use crate::cache::leaderboard_key;
use crate::database::Database;
use crate::model::leaderboard::LeaderboardEntry;

/// Largest board kept per language; smaller limits are sliced from it.
pub const LEADERBOARD_MAX: usize = 100;
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

#[derive(sqlx::FromRow)]
struct LeaderboardRow {
    user_id: Uuid,
    username: String,
    avatar_url: Option<String>,
    points: i64,
    streak_days: i32,
    learning_language: String,
}

/// Number the rows in the order the query returned them.
fn rank_rows(rows: Vec<LeaderboardRow>) -> Vec<LeaderboardEntry> {
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| LeaderboardEntry {
            rank: index + 1,
            user_id: row.user_id,
            username: row.username,
            avatar_url: row.avatar_url,
            points: row.points,
            level: level_for_points(row.points),
            learning_language: row.learning_language,
            streak_days: row.streak_days,
        })
        .collect()
}

/// Top learners of `language` by points. Ties are ordered by username, then
/// id. An unknown language or one without learners yields an empty list.
pub async fn top_learners(
    db: &Database,
    language: &str,
    limit: usize,
) -> anyhow::Result<Vec<LeaderboardEntry>> {
    let limit = limit.clamp(1, LEADERBOARD_MAX);
    let cache_key = leaderboard_key(db.cache(), language);

    let mut board = db
        .cache()
        .get_or_load_json(&cache_key, db.cache().leaderboard_ttl(), || async {
            let rows = sqlx::query_as::<_, LeaderboardRow>(
                "SELECT p.id AS user_id, p.username, p.avatar_url, p.points, p.streak_days,
                        lp.primary_learning_language AS learning_language
                 FROM profiles p
                 JOIN language_preferences lp ON lp.user_id = p.id
                 WHERE LOWER(lp.primary_learning_language) = LOWER($1)
                 ORDER BY p.points DESC, p.username ASC, p.id ASC
                 LIMIT $2",
            )
            .bind(language)
            .bind(LEADERBOARD_MAX as i64)
            .fetch_all(db.pool())
            .await?;

            Ok(rank_rows(rows))
        })
        .await?;

    board.truncate(limit);
    Ok(board)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{LeaderboardRow, rank_rows};

    fn row(username: &str, points: i64) -> LeaderboardRow {
        LeaderboardRow {
            user_id: Uuid::new_v4(),
            username: username.to_owned(),
            avatar_url: None,
            points,
            streak_days: 1,
            learning_language: "Hausa".to_owned(),
        }
    }

    #[test]
    fn ranks_follow_query_order() {
        let ranked = rank_rows(vec![row("amina", 250), row("bola", 90)]);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[0].level, 3);
        assert_eq!(ranked[1].rank, 2);
        assert_eq!(ranked[1].username, "bola");
        assert_eq!(ranked[1].level, 1);
    }

    #[test]
    fn empty_board_stays_empty() {
        assert!(rank_rows(Vec::new()).is_empty());
    }
}
