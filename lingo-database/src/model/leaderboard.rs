use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
    pub points: i64,
    pub level: i64,
    pub learning_language: String,
    pub streak_days: i32,
}
