use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-learner aggregate; languages come from the learner's preferences.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: Uuid,
    pub words_learned: i64,
    pub streak: i32,
    pub points: i64,
    pub level: i64,
    pub base_language: Option<String>,
    pub target_language: Option<String>,
}
