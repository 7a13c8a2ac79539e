use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use lingo_utils::access::Role;
use lingo_utils::points::level_for_points;
use lingo_utils::stages::Track;

use crate::model::preferences::LearningPair;

#[derive(Clone, Debug, FromRow)]
/// Raw `profiles` row.
pub struct ProfileRow {
    pub id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: String,
    pub points: i64,
    pub streak_days: i32,
    pub last_active_on: Option<NaiveDate>,
    pub languages_spoken: Vec<String>,
    pub achievements: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Completed stage levels per track, ascending.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagesCompleted {
    pub vocabulary: Vec<i32>,
    pub quiz: Vec<i32>,
}

impl StagesCompleted {
    pub fn for_track(&self, track: Track) -> BTreeSet<i32> {
        match track {
            Track::Vocabulary => self.vocabulary.iter().copied().collect(),
            Track::Quiz => self.quiz.iter().copied().collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub points: i64,
    /// Always derived from `points`.
    pub level: i64,
    pub streak_days: i32,
    pub last_active_on: Option<NaiveDate>,
    pub stages_completed: StagesCompleted,
    pub languages_spoken: Vec<String>,
    pub learning_languages: Option<LearningPair>,
    pub achievements: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl ProfileRow {
    pub(crate) fn into_profile(
        self,
        stages_completed: StagesCompleted,
        learning_languages: Option<LearningPair>,
    ) -> Profile {
        Profile {
            id: self.id,
            username: self.username,
            full_name: self.full_name,
            avatar_url: self.avatar_url,
            // Unknown roles never grant admin.
            role: Role::parse(&self.role).unwrap_or(Role::User),
            points: self.points,
            level: level_for_points(self.points),
            streak_days: self.streak_days,
            last_active_on: self.last_active_on,
            stages_completed,
            languages_spoken: self.languages_spoken,
            learning_languages,
            achievements: self.achievements,
            created_at: self.created_at,
        }
    }
}

/// Compact row for admin listings and community pages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub points: i64,
    pub level: i64,
    pub streak_days: i32,
    pub created_at: DateTime<Utc>,
}

impl From<ProfileRow> for ProfileSummary {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            role: Role::parse(&row.role).unwrap_or(Role::User),
            level: level_for_points(row.points),
            username: row.username,
            full_name: row.full_name,
            avatar_url: row.avatar_url,
            points: row.points,
            streak_days: row.streak_days,
            created_at: row.created_at,
        }
    }
}
