use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The one stored shape of a learner's language choices.
#[derive(Clone, Debug, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LanguagePreferences {
    pub user_id: Uuid,
    pub spoken_languages: Vec<String>,
    pub learning_languages: Vec<String>,
    pub primary_spoken_language: String,
    pub primary_learning_language: String,
}

/// Base/target pair derived from the primaries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningPair {
    pub base: String,
    pub target: String,
}

impl LanguagePreferences {
    pub fn learning_pair(&self) -> LearningPair {
        LearningPair {
            base: self.primary_spoken_language.clone(),
            target: self.primary_learning_language.clone(),
        }
    }
}
