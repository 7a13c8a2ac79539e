pub mod accounts;
pub mod achievements;
pub mod admin;
pub mod leaderboard;
pub mod preferences;
pub mod profiles;
pub mod progress;
pub mod quizzes;
pub mod sessions;
pub mod stats;
pub mod vocabulary;

/// Outcome of an admin content write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentWrite<T> {
    Saved(T),
    /// Another stage already uses this language and level.
    Conflict,
    NotFound,
}

pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => db_error.is_unique_violation(),
        _ => false,
    }
}
