/// Route access predicate and session states.
pub mod access;
/// Achievement catalog and unlock evaluation.
pub mod achievements;
/// Shared formatting helpers (labels, durations, level progress).
pub mod formatting;
/// Supported languages and name normalization.
pub mod languages;
/// Shared pagination helper utilities.
pub mod pagination;
/// Pure parser helpers.
pub mod parse;
/// Points awards and level derivation.
pub mod points;
/// Stage gating and completion rules.
pub mod stages;
/// Daily activity streaks.
pub mod streak;
/// Shared time helpers.
pub mod time;
/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "lingo_session";
