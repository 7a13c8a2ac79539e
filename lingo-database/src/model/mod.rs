pub mod account;
pub mod content;
pub mod leaderboard;
pub mod preferences;
pub mod profile;
pub mod stats;
