use tracing::info;
use uuid::Uuid;

use lingo_utils::achievements::{ProgressSnapshot, newly_unlocked};

use crate::database::Database;
use crate::impls::profiles::{add_achievements, get_profile};
use crate::impls::stats::get_user_stats;

/// Award every achievement the learner now qualifies for and return the
/// newly unlocked keys.
pub async fn evaluate_achievements(
    db: &Database,
    user_id: Uuid,
) -> anyhow::Result<Vec<&'static str>> {
    let Some(profile) = get_profile(db, user_id).await? else {
        return Ok(Vec::new());
    };
    let words_learned = get_user_stats(db, user_id)
        .await?
        .map_or(0, |stats| stats.words_learned);

    let snapshot = ProgressSnapshot {
        words_learned,
        vocabulary_stages_completed: profile.stages_completed.vocabulary.len(),
        quiz_stages_completed: profile.stages_completed.quiz.len(),
        points: profile.points,
        streak_days: profile.streak_days,
    };

    let unlocked = newly_unlocked(&snapshot, &profile.achievements);
    if !unlocked.is_empty() {
        add_achievements(db, user_id, &unlocked).await?;
        info!(%user_id, ?unlocked, "achievements unlocked");
    }

    Ok(unlocked)
}
