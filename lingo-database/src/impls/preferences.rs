use uuid::Uuid;

use crate::cache::invalidate_leaderboard;
use crate::database::Database;
use crate::impls::profiles::set_languages_spoken;
use crate::impls::stats::ensure_user_stats;
use crate::model::preferences::LanguagePreferences;
use crate::realtime::{ChangeEvent, ChangeOp, Table};

pub async fn get_preferences(
    db: &Database,
    user_id: Uuid,
) -> anyhow::Result<Option<LanguagePreferences>> {
    let preferences = sqlx::query_as::<_, LanguagePreferences>(
        "SELECT user_id, spoken_languages, learning_languages,
                primary_spoken_language, primary_learning_language
         FROM language_preferences
         WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(db.pool())
    .await?;

    Ok(preferences)
}

/// Boards that list the learner: the one they leave and the one they join.
fn stale_leaderboards<'a>(
    previous: Option<&'a LanguagePreferences>,
    next: &'a LanguagePreferences,
) -> Vec<&'a str> {
    let mut languages = vec![next.primary_learning_language.as_str()];
    if let Some(previous) = previous {
        if previous.primary_learning_language != next.primary_learning_language {
            languages.push(previous.primary_learning_language.as_str());
        }
    }
    languages
}

/// Save preferences (first-time selection or later edits). Callers validate
/// the languages beforehand.
pub async fn set_preferences(
    db: &Database,
    preferences: &LanguagePreferences,
) -> anyhow::Result<()> {
    let previous = get_preferences(db, preferences.user_id).await?;

    sqlx::query(
        "INSERT INTO language_preferences
            (user_id, spoken_languages, learning_languages,
             primary_spoken_language, primary_learning_language, updated_at)
         VALUES ($1, $2, $3, $4, $5, NOW())
         ON CONFLICT (user_id) DO UPDATE SET
            spoken_languages = EXCLUDED.spoken_languages,
            learning_languages = EXCLUDED.learning_languages,
            primary_spoken_language = EXCLUDED.primary_spoken_language,
            primary_learning_language = EXCLUDED.primary_learning_language,
            updated_at = NOW()",
    )
    .bind(preferences.user_id)
    .bind(&preferences.spoken_languages)
    .bind(&preferences.learning_languages)
    .bind(&preferences.primary_spoken_language)
    .bind(&preferences.primary_learning_language)
    .execute(db.pool())
    .await?;

    set_languages_spoken(db, preferences.user_id, &preferences.spoken_languages).await?;
    ensure_user_stats(db, preferences.user_id).await?;

    for language in stale_leaderboards(previous.as_ref(), preferences) {
        invalidate_leaderboard(db.cache(), language).await;
    }

    let op = if previous.is_some() {
        ChangeOp::Update
    } else {
        ChangeOp::Insert
    };
    db.notify(ChangeEvent::new(
        Table::LanguagePreferences,
        op,
        Some(preferences.user_id),
        preferences,
    ));

    Ok(())
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::stale_leaderboards;
    use crate::model::preferences::LanguagePreferences;

    fn learning(language: &str) -> LanguagePreferences {
        LanguagePreferences {
            user_id: Uuid::nil(),
            spoken_languages: vec!["English".to_owned()],
            learning_languages: vec!["Hausa".to_owned(), "Yoruba".to_owned()],
            primary_spoken_language: "English".to_owned(),
            primary_learning_language: language.to_owned(),
        }
    }

    #[test]
    fn switching_language_clears_both_boards() {
        let before = learning("Hausa");
        let after = learning("Yoruba");
        assert_eq!(stale_leaderboards(Some(&before), &after), vec!["Yoruba", "Hausa"]);
        assert_eq!(stale_leaderboards(Some(&after), &after), vec!["Yoruba"]);
        assert_eq!(stale_leaderboards(None, &after), vec!["Yoruba"]);
    }
}
