use anyhow::Context as _;
use sqlx::types::Json;
use tracing::info;

use crate::cache::{STAGE_LIST_CACHE_TTL, vocabulary_stages_key};
use crate::database::Database;
use crate::impls::{ContentWrite, is_unique_violation};
use crate::model::content::{
    NewVocabularyStage, StageSummary, VocabularyStage, VocabularyStageRow,
};
use crate::realtime::{ChangeEvent, ChangeOp, Table};

/// All vocabulary stages for a language, ordered by level.
pub async fn list_vocabulary_stages(
    db: &Database,
    language: &str,
) -> anyhow::Result<Vec<VocabularyStage>> {
    let cache_key = vocabulary_stages_key(db.cache(), language);
    db.cache()
        .get_or_load_json(&cache_key, STAGE_LIST_CACHE_TTL, || async {
            let rows = sqlx::query_as::<_, VocabularyStageRow>(
                "SELECT id, language, level, name, words
                 FROM vocabulary_stages
                 WHERE LOWER(language) = LOWER($1)
                 ORDER BY level ASC",
            )
            .bind(language)
            .fetch_all(db.pool())
            .await?;

            Ok(rows.into_iter().map(VocabularyStage::from).collect())
        })
        .await
}

pub async fn get_vocabulary_stage(
    db: &Database,
    language: &str,
    level: i32,
) -> anyhow::Result<Option<VocabularyStage>> {
    let stages = list_vocabulary_stages(db, language).await?;
    Ok(stages.into_iter().find(|stage| stage.level == level))
}

/// Feed event for a saved stage. Only the header is published; learners
/// fetch items through the gated stage endpoints.
fn stage_event(op: ChangeOp, stage: &VocabularyStage) -> ChangeEvent {
    ChangeEvent::new(Table::VocabularyStages, op, None, StageSummary::from(stage))
}

async fn invalidate(db: &Database, languages: &[&str]) {
    let keys: Vec<String> = languages
        .iter()
        .map(|language| vocabulary_stages_key(db.cache(), language))
        .collect();
    db.cache().invalidate(&keys).await;
}

async fn language_of(db: &Database, id: i64) -> anyhow::Result<Option<String>> {
    let language: Option<String> =
        sqlx::query_scalar("SELECT language FROM vocabulary_stages WHERE id = $1")
            .bind(id)
            .fetch_optional(db.pool())
            .await?;
    Ok(language)
}

pub async fn create_vocabulary_stage(
    db: &Database,
    stage: &NewVocabularyStage,
) -> anyhow::Result<ContentWrite<VocabularyStage>> {
    let result = sqlx::query_as::<_, VocabularyStageRow>(
        "INSERT INTO vocabulary_stages (language, level, name, words)
         VALUES ($1, $2, $3, $4)
         RETURNING id, language, level, name, words",
    )
    .bind(stage.language.trim())
    .bind(stage.level)
    .bind(stage.name.trim())
    .bind(Json(&stage.words))
    .fetch_one(db.pool())
    .await;

    let saved = match result {
        Ok(row) => VocabularyStage::from(row),
        Err(err) if is_unique_violation(&err) => return Ok(ContentWrite::Conflict),
        Err(err) => return Err(err).context("failed to insert vocabulary stage"),
    };

    invalidate(db, &[&saved.language]).await;
    info!(id = saved.id, language = %saved.language, level = saved.level, "vocabulary stage created");
    db.notify(stage_event(ChangeOp::Insert, &saved));

    Ok(ContentWrite::Saved(saved))
}

pub async fn update_vocabulary_stage(
    db: &Database,
    id: i64,
    stage: &NewVocabularyStage,
) -> anyhow::Result<ContentWrite<VocabularyStage>> {
    let Some(previous_language) = language_of(db, id).await? else {
        return Ok(ContentWrite::NotFound);
    };

    let result = sqlx::query_as::<_, VocabularyStageRow>(
        "UPDATE vocabulary_stages
         SET language = $2, level = $3, name = $4, words = $5
         WHERE id = $1
         RETURNING id, language, level, name, words",
    )
    .bind(id)
    .bind(stage.language.trim())
    .bind(stage.level)
    .bind(stage.name.trim())
    .bind(Json(&stage.words))
    .fetch_optional(db.pool())
    .await;

    let saved = match result {
        Ok(Some(row)) => VocabularyStage::from(row),
        Ok(None) => return Ok(ContentWrite::NotFound),
        Err(err) if is_unique_violation(&err) => return Ok(ContentWrite::Conflict),
        Err(err) => return Err(err).context("failed to update vocabulary stage"),
    };

    invalidate(db, &[&previous_language, &saved.language]).await;
    db.notify(stage_event(ChangeOp::Update, &saved));

    Ok(ContentWrite::Saved(saved))
}

pub async fn delete_vocabulary_stage(db: &Database, id: i64) -> anyhow::Result<bool> {
    let language: Option<String> =
        sqlx::query_scalar("DELETE FROM vocabulary_stages WHERE id = $1 RETURNING language")
            .bind(id)
            .fetch_optional(db.pool())
            .await?;

    let Some(language) = language else {
        return Ok(false);
    };

    invalidate(db, &[&language]).await;
    info!(id, language = %language, "vocabulary stage deleted");
    db.notify(ChangeEvent::new(
        Table::VocabularyStages,
        ChangeOp::Delete,
        None,
        serde_json::json!({ "id": id, "language": language }),
    ));

    Ok(true)
}

pub async fn count_vocabulary_stages(db: &Database) -> anyhow::Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vocabulary_stages")
        .fetch_one(db.pool())
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::stage_event;
    use crate::model::content::{VocabularyStage, VocabularyWord};
    use crate::realtime::{ChangeOp, Table};

    #[test]
    fn feed_events_carry_no_words() {
        let stage = VocabularyStage {
            id: 4,
            language: "Hausa".to_owned(),
            level: 2,
            name: "Family".to_owned(),
            words: vec![VocabularyWord {
                word: "uwa".to_owned(),
                translation: "mother".to_owned(),
                difficulty: "easy".to_owned(),
                audio_url: None,
            }],
        };

        let event = stage_event(ChangeOp::Insert, &stage);
        assert_eq!(event.table, Table::VocabularyStages);
        assert_eq!(event.row["name"], "Family");
        assert_eq!(event.row["items"], 1);
        assert!(event.row.get("words").is_none());
    }
}
