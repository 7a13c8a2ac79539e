use anyhow::Context as _;
use sqlx::types::Json;
use tracing::info;

use crate::cache::{STAGE_LIST_CACHE_TTL, quiz_stages_key};
use crate::database::Database;
use crate::impls::{ContentWrite, is_unique_violation};
use crate::model::content::{NewQuizStage, QuizStage, QuizStageRow, StageSummary};
use crate::realtime::{ChangeEvent, ChangeOp, Table};

/// All quiz stages for a language, ordered by level.
pub async fn list_quiz_stages(
    db: &Database,
    language: &str,
) -> anyhow::Result<Vec<QuizStage>> {
    let cache_key = quiz_stages_key(db.cache(), language);
    db.cache()
        .get_or_load_json(&cache_key, STAGE_LIST_CACHE_TTL, || async {
            let rows = sqlx::query_as::<_, QuizStageRow>(
                "SELECT id, language, level, name, description, questions
                 FROM quiz_stages
                 WHERE LOWER(language) = LOWER($1)
                 ORDER BY level ASC",
            )
            .bind(language)
            .fetch_all(db.pool())
            .await?;

            Ok(rows.into_iter().map(QuizStage::from).collect())
        })
        .await
}

pub async fn get_quiz_stage(
    db: &Database,
    language: &str,
    level: i32,
) -> anyhow::Result<Option<QuizStage>> {
    let stages = list_quiz_stages(db, language).await?;
    Ok(stages.into_iter().find(|stage| stage.level == level))
}

/// Feed event for a saved stage. Only the header is published; learners
/// fetch items through the gated stage endpoints.
fn stage_event(op: ChangeOp, stage: &QuizStage) -> ChangeEvent {
    ChangeEvent::new(Table::QuizStages, op, None, StageSummary::from(stage))
}

async fn invalidate(db: &Database, languages: &[&str]) {
    let keys: Vec<String> = languages
        .iter()
        .map(|language| quiz_stages_key(db.cache(), language))
        .collect();
    db.cache().invalidate(&keys).await;
}

async fn language_of(db: &Database, id: i64) -> anyhow::Result<Option<String>> {
    let language: Option<String> =
        sqlx::query_scalar("SELECT language FROM quiz_stages WHERE id = $1")
            .bind(id)
            .fetch_optional(db.pool())
            .await?;
    Ok(language)
}

pub async fn create_quiz_stage(
    db: &Database,
    stage: &NewQuizStage,
) -> anyhow::Result<ContentWrite<QuizStage>> {
    let result = sqlx::query_as::<_, QuizStageRow>(
        "INSERT INTO quiz_stages (language, level, name, description, questions)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, language, level, name, description, questions",
    )
    .bind(stage.language.trim())
    .bind(stage.level)
    .bind(stage.name.trim())
    .bind(stage.description.trim())
    .bind(Json(&stage.questions))
    .fetch_one(db.pool())
    .await;

    let saved = match result {
        Ok(row) => QuizStage::from(row),
        Err(err) if is_unique_violation(&err) => return Ok(ContentWrite::Conflict),
        Err(err) => return Err(err).context("failed to insert quiz stage"),
    };

    invalidate(db, &[&saved.language]).await;
    info!(id = saved.id, language = %saved.language, level = saved.level, "quiz stage created");
    db.notify(stage_event(ChangeOp::Insert, &saved));

    Ok(ContentWrite::Saved(saved))
}

pub async fn update_quiz_stage(
    db: &Database,
    id: i64,
    stage: &NewQuizStage,
) -> anyhow::Result<ContentWrite<QuizStage>> {
    let Some(previous_language) = language_of(db, id).await? else {
        return Ok(ContentWrite::NotFound);
    };

    let result = sqlx::query_as::<_, QuizStageRow>(
        "UPDATE quiz_stages
         SET language = $2, level = $3, name = $4, description = $5, questions = $6
         WHERE id = $1
         RETURNING id, language, level, name, description, questions",
    )
    .bind(id)
    .bind(stage.language.trim())
    .bind(stage.level)
    .bind(stage.name.trim())
    .bind(stage.description.trim())
    .bind(Json(&stage.questions))
    .fetch_optional(db.pool())
    .await;

    let saved = match result {
        Ok(Some(row)) => QuizStage::from(row),
        Ok(None) => return Ok(ContentWrite::NotFound),
        Err(err) if is_unique_violation(&err) => return Ok(ContentWrite::Conflict),
        Err(err) => return Err(err).context("failed to update quiz stage"),
    };

    invalidate(db, &[&previous_language, &saved.language]).await;
    db.notify(stage_event(ChangeOp::Update, &saved));

    Ok(ContentWrite::Saved(saved))
}

pub async fn delete_quiz_stage(db: &Database, id: i64) -> anyhow::Result<bool> {
    let language: Option<String> =
        sqlx::query_scalar("DELETE FROM quiz_stages WHERE id = $1 RETURNING language")
            .bind(id)
            .fetch_optional(db.pool())
            .await?;

    let Some(language) = language else {
        return Ok(false);
    };

    invalidate(db, &[&language]).await;
    info!(id, language = %language, "quiz stage deleted");
    db.notify(ChangeEvent::new(
        Table::QuizStages,
        ChangeOp::Delete,
        None,
        serde_json::json!({ "id": id, "language": language }),
    ));

    Ok(true)
}

pub async fn count_quiz_stages(db: &Database) -> anyhow::Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quiz_stages")
        .fetch_one(db.pool())
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::stage_event;
    use crate::model::content::{QuizQuestion, QuizStage};
    use crate::realtime::{ChangeOp, Table};

    #[test]
    fn feed_events_carry_no_answers() {
        let stage = QuizStage {
            id: 7,
            language: "Hausa".to_owned(),
            level: 3,
            name: "Greetings quiz".to_owned(),
            description: String::new(),
            questions: vec![QuizQuestion {
                question: "What does 'sannu' mean?".to_owned(),
                options: vec!["Hello".to_owned(), "Goodbye".to_owned()],
                correct_answer: "Hello".to_owned(),
                points: 10,
                difficulty: "easy".to_owned(),
            }],
        };

        let event = stage_event(ChangeOp::Update, &stage);
        assert_eq!(event.table, Table::QuizStages);
        assert_eq!(event.row["level"], 3);
        assert_eq!(event.row["items"], 1);
        assert!(event.row.get("questions").is_none());
        assert!(!event.row.to_string().contains("correct_answer"));
    }
}
