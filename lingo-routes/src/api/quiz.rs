use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use lingo_core::AppState;
use lingo_database::impls::achievements::evaluate_achievements;
use lingo_database::impls::progress::{
    ActivityTotals, completed_levels, credit_quiz_answers, record_activity,
};
use lingo_database::impls::quizzes::{get_quiz_stage, list_quiz_stages};
use lingo_database::model::content::{QuizPrompt, QuizQuestion};
use lingo_database::model::preferences::LearningPair;
use lingo_utils::achievements;
use lingo_utils::points::{QUIZ_PASS_PERCENT, quiz_award, quiz_passed};
use lingo_utils::stages::{Track, gate, next_stage};
use lingo_utils::time::today_utc;

use crate::api::{StageListing, complete_stage, learning_pair};
use crate::error::{ApiError, ApiResult};
use crate::session::AuthUser;
use crate::views::{Notification, NotificationLevel};

pub(crate) async fn listing(
    state: &AppState,
    user_id: Uuid,
) -> ApiResult<(LearningPair, Vec<StageListing>)> {
    let pair = learning_pair(state, user_id).await?;
    let completed = completed_levels(&state.db, user_id, Track::Quiz).await?;
    let stages = list_quiz_stages(&state.db, &pair.target).await?;

    let listing = stages
        .iter()
        .map(|stage| {
            StageListing::new(stage.id, stage.level, &stage.name, stage.questions.len(), &completed)
        })
        .collect();

    Ok((pair, listing))
}

pub async fn list_stages(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<Value>> {
    let (pair, stages) = listing(&state, user.user_id).await?;
    Ok(Json(json!({ "language": pair.target, "stages": stages })))
}

/// Questions of an unlocked stage, without their answers.
pub async fn get_stage(
    State(state): State<AppState>,
    user: AuthUser,
    Path(level): Path<i32>,
) -> ApiResult<Json<Value>> {
    let pair = learning_pair(&state, user.user_id).await?;
    let completed = completed_levels(&state.db, user.user_id, Track::Quiz).await?;
    gate(&completed, level)?;

    let stage = get_quiz_stage(&state.db, &pair.target, level)
        .await?
        .ok_or_else(|| ApiError::not_found("Stage"))?;
    let questions: Vec<QuizPrompt> = stage.questions.iter().map(QuizPrompt::from).collect();

    Ok(Json(json!({
        "id": stage.id,
        "language": stage.language,
        "level": stage.level,
        "name": stage.name,
        "description": stage.description,
        "questions": questions,
        "pass_percent": QUIZ_PASS_PERCENT,
        "completed": completed.contains(&level),
    })))
}

#[derive(Debug, Deserialize)]
pub struct QuizSubmission {
    pub answers: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuestionResult {
    pub index: usize,
    pub correct: bool,
    pub correct_answer: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
    pub percent: usize,
    pub points: i64,
    pub passed: bool,
    pub results: Vec<QuestionResult>,
}

/// Score answers positionally. Missing answers count as wrong.
pub fn score_quiz(questions: &[QuizQuestion], answers: &[String]) -> QuizScore {
    let results: Vec<QuestionResult> = questions
        .iter()
        .enumerate()
        .map(|(index, question)| QuestionResult {
            index,
            correct: answers
                .get(index)
                .is_some_and(|answer| question.is_correct(answer)),
            correct_answer: question.correct_answer.clone(),
        })
        .collect();

    let correct = results.iter().filter(|result| result.correct).count();
    let points = questions
        .iter()
        .zip(&results)
        .filter(|(_, result)| result.correct)
        .map(|(question, _)| quiz_award(question.points))
        .sum();
    let total = questions.len();

    QuizScore {
        correct,
        total,
        percent: (correct * 100).checked_div(total).unwrap_or(0),
        points,
        passed: quiz_passed(correct, total),
        results,
    }
}

impl QuizScore {
    pub fn correct_indices(&self) -> Vec<usize> {
        self.results
            .iter()
            .filter(|result| result.correct)
            .map(|result| result.index)
            .collect()
    }
}

/// Points for the questions credited by one submission.
pub fn credited_points(questions: &[QuizQuestion], credited: &[usize]) -> i64 {
    credited
        .iter()
        .filter_map(|index| questions.get(*index))
        .map(|question| quiz_award(question.points))
        .sum()
}

#[derive(Debug, Serialize)]
pub struct QuizSubmitResponse {
    pub level: i32,
    pub score: QuizScore,
    pub points_awarded: i64,
    pub totals: ActivityTotals,
    pub stage_complete: bool,
    pub next_stage: Option<i32>,
    pub unlocked_achievements: Vec<&'static str>,
    pub notifications: Vec<Notification>,
}

/// Score a submission. Each question earns its points the first time it is
/// answered correctly, and nothing once the stage is completed; a qualifying
/// score completes it.
pub async fn submit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(level): Path<i32>,
    Json(submission): Json<QuizSubmission>,
) -> ApiResult<Json<QuizSubmitResponse>> {
    let user_id = user.user_id;
    let pair = learning_pair(&state, user_id).await?;
    let mut completed = completed_levels(&state.db, user_id, Track::Quiz).await?;
    gate(&completed, level)?;

    let stage = get_quiz_stage(&state.db, &pair.target, level)
        .await?
        .ok_or_else(|| ApiError::not_found("Stage"))?;
    if submission.answers.len() > stage.questions.len() {
        return Err(ApiError::BadRequest(format!(
            "This quiz has {} questions.",
            stage.questions.len()
        )));
    }

    let score = score_quiz(&stage.questions, &submission.answers);
    let replay = completed.contains(&level);
    let points_awarded = if replay {
        0
    } else {
        let credited =
            credit_quiz_answers(&state.db, user_id, stage.id, &score.correct_indices()).await?;
        credited_points(&stage.questions, &credited)
    };
    let totals = record_activity(&state.db, user_id, points_awarded, today_utc()).await?;

    let mut notifications = vec![Notification::info(format!(
        "You answered {} of {} correctly ({}%).",
        score.correct, score.total, score.percent
    ))];
    if points_awarded > 0 {
        notifications.push(Notification::success(format!("+{points_awarded} XP")));
    }

    let mut next = None;
    if score.passed {
        if complete_stage(&state, user_id, Track::Quiz, &mut completed, level).await? {
            notifications.push(Notification::success(format!("Quiz stage {level} passed!")));
        }
        let levels: Vec<i32> = list_quiz_stages(&state.db, &pair.target)
            .await?
            .iter()
            .map(|stage| stage.level)
            .collect();
        next = next_stage(&levels, level);
        if let Some(next) = next {
            notifications.push(Notification::info(format!("Stage {next} is now unlocked.")));
        }
    } else {
        notifications.push(Notification::blocking(
            NotificationLevel::Warning,
            format!("You need {QUIZ_PASS_PERCENT}% to pass. Try again!"),
        ));
    }

    let unlocked = evaluate_achievements(&state.db, user_id).await?;
    for key in &unlocked {
        if let Some(achievement) = achievements::find(key) {
            notifications.push(Notification::success(format!(
                "Achievement unlocked: {}",
                achievement.title
            )));
        }
    }

    Ok(Json(QuizSubmitResponse {
        level,
        stage_complete: score.passed,
        score,
        points_awarded,
        totals,
        next_stage: next,
        unlocked_achievements: unlocked,
        notifications,
    }))
}

#[cfg(test)]
mod tests {
    use lingo_database::model::content::QuizQuestion;

    use std::collections::BTreeSet;

    use lingo_utils::points::accumulate;

    use super::{credited_points, score_quiz};

    fn question(correct: &str, points: i64) -> QuizQuestion {
        QuizQuestion {
            question: format!("Pick {correct}"),
            options: vec![correct.to_owned(), "other".to_owned()],
            correct_answer: correct.to_owned(),
            points,
            difficulty: "easy".to_owned(),
        }
    }

    fn answers(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    #[test]
    fn all_correct_passes_with_question_points() {
        let questions = vec![question("a", 10), question("b", 20), question("c", 0)];
        let score = score_quiz(&questions, &answers(&["a", "B", "c"]));
        assert_eq!(score.correct, 3);
        assert_eq!(score.percent, 100);
        // Zero-point questions award the default.
        assert_eq!(score.points, 40);
        assert!(score.passed);
    }

    #[test]
    fn below_threshold_fails_but_still_scores() {
        let questions = vec![question("a", 10), question("b", 10), question("c", 10)];
        let score = score_quiz(&questions, &answers(&["a", "b", "x"]));
        assert_eq!(score.correct, 2);
        assert_eq!(score.percent, 66);
        assert_eq!(score.points, 20);
        assert!(!score.passed);
        assert!(!score.results[2].correct);
        assert_eq!(score.results[2].correct_answer, "c");
    }

    #[test]
    fn missing_answers_count_as_wrong() {
        let questions = vec![question("a", 10), question("b", 10)];
        let score = score_quiz(&questions, &answers(&["a"]));
        assert_eq!(score.correct, 1);
        assert!(!score.passed);
        assert_eq!(score_quiz(&[], &[]).percent, 0);
    }

    /// Inserts into `stored`, returning only the indices that were new.
    fn credit(stored: &mut BTreeSet<usize>, indices: Vec<usize>) -> Vec<usize> {
        indices
            .into_iter()
            .filter(|index| stored.insert(*index))
            .collect()
    }

    #[test]
    fn repeated_failing_attempts_do_not_farm_points() {
        let questions = vec![question("a", 10), question("b", 10), question("c", 10)];
        let mut stored = BTreeSet::new();
        let mut total = 0;

        let failing = score_quiz(&questions, &answers(&["a", "b", "x"]));
        assert!(!failing.passed);
        assert_eq!(failing.correct_indices(), vec![0, 1]);

        let first = credit(&mut stored, failing.correct_indices());
        total = accumulate(total, credited_points(&questions, &first));
        assert_eq!(total, 20);

        for _ in 0..5 {
            let again = credit(&mut stored, failing.correct_indices());
            assert!(again.is_empty());
            total = accumulate(total, credited_points(&questions, &again));
        }
        assert_eq!(total, 20);

        // Passing later only earns the question not yet credited.
        let passing = score_quiz(&questions, &answers(&["a", "b", "c"]));
        let last = credit(&mut stored, passing.correct_indices());
        assert_eq!(last, vec![2]);
        total = accumulate(total, credited_points(&questions, &last));
        assert_eq!(total, 30);
    }

    #[test]
    fn credited_points_ignore_unknown_indices() {
        let questions = vec![question("a", 15), question("b", 0)];
        assert_eq!(credited_points(&questions, &[0, 1, 9]), 25);
        assert_eq!(credited_points(&questions, &[]), 0);
    }
}
