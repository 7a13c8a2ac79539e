use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

use lingo_utils::points::Difficulty;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyWord {
    pub word: String,
    pub translation: String,
    pub difficulty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

impl VocabularyWord {
    pub fn difficulty(&self) -> Difficulty {
        Difficulty::parse_or_medium(&self.difficulty)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyStage {
    pub id: i64,
    pub language: String,
    pub level: i32,
    pub name: String,
    pub words: Vec<VocabularyWord>,
}

#[derive(FromRow)]
pub struct VocabularyStageRow {
    pub id: i64,
    pub language: String,
    pub level: i32,
    pub name: String,
    pub words: Json<Vec<VocabularyWord>>,
}

impl From<VocabularyStageRow> for VocabularyStage {
    fn from(row: VocabularyStageRow) -> Self {
        Self {
            id: row.id,
            language: row.language,
            level: row.level,
            name: row.name,
            words: row.words.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub points: i64,
    pub difficulty: String,
}

impl QuizQuestion {
    /// Answers are compared ignoring surrounding whitespace and ASCII case.
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer
            .trim()
            .eq_ignore_ascii_case(answer.trim())
    }
}

/// Question as shown to learners, without the answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuizPrompt {
    pub question: String,
    pub options: Vec<String>,
    pub points: i64,
    pub difficulty: String,
}

impl From<&QuizQuestion> for QuizPrompt {
    fn from(question: &QuizQuestion) -> Self {
        Self {
            question: question.question.clone(),
            options: question.options.clone(),
            points: question.points,
            difficulty: question.difficulty.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizStage {
    pub id: i64,
    pub language: String,
    pub level: i32,
    pub name: String,
    pub description: String,
    pub questions: Vec<QuizQuestion>,
}

#[derive(FromRow)]
pub struct QuizStageRow {
    pub id: i64,
    pub language: String,
    pub level: i32,
    pub name: String,
    pub description: String,
    pub questions: Json<Vec<QuizQuestion>>,
}

impl From<QuizStageRow> for QuizStage {
    fn from(row: QuizStageRow) -> Self {
        Self {
            id: row.id,
            language: row.language,
            level: row.level,
            name: row.name,
            description: row.description,
            questions: row.questions.0,
        }
    }
}

/// Stage header without its items.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StageSummary {
    pub id: i64,
    pub language: String,
    pub level: i32,
    pub name: String,
    pub items: usize,
}

impl From<&VocabularyStage> for StageSummary {
    fn from(stage: &VocabularyStage) -> Self {
        Self {
            id: stage.id,
            language: stage.language.clone(),
            level: stage.level,
            name: stage.name.clone(),
            items: stage.words.len(),
        }
    }
}

impl From<&QuizStage> for StageSummary {
    fn from(stage: &QuizStage) -> Self {
        Self {
            id: stage.id,
            language: stage.language.clone(),
            level: stage.level,
            name: stage.name.clone(),
            items: stage.questions.len(),
        }
    }
}

/// Admin-submitted vocabulary stage.
#[derive(Clone, Debug, Deserialize)]
pub struct NewVocabularyStage {
    pub language: String,
    pub level: i32,
    pub name: String,
    pub words: Vec<VocabularyWord>,
}

/// Admin-submitted quiz stage.
#[derive(Clone, Debug, Deserialize)]
pub struct NewQuizStage {
    pub language: String,
    pub level: i32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub questions: Vec<QuizQuestion>,
}

impl NewVocabularyStage {
    pub fn validate(&self) -> Result<(), String> {
        validate_header(&self.name, self.level)?;
        if self.words.is_empty() {
            return Err("A vocabulary stage needs at least one word.".to_owned());
        }

        for (index, word) in self.words.iter().enumerate() {
            if word.word.trim().is_empty() || word.translation.trim().is_empty() {
                return Err(format!("Word {} needs a word and a translation.", index + 1));
            }
            if Difficulty::parse(&word.difficulty).is_none() {
                return Err(format!(
                    "Word {} has unknown difficulty `{}`.",
                    index + 1,
                    word.difficulty
                ));
            }
        }

        Ok(())
    }
}

impl NewQuizStage {
    pub fn validate(&self) -> Result<(), String> {
        validate_header(&self.name, self.level)?;
        if self.questions.is_empty() {
            return Err("A quiz stage needs at least one question.".to_owned());
        }

        for (index, question) in self.questions.iter().enumerate() {
            let number = index + 1;
            if question.question.trim().is_empty() {
                return Err(format!("Question {} is empty.", number));
            }
            if question.options.len() < 2 {
                return Err(format!("Question {} needs at least two options.", number));
            }
            if !question
                .options
                .iter()
                .any(|option| question.is_correct(option))
            {
                return Err(format!(
                    "Question {} has a correct answer that is not among its options.",
                    number
                ));
            }
            if question.points < 0 {
                return Err(format!("Question {} has negative points.", number));
            }
            if Difficulty::parse(&question.difficulty).is_none() {
                return Err(format!(
                    "Question {} has unknown difficulty `{}`.",
                    number, question.difficulty
                ));
            }
        }

        Ok(())
    }
}

fn validate_header(name: &str, level: i32) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Stage name is required.".to_owned());
    }
    if level < 1 {
        return Err("Stage level must be 1 or higher.".to_owned());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{NewQuizStage, NewVocabularyStage, QuizPrompt, QuizQuestion, VocabularyWord};
    use lingo_utils::points::Difficulty;

    fn word(word: &str, difficulty: &str) -> VocabularyWord {
        VocabularyWord {
            word: word.to_owned(),
            translation: "hello".to_owned(),
            difficulty: difficulty.to_owned(),
            audio_url: None,
        }
    }

    fn question(correct: &str) -> QuizQuestion {
        QuizQuestion {
            question: "What does 'sannu' mean?".to_owned(),
            options: vec!["Hello".to_owned(), "Goodbye".to_owned()],
            correct_answer: correct.to_owned(),
            points: 10,
            difficulty: "easy".to_owned(),
        }
    }

    #[test]
    fn word_difficulty_defaults_to_medium() {
        assert_eq!(word("sannu", "hard").difficulty(), Difficulty::Hard);
        assert_eq!(word("sannu", "???").difficulty(), Difficulty::Medium);
    }

    #[test]
    fn answers_match_loosely() {
        let q = question("Hello");
        assert!(q.is_correct(" hello "));
        assert!(!q.is_correct("Goodbye"));
    }

    #[test]
    fn prompt_hides_answer() {
        let prompt = QuizPrompt::from(&question("Hello"));
        let json = serde_json::to_value(&prompt).unwrap();
        assert!(json.get("correct_answer").is_none());
        assert_eq!(json["options"][0], "Hello");
    }

    #[test]
    fn vocabulary_stage_validation() {
        let mut stage = NewVocabularyStage {
            language: "Hausa".to_owned(),
            level: 1,
            name: "Greetings".to_owned(),
            words: vec![word("sannu", "easy")],
        };
        assert_eq!(stage.validate(), Ok(()));

        stage.words.push(word("ina kwana", "legendary"));
        assert!(stage.validate().unwrap_err().contains("unknown difficulty"));

        stage.words.clear();
        assert!(stage.validate().is_err());

        stage.words.push(word("sannu", "easy"));
        stage.level = 0;
        assert!(stage.validate().is_err());
    }

    #[test]
    fn quiz_stage_validation() {
        let mut stage = NewQuizStage {
            language: "Hausa".to_owned(),
            level: 2,
            name: "Greetings quiz".to_owned(),
            description: String::new(),
            questions: vec![question("Hello")],
        };
        assert_eq!(stage.validate(), Ok(()));

        stage.questions = vec![question("Thanks")];
        assert!(stage.validate().unwrap_err().contains("not among its options"));

        stage.questions = vec![];
        assert!(stage.validate().is_err());
    }
}
