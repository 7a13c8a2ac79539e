use serde::{Deserialize, Serialize};

/// Points needed to move through one level.
pub const POINTS_PER_LEVEL: i64 = 100;
/// Share of correct quiz answers (in percent) needed to complete a stage.
pub const QUIZ_PASS_PERCENT: u32 = 70;
/// Fallback value for quiz questions stored without a positive point value.
pub const DEFAULT_QUESTION_POINTS: i64 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Strict parse, used when validating admin-submitted content.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "easy" | "beginner" => Some(Difficulty::Easy),
            "medium" | "intermediate" => Some(Difficulty::Medium),
            "hard" | "advanced" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Lenient parse for stored content: unknown strings count as medium.
    pub fn parse_or_medium(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(Difficulty::Medium)
    }
}

/// Points for learning one vocabulary word.
pub fn vocabulary_award(difficulty: Difficulty) -> i64 {
    match difficulty {
        Difficulty::Easy => 5,
        Difficulty::Medium => 10,
        Difficulty::Hard => 15,
    }
}

/// Points for one correct quiz answer.
pub fn quiz_award(question_points: i64) -> i64 {
    if question_points > 0 {
        question_points
    } else {
        DEFAULT_QUESTION_POINTS
    }
}

/// Add an award to a balance. Negative awards are ignored so the balance
/// never goes down.
pub fn accumulate(current: i64, awarded: i64) -> i64 {
    current.saturating_add(awarded.max(0))
}

/// Level derived from points. Level 1 covers 0..100 points.
pub fn level_for_points(points: i64) -> i64 {
    points.max(0) / POINTS_PER_LEVEL + 1
}

/// Points earned within the current level, in 0..100.
pub fn progress_in_level(points: i64) -> i64 {
    points.max(0) % POINTS_PER_LEVEL
}

pub fn points_to_next_level(points: i64) -> i64 {
    POINTS_PER_LEVEL - progress_in_level(points)
}

pub fn quiz_passed(correct: usize, total: usize) -> bool {
    if total == 0 {
        return false;
    }

    correct.saturating_mul(100) >= total.saturating_mul(QUIZ_PASS_PERCENT as usize)
}

/// Summary shown on the dashboard and in profile payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub points: i64,
    pub level: i64,
    pub progress: i64,
    pub to_next_level: i64,
}

impl LevelSummary {
    pub fn from_points(points: i64) -> Self {
        Self {
            points,
            level: level_for_points(points),
            progress: progress_in_level(points),
            to_next_level: points_to_next_level(points),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Difficulty, LevelSummary, accumulate, level_for_points, progress_in_level, quiz_award,
        quiz_passed, vocabulary_award,
    };

    #[test]
    fn difficulty_tiers_award_increasing_points() {
        assert_eq!(vocabulary_award(Difficulty::Easy), 5);
        assert_eq!(vocabulary_award(Difficulty::Medium), 10);
        assert_eq!(vocabulary_award(Difficulty::Hard), 15);
    }

    #[test]
    fn difficulty_parsing() {
        assert_eq!(Difficulty::parse("Hard"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("beginner"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::parse("expert"), None);
        assert_eq!(Difficulty::parse_or_medium("expert"), Difficulty::Medium);
    }

    #[test]
    fn accumulation_never_decreases() {
        assert_eq!(accumulate(40, 15), 55);
        assert_eq!(accumulate(40, -15), 40);
        assert_eq!(accumulate(i64::MAX, 5), i64::MAX);
    }

    #[test]
    fn quiz_points_fall_back_to_default() {
        assert_eq!(quiz_award(25), 25);
        assert_eq!(quiz_award(0), 10);
    }

    #[test]
    fn level_is_derived_from_points() {
        assert_eq!(level_for_points(0), 1);
        assert_eq!(level_for_points(99), 1);
        assert_eq!(level_for_points(100), 2);
        assert_eq!(level_for_points(250), 3);
        assert_eq!(progress_in_level(250), 50);
        assert_eq!(
            LevelSummary::from_points(130),
            LevelSummary {
                points: 130,
                level: 2,
                progress: 30,
                to_next_level: 70
            }
        );
    }

    #[test]
    fn quiz_pass_threshold() {
        assert!(quiz_passed(7, 10));
        assert!(!quiz_passed(6, 10));
        assert!(quiz_passed(3, 3));
        assert!(!quiz_passed(2, 3));
        assert!(!quiz_passed(0, 0));
    }
}
