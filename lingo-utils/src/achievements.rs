use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub key: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

/// Counters an achievement can depend on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub words_learned: i64,
    pub vocabulary_stages_completed: usize,
    pub quiz_stages_completed: usize,
    pub points: i64,
    pub streak_days: i32,
}

pub const CATALOG: &[Achievement] = &[
    Achievement {
        key: "first_word",
        title: "First Word",
        description: "Learn your first vocabulary word.",
    },
    Achievement {
        key: "word_collector",
        title: "Word Collector",
        description: "Learn 50 vocabulary words.",
    },
    Achievement {
        key: "first_stage",
        title: "Stage Clear",
        description: "Complete a vocabulary stage.",
    },
    Achievement {
        key: "first_quiz",
        title: "Quiz Taker",
        description: "Pass your first quiz stage.",
    },
    Achievement {
        key: "quiz_master",
        title: "Quiz Master",
        description: "Pass 5 quiz stages.",
    },
    Achievement {
        key: "centurion",
        title: "Centurion",
        description: "Earn 100 points.",
    },
    Achievement {
        key: "week_streak",
        title: "On Fire",
        description: "Keep a 7 day learning streak.",
    },
];

fn is_met(key: &str, snapshot: &ProgressSnapshot) -> bool {
    match key {
        "first_word" => snapshot.words_learned >= 1,
        "word_collector" => snapshot.words_learned >= 50,
        "first_stage" => snapshot.vocabulary_stages_completed >= 1,
        "first_quiz" => snapshot.quiz_stages_completed >= 1,
        "quiz_master" => snapshot.quiz_stages_completed >= 5,
        "centurion" => snapshot.points >= 100,
        "week_streak" => snapshot.streak_days >= 7,
        _ => false,
    }
}

pub fn find(key: &str) -> Option<&'static Achievement> {
    CATALOG.iter().find(|achievement| achievement.key == key)
}

/// Keys whose condition holds but are not yet in `existing`, in catalog order.
pub fn newly_unlocked(snapshot: &ProgressSnapshot, existing: &[String]) -> Vec<&'static str> {
    CATALOG
        .iter()
        .filter(|achievement| is_met(achievement.key, snapshot))
        .filter(|achievement| !existing.iter().any(|key| key == achievement.key))
        .map(|achievement| achievement.key)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{CATALOG, ProgressSnapshot, find, newly_unlocked};

    #[test]
    fn nothing_unlocks_for_new_learner() {
        assert!(newly_unlocked(&ProgressSnapshot::default(), &[]).is_empty());
    }

    #[test]
    fn unlocks_match_thresholds() {
        let snapshot = ProgressSnapshot {
            words_learned: 3,
            vocabulary_stages_completed: 1,
            quiz_stages_completed: 0,
            points: 120,
            streak_days: 2,
        };
        assert_eq!(
            newly_unlocked(&snapshot, &[]),
            vec!["first_word", "first_stage", "centurion"]
        );
    }

    #[test]
    fn already_held_achievements_are_not_repeated() {
        let snapshot = ProgressSnapshot {
            words_learned: 60,
            streak_days: 7,
            ..ProgressSnapshot::default()
        };
        let existing = vec!["first_word".to_owned(), "week_streak".to_owned()];
        assert_eq!(newly_unlocked(&snapshot, &existing), vec!["word_collector"]);
    }

    #[test]
    fn catalog_keys_are_unique_and_findable() {
        for achievement in CATALOG {
            assert_eq!(find(achievement.key), Some(achievement));
        }
        assert!(find("unknown").is_none());
    }
}
