use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Content track a stage belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    Vocabulary,
    Quiz,
}

impl Track {
    pub const ALL: [Track; 2] = [Track::Vocabulary, Track::Quiz];

    pub fn as_str(self) -> &'static str {
        match self {
            Track::Vocabulary => "vocabulary",
            Track::Quiz => "quiz",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "vocabulary" => Some(Track::Vocabulary),
            "quiz" => Some(Track::Quiz),
            _ => None,
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display status of a stage in a listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Completed,
    Unlocked,
    Locked,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("Stage {level} is locked. Complete stage {requires} first.")]
    Locked { level: i32, requires: i32 },
    #[error("Stage {0} does not exist.")]
    InvalidLevel(i32),
}

/// Result of trying to add a level to a completed set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    Appended,
    AlreadyCompleted,
    Rejected,
}

/// Stage 1 is always open; stage N needs N-1 in the completed set.
pub fn can_enter(completed: &BTreeSet<i32>, level: i32) -> bool {
    if level < 1 {
        return false;
    }

    level == 1 || completed.contains(&(level - 1))
}

/// Check entry and describe the blocking reason when refused.
pub fn gate(completed: &BTreeSet<i32>, level: i32) -> Result<(), GateError> {
    if level < 1 {
        return Err(GateError::InvalidLevel(level));
    }

    if can_enter(completed, level) {
        Ok(())
    } else {
        Err(GateError::Locked {
            level,
            requires: level - 1,
        })
    }
}

/// Add `level` to the completed set unless it is already there or the gate
/// refuses it. Calling this twice for the same level never appends twice.
pub fn record_completion(completed: &mut BTreeSet<i32>, level: i32) -> Completion {
    if completed.contains(&level) {
        return Completion::AlreadyCompleted;
    }

    if !can_enter(completed, level) {
        return Completion::Rejected;
    }

    completed.insert(level);
    Completion::Appended
}

pub fn stage_status(completed: &BTreeSet<i32>, level: i32) -> StageStatus {
    if completed.contains(&level) {
        StageStatus::Completed
    } else if can_enter(completed, level) {
        StageStatus::Unlocked
    } else {
        StageStatus::Locked
    }
}

/// Smallest available level above `completed_level`, if any.
pub fn next_stage(levels: &[i32], completed_level: i32) -> Option<i32> {
    levels
        .iter()
        .copied()
        .filter(|level| *level > completed_level)
        .min()
}

/// Tracks which items of a single stage a learner has marked as known.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StageProgress {
    total: usize,
    known: BTreeSet<usize>,
}

/// What happened when an item was marked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkOutcome {
    /// Item newly marked; stage still has unknown items.
    Marked,
    /// Item newly marked and it was the last one.
    StageComplete,
    /// Item was already known.
    AlreadyKnown,
    OutOfRange,
}

impl StageProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            known: BTreeSet::new(),
        }
    }

    /// Rebuild progress from persisted indices, ignoring any that no longer
    /// fit the stage (content may have shrunk since).
    pub fn with_known(total: usize, known: impl IntoIterator<Item = usize>) -> Self {
        let known = known.into_iter().filter(|index| *index < total).collect();
        Self { total, known }
    }

    pub fn mark_known(&mut self, index: usize) -> MarkOutcome {
        if index >= self.total {
            return MarkOutcome::OutOfRange;
        }

        if !self.known.insert(index) {
            return MarkOutcome::AlreadyKnown;
        }

        if self.is_complete() {
            MarkOutcome::StageComplete
        } else {
            MarkOutcome::Marked
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.known.len() == self.total
    }

    pub fn known_count(&self) -> usize {
        self.known.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn known_indices(&self) -> Vec<usize> {
        self.known.iter().copied().collect()
    }
}

/// Completion step of a mark. `known_after_write` is the learner's known
/// set read back after the write, so two requests racing on the last words
/// of a stage both see it finished. Returns the settled progress and, when
/// every item is known, what happened to the completed set.
pub fn settle_stage(
    total: usize,
    known_after_write: impl IntoIterator<Item = usize>,
    completed: &mut BTreeSet<i32>,
    level: i32,
) -> (StageProgress, Option<Completion>) {
    let progress = StageProgress::with_known(total, known_after_write);
    let completion = progress
        .is_complete()
        .then(|| record_completion(completed, level));
    (progress, completion)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{
        Completion, GateError, MarkOutcome, StageProgress, StageStatus, Track, can_enter, gate,
        next_stage, record_completion, settle_stage, stage_status,
    };

    fn set(levels: &[i32]) -> BTreeSet<i32> {
        levels.iter().copied().collect()
    }

    #[test]
    fn stage_one_is_always_open() {
        assert!(can_enter(&set(&[]), 1));
        assert!(can_enter(&set(&[4, 5]), 1));
    }

    #[test]
    fn later_stages_need_previous_level() {
        for level in 2..20 {
            assert!(!can_enter(&set(&[]), level));
            assert!(can_enter(&set(&[level - 1]), level));
            assert!(!can_enter(&set(&[level - 1]), level + 1));
        }
        assert!(!can_enter(&set(&[1]), 3));
        assert!(!can_enter(&set(&[1]), 0));
    }

    #[test]
    fn gate_reports_required_stage() {
        assert_eq!(gate(&set(&[1]), 2), Ok(()));
        assert_eq!(
            gate(&set(&[1]), 3),
            Err(GateError::Locked {
                level: 3,
                requires: 2
            })
        );
        assert_eq!(gate(&set(&[]), -1), Err(GateError::InvalidLevel(-1)));
        assert_eq!(
            GateError::Locked {
                level: 3,
                requires: 2
            }
            .to_string(),
            "Stage 3 is locked. Complete stage 2 first."
        );
    }

    #[test]
    fn completion_is_idempotent() {
        let mut completed = set(&[]);
        assert_eq!(record_completion(&mut completed, 1), Completion::Appended);
        assert_eq!(
            record_completion(&mut completed, 1),
            Completion::AlreadyCompleted
        );
        assert_eq!(completed, set(&[1]));
    }

    #[test]
    fn out_of_order_completion_is_rejected() {
        let mut completed = set(&[1]);
        assert_eq!(record_completion(&mut completed, 3), Completion::Rejected);
        assert_eq!(completed, set(&[1]));
        assert_eq!(record_completion(&mut completed, 2), Completion::Appended);
        assert_eq!(record_completion(&mut completed, 3), Completion::Appended);
    }

    #[test]
    fn statuses_follow_gate() {
        let completed = set(&[1, 2]);
        assert_eq!(stage_status(&completed, 1), StageStatus::Completed);
        assert_eq!(stage_status(&completed, 3), StageStatus::Unlocked);
        assert_eq!(stage_status(&completed, 4), StageStatus::Locked);
    }

    #[test]
    fn next_stage_skips_gaps() {
        assert_eq!(next_stage(&[1, 2, 3], 1), Some(2));
        assert_eq!(next_stage(&[3, 1, 5], 3), Some(5));
        assert_eq!(next_stage(&[1, 2, 3], 3), None);
    }

    #[test]
    fn marking_every_word_completes_stage() {
        let mut progress = StageProgress::new(3);
        assert_eq!(progress.mark_known(0), MarkOutcome::Marked);
        assert_eq!(progress.mark_known(0), MarkOutcome::AlreadyKnown);
        assert_eq!(progress.mark_known(2), MarkOutcome::Marked);
        assert!(!progress.is_complete());
        assert_eq!(progress.mark_known(1), MarkOutcome::StageComplete);
        assert!(progress.is_complete());
        assert_eq!(progress.known_count(), 3);
        assert_eq!(progress.mark_known(3), MarkOutcome::OutOfRange);
    }

    #[test]
    fn persisted_indices_outside_stage_are_dropped() {
        let progress = StageProgress::with_known(2, [0, 1, 7]);
        assert_eq!(progress.known_indices(), vec![0, 1]);
        assert!(progress.is_complete());
        assert!(!StageProgress::new(0).is_complete());
    }

    #[test]
    fn three_word_stage_completes_once() {
        let mut stored: BTreeSet<usize> = BTreeSet::new();
        let mut completed = set(&[]);

        for index in [0, 1] {
            let mut snapshot = StageProgress::with_known(3, stored.iter().copied());
            assert_eq!(snapshot.mark_known(index), MarkOutcome::Marked);
            stored.insert(index);
            let (progress, completion) = settle_stage(3, stored.iter().copied(), &mut completed, 1);
            assert_eq!(completion, None);
            assert_eq!(progress.known_count(), index + 1);
        }

        let mut snapshot = StageProgress::with_known(3, stored.iter().copied());
        assert_eq!(snapshot.mark_known(2), MarkOutcome::StageComplete);
        stored.insert(2);
        let (progress, completion) = settle_stage(3, stored.iter().copied(), &mut completed, 1);
        assert!(progress.is_complete());
        assert_eq!(completion, Some(Completion::Appended));
        assert_eq!(completed, set(&[1]));

        // The same request fired again finds the stage already recorded.
        let (_, completion) = settle_stage(3, stored.iter().copied(), &mut completed, 1);
        assert_eq!(completion, Some(Completion::AlreadyCompleted));
        assert_eq!(completed, set(&[1]));
    }

    #[test]
    fn racing_marks_of_the_last_words_complete_the_stage() {
        let mut stored: BTreeSet<usize> = [0].into_iter().collect();
        let mut first = StageProgress::with_known(3, stored.iter().copied());
        let mut second = StageProgress::with_known(3, stored.iter().copied());

        // Each request alone believes a word is still missing.
        assert_eq!(first.mark_known(1), MarkOutcome::Marked);
        assert_eq!(second.mark_known(2), MarkOutcome::Marked);
        stored.insert(1);
        stored.insert(2);

        let mut first_completed = set(&[1]);
        let mut second_completed = set(&[1]);
        let (_, first_outcome) = settle_stage(3, stored.iter().copied(), &mut first_completed, 2);
        let (_, second_outcome) = settle_stage(3, stored.iter().copied(), &mut second_completed, 2);
        assert_eq!(first_outcome, Some(Completion::Appended));
        assert_eq!(second_outcome, Some(Completion::Appended));
        assert_eq!(first_completed, set(&[1, 2]));
    }

    #[test]
    fn settling_a_locked_stage_is_rejected() {
        let mut completed = set(&[]);
        let (_, completion) = settle_stage(1, [0], &mut completed, 3);
        assert_eq!(completion, Some(Completion::Rejected));
        assert!(completed.is_empty());
    }

    #[test]
    fn tracks_parse_case_insensitively() {
        assert_eq!(Track::parse(" Quiz "), Some(Track::Quiz));
        assert_eq!(Track::parse("vocabulary"), Some(Track::Vocabulary));
        assert_eq!(Track::parse("grammar"), None);
        assert_eq!(Track::Vocabulary.to_string(), "vocabulary");
    }
}
