use crate::points::{LevelSummary, POINTS_PER_LEVEL};

/// Name shown for a learner: full name when set, otherwise the username.
pub fn display_name(username: &str, full_name: Option<&str>) -> String {
    full_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(username)
        .to_owned()
}

/// e.g. "Level 2 · 30/100 XP".
pub fn level_progress_label(summary: &LevelSummary) -> String {
    format!(
        "Level {} \u{b7} {}/{} XP",
        summary.level, summary.progress, POINTS_PER_LEVEL
    )
}

pub fn streak_label(days: i32) -> String {
    match days {
        d if d <= 0 => "No streak yet".to_owned(),
        1 => "1 day streak".to_owned(),
        d => format!("{} day streak", d),
    }
}

/// Format seconds into a compact human-readable duration (e.g. 59s, 1m, 1h 30m, 7d).
pub fn format_compact_duration(total_seconds: u64) -> String {
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    let parts: Vec<String> = [(days, "d"), (hours, "h"), (minutes, "m"), (seconds, "s")]
        .into_iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{}{}", value, unit))
        .collect();

    if parts.is_empty() {
        "0s".to_owned()
    } else {
        parts.join(" ")
    }
}

/// Ordinal rank label for leaderboards ("1st", "2nd", "11th", ...).
pub fn rank_label(rank: usize) -> String {
    let suffix = match (rank % 10, rank % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", rank, suffix)
}

#[cfg(test)]
mod tests {
    use super::{
        display_name, format_compact_duration, level_progress_label, rank_label, streak_label,
    };
    use crate::points::LevelSummary;

    #[test]
    fn display_name_prefers_full_name() {
        assert_eq!(display_name("ada", Some("Ada Obi")), "Ada Obi");
        assert_eq!(display_name("ada", Some("  ")), "ada");
        assert_eq!(display_name("ada", None), "ada");
    }

    #[test]
    fn level_label() {
        assert_eq!(
            level_progress_label(&LevelSummary::from_points(130)),
            "Level 2 \u{b7} 30/100 XP"
        );
    }

    #[test]
    fn streak_labels() {
        assert_eq!(streak_label(0), "No streak yet");
        assert_eq!(streak_label(1), "1 day streak");
        assert_eq!(streak_label(9), "9 day streak");
    }

    #[test]
    fn compact_duration_formatting() {
        assert_eq!(format_compact_duration(0), "0s");
        assert_eq!(format_compact_duration(59), "59s");
        assert_eq!(format_compact_duration(3_660), "1h 1m");
        assert_eq!(format_compact_duration(604_800), "7d");
        assert_eq!(format_compact_duration(90_000), "1d 1h");
    }

    #[test]
    fn rank_suffixes() {
        assert_eq!(rank_label(1), "1st");
        assert_eq!(rank_label(2), "2nd");
        assert_eq!(rank_label(3), "3rd");
        assert_eq!(rank_label(4), "4th");
        assert_eq!(rank_label(11), "11th");
        assert_eq!(rank_label(12), "12th");
        assert_eq!(rank_label(22), "22nd");
        assert_eq!(rank_label(113), "113th");
    }
}
