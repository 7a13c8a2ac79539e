use chrono::NaiveDate;

/// New streak length after activity on `today`.
///
/// Same-day activity keeps the streak, activity on the following day extends
/// it, and anything else (including a missing or future last date) restarts
/// it at 1.
pub fn next_streak(current: i32, last_active: Option<NaiveDate>, today: NaiveDate) -> i32 {
    let Some(last_active) = last_active else {
        return 1;
    };

    match (today - last_active).num_days() {
        0 => current.max(1),
        1 => current.saturating_add(1).max(1),
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::next_streak;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn first_activity_starts_streak() {
        assert_eq!(next_streak(0, None, day(10)), 1);
    }

    #[test]
    fn same_day_keeps_streak() {
        assert_eq!(next_streak(4, Some(day(10)), day(10)), 4);
        assert_eq!(next_streak(0, Some(day(10)), day(10)), 1);
    }

    #[test]
    fn consecutive_day_extends_streak() {
        assert_eq!(next_streak(4, Some(day(9)), day(10)), 5);
    }

    #[test]
    fn gap_resets_streak() {
        assert_eq!(next_streak(4, Some(day(7)), day(10)), 1);
        assert_eq!(next_streak(4, Some(day(12)), day(10)), 1);
    }
}
