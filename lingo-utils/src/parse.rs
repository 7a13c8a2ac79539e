/// Parse a compact duration like `30m`, `12h`, `7d`, `2w`, `1d12h` or plain
/// seconds. Zero and overflowing values are rejected.
pub fn parse_duration_seconds(raw: &str) -> Option<u64> {
    let compact: String = raw.chars().filter(|ch| !ch.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }

    if let Ok(seconds) = compact.parse::<u64>() {
        return (seconds > 0).then_some(seconds);
    }

    let mut total_seconds = 0_u64;
    let mut digits = String::new();

    for ch in compact.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }

        let multiplier = match ch.to_ascii_lowercase() {
            's' => 1_u64,
            'm' => 60,
            'h' => 60 * 60,
            'd' => 60 * 60 * 24,
            'w' => 60 * 60 * 24 * 7,
            _ => return None,
        };

        let number = digits.parse::<u64>().ok().filter(|value| *value > 0)?;
        digits.clear();
        total_seconds = total_seconds.checked_add(number.checked_mul(multiplier)?)?;
    }

    // Trailing digits without a unit after a unit segment, e.g. `1h30`.
    if !digits.is_empty() {
        return None;
    }

    (total_seconds > 0).then_some(total_seconds)
}

/// Truthy flag values accepted in configuration.
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::{parse_duration_seconds, parse_flag};

    #[test]
    fn parses_units_and_plain_seconds() {
        assert_eq!(parse_duration_seconds("45"), Some(45));
        assert_eq!(parse_duration_seconds("30m"), Some(1_800));
        assert_eq!(parse_duration_seconds("12H"), Some(43_200));
        assert_eq!(parse_duration_seconds("7d"), Some(604_800));
        assert_eq!(parse_duration_seconds("2w"), Some(1_209_600));
        assert_eq!(parse_duration_seconds("1d 12h"), Some(129_600));
    }

    #[test]
    fn rejects_malformed_durations() {
        assert_eq!(parse_duration_seconds(""), None);
        assert_eq!(parse_duration_seconds("0"), None);
        assert_eq!(parse_duration_seconds("0h"), None);
        assert_eq!(parse_duration_seconds("h"), None);
        assert_eq!(parse_duration_seconds("1h30"), None);
        assert_eq!(parse_duration_seconds("5y"), None);
    }

    #[test]
    fn flags() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" on "));
        assert!(!parse_flag("off"));
        assert!(!parse_flag(""));
    }
}
