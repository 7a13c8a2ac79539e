use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{NaiveDate, Utc};

/// Return the current unix timestamp in seconds.
pub fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}

/// Current UTC calendar day, used for streak bookkeeping.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}
