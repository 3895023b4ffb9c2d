//! Template filters.

use chrono::{DateTime, Datelike, Local, TimeZone, Utc};
use serde_json::Value;

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;

/// Wording used by [`relative_time`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    English,
    Chinese,
}

/// Describe a Unix timestamp relative to the current time.
pub fn relative_time(timestamp: i64, locale: Locale) -> String {
    relative_time_at(timestamp, Utc::now().timestamp(), locale)
}

/// Describe `timestamp` relative to `now` (both Unix seconds).
///
/// Anything under a minute old, or in the future, is "just now". Past a week
/// the local calendar date of `timestamp` is shown instead.
pub fn relative_time_at(timestamp: i64, now: i64, locale: Locale) -> String {
    let delta = now.saturating_sub(timestamp);

    match locale {
        Locale::English => match delta {
            d if d < MINUTE => "just now".to_string(),
            d if d < HOUR => format!("{} minutes ago", d / MINUTE),
            d if d < DAY => format!("{} hours ago", d / HOUR),
            d if d < WEEK => format!("{} days ago", d / DAY),
            _ => calendar_date(timestamp, locale),
        },
        Locale::Chinese => match delta {
            d if d < MINUTE => "1分钟前".to_string(),
            d if d < HOUR => format!("{}分钟前", d / MINUTE),
            d if d < DAY => format!("{}小时前", d / HOUR),
            d if d < WEEK => format!("{}天前", d / DAY),
            _ => calendar_date(timestamp, locale),
        },
    }
}

fn calendar_date(timestamp: i64, locale: Locale) -> String {
    let date = Local
        .timestamp_opt(timestamp, 0)
        .earliest()
        .map(|dt| dt.date_naive())
        .or_else(|| DateTime::<Utc>::from_timestamp(timestamp, 0).map(|dt| dt.date_naive()));

    match (date, locale) {
        (Some(d), Locale::English) => format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day()),
        (Some(d), Locale::Chinese) => format!("{}年{}月{}日", d.year(), d.month(), d.day()),
        (None, _) => timestamp.to_string(),
    }
}

/// The `datetime` template filter.
///
/// Numbers are read as Unix seconds (fractions dropped); any other value is
/// passed through as text.
pub fn datetime_filter(value: &Value, locale: Locale) -> String {
    let seconds = value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.floor() as i64));

    match seconds {
        Some(t) => relative_time(t, locale),
        None => match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    }
}
