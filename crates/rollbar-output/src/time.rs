//! Relative and absolute time presentation
//!
//! All functions take the reference instant explicitly. Instants in the
//! future relative to `now` are treated as zero age.

use chrono::{DateTime, SecondsFormat, Utc};

/// Short age for machine-oriented output: `45m ago`, `3h ago`, `2d ago`, or `?`
pub fn terse(at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(at) = at else {
        return "?".to_string();
    };
    let age = (now - at).num_seconds().max(0);
    let minutes = age / 60;
    let hours = minutes / 60;

    if hours < 1 {
        format!("{}m ago", minutes)
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else {
        format!("{}d ago", hours / 24)
    }
}

/// Human age: `just now`, `1 minute ago`, `3 hours ago`, `2 weeks ago`, or `unknown`
pub fn verbose(at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(at) = at else {
        return "unknown".to_string();
    };
    let age = (now - at).num_seconds().max(0);
    let minutes = age / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if minutes < 1 {
        "just now".to_string()
    } else if hours < 1 {
        plural(minutes, "minute")
    } else if days < 1 {
        plural(hours, "hour")
    } else if days < 7 {
        plural(days, "day")
    } else {
        plural(days / 7, "week")
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

/// RFC 3339 UTC with second precision, or `unknown`
pub fn timestamp(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => at.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    fn ago(d: Duration) -> Option<DateTime<Utc>> {
        Some(now() - d)
    }

    #[test]
    fn test_terse() {
        let cases = [
            (ago(Duration::seconds(30)), "0m ago"),
            (ago(Duration::minutes(45)), "45m ago"),
            (ago(Duration::minutes(59)), "59m ago"),
            (ago(Duration::minutes(60)), "1h ago"),
            (ago(Duration::hours(23)), "23h ago"),
            (ago(Duration::hours(25)), "1d ago"),
            (ago(Duration::days(40)), "40d ago"),
            (None, "?"),
        ];
        for (at, expected) in cases {
            assert_eq!(terse(at, now()), expected);
        }
    }

    #[test]
    fn test_verbose() {
        let cases = [
            (ago(Duration::seconds(10)), "just now"),
            (ago(Duration::seconds(61)), "1 minute ago"),
            (ago(Duration::minutes(5)), "5 minutes ago"),
            (ago(Duration::minutes(61)), "1 hour ago"),
            (ago(Duration::minutes(125)), "2 hours ago"),
            (ago(Duration::hours(24)), "1 day ago"),
            (ago(Duration::days(6)), "6 days ago"),
            (ago(Duration::days(7)), "1 week ago"),
            (ago(Duration::days(30)), "4 weeks ago"),
            (None, "unknown"),
        ];
        for (at, expected) in cases {
            assert_eq!(verbose(at, now()), expected);
        }
    }

    #[test]
    fn test_future_instant_is_zero_age() {
        let future = Some(now() + Duration::minutes(10));
        assert_eq!(terse(future, now()), "0m ago");
        assert_eq!(verbose(future, now()), "just now");
    }

    #[test]
    fn test_timestamp() {
        assert_eq!(timestamp(Some(now())), "2024-01-15T12:00:00Z");
        assert_eq!(timestamp(None), "unknown");
    }
}
