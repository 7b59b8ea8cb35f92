//! Parsing of `--since`, `--from` and `--to` arguments

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// Absolute forms accepted after RFC 3339, interpreted as UTC
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// A lookback made only of `<N><unit>` terms
static LOOKBACK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+\s*[a-z]+\s*)+$").expect("valid lookback regex"));

/// One `<N><unit>` term
static TERM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*([a-z]+)").expect("valid term regex"));

/// Resolve a lookback such as `24h`, `8 hours ago`, `1h30m` or an absolute
/// timestamp to an instant relative to `now`
pub fn parse_since(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();
    if let Ok(at) = parse_time(trimmed) {
        return Ok(at);
    }

    let lower = trimmed.to_lowercase();
    let lookback = lower.strip_suffix(" ago").unwrap_or(&lower).trim();
    let seconds = duration_seconds(lookback)
        .ok_or_else(|| anyhow!("unable to parse duration: {}", input.trim()))?;

    let delta = chrono::Duration::from_std(std::time::Duration::from_secs(seconds))
        .map_err(|_| anyhow!("duration too large: {}", input.trim()))?;
    now.checked_sub_signed(delta)
        .ok_or_else(|| anyhow!("duration too large: {}", input.trim()))
}

/// Parse an absolute `--from` / `--to` timestamp
pub fn parse_time(input: &str) -> Result<DateTime<Utc>> {
    let s = input.trim();

    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Ok(at.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Some(naive) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(naive.and_utc());
    }

    bail!(
        "unable to parse time: {} (use ISO 8601 format like 2006-01-02T15:04:05)",
        s
    )
}

/// Total seconds of `<N><unit>` terms, e.g. `7 days` or `1h30m`
fn duration_seconds(lookback: &str) -> Option<u64> {
    if !LOOKBACK_REGEX.is_match(lookback) {
        return None;
    }

    let mut total: u64 = 0;
    for caps in TERM_REGEX.captures_iter(lookback) {
        let n: u64 = caps[1].parse().ok()?;
        let unit = unit_seconds(&caps[2])?;
        total = total.checked_add(n.checked_mul(unit)?)?;
    }
    Some(total)
}

fn unit_seconds(unit: &str) -> Option<u64> {
    let singular = match unit {
        "s" => unit,
        "ms" => return None,
        _ => unit.strip_suffix('s').unwrap_or(unit),
    };
    let secs = match singular {
        "second" | "sec" | "s" => 1,
        "minute" | "min" | "m" => 60,
        "hour" | "hr" | "h" => 60 * 60,
        "day" | "d" => 24 * 60 * 60,
        "week" | "w" => 7 * 24 * 60 * 60,
        "month" | "mon" => 30 * 24 * 60 * 60,
        _ => return None,
    };
    Some(secs)
}
