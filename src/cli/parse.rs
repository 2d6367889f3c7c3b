use std::{fmt::Display, ops::RangeInclusive, str::FromStr};

use chrono::{DateTime, Utc};
use humantime::parse_duration;

pub fn parse_range_inclusive<N: PartialEq + PartialOrd + FromStr + Display>(
    s: &str,
    range: RangeInclusive<N>,
) -> Result<N, String> {
    let value: N = s.parse().map_err(|_| "invalid numeric value")?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "{} is not in range {}-{}",
            value,
            range.start(),
            range.end(),
        ))
    }
}

/// Accepts an RFC 3339 timestamp or a duration meaning "that long ago".
pub fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    parse_time_at(s, Utc::now())
}

fn parse_time_at(s: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
    if let Ok(time) = DateTime::parse_from_rfc3339(s) {
        return Ok(time.with_timezone(&Utc));
    }

    let ago = parse_duration(s).map_err(|_| format!("`{s}` is neither a timestamp nor a duration"))?;
    let ago = chrono::Duration::from_std(ago).map_err(|err| err.to_string())?;
    now.checked_sub_signed(ago)
        .ok_or_else(|| format!("`{s}` is too far in the past"))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn range() {
        assert_eq!(parse_range_inclusive("4", 1..=8), Ok(4));
        assert!(parse_range_inclusive("0", 1..=8).is_err());
        assert!(parse_range_inclusive("x", 1..=8).is_err());
    }

    #[test]
    fn time_rfc3339() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 1, 4, 5).unwrap();
        assert_eq!(parse_time("2024-01-02T03:04:05+02:00"), Ok(expected));
    }

    #[test]
    fn time_relative() {
        let now = Utc.with_ymd_and_hms(2024, 1, 21, 0, 0, 0).unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_time_at("20days", now), Ok(expected));
        assert!(parse_time_at("yesterday-ish", now).is_err());
    }
}
