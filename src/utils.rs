use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Jira's native timestamp layout, e.g. `2024-03-04T09:15:00.000+0000`.
const JIRA_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Parse a timestamp in RFC 3339, Jira's `+0000` offset form, or a bare date
/// (taken as midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, JIRA_TIMESTAMP_FORMAT) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse a calendar date from either a bare `YYYY-MM-DD` or any timestamp
/// accepted by [`parse_timestamp`].
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(raw).map(|ts| ts.date_naive()))
}

/// `part * 100 / whole`, defined as 0 when `whole` is 0.
///
/// Scaling before dividing keeps the result exact whenever it is representable,
/// so 7 of 100 is exactly 7.0 and compares equal to a 7% limit.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

/// Whole days between two instants, truncated toward zero.
pub fn whole_days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    (later - earlier).num_days()
}

/// Serde helpers for dates that may arrive as a bare date or a full timestamp.
pub mod flexible_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_rfc3339() {
        let ts = parse_timestamp("2024-03-04T09:15:00Z").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 4, 9, 15, 0).unwrap());
    }

    #[test]
    fn parses_jira_offset_format() {
        let ts = parse_timestamp("2024-03-04T10:15:00.000+0100").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 4, 9, 15, 0).unwrap());
    }

    #[test]
    fn parses_bare_date_as_midnight() {
        let ts = parse_timestamp("2024-03-04").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
        assert!(parse_date("03/04/2024").is_none());
    }

    #[test]
    fn date_from_timestamp() {
        assert_eq!(
            parse_date("2024-03-04T23:00:00.000Z"),
            NaiveDate::from_ymd_opt(2024, 3, 4)
        );
    }

    #[test]
    fn percentage_of_zero_is_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 5), 20.0);
    }

    #[test]
    fn whole_percentages_are_exact() {
        assert_eq!(percentage(7, 100), 7.0);
        assert_eq!(percentage(29, 100), 29.0);
        assert_eq!(percentage(57, 100), 57.0);
        for whole in 1..=200 {
            for part in 0..=whole {
                if (part * 100) % whole == 0 {
                    assert_eq!(percentage(part, whole), (part * 100 / whole) as f64);
                }
            }
        }
    }
}
