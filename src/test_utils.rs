//! Shared test utilities for creating test fixtures.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::models::{Issue, IssueStatus};
use crate::thresholds::{GuidelineId, ThresholdConfig};

/// Calendar date shorthand.
pub fn day(year: i32, month: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, d).expect("valid test date")
}

/// Noon UTC on the given date.
pub fn at(year: i32, month: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, d, 12, 0, 0)
        .single()
        .expect("valid test timestamp")
}

/// Create a minimal issue with every optional field absent.
pub fn make_issue(key: &str, status: IssueStatus) -> Issue {
    Issue::new(key, status)
}

/// Create an issue assigned to `assignee`.
pub fn make_assigned(key: &str, status: IssueStatus, assignee: &str) -> Issue {
    let mut issue = Issue::new(key, status);
    issue.assignee = Some(assignee.to_string());
    issue
}

/// Threshold config with only the listed guidelines configured.
pub fn thresholds(values: &[(GuidelineId, f64)]) -> ThresholdConfig {
    values
        .iter()
        .fold(ThresholdConfig::unconfigured(), |config, (id, value)| {
            config.with(*id, *value).expect("valid test threshold")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_assigned() {
        let issue = make_assigned("A-1", IssueStatus::ToDo, "ana");
        assert_eq!(issue.assignee.as_deref(), Some("ana"));
        assert_eq!(issue.story_points, None);
    }

    #[test]
    fn test_thresholds_only_sets_listed() {
        let config = thresholds(&[(GuidelineId::MaxOverdueDays, 2.0)]);
        assert!(config.is_configured(GuidelineId::MaxOverdueDays));
        assert!(!config.is_configured(GuidelineId::MaxBlockedPct));
    }
}
