//! Raw issue normalization.
//!
//! Maps loosely-typed provider records into canonical [`Issue`] values. Only a
//! missing key or status is fatal; every other gap degrades to `None` or a
//! documented default.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{
    FieldMapping, Issue, IssueStatus, LogicalField, Priority, RawIssueRecord, DEFAULT_ISSUE_TYPE,
};
use crate::utils::{parse_date, parse_timestamp};

/// Errors that abort normalization, and with it the whole analysis run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedInputError {
    #[error("issue record #{index} has no key (field '{field_id}')")]
    MissingKey { index: usize, field_id: String },
    #[error("issue {key} has no status (field '{field_id}')")]
    MissingStatus { key: String, field_id: String },
    #[error("issue key {0} appears more than once in the snapshot")]
    DuplicateKey(String),
}

/// Provider status names recognised for each canonical status.
///
/// Matching is case-insensitive; anything unlisted maps to [`IssueStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusMapping {
    pub to_do: Vec<String>,
    pub in_progress: Vec<String>,
    pub review_pending: Vec<String>,
    pub done: Vec<String>,
    pub cancelled: Vec<String>,
}

impl Default for StatusMapping {
    fn default() -> Self {
        fn names(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            to_do: names(&["To Do", "Open", "Backlog", "Selected for Development"]),
            in_progress: names(&["In Progress"]),
            review_pending: names(&["In Review", "Code Review", "Review", "Review Pending"]),
            done: names(&["Done", "Closed", "Resolved"]),
            cancelled: names(&["Cancelled", "Canceled", "Won't Do", "Won't Fix"]),
        }
    }
}

impl StatusMapping {
    pub fn resolve(&self, status_name: &str) -> IssueStatus {
        let wanted = status_name.trim();
        let matches = |names: &[String]| names.iter().any(|n| n.trim().eq_ignore_ascii_case(wanted));

        if matches(&self.cancelled) {
            IssueStatus::Cancelled
        } else if matches(&self.done) {
            IssueStatus::Done
        } else if matches(&self.review_pending) {
            IssueStatus::ReviewPending
        } else if matches(&self.in_progress) {
            IssueStatus::InProgress
        } else if matches(&self.to_do) {
            IssueStatus::ToDo
        } else {
            IssueStatus::Other
        }
    }
}

/// Labels that mark an issue as blocked when no explicit flag is set.
pub fn default_blocker_labels() -> Vec<String> {
    vec!["blocker".to_string(), "impediment".to_string()]
}

/// Configurable raw-to-canonical issue mapper.
#[derive(Debug, Clone)]
pub struct Normalizer {
    mapping: FieldMapping,
    statuses: StatusMapping,
    blocker_labels: BTreeSet<String>,
    sprint_start: Option<NaiveDate>,
}

impl Normalizer {
    pub fn new(mapping: FieldMapping) -> Self {
        Self {
            mapping,
            statuses: StatusMapping::default(),
            blocker_labels: default_blocker_labels().into_iter().collect(),
            sprint_start: None,
        }
    }

    pub fn with_statuses(mut self, statuses: StatusMapping) -> Self {
        self.statuses = statuses;
        self
    }

    pub fn with_blocker_labels(mut self, labels: &[String]) -> Self {
        self.blocker_labels = labels.iter().map(|l| l.trim().to_lowercase()).collect();
        self
    }

    /// Lets `created_during_sprint` be derived from the creation timestamp
    /// when the provider does not supply an explicit flag.
    pub fn with_sprint_start(mut self, start: NaiveDate) -> Self {
        self.sprint_start = Some(start);
        self
    }

    /// Normalize every record, preserving input order.
    pub fn normalize(&self, raw_issues: &[RawIssueRecord]) -> Result<Vec<Issue>, MalformedInputError> {
        let mut seen = HashSet::new();
        let mut issues = Vec::with_capacity(raw_issues.len());

        for (index, raw) in raw_issues.iter().enumerate() {
            let issue = self.normalize_one(index, raw)?;
            if !seen.insert(issue.key.clone()) {
                return Err(MalformedInputError::DuplicateKey(issue.key));
            }
            issues.push(issue);
        }

        debug!(
            "Normalized {} issues ({} unestimated, {} without due date)",
            issues.len(),
            issues.iter().filter(|i| i.story_points.is_none()).count(),
            issues.iter().filter(|i| i.due_date.is_none()).count()
        );
        Ok(issues)
    }

    fn normalize_one(&self, index: usize, raw: &RawIssueRecord) -> Result<Issue, MalformedInputError> {
        let key = self
            .field(raw, LogicalField::Key)
            .and_then(text)
            .ok_or_else(|| MalformedInputError::MissingKey {
                index,
                field_id: self
                    .mapping
                    .field_id(LogicalField::Key)
                    .unwrap_or_default()
                    .to_string(),
            })?;

        let status_name = self
            .field(raw, LogicalField::Status)
            .and_then(text)
            .ok_or_else(|| MalformedInputError::MissingStatus {
                key: key.clone(),
                field_id: self
                    .mapping
                    .field_id(LogicalField::Status)
                    .unwrap_or_default()
                    .to_string(),
            })?;

        let cancelled_flag = self
            .field(raw, LogicalField::Cancelled)
            .map(flag)
            .unwrap_or(false);
        let status = if cancelled_flag {
            IssueStatus::Cancelled
        } else {
            self.statuses.resolve(&status_name)
        };

        let labels: BTreeSet<String> = self
            .field(raw, LogicalField::Labels)
            .map(string_set)
            .unwrap_or_default();
        let blocked_by_label = labels
            .iter()
            .any(|l| self.blocker_labels.contains(&l.to_lowercase()));
        let blocked_flag = self
            .field(raw, LogicalField::Blocked)
            .map(flag)
            .unwrap_or(false);

        let created = self.field(raw, LogicalField::Created).and_then(timestamp);
        let created_during_sprint = match self.field(raw, LogicalField::AddedDuringSprint) {
            Some(value) => flag(value),
            None => match (created, self.sprint_start) {
                (Some(created), Some(start)) => created.date_naive() > start,
                _ => false,
            },
        };

        Ok(Issue {
            key,
            status,
            status_name,
            issue_type: self
                .field(raw, LogicalField::IssueType)
                .and_then(text)
                .unwrap_or_else(|| DEFAULT_ISSUE_TYPE.to_string()),
            summary: self.field(raw, LogicalField::Summary).and_then(text),
            assignee: self.field(raw, LogicalField::Assignee).and_then(person),
            reporter: self.field(raw, LogicalField::Reporter).and_then(person),
            story_points: self.field(raw, LogicalField::StoryPoints).and_then(story_points),
            due_date: self.field(raw, LogicalField::DueDate).and_then(date),
            created,
            last_updated: self.field(raw, LogicalField::Updated).and_then(timestamp),
            status_entered_at: self
                .field(raw, LogicalField::StatusEnteredAt)
                .and_then(timestamp),
            resolved_at: self
                .field(raw, LogicalField::ResolutionDate)
                .and_then(timestamp),
            created_during_sprint,
            carried_over: self.field(raw, LogicalField::CarriedOver).map(flag),
            reopened: self
                .field(raw, LogicalField::Reopened)
                .map(flag)
                .unwrap_or(false),
            fix_versions: self
                .field(raw, LogicalField::FixVersions)
                .map(string_set)
                .unwrap_or_default(),
            labels,
            is_blocked: blocked_flag || blocked_by_label,
            priority: self
                .field(raw, LogicalField::Priority)
                .and_then(text)
                .and_then(|p| p.parse::<Priority>().ok())
                .unwrap_or_default(),
            epic: self.field(raw, LogicalField::EpicLink).and_then(text),
        })
    }

    fn field<'r>(&self, raw: &'r RawIssueRecord, field: LogicalField) -> Option<&'r Value> {
        self.mapping.field_id(field).and_then(|id| raw.get(id))
    }
}

/// Normalize with default status names and blocker labels.
pub fn normalize(
    raw_issues: &[RawIssueRecord],
    mapping: &FieldMapping,
) -> Result<Vec<Issue>, MalformedInputError> {
    Normalizer::new(mapping.clone()).normalize(raw_issues)
}

/// Text from a plain string or a Jira-style `{"name": ..}` / `{"value": ..}` object.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(obj) => ["name", "value", "displayName", "key"]
            .iter()
            .find_map(|k| obj.get(*k))
            .and_then(text),
        _ => None,
    }
}

/// A user reference: prefers display name over login name or account id.
fn person(value: &Value) -> Option<String> {
    match value {
        Value::Object(obj) => ["displayName", "name", "emailAddress", "accountId"]
            .iter()
            .find_map(|k| obj.get(*k))
            .and_then(text),
        other => text(other),
    }
}

/// Non-negative finite number, from a JSON number or numeric string.
fn story_points(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (number.is_finite() && number >= 0.0).then_some(number)
}

fn flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "yes" | "y" | "1"
        ),
        // Jira's "Flagged" custom field is a list of selected options.
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
        Value::Null => false,
    }
}

fn string_set(value: &Value) -> BTreeSet<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(text).collect(),
        other => text(other).into_iter().collect(),
    }
}

fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value.as_str().and_then(parse_timestamp)
}

fn date(value: &Value) -> Option<NaiveDate> {
    value.as_str().and_then(parse_date)
}
