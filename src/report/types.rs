//! Report data model consumed by renderers.

use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::hygiene::{HygieneViolation, RiskFlag};
use crate::metrics::SprintMetrics;
use crate::models::{IssueStatus, SprintIdentity};

/// Which view of the sprint a report is meant for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    /// Headline metrics and the top risks.
    Daily,
    /// Everything the engine produced.
    #[default]
    Full,
    /// A closed sprint, with completed-after-end and removed tables.
    Previous,
}

impl ReportMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Full => "full",
            Self::Previous => "previous",
        }
    }
}

impl std::fmt::Display for ReportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ReportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "full" => Ok(Self::Full),
            "previous" => Ok(Self::Previous),
            other => Err(format!("unknown report mode '{}'", other)),
        }
    }
}

/// Non-fatal data quality problem that weakens some figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataWarning {
    /// No removed-issue list; scope change counts additions only.
    ScopeRemovedUnavailable,
    /// No issue says whether it was carried over.
    CarriedOverUnavailable,
    MissingDueDates { count: usize },
    MissingStoryPoints { count: usize },
    MissingUpdateTimestamps { count: usize },
}

impl std::fmt::Display for DataWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ScopeRemovedUnavailable => {
                write!(f, "Removed issues are not tracked; scope change counts additions only")
            }
            Self::CarriedOverUnavailable => {
                write!(f, "Carried-over data is unavailable")
            }
            Self::MissingDueDates { count } => {
                write!(f, "{} open issue(s) have no due date", count)
            }
            Self::MissingStoryPoints { count } => {
                write!(f, "{} issue(s) have no story points", count)
            }
            Self::MissingUpdateTimestamps { count } => {
                write!(f, "{} issue(s) have no last-updated timestamp", count)
            }
        }
    }
}

/// One issue as shown in a detail table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRow {
    pub key: String,
    #[serde(default)]
    pub summary: Option<String>,
    pub issue_type: String,
    pub status: IssueStatus,
    /// Provider status name as received.
    pub status_name: String,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub story_points: Option<f64>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub days_since_created: Option<i64>,
}

/// Per-developer workload with the issues behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeveloperWorkload {
    /// `None` for the unassigned bucket.
    pub developer: Option<String>,
    pub task_count: usize,
    pub open_count: usize,
    pub story_points: f64,
    pub issues: Vec<IssueRow>,
}

/// Sprint issues grouped under one epic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpicSummary {
    pub epic: String,
    pub issue_count: usize,
    pub done_count: usize,
    pub story_points: f64,
    pub issues: Vec<IssueRow>,
}

/// Tables derived from the issue list so renderers need nothing else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailTables {
    /// Non-bug issues without a fix version.
    pub without_fix_versions: Vec<IssueRow>,
    pub unestimated: Vec<IssueRow>,
    /// Developers by name, then the unassigned bucket if it has issues.
    pub workload: Vec<DeveloperWorkload>,
    pub completed_after_sprint_end: Vec<IssueRow>,
    pub removed_issue_keys: Vec<String>,
    /// Epics by key; empty unless the epic link field is mapped.
    pub epics: Vec<EpicSummary>,
    /// Every non-cancelled issue in input order.
    pub active_issues: Vec<IssueRow>,
}

/// Complete sprint health report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintReport {
    pub sprint: SprintIdentity,
    /// The analysis date, not the wall clock.
    pub generated_at: DateTime<Utc>,
    pub mode: ReportMode,
    pub metrics: SprintMetrics,
    pub violations: Vec<HygieneViolation>,
    pub risk_flags: Vec<RiskFlag>,
    pub warnings: Vec<DataWarning>,
    pub details: DetailTables,
}

impl SprintReport {
    pub fn with_mode(mut self, mode: ReportMode) -> Self {
        self.mode = mode;
        self
    }

    /// The `limit` most severe risk flags.
    pub fn top_risks(&self, limit: usize) -> &[RiskFlag] {
        &self.risk_flags[..limit.min(self.risk_flags.len())]
    }

    pub fn is_healthy(&self) -> bool {
        self.violations.is_empty() && self.risk_flags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("Daily".parse::<ReportMode>(), Ok(ReportMode::Daily));
        assert_eq!(" previous ".parse::<ReportMode>(), Ok(ReportMode::Previous));
        assert!("weekly".parse::<ReportMode>().is_err());
    }

    #[test]
    fn warnings_serialize_with_kind_tag() {
        let json = serde_json::to_string(&DataWarning::MissingDueDates { count: 2 }).unwrap();
        assert_eq!(json, r#"{"kind":"missing_due_dates","count":2}"#);
    }
}
