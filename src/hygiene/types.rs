//! Core types for hygiene and risk evaluation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::thresholds::GuidelineId;

/// What a hygiene violation is about. One category per guideline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCategory {
    Overdue,
    Unestimated,
    Unassigned,
    TasksPerDeveloper,
    Blocked,
    StaleInProgress,
    LowCompletion,
    ScopeChange,
    CarriedOver,
    CriticalBugs,
    Reopened,
    StaleReview,
    NoRecentUpdate,
    MissingFixVersion,
}

impl ViolationCategory {
    pub fn for_guideline(id: GuidelineId) -> Self {
        match id {
            GuidelineId::MaxOverdueDays => Self::Overdue,
            GuidelineId::MaxUnestimatedPct => Self::Unestimated,
            GuidelineId::MaxUnassignedPct => Self::Unassigned,
            GuidelineId::MaxTasksPerDev => Self::TasksPerDeveloper,
            GuidelineId::MaxBlockedPct => Self::Blocked,
            GuidelineId::MaxInProgressDays => Self::StaleInProgress,
            GuidelineId::MinCompletedPct => Self::LowCompletion,
            GuidelineId::MaxScopeChangePct => Self::ScopeChange,
            GuidelineId::MaxCarriedOverPct => Self::CarriedOver,
            GuidelineId::MaxCriticalBugsOpen => Self::CriticalBugs,
            GuidelineId::MaxReopenedPct => Self::Reopened,
            GuidelineId::MaxReviewPendingDays => Self::StaleReview,
            GuidelineId::MaxNoUpdateDays => Self::NoRecentUpdate,
            GuidelineId::MaxIssuesWithoutFixVersionsPct => Self::MissingFixVersion,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Overdue => "Overdue",
            Self::Unestimated => "Unestimated",
            Self::Unassigned => "Unassigned",
            Self::TasksPerDeveloper => "Tasks per Developer",
            Self::Blocked => "Blocked",
            Self::StaleInProgress => "Stale In Progress",
            Self::LowCompletion => "Low Completion",
            Self::ScopeChange => "Scope Change",
            Self::CarriedOver => "Carried Over",
            Self::CriticalBugs => "Critical Bugs",
            Self::Reopened => "Reopened",
            Self::StaleReview => "Stale Review",
            Self::NoRecentUpdate => "No Recent Update",
            Self::MissingFixVersion => "Missing Fix Version",
        }
    }
}

impl std::fmt::Display for ViolationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An aggregate breach of one guideline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HygieneViolation {
    pub category: ViolationCategory,
    /// Guideline that produced this violation.
    pub guideline: GuidelineId,
    pub description: String,
    /// Offending issues, in input order.
    pub affected_issue_keys: Vec<String>,
    pub measured_value: f64,
    pub threshold_value: f64,
}

/// Why an individual issue is at risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskReason {
    Overdue,
    Stale,
    Blocked,
    UnassignedNearDeadline,
}

impl std::fmt::Display for RiskReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Overdue => "overdue",
            Self::Stale => "stale",
            Self::Blocked => "blocked",
            Self::UnassignedNearDeadline => "unassigned near deadline",
        };
        f.write_str(name)
    }
}

/// Risk severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        };
        f.write_str(name)
    }
}

/// All risk reasons for one issue, with the worst severity among them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFlag {
    pub issue_key: String,
    pub reasons: BTreeSet<RiskReason>,
    pub severity: Severity,
}

/// Output of one evaluation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub violations: Vec<HygieneViolation>,
    pub risk_flags: Vec<RiskFlag>,
}
