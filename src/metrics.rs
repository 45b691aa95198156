//! Sprint-level aggregate statistics.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::{Issue, IssueStatus};
use crate::utils::percentage;

/// Issue counts per canonical status (cancelled issues are counted separately).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBreakdown {
    pub to_do: usize,
    pub in_progress: usize,
    pub review_pending: usize,
    pub done: usize,
    pub other: usize,
}

/// Task load of one developer, or of the unassigned bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkloadBucket {
    pub task_count: usize,
    pub open_count: usize,
    pub story_points: f64,
}

impl WorkloadBucket {
    fn add(&mut self, issue: &Issue) {
        self.task_count += 1;
        if issue.is_open() {
            self.open_count += 1;
        }
        self.story_points += issue.story_points.unwrap_or(0.0);
    }
}

/// Aggregate statistics over a normalized issue set.
///
/// Every count except `raw_issue_count` and `cancelled_count` excludes
/// cancelled issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintMetrics {
    pub raw_issue_count: usize,
    pub cancelled_count: usize,
    /// Non-cancelled issues; the denominator of every percentage.
    pub total_issues: usize,
    pub completed_count: usize,
    pub completed_pct: f64,
    /// True when there is nothing to measure completion against.
    pub no_active_issues: bool,
    pub status_breakdown: StatusBreakdown,
    pub total_story_points: f64,
    pub completed_story_points: f64,
    pub unestimated_count: usize,
    pub scope_added_count: usize,
    pub scope_removed_count: usize,
    /// False when the provider supplied no removed-issue list.
    pub scope_removed_known: bool,
    pub carried_over_count: usize,
    /// False when no issue carries the carried-over field.
    pub carried_over_known: bool,
    pub sprint_length_days: i64,
    pub days_elapsed: i64,
    pub days_remaining: i64,
    /// 1-based working day (Mon-Fri) of the sprint as of the analysis date.
    pub working_day_number: u32,
    pub developers: BTreeMap<String, WorkloadBucket>,
    pub unassigned: WorkloadBucket,
}

impl SprintMetrics {
    /// Sum of all workload buckets, unassigned included.
    pub fn bucketed_task_total(&self) -> usize {
        self.developers.values().map(|b| b.task_count).sum::<usize>() + self.unassigned.task_count
    }
}

/// Compute sprint metrics as of `as_of`.
///
/// `removed_keys` is the provider's list of issues taken out of the sprint;
/// `None` means the provider does not track removals.
pub fn compute_metrics(
    issues: &[Issue],
    sprint_start: NaiveDate,
    sprint_end: NaiveDate,
    as_of: DateTime<Utc>,
    removed_keys: Option<&[String]>,
) -> SprintMetrics {
    let active: Vec<&Issue> = issues.iter().filter(|i| !i.is_cancelled()).collect();
    let total_issues = active.len();

    let mut status_breakdown = StatusBreakdown::default();
    let mut developers: BTreeMap<String, WorkloadBucket> = BTreeMap::new();
    let mut unassigned = WorkloadBucket::default();
    let mut total_story_points = 0.0;
    let mut completed_story_points = 0.0;

    for issue in &active {
        match issue.status {
            IssueStatus::ToDo => status_breakdown.to_do += 1,
            IssueStatus::InProgress => status_breakdown.in_progress += 1,
            IssueStatus::ReviewPending => status_breakdown.review_pending += 1,
            IssueStatus::Done => status_breakdown.done += 1,
            IssueStatus::Other => status_breakdown.other += 1,
            IssueStatus::Cancelled => {}
        }

        let points = issue.story_points.unwrap_or(0.0);
        total_story_points += points;
        if issue.is_done() {
            completed_story_points += points;
        }

        match &issue.assignee {
            Some(name) => developers.entry(name.clone()).or_default().add(issue),
            None => unassigned.add(issue),
        }
    }

    let completed_count = status_breakdown.done;
    let carried_over_known = active.iter().any(|i| i.carried_over.is_some());
    let scope_removed_count = removed_keys
        .map(|keys| keys.iter().collect::<BTreeSet<_>>().len())
        .unwrap_or(0);

    let end = sprint_end.max(sprint_start);
    let today = as_of.date_naive().clamp(sprint_start, end);

    SprintMetrics {
        raw_issue_count: issues.len(),
        cancelled_count: issues.len() - total_issues,
        total_issues,
        completed_count,
        completed_pct: percentage(completed_count, total_issues),
        no_active_issues: total_issues == 0,
        status_breakdown,
        total_story_points,
        completed_story_points,
        unestimated_count: active.iter().filter(|i| i.story_points.is_none()).count(),
        scope_added_count: active.iter().filter(|i| i.created_during_sprint).count(),
        scope_removed_count,
        scope_removed_known: removed_keys.is_some(),
        carried_over_count: active
            .iter()
            .filter(|i| i.carried_over == Some(true))
            .count(),
        carried_over_known,
        sprint_length_days: (end - sprint_start).num_days(),
        days_elapsed: (today - sprint_start).num_days(),
        days_remaining: (end - today).num_days(),
        working_day_number: working_days_through(sprint_start, today),
        developers,
        unassigned,
    }
}

/// Weekdays from `start` through `day` inclusive, never less than 1.
fn working_days_through(start: NaiveDate, day: NaiveDate) -> u32 {
    let mut count = 0;
    let mut current = start;
    while current <= day {
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            count += 1;
        }
        current += Duration::days(1);
    }
    count.max(1)
}
