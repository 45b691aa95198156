//! Report model building and rendering.

pub mod render;
pub mod types;

pub use render::{render, OutputFormat, RenderOptions};
pub use types::{
    DataWarning, DetailTables, DeveloperWorkload, EpicSummary, IssueRow, ReportMode,
    SprintReport,
};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::hygiene::{HygieneViolation, RiskFlag};
use crate::metrics::SprintMetrics;
use crate::models::{Issue, SprintIdentity};
use crate::utils::whole_days_between;

/// Assemble a report from engine output.
///
/// Pure: detail tables and data warnings are derived from `issues` and
/// `metrics` only. The report starts in [`ReportMode::Full`].
pub fn build(
    identity: &SprintIdentity,
    metrics: SprintMetrics,
    violations: Vec<HygieneViolation>,
    risk_flags: Vec<RiskFlag>,
    issues: &[Issue],
    as_of: DateTime<Utc>,
) -> SprintReport {
    let active: Vec<&Issue> = issues.iter().filter(|i| !i.is_cancelled()).collect();
    let warnings = data_warnings(&metrics, &active);
    let details = DetailTables {
        without_fix_versions: rows(&active, as_of, |i| !i.is_bug() && i.fix_versions.is_empty()),
        unestimated: rows(&active, as_of, |i| !i.is_bug() && i.story_points.is_none()),
        workload: workload(&metrics, &active, as_of),
        completed_after_sprint_end: rows(&active, as_of, |i| {
            i.is_done()
                && i
                    .resolved_at
                    .is_some_and(|at| at.date_naive() > identity.end_date)
        }),
        removed_issue_keys: Vec::new(),
        epics: epics(&active, as_of),
        active_issues: rows(&active, as_of, |_| true),
    };

    SprintReport {
        sprint: identity.clone(),
        generated_at: as_of,
        mode: ReportMode::default(),
        metrics,
        violations,
        risk_flags,
        warnings,
        details,
    }
}

impl SprintReport {
    /// Attach the provider's removed-issue list, deduplicated and sorted.
    pub fn with_removed_issue_keys(mut self, keys: &[String]) -> Self {
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();
        self.details.removed_issue_keys = keys;
        self
    }
}

fn data_warnings(metrics: &SprintMetrics, active: &[&Issue]) -> Vec<DataWarning> {
    let mut warnings = Vec::new();

    if !metrics.scope_removed_known {
        warnings.push(DataWarning::ScopeRemovedUnavailable);
    }
    if !active.is_empty() && !metrics.carried_over_known {
        warnings.push(DataWarning::CarriedOverUnavailable);
    }

    let missing_due = active
        .iter()
        .filter(|i| i.is_open() && i.due_date.is_none())
        .count();
    if missing_due > 0 {
        warnings.push(DataWarning::MissingDueDates { count: missing_due });
    }

    let missing_points = active.iter().filter(|i| i.story_points.is_none()).count();
    if missing_points > 0 {
        warnings.push(DataWarning::MissingStoryPoints {
            count: missing_points,
        });
    }

    let missing_updates = active.iter().filter(|i| i.last_updated.is_none()).count();
    if missing_updates > 0 {
        warnings.push(DataWarning::MissingUpdateTimestamps {
            count: missing_updates,
        });
    }

    warnings
}

fn rows<F>(active: &[&Issue], as_of: DateTime<Utc>, keep: F) -> Vec<IssueRow>
where
    F: Fn(&Issue) -> bool,
{
    active
        .iter()
        .filter(|i| keep(i))
        .map(|i| issue_row(i, as_of))
        .collect()
}

fn issue_row(issue: &Issue, as_of: DateTime<Utc>) -> IssueRow {
    IssueRow {
        key: issue.key.clone(),
        summary: issue.summary.clone(),
        issue_type: issue.issue_type.clone(),
        status: issue.status,
        status_name: issue.status_name.clone(),
        assignee: issue.assignee.clone(),
        story_points: issue.story_points,
        due_date: issue.due_date,
        days_since_created: issue
            .created
            .map(|created| whole_days_between(created, as_of)),
    }
}

fn workload(
    metrics: &SprintMetrics,
    active: &[&Issue],
    as_of: DateTime<Utc>,
) -> Vec<DeveloperWorkload> {
    let mut table: Vec<DeveloperWorkload> = metrics
        .developers
        .iter()
        .map(|(developer, bucket)| DeveloperWorkload {
            developer: Some(developer.clone()),
            task_count: bucket.task_count,
            open_count: bucket.open_count,
            story_points: bucket.story_points,
            issues: rows(active, as_of, |i| {
                i.assignee.as_deref() == Some(developer.as_str())
            }),
        })
        .collect();

    if metrics.unassigned.task_count > 0 {
        table.push(DeveloperWorkload {
            developer: None,
            task_count: metrics.unassigned.task_count,
            open_count: metrics.unassigned.open_count,
            story_points: metrics.unassigned.story_points,
            issues: rows(active, as_of, |i| i.assignee.is_none()),
        });
    }

    table
}

fn epics(active: &[&Issue], as_of: DateTime<Utc>) -> Vec<EpicSummary> {
    let mut grouped: BTreeMap<&str, Vec<&Issue>> = BTreeMap::new();
    for &issue in active {
        if let Some(epic) = issue.epic.as_deref() {
            grouped.entry(epic).or_default().push(issue);
        }
    }

    grouped
        .into_iter()
        .map(|(epic, issues)| EpicSummary {
            epic: epic.to_string(),
            issue_count: issues.len(),
            done_count: issues.iter().filter(|i| i.is_done()).count(),
            story_points: issues.iter().filter_map(|i| i.story_points).sum(),
            issues: rows(&issues, as_of, |_| true),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::compute_metrics;
    use crate::models::{BoardIdentity, IssueStatus};
    use crate::test_utils::{at, day, make_assigned, make_issue};

    fn identity() -> SprintIdentity {
        SprintIdentity {
            id: 7,
            name: "Sprint 7".to_string(),
            start_date: day(2024, 3, 4),
            end_date: day(2024, 3, 15),
            goal: None,
            board: BoardIdentity::default(),
        }
    }

    fn report(issues: &[Issue], removed: Option<&[String]>) -> SprintReport {
        let as_of = at(2024, 3, 18);
        let metrics = compute_metrics(issues, day(2024, 3, 4), day(2024, 3, 15), as_of, removed);
        build(&identity(), metrics, Vec::new(), Vec::new(), issues, as_of)
    }

    #[test]
    fn detail_tables_exclude_cancelled_issues() {
        let mut late = make_assigned("A-1", IssueStatus::Done, "ana");
        late.resolved_at = Some(at(2024, 3, 16));
        late.story_points = Some(2.0);
        late.fix_versions.insert("1.0".to_string());
        let mut bug = make_issue("B-1", IssueStatus::ToDo);
        bug.issue_type = "Bug".to_string();
        let issues = vec![
            late,
            bug,
            make_issue("S-1", IssueStatus::ToDo),
            make_issue("C-1", IssueStatus::Cancelled),
        ];

        let report = report(&issues, None);
        let details = &report.details;
        let keys = |rows: &[IssueRow]| rows.iter().map(|r| r.key.clone()).collect::<Vec<_>>();

        assert_eq!(keys(&details.active_issues), vec!["A-1", "B-1", "S-1"]);
        assert_eq!(keys(&details.without_fix_versions), vec!["S-1"]);
        // Bugs are not expected to carry an estimate.
        assert_eq!(keys(&details.unestimated), vec!["S-1"]);
        assert_eq!(keys(&details.completed_after_sprint_end), vec!["A-1"]);
    }

    #[test]
    fn epics_group_active_issues_by_key() {
        let mut a = make_assigned("A-1", IssueStatus::Done, "ana");
        a.epic = Some("EP-2".to_string());
        a.story_points = Some(3.0);
        let mut b = make_issue("A-2", IssueStatus::ToDo);
        b.epic = Some("EP-1".to_string());
        let mut c = make_issue("A-3", IssueStatus::InProgress);
        c.epic = Some("EP-2".to_string());
        c.story_points = Some(2.0);
        let mut cancelled = make_issue("A-4", IssueStatus::Cancelled);
        cancelled.epic = Some("EP-3".to_string());
        let issues = vec![a, b, c, cancelled, make_issue("A-5", IssueStatus::ToDo)];

        let epics = report(&issues, None).details.epics;
        let names: Vec<&str> = epics.iter().map(|e| e.epic.as_str()).collect();
        assert_eq!(names, vec!["EP-1", "EP-2"]);
        assert_eq!(epics[1].issue_count, 2);
        assert_eq!(epics[1].done_count, 1);
        assert_eq!(epics[1].story_points, 5.0);
        assert_eq!(epics[1].issues[1].key, "A-3");
    }

    #[test]
    fn workload_lists_unassigned_last() {
        let issues = vec![
            make_issue("A-1", IssueStatus::ToDo),
            make_assigned("A-2", IssueStatus::ToDo, "zoe"),
            make_assigned("A-3", IssueStatus::Done, "ana"),
        ];
        let report = report(&issues, None);
        let owners: Vec<Option<&str>> = report
            .details
            .workload
            .iter()
            .map(|w| w.developer.as_deref())
            .collect();
        assert_eq!(owners, vec![Some("ana"), Some("zoe"), None]);
        assert_eq!(report.details.workload[2].issues[0].key, "A-1");
    }

    #[test]
    fn warnings_reflect_missing_data() {
        let issues = vec![make_issue("A-1", IssueStatus::ToDo)];
        let report = report(&issues, None);
        assert_eq!(
            report.warnings,
            vec![
                DataWarning::ScopeRemovedUnavailable,
                DataWarning::CarriedOverUnavailable,
                DataWarning::MissingDueDates { count: 1 },
                DataWarning::MissingStoryPoints { count: 1 },
                DataWarning::MissingUpdateTimestamps { count: 1 },
            ]
        );

        let removed = vec!["X-2".to_string(), "X-1".to_string(), "X-2".to_string()];
        let report = report_with_removed(&[], &removed);
        assert!(report.warnings.is_empty());
        assert_eq!(report.details.removed_issue_keys, vec!["X-1", "X-2"]);
    }

    fn report_with_removed(issues: &[Issue], removed: &[String]) -> SprintReport {
        report(issues, Some(removed)).with_removed_issue_keys(removed)
    }

    #[test]
    fn generated_at_is_the_analysis_date() {
        let report = report(&[], None);
        assert_eq!(report.generated_at, at(2024, 3, 18));
        assert_eq!(report.mode, ReportMode::Full);
    }
}
