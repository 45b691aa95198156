//! Per-developer task load.

use crate::hygiene::checks::{CheckContext, Findings};
use crate::thresholds::GuidelineId;

/// One violation per overloaded developer. The unassigned bucket is never a
/// developer and is never reported here.
pub fn check(ctx: &CheckContext<'_>, threshold: f64, findings: &mut Findings) {
    for (developer, bucket) in &ctx.metrics.developers {
        let count = bucket.task_count as f64;
        if count <= threshold {
            continue;
        }

        let keys: Vec<String> = ctx
            .active_issues()
            .filter(|i| i.assignee.as_deref() == Some(developer.as_str()))
            .map(|i| i.key.clone())
            .collect();

        findings.violation(
            GuidelineId::MaxTasksPerDev,
            format!(
                "{} has {} tasks ({} open), limit is {}",
                developer, bucket.task_count, bucket.open_count, threshold
            ),
            keys,
            count,
            threshold,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hygiene::RiskOptions;
    use crate::metrics::compute_metrics;
    use crate::models::{Issue, IssueStatus};
    use crate::test_utils::{at, day, make_assigned, make_issue};

    fn run(issues: &[Issue], threshold: f64) -> Findings {
        let as_of = at(2024, 3, 6);
        let metrics = compute_metrics(issues, day(2024, 3, 4), day(2024, 3, 15), as_of, None);
        let options = RiskOptions::default();
        let ctx = CheckContext::new(&metrics, issues, as_of, &options);
        let mut findings = Findings::default();
        check(&ctx, threshold, &mut findings);
        findings
    }

    #[test]
    fn each_overloaded_developer_is_reported() {
        let issues = vec![
            make_assigned("A-1", IssueStatus::ToDo, "zoe"),
            make_assigned("A-2", IssueStatus::ToDo, "zoe"),
            make_assigned("A-3", IssueStatus::ToDo, "ana"),
            make_assigned("A-4", IssueStatus::Done, "ana"),
            make_assigned("A-5", IssueStatus::ToDo, "bo"),
        ];
        let findings = run(&issues, 1.0);
        assert_eq!(findings.violations.len(), 2);
        assert!(findings.violations[0].description.starts_with("ana"));
        assert_eq!(findings.violations[1].affected_issue_keys, vec!["A-1", "A-2"]);
    }

    #[test]
    fn unassigned_bucket_never_reported() {
        let issues = vec![
            make_issue("A-1", IssueStatus::ToDo),
            make_issue("A-2", IssueStatus::ToDo),
            make_issue("A-3", IssueStatus::ToDo),
        ];
        assert!(run(&issues, 1.0).violations.is_empty());
    }

    #[test]
    fn at_limit_is_fine() {
        let issues = vec![
            make_assigned("A-1", IssueStatus::ToDo, "ana"),
            make_assigned("A-2", IssueStatus::ToDo, "ana"),
        ];
        assert!(run(&issues, 2.0).violations.is_empty());
    }
}
