//! Percentage-of-sprint checks.
//!
//! All share one rule: count offending non-cancelled issues, divide by the
//! number of non-cancelled issues, and report only when the percentage is
//! strictly above the limit.

use crate::hygiene::checks::{CheckContext, Findings};
use crate::models::Issue;
use crate::thresholds::GuidelineId;
use crate::utils::percentage;

pub fn unestimated(ctx: &CheckContext<'_>, threshold: f64, findings: &mut Findings) {
    // Bugs are routinely left unestimated and do not count against the sprint.
    ratio_check(
        ctx,
        GuidelineId::MaxUnestimatedPct,
        threshold,
        "have no story point estimate",
        |i| !i.is_bug() && i.story_points.is_none(),
        findings,
    );
}

pub fn unassigned(ctx: &CheckContext<'_>, threshold: f64, findings: &mut Findings) {
    ratio_check(
        ctx,
        GuidelineId::MaxUnassignedPct,
        threshold,
        "are unassigned",
        |i| i.assignee.is_none(),
        findings,
    );
}

pub fn blocked(ctx: &CheckContext<'_>, threshold: f64, findings: &mut Findings) {
    ratio_check(
        ctx,
        GuidelineId::MaxBlockedPct,
        threshold,
        "are blocked",
        |i| i.is_blocked,
        findings,
    );
}

pub fn reopened(ctx: &CheckContext<'_>, threshold: f64, findings: &mut Findings) {
    ratio_check(
        ctx,
        GuidelineId::MaxReopenedPct,
        threshold,
        "were reopened",
        |i| i.reopened,
        findings,
    );
}

pub fn without_fix_version(ctx: &CheckContext<'_>, threshold: f64, findings: &mut Findings) {
    ratio_check(
        ctx,
        GuidelineId::MaxIssuesWithoutFixVersionsPct,
        threshold,
        "have no fix version (bugs excluded)",
        |i| !i.is_bug() && i.fix_versions.is_empty(),
        findings,
    );
}

fn ratio_check<F>(
    ctx: &CheckContext<'_>,
    guideline: GuidelineId,
    threshold: f64,
    what: &str,
    offends: F,
    findings: &mut Findings,
) where
    F: Fn(&Issue) -> bool,
{
    let keys: Vec<String> = ctx
        .active_issues()
        .filter(|i| offends(i))
        .map(|i| i.key.clone())
        .collect();
    let total = ctx.active_count();
    let pct = percentage(keys.len(), total);

    if pct <= threshold {
        return;
    }

    findings.violation(
        guideline,
        format!(
            "{:.1}% of issues {} ({} of {}), limit is {}%",
            pct,
            what,
            keys.len(),
            total,
            threshold
        ),
        keys,
        pct,
        threshold,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hygiene::RiskOptions;
    use crate::metrics::compute_metrics;
    use crate::models::IssueStatus;
    use crate::test_utils::{at, day, make_assigned, make_issue};

    fn run(issues: &[Issue], check: fn(&CheckContext<'_>, f64, &mut Findings), threshold: f64) -> Findings {
        let as_of = at(2024, 3, 6);
        let metrics = compute_metrics(issues, day(2024, 3, 4), day(2024, 3, 15), as_of, None);
        let options = RiskOptions::default();
        let ctx = CheckContext::new(&metrics, issues, as_of, &options);
        let mut findings = Findings::default();
        check(&ctx, threshold, &mut findings);
        findings
    }

    fn five_with_one_unassigned() -> Vec<Issue> {
        vec![
            make_issue("A-1", IssueStatus::InProgress),
            make_assigned("A-2", IssueStatus::ToDo, "ana"),
            make_assigned("A-3", IssueStatus::ToDo, "ana"),
            make_assigned("A-4", IssueStatus::Done, "bo"),
            make_assigned("A-5", IssueStatus::Done, "bo"),
        ]
    }

    #[test]
    fn exactly_at_limit_is_not_reported() {
        let findings = run(&five_with_one_unassigned(), unassigned, 20.0);
        assert!(findings.violations.is_empty());
    }

    #[test]
    fn above_limit_reports_exact_percentage() {
        let findings = run(&five_with_one_unassigned(), unassigned, 19.9);
        let violation = &findings.violations[0];
        assert_eq!(violation.measured_value, 20.0);
        assert_eq!(violation.threshold_value, 19.9);
        assert_eq!(violation.affected_issue_keys, vec!["A-1"]);
    }

    #[test]
    fn seven_of_a_hundred_sits_on_a_seven_percent_limit() {
        let issues: Vec<Issue> = (1..=100)
            .map(|n| {
                let key = format!("A-{}", n);
                if n <= 7 {
                    make_issue(&key, IssueStatus::ToDo)
                } else {
                    make_assigned(&key, IssueStatus::ToDo, "ana")
                }
            })
            .collect();

        assert!(run(&issues, unassigned, 7.0).violations.is_empty());
        let findings = run(&issues, unassigned, 6.9);
        assert_eq!(findings.violations[0].measured_value, 7.0);
    }

    #[test]
    fn cancelled_issues_do_not_count() {
        let mut issues = five_with_one_unassigned();
        issues.push(make_issue("A-6", IssueStatus::Cancelled));
        issues.push(make_issue("A-7", IssueStatus::Cancelled));
        let findings = run(&issues, unassigned, 19.0);
        assert_eq!(findings.violations[0].measured_value, 20.0);
        assert_eq!(findings.violations[0].affected_issue_keys, vec!["A-1"]);
    }

    #[test]
    fn bugs_exempt_from_estimation_and_fix_version() {
        let mut bug = make_issue("B-1", IssueStatus::ToDo);
        bug.issue_type = "Bug".to_string();
        let mut story = make_issue("S-1", IssueStatus::ToDo);
        story.story_points = Some(3.0);
        story.fix_versions.insert("1.0".to_string());

        let issues = vec![bug, story];
        assert!(run(&issues, unestimated, 0.0).violations.is_empty());
        assert!(run(&issues, without_fix_version, 0.0).violations.is_empty());
    }

    #[test]
    fn blocked_and_reopened() {
        let mut blocked_issue = make_issue("A-1", IssueStatus::ToDo);
        blocked_issue.is_blocked = true;
        let mut reopened_issue = make_issue("A-2", IssueStatus::InProgress);
        reopened_issue.reopened = true;
        let issues = vec![blocked_issue, reopened_issue, make_issue("A-3", IssueStatus::Done)];

        let blocked_findings = run(&issues, blocked, 30.0);
        assert_eq!(blocked_findings.violations[0].affected_issue_keys, vec!["A-1"]);
        let reopened_findings = run(&issues, reopened, 30.0);
        assert_eq!(reopened_findings.violations[0].affected_issue_keys, vec!["A-2"]);
    }

    #[test]
    fn empty_sprint_reports_nothing() {
        assert!(run(&[], unassigned, 0.0).violations.is_empty());
    }
}
