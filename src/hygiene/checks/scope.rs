//! Sprint scope stability: churn during the sprint and work carried in from
//! earlier sprints.

use crate::hygiene::checks::{CheckContext, Findings};
use crate::thresholds::GuidelineId;
use crate::utils::percentage;

/// (added + removed) / (non-cancelled + removed). Without a removed-issue list
/// only additions are counted and the description says so.
pub fn scope_change(ctx: &CheckContext<'_>, threshold: f64, findings: &mut Findings) {
    let metrics = ctx.metrics;
    let changed = metrics.scope_added_count + metrics.scope_removed_count;
    let baseline = metrics.total_issues + metrics.scope_removed_count;
    let pct = percentage(changed, baseline);

    if pct <= threshold {
        return;
    }

    let keys: Vec<String> = ctx
        .active_issues()
        .filter(|i| i.created_during_sprint)
        .map(|i| i.key.clone())
        .collect();

    let mut description = format!(
        "Scope changed by {:.1}% ({} added, {} removed), limit is {}%",
        pct, metrics.scope_added_count, metrics.scope_removed_count, threshold
    );
    if !metrics.scope_removed_known {
        description.push_str("; removed issues are not tracked, figure counts additions only");
    }

    findings.violation(GuidelineId::MaxScopeChangePct, description, keys, pct, threshold);
}

/// Nothing fires when no issue says whether it was carried over.
pub fn carried_over(ctx: &CheckContext<'_>, threshold: f64, findings: &mut Findings) {
    if !ctx.metrics.carried_over_known {
        log::debug!("carried-over figure unavailable, skipping {}", GuidelineId::MaxCarriedOverPct);
        return;
    }

    let keys: Vec<String> = ctx
        .active_issues()
        .filter(|i| i.carried_over == Some(true))
        .map(|i| i.key.clone())
        .collect();
    let pct = percentage(keys.len(), ctx.active_count());

    if pct <= threshold {
        return;
    }

    findings.violation(
        GuidelineId::MaxCarriedOverPct,
        format!(
            "{:.1}% of issues were carried over from a previous sprint ({} of {}), limit is {}%",
            pct,
            keys.len(),
            ctx.active_count(),
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
    use crate::models::{Issue, IssueStatus};
    use crate::test_utils::{at, day, make_issue};

    fn run(
        issues: &[Issue],
        removed: Option<&[String]>,
        check: fn(&CheckContext<'_>, f64, &mut Findings),
        threshold: f64,
    ) -> Findings {
        let as_of = at(2024, 3, 6);
        let metrics = compute_metrics(issues, day(2024, 3, 4), day(2024, 3, 15), as_of, removed);
        let options = RiskOptions::default();
        let ctx = CheckContext::new(&metrics, issues, as_of, &options);
        let mut findings = Findings::default();
        check(&ctx, threshold, &mut findings);
        findings
    }

    fn sprint_with_one_addition() -> Vec<Issue> {
        let mut added = make_issue("A-1", IssueStatus::ToDo);
        added.created_during_sprint = true;
        vec![
            added,
            make_issue("A-2", IssueStatus::ToDo),
            make_issue("A-3", IssueStatus::Done),
        ]
    }

    #[test]
    fn removals_count_toward_both_sides() {
        let removed = vec!["A-9".to_string()];
        let findings = run(&sprint_with_one_addition(), Some(removed.as_slice()), scope_change, 20.0);
        let violation = &findings.violations[0];
        assert_eq!(violation.measured_value, 50.0);
        assert_eq!(violation.affected_issue_keys, vec!["A-1"]);
        assert!(!violation.description.contains("not tracked"));
    }

    #[test]
    fn degraded_mode_is_described() {
        let findings = run(&sprint_with_one_addition(), None, scope_change, 20.0);
        let violation = &findings.violations[0];
        assert!((violation.measured_value - 100.0 / 3.0).abs() < 1e-9);
        assert!(violation.description.contains("not tracked"));
    }

    #[test]
    fn churn_exactly_at_limit_is_not_reported() {
        // 3 added + 4 removed over 96 + 4 issues is exactly 7%.
        let issues: Vec<Issue> = (1..=96)
            .map(|n| {
                let mut issue = make_issue(&format!("A-{}", n), IssueStatus::ToDo);
                issue.created_during_sprint = n <= 3;
                issue
            })
            .collect();
        let removed: Vec<String> = (1..=4).map(|n| format!("R-{}", n)).collect();

        assert!(run(&issues, Some(removed.as_slice()), scope_change, 7.0)
            .violations
            .is_empty());
    }

    #[test]
    fn unknown_carry_over_never_fires() {
        assert!(run(&sprint_with_one_addition(), None, carried_over, 0.0)
            .violations
            .is_empty());
    }

    #[test]
    fn carried_over_ratio() {
        let mut issues = sprint_with_one_addition();
        issues[1].carried_over = Some(true);
        issues[2].carried_over = Some(false);
        let findings = run(&issues, None, carried_over, 30.0);
        assert_eq!(findings.violations[0].affected_issue_keys, vec!["A-2"]);
    }
}
