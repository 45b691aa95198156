//! Overdue issues: open, past their due date by more than the allowed days.

use crate::hygiene::checks::{escalates, CheckContext, Findings};
use crate::hygiene::types::{RiskReason, Severity};
use crate::thresholds::GuidelineId;

/// Issues without a due date are skipped, not treated as overdue.
pub fn check(ctx: &CheckContext<'_>, threshold: f64, findings: &mut Findings) {
    let today = ctx.as_of.date_naive();
    let allowed_days = threshold as i64;

    let mut keys = Vec::new();
    let mut worst = 0;

    for issue in ctx.open_issues() {
        let Some(due) = issue.due_date else {
            continue;
        };
        if due >= today {
            continue;
        }
        let overdue_days = (today - due).num_days();
        if overdue_days <= allowed_days {
            continue;
        }

        let severity = if escalates(overdue_days, allowed_days) {
            Severity::High
        } else {
            Severity::Medium
        };
        findings.risks.add(&issue.key, RiskReason::Overdue, severity);
        keys.push(issue.key.clone());
        worst = worst.max(overdue_days);
    }

    if keys.is_empty() {
        return;
    }

    findings.violation(
        GuidelineId::MaxOverdueDays,
        format!(
            "{} issue(s) overdue by more than {} day(s); worst is {} day(s) late",
            keys.len(),
            allowed_days,
            worst
        ),
        keys,
        worst as f64,
        threshold,
    );
}
