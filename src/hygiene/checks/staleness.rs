//! Staleness: issues sitting in a state, or untouched, for too long.
//!
//! State entry time comes from the provider's status-change timestamp when it
//! is available and falls back to the last update otherwise. Issues with
//! neither timestamp are skipped.

use chrono::{DateTime, Utc};

use crate::hygiene::checks::{escalates, CheckContext, Findings};
use crate::hygiene::types::{RiskReason, Severity};
use crate::models::{Issue, IssueStatus};
use crate::thresholds::GuidelineId;
use crate::utils::whole_days_between;

pub fn in_progress(ctx: &CheckContext<'_>, threshold: f64, findings: &mut Findings) {
    stale_check(
        ctx,
        GuidelineId::MaxInProgressDays,
        threshold,
        "in progress",
        |i| (i.status == IssueStatus::InProgress).then(|| i.state_entered()).flatten(),
        (Severity::Medium, Severity::High),
        findings,
    );
}

pub fn review_pending(ctx: &CheckContext<'_>, threshold: f64, findings: &mut Findings) {
    stale_check(
        ctx,
        GuidelineId::MaxReviewPendingDays,
        threshold,
        "waiting for review",
        |i| (i.status == IssueStatus::ReviewPending).then(|| i.state_entered()).flatten(),
        (Severity::Medium, Severity::High),
        findings,
    );
}

pub fn no_update(ctx: &CheckContext<'_>, threshold: f64, findings: &mut Findings) {
    stale_check(
        ctx,
        GuidelineId::MaxNoUpdateDays,
        threshold,
        "without any update",
        |i| i.last_updated,
        (Severity::Low, Severity::Medium),
        findings,
    );
}

fn stale_check<F>(
    ctx: &CheckContext<'_>,
    guideline: GuidelineId,
    threshold: f64,
    what: &str,
    since: F,
    (base, escalated): (Severity, Severity),
    findings: &mut Findings,
) where
    F: Fn(&Issue) -> Option<DateTime<Utc>>,
{
    let allowed_days = threshold as i64;
    let mut keys = Vec::new();
    let mut worst = 0;

    for issue in ctx.open_issues() {
        let Some(since) = since(issue) else {
            continue;
        };
        let age = whole_days_between(since, ctx.as_of);
        if age <= allowed_days {
            continue;
        }

        let severity = if escalates(age, allowed_days) {
            escalated
        } else {
            base
        };
        findings.risks.add(&issue.key, RiskReason::Stale, severity);
        keys.push(issue.key.clone());
        worst = worst.max(age);
    }

    if keys.is_empty() {
        return;
    }

    findings.violation(
        guideline,
        format!(
            "{} issue(s) {} for more than {} day(s); longest is {} day(s)",
            keys.len(),
            what,
            allowed_days,
            worst
        ),
        keys,
        worst as f64,
        threshold,
    );
}
