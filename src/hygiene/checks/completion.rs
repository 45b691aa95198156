//! Minimum completion: the one guideline that fires when a figure is too low.

use crate::hygiene::checks::{CheckContext, Findings};
use crate::thresholds::GuidelineId;

pub fn check(ctx: &CheckContext<'_>, threshold: f64, findings: &mut Findings) {
    let metrics = ctx.metrics;
    if metrics.no_active_issues {
        return;
    }
    if metrics.completed_pct >= threshold {
        return;
    }

    let keys: Vec<String> = ctx.open_issues().map(|i| i.key.clone()).collect();

    findings.violation(
        GuidelineId::MinCompletedPct,
        format!(
            "Only {:.1}% of issues completed ({} of {}), minimum is {}%",
            metrics.completed_pct, metrics.completed_count, metrics.total_issues, threshold
        ),
        keys,
        metrics.completed_pct,
        threshold,
    );
}
