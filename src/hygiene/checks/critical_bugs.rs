//! Open bugs at the highest priority.

use crate::hygiene::checks::{CheckContext, Findings};
use crate::models::Priority;
use crate::thresholds::GuidelineId;

pub fn check(ctx: &CheckContext<'_>, threshold: f64, findings: &mut Findings) {
    let keys: Vec<String> = ctx
        .open_issues()
        .filter(|i| i.is_bug() && i.priority == Priority::Highest)
        .map(|i| i.key.clone())
        .collect();
    let count = keys.len() as f64;

    if count <= threshold {
        return;
    }

    findings.violation(
        GuidelineId::MaxCriticalBugsOpen,
        format!(
            "{} critical bug(s) still open, limit is {}",
            keys.len(),
            threshold
        ),
        keys,
        count,
        threshold,
    );
}
