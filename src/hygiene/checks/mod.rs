//! Guideline checks.
//!
//! Each guideline maps to exactly one check. Checks are independent: they all
//! read the same [`CheckContext`] and append to the same [`Findings`], and a
//! check with nothing to report leaves no trace.

pub mod completion;
pub mod critical_bugs;
pub mod overdue;
pub mod ratios;
pub mod scope;
pub mod staleness;
pub mod workload;

use chrono::{DateTime, Utc};

use crate::hygiene::risk::RiskAccumulator;
use crate::hygiene::types::{HygieneViolation, ViolationCategory};
use crate::hygiene::RiskOptions;
use crate::metrics::SprintMetrics;
use crate::models::Issue;
use crate::thresholds::GuidelineId;

/// Read-only inputs shared by every check. Cancelled issues are filtered out
/// up front so no check can see them.
pub struct CheckContext<'a> {
    pub metrics: &'a SprintMetrics,
    pub as_of: DateTime<Utc>,
    pub options: &'a RiskOptions,
    active: Vec<&'a Issue>,
}

impl<'a> CheckContext<'a> {
    pub fn new(
        metrics: &'a SprintMetrics,
        issues: &'a [Issue],
        as_of: DateTime<Utc>,
        options: &'a RiskOptions,
    ) -> Self {
        Self {
            metrics,
            as_of,
            options,
            active: issues.iter().filter(|i| !i.is_cancelled()).collect(),
        }
    }

    /// Non-cancelled issues in input order.
    pub fn active_issues(&self) -> impl Iterator<Item = &'a Issue> + '_ {
        self.active.iter().copied()
    }

    /// Issues that are neither done nor cancelled.
    pub fn open_issues(&self) -> impl Iterator<Item = &'a Issue> + '_ {
        self.active_issues().filter(|i| i.is_open())
    }

    /// Denominator for every percentage check.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

/// Violations and risk reasons gathered across all checks.
#[derive(Debug, Default)]
pub struct Findings {
    pub violations: Vec<HygieneViolation>,
    pub risks: RiskAccumulator,
}

impl Findings {
    pub fn violation(
        &mut self,
        guideline: GuidelineId,
        description: String,
        affected_issue_keys: Vec<String>,
        measured_value: f64,
        threshold_value: f64,
    ) {
        self.violations.push(HygieneViolation {
            category: ViolationCategory::for_guideline(guideline),
            guideline,
            description,
            affected_issue_keys,
            measured_value,
            threshold_value,
        });
    }
}

/// Run the check for one configured guideline.
pub fn run_check(
    id: GuidelineId,
    threshold: f64,
    ctx: &CheckContext<'_>,
    findings: &mut Findings,
) {
    match id {
        GuidelineId::MaxOverdueDays => overdue::check(ctx, threshold, findings),
        GuidelineId::MaxUnestimatedPct => ratios::unestimated(ctx, threshold, findings),
        GuidelineId::MaxUnassignedPct => ratios::unassigned(ctx, threshold, findings),
        GuidelineId::MaxTasksPerDev => workload::check(ctx, threshold, findings),
        GuidelineId::MaxBlockedPct => ratios::blocked(ctx, threshold, findings),
        GuidelineId::MaxInProgressDays => staleness::in_progress(ctx, threshold, findings),
        GuidelineId::MinCompletedPct => completion::check(ctx, threshold, findings),
        GuidelineId::MaxScopeChangePct => scope::scope_change(ctx, threshold, findings),
        GuidelineId::MaxCarriedOverPct => scope::carried_over(ctx, threshold, findings),
        GuidelineId::MaxCriticalBugsOpen => critical_bugs::check(ctx, threshold, findings),
        GuidelineId::MaxReopenedPct => ratios::reopened(ctx, threshold, findings),
        GuidelineId::MaxReviewPendingDays => staleness::review_pending(ctx, threshold, findings),
        GuidelineId::MaxNoUpdateDays => staleness::no_update(ctx, threshold, findings),
        GuidelineId::MaxIssuesWithoutFixVersionsPct => {
            ratios::without_fix_version(ctx, threshold, findings)
        }
    }
}

/// Severity for a day-count breach: doubling the limit escalates.
pub(crate) fn escalates(days: i64, threshold_days: i64) -> bool {
    days >= threshold_days.saturating_mul(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escalation_at_double_threshold() {
        assert!(!escalates(3, 2));
        assert!(escalates(4, 2));
        assert!(escalates(1, 0));
    }
}
