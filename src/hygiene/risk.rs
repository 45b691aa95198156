//! Per-issue risk flag aggregation.

use std::collections::{BTreeMap, BTreeSet};

use crate::hygiene::checks::CheckContext;
use crate::hygiene::types::{RiskFlag, RiskReason, Severity};

/// Collects risk reasons per issue so each issue ends up with one flag.
#[derive(Debug, Default)]
pub struct RiskAccumulator {
    flags: BTreeMap<String, (BTreeSet<RiskReason>, Severity)>,
}

impl RiskAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue_key: &str, reason: RiskReason, severity: Severity) {
        let entry = self
            .flags
            .entry(issue_key.to_string())
            .or_insert_with(|| (BTreeSet::new(), severity));
        entry.0.insert(reason);
        entry.1 = entry.1.max(severity);
    }

    /// Flags sorted by severity (highest first), then issue key.
    pub fn finish(self) -> Vec<RiskFlag> {
        let mut flags: Vec<RiskFlag> = self
            .flags
            .into_iter()
            .map(|(issue_key, (reasons, severity))| RiskFlag {
                issue_key,
                reasons,
                severity,
            })
            .collect();
        flags.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.issue_key.cmp(&b.issue_key))
        });
        flags
    }
}

/// Risk signals that are not tied to a numeric guideline.
///
/// Open blocked issues are always high risk. Open unassigned issues are at
/// risk when their due date, or the sprint end for issues without one, is at
/// most `near_deadline_days` away. Issues already past due are left to the
/// overdue check.
pub fn collect_signals(ctx: &CheckContext<'_>, risks: &mut RiskAccumulator) {
    let today = ctx.as_of.date_naive();

    for issue in ctx.open_issues() {
        if issue.is_blocked {
            risks.add(&issue.key, RiskReason::Blocked, Severity::High);
        }

        if issue.assignee.is_some() {
            continue;
        }
        let days_left = match issue.due_date {
            Some(due) => (due - today).num_days(),
            None => ctx.metrics.days_remaining,
        };
        if (0..=ctx.options.near_deadline_days).contains(&days_left) {
            risks.add(
                &issue.key,
                RiskReason::UnassignedNearDeadline,
                Severity::Medium,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_merge_into_one_flag() {
        let mut risks = RiskAccumulator::new();
        risks.add("A-1", RiskReason::Stale, Severity::Low);
        risks.add("A-1", RiskReason::Overdue, Severity::High);
        risks.add("A-1", RiskReason::Stale, Severity::Medium);

        let flags = risks.finish();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].reasons.len(), 2);
        assert_eq!(flags[0].severity, Severity::High);
    }

    #[test]
    fn flags_sorted_by_severity_then_key() {
        let mut risks = RiskAccumulator::new();
        risks.add("B-2", RiskReason::Stale, Severity::Low);
        risks.add("C-3", RiskReason::Blocked, Severity::High);
        risks.add("A-1", RiskReason::Stale, Severity::Low);

        let keys: Vec<_> = risks.finish().into_iter().map(|f| f.issue_key).collect();
        assert_eq!(keys, vec!["C-3", "A-1", "B-2"]);
    }
}
