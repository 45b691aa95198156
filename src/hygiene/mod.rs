//! Hygiene and risk evaluation.
//!
//! Runs every configured guideline against the normalized issues and the
//! computed metrics, then folds per-issue risk reasons into one flag per issue.

pub mod checks;
pub mod risk;
pub mod types;

pub use risk::RiskAccumulator;
pub use types::{
    Evaluation, HygieneViolation, RiskFlag, RiskReason, Severity, ViolationCategory,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::SprintMetrics;
use crate::models::Issue;
use crate::thresholds::{GuidelineId, ThresholdConfig};

use checks::{run_check, CheckContext, Findings};

/// Default look-ahead for unassigned work near its deadline.
pub const DEFAULT_NEAR_DEADLINE_DAYS: i64 = 2;

/// Knobs for risk signals that are not guidelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskOptions {
    pub near_deadline_days: i64,
}

impl Default for RiskOptions {
    fn default() -> Self {
        Self {
            near_deadline_days: DEFAULT_NEAR_DEADLINE_DAYS,
        }
    }
}

/// Evaluate with default risk options.
pub fn evaluate(
    metrics: &SprintMetrics,
    issues: &[Issue],
    thresholds: &ThresholdConfig,
    as_of: DateTime<Utc>,
) -> Evaluation {
    evaluate_with(metrics, issues, thresholds, as_of, &RiskOptions::default())
}

/// Evaluate every configured guideline in guideline order.
///
/// Unconfigured guidelines are skipped; configured ones always run, whatever
/// the others found.
pub fn evaluate_with(
    metrics: &SprintMetrics,
    issues: &[Issue],
    thresholds: &ThresholdConfig,
    as_of: DateTime<Utc>,
    options: &RiskOptions,
) -> Evaluation {
    let ctx = CheckContext::new(metrics, issues, as_of, options);
    let mut findings = Findings::default();

    for &id in GuidelineId::all() {
        let Some(threshold) = thresholds.get(id) else {
            log::debug!("guideline {} not configured, skipping", id);
            continue;
        };
        let before = findings.violations.len();
        run_check(id, threshold, &ctx, &mut findings);
        log::debug!(
            "guideline {} (threshold {}): {} violation(s)",
            id,
            threshold,
            findings.violations.len() - before
        );
    }

    risk::collect_signals(&ctx, &mut findings.risks);

    Evaluation {
        violations: findings.violations,
        risk_flags: findings.risks.finish(),
    }
}
