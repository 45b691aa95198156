//! Sprint analysis pipeline: normalize, measure, evaluate, report.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::hygiene::evaluate_with;
use crate::metrics::compute_metrics;
use crate::models::{Issue, SprintSnapshot};
use crate::normalize::{MalformedInputError, Normalizer};
use crate::report::{self, SprintReport};
use crate::settings::Settings;
use crate::thresholds::{InvalidThresholdError, ThresholdConfig};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    MalformedInput(#[from] MalformedInputError),
    #[error(transparent)]
    InvalidThreshold(#[from] InvalidThresholdError),
}

/// Runs the full analysis for one sprint snapshot.
///
/// Holds only read-only configuration, so one analyzer can serve any number
/// of snapshots, including from several threads at once.
#[derive(Debug, Clone, Default)]
pub struct SprintAnalyzer {
    settings: Settings,
}

impl SprintAnalyzer {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Replace the guideline thresholds.
    pub fn with_thresholds(mut self, thresholds: ThresholdConfig) -> Self {
        self.settings.guidelines = thresholds;
        self
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.settings.guidelines
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Normalize the snapshot's raw issues with this analyzer's status and
    /// blocker configuration.
    pub fn normalize(&self, snapshot: &SprintSnapshot) -> Result<Vec<Issue>, EngineError> {
        let normalizer = Normalizer::new(snapshot.field_mapping.clone())
            .with_statuses(self.settings.statuses.clone())
            .with_blocker_labels(&self.settings.blocker_labels)
            .with_sprint_start(snapshot.sprint.start_date);
        Ok(normalizer.normalize(&snapshot.issues)?)
    }

    /// Analyze a snapshot as of `as_of`. The same inputs always produce the
    /// same report.
    pub fn analyze(
        &self,
        snapshot: &SprintSnapshot,
        as_of: DateTime<Utc>,
    ) -> Result<SprintReport, EngineError> {
        let sprint = &snapshot.sprint;
        info!(
            "Analyzing sprint '{}' ({} issue record(s)) as of {}",
            sprint.name,
            snapshot.issues.len(),
            as_of.format("%Y-%m-%d")
        );

        let issues = self.normalize(snapshot)?;
        debug!("normalized {} issue(s)", issues.len());

        let removed = snapshot.removed_issue_keys.as_deref();
        let metrics = compute_metrics(&issues, sprint.start_date, sprint.end_date, as_of, removed);
        debug!(
            "metrics: {} active, {} cancelled, {:.1}% complete",
            metrics.total_issues, metrics.cancelled_count, metrics.completed_pct
        );

        let options = self.settings.risk_options();
        let evaluation =
            evaluate_with(&metrics, &issues, &self.settings.guidelines, as_of, &options);

        let mut report = report::build(
            sprint,
            metrics,
            evaluation.violations,
            evaluation.risk_flags,
            &issues,
            as_of,
        );
        if let Some(keys) = removed {
            report = report.with_removed_issue_keys(keys);
        }

        for warning in &report.warnings {
            warn!("{}", warning);
        }
        info!(
            "{} violation(s), {} risk flag(s)",
            report.violations.len(),
            report.risk_flags.len()
        );

        Ok(report)
    }
}
