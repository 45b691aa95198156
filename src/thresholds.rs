//! Guideline thresholds that drive hygiene and risk checks.
//!
//! A [`ThresholdConfig`] is an explicit, validated value. It is built once at
//! configuration-load time and passed by reference into every analysis run;
//! nothing in the engine mutates it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unique identifier for a guideline. Serialized form is the configuration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidelineId {
    MaxOverdueDays,
    MaxUnestimatedPct,
    MaxUnassignedPct,
    MaxTasksPerDev,
    MaxBlockedPct,
    MaxInProgressDays,
    MinCompletedPct,
    MaxScopeChangePct,
    MaxCarriedOverPct,
    MaxCriticalBugsOpen,
    MaxReopenedPct,
    MaxReviewPendingDays,
    MaxNoUpdateDays,
    MaxIssuesWithoutFixVersionsPct,
}

/// How a guideline's value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuidelineKind {
    /// A percentage in `[0, 100]`.
    Percentage,
    /// A whole number of days.
    Days,
    /// A whole, absolute count.
    Count,
}

impl GuidelineId {
    /// All guidelines, in the order checks are evaluated and reported.
    pub fn all() -> &'static [GuidelineId] {
        &[
            GuidelineId::MaxOverdueDays,
            GuidelineId::MaxUnestimatedPct,
            GuidelineId::MaxUnassignedPct,
            GuidelineId::MaxTasksPerDev,
            GuidelineId::MaxBlockedPct,
            GuidelineId::MaxInProgressDays,
            GuidelineId::MinCompletedPct,
            GuidelineId::MaxScopeChangePct,
            GuidelineId::MaxCarriedOverPct,
            GuidelineId::MaxCriticalBugsOpen,
            GuidelineId::MaxReopenedPct,
            GuidelineId::MaxReviewPendingDays,
            GuidelineId::MaxNoUpdateDays,
            GuidelineId::MaxIssuesWithoutFixVersionsPct,
        ]
    }

    /// Configuration key as it appears in settings files.
    pub fn key(&self) -> &'static str {
        match self {
            Self::MaxOverdueDays => "max_overdue_days",
            Self::MaxUnestimatedPct => "max_unestimated_pct",
            Self::MaxUnassignedPct => "max_unassigned_pct",
            Self::MaxTasksPerDev => "max_tasks_per_dev",
            Self::MaxBlockedPct => "max_blocked_pct",
            Self::MaxInProgressDays => "max_in_progress_days",
            Self::MinCompletedPct => "min_completed_pct",
            Self::MaxScopeChangePct => "max_scope_change_pct",
            Self::MaxCarriedOverPct => "max_carried_over_pct",
            Self::MaxCriticalBugsOpen => "max_critical_bugs_open",
            Self::MaxReopenedPct => "max_reopened_pct",
            Self::MaxReviewPendingDays => "max_review_pending_days",
            Self::MaxNoUpdateDays => "max_no_update_days",
            Self::MaxIssuesWithoutFixVersionsPct => "max_issues_without_fix_versions_pct",
        }
    }

    /// Human-readable name of this guideline.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MaxOverdueDays => "Max Overdue Days",
            Self::MaxUnestimatedPct => "Max Unestimated %",
            Self::MaxUnassignedPct => "Max Unassigned %",
            Self::MaxTasksPerDev => "Max Tasks per Developer",
            Self::MaxBlockedPct => "Max Blocked %",
            Self::MaxInProgressDays => "Max In-Progress Days",
            Self::MinCompletedPct => "Min Completed %",
            Self::MaxScopeChangePct => "Max Scope Change %",
            Self::MaxCarriedOverPct => "Max Carried-Over %",
            Self::MaxCriticalBugsOpen => "Max Critical Bugs Open",
            Self::MaxReopenedPct => "Max Reopened %",
            Self::MaxReviewPendingDays => "Max Review-Pending Days",
            Self::MaxNoUpdateDays => "Max Days Without Update",
            Self::MaxIssuesWithoutFixVersionsPct => "Max Issues Without Fix Version %",
        }
    }

    pub fn kind(&self) -> GuidelineKind {
        match self {
            Self::MaxOverdueDays
            | Self::MaxInProgressDays
            | Self::MaxReviewPendingDays
            | Self::MaxNoUpdateDays => GuidelineKind::Days,
            Self::MaxTasksPerDev | Self::MaxCriticalBugsOpen => GuidelineKind::Count,
            Self::MaxUnestimatedPct
            | Self::MaxUnassignedPct
            | Self::MaxBlockedPct
            | Self::MinCompletedPct
            | Self::MaxScopeChangePct
            | Self::MaxCarriedOverPct
            | Self::MaxReopenedPct
            | Self::MaxIssuesWithoutFixVersionsPct => GuidelineKind::Percentage,
        }
    }

    /// Recommended value used by [`ThresholdConfig::default`].
    fn recommended(&self) -> f64 {
        match self {
            Self::MaxOverdueDays => 0.0,
            Self::MaxUnestimatedPct => 10.0,
            Self::MaxUnassignedPct => 10.0,
            Self::MaxTasksPerDev => 5.0,
            Self::MaxBlockedPct => 10.0,
            Self::MaxInProgressDays => 5.0,
            Self::MinCompletedPct => 70.0,
            Self::MaxScopeChangePct => 20.0,
            Self::MaxCarriedOverPct => 20.0,
            Self::MaxCriticalBugsOpen => 0.0,
            Self::MaxReopenedPct => 5.0,
            Self::MaxReviewPendingDays => 3.0,
            Self::MaxNoUpdateDays => 7.0,
            Self::MaxIssuesWithoutFixVersionsPct => 0.0,
        }
    }
}

impl std::fmt::Display for GuidelineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for GuidelineId {
    type Err = InvalidThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|id| id.key() == key)
            .ok_or_else(|| InvalidThresholdError::UnknownGuideline(s.to_string()))
    }
}

/// Errors raised while loading or validating guideline values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidThresholdError {
    #[error("unknown guideline '{0}'")]
    UnknownGuideline(String),
    #[error("guideline '{guideline}' must be a number, got {found}")]
    WrongType {
        guideline: GuidelineId,
        found: &'static str,
    },
    #[error("guideline '{guideline}' must not be negative (got {value})")]
    Negative { guideline: GuidelineId, value: f64 },
    #[error("guideline '{guideline}' is a percentage and must be within 0-100 (got {value})")]
    OutOfRange { guideline: GuidelineId, value: f64 },
    #[error("guideline '{guideline}' must be a whole number (got {value})")]
    NotInteger { guideline: GuidelineId, value: f64 },
    #[error("guideline '{guideline}' must be a finite number")]
    NotFinite { guideline: GuidelineId },
}

/// Validated set of guideline thresholds.
///
/// A guideline that is absent is "not configured" and its check is skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Value>", into = "BTreeMap<String, f64>")]
pub struct ThresholdConfig {
    values: BTreeMap<GuidelineId, f64>,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            values: GuidelineId::all()
                .iter()
                .map(|id| (*id, id.recommended()))
                .collect(),
        }
    }
}

impl ThresholdConfig {
    /// A configuration with no guideline set; every check is skipped.
    pub fn unconfigured() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Set a guideline, validating the value for its kind.
    pub fn with(mut self, id: GuidelineId, value: f64) -> Result<Self, InvalidThresholdError> {
        self.values.insert(id, validate_value(id, value)?);
        Ok(self)
    }

    /// Remove a guideline so its check is skipped.
    pub fn without(mut self, id: GuidelineId) -> Self {
        self.values.remove(&id);
        self
    }

    /// Build from a loosely-typed key/value mapping (as read from a settings file).
    ///
    /// `null` values leave the guideline unconfigured. Any other non-numeric value,
    /// a negative value, a percentage above 100, a fractional day count or an
    /// unknown key fails the whole load.
    pub fn from_mapping<'a, I>(entries: I) -> Result<Self, InvalidThresholdError>
    where
        I: IntoIterator<Item = (&'a String, &'a Value)>,
    {
        let mut config = Self::unconfigured();
        for (key, value) in entries {
            let id: GuidelineId = key.parse()?;
            let number = match value {
                Value::Null => continue,
                Value::Number(n) => n
                    .as_f64()
                    .ok_or(InvalidThresholdError::NotFinite { guideline: id })?,
                other => {
                    return Err(InvalidThresholdError::WrongType {
                        guideline: id,
                        found: json_type_name(other),
                    })
                }
            };
            config = config.with(id, number)?;
        }
        Ok(config)
    }

    /// Merge `overrides` on top of this configuration.
    pub fn merged_with(mut self, overrides: &ThresholdConfig) -> Self {
        for (id, value) in &overrides.values {
            self.values.insert(*id, *value);
        }
        self
    }

    pub fn get(&self, id: GuidelineId) -> Option<f64> {
        self.values.get(&id).copied()
    }

    pub fn is_configured(&self, id: GuidelineId) -> bool {
        self.values.contains_key(&id)
    }

    /// Configured guidelines in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = (GuidelineId, f64)> + '_ {
        self.values.iter().map(|(id, value)| (*id, *value))
    }
}

impl TryFrom<BTreeMap<String, Value>> for ThresholdConfig {
    type Error = InvalidThresholdError;

    fn try_from(raw: BTreeMap<String, Value>) -> Result<Self, Self::Error> {
        Self::from_mapping(raw.iter())
    }
}

impl From<ThresholdConfig> for BTreeMap<String, f64> {
    fn from(config: ThresholdConfig) -> Self {
        config
            .values
            .into_iter()
            .map(|(id, value)| (id.key().to_string(), value))
            .collect()
    }
}

fn validate_value(id: GuidelineId, value: f64) -> Result<f64, InvalidThresholdError> {
    if !value.is_finite() {
        return Err(InvalidThresholdError::NotFinite { guideline: id });
    }
    if value < 0.0 {
        return Err(InvalidThresholdError::Negative {
            guideline: id,
            value,
        });
    }
    match id.kind() {
        GuidelineKind::Percentage if value > 100.0 => Err(InvalidThresholdError::OutOfRange {
            guideline: id,
            value,
        }),
        GuidelineKind::Days | GuidelineKind::Count if value.fract() != 0.0 => {
            Err(InvalidThresholdError::NotInteger {
                guideline: id,
                value,
            })
        }
        _ => Ok(value),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping(value: Value) -> BTreeMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn all_fourteen_guidelines() {
        assert_eq!(GuidelineId::all().len(), 14);
    }

    #[test]
    fn keys_round_trip_through_from_str() {
        for id in GuidelineId::all() {
            assert_eq!(id.key().parse::<GuidelineId>().unwrap(), *id);
        }
    }

    #[test]
    fn serde_key_matches_config_key() {
        for id in GuidelineId::all() {
            let serialized = serde_json::to_value(id).unwrap();
            assert_eq!(serialized, json!(id.key()));
        }
    }

    #[test]
    fn default_configures_everything() {
        let config = ThresholdConfig::default();
        assert!(GuidelineId::all().iter().all(|id| config.is_configured(*id)));
        assert_eq!(config.get(GuidelineId::MaxNoUpdateDays), Some(7.0));
    }

    #[test]
    fn loads_valid_mapping() {
        let raw = mapping(json!({
            "max_overdue_days": 2,
            "max_unassigned_pct": 20.5,
            "max_review_pending_days": null
        }));
        let config = ThresholdConfig::try_from(raw).unwrap();
        assert_eq!(config.get(GuidelineId::MaxOverdueDays), Some(2.0));
        assert_eq!(config.get(GuidelineId::MaxUnassignedPct), Some(20.5));
        assert!(!config.is_configured(GuidelineId::MaxReviewPendingDays));
    }

    #[test]
    fn rejects_negative_value() {
        let raw = mapping(json!({ "max_tasks_per_dev": -1 }));
        let err = ThresholdConfig::try_from(raw).unwrap_err();
        assert!(matches!(
            err,
            InvalidThresholdError::Negative {
                guideline: GuidelineId::MaxTasksPerDev,
                ..
            }
        ));
    }

    #[test]
    fn rejects_wrong_type() {
        let raw = mapping(json!({ "max_blocked_pct": "ten" }));
        let err = ThresholdConfig::try_from(raw).unwrap_err();
        assert_eq!(
            err,
            InvalidThresholdError::WrongType {
                guideline: GuidelineId::MaxBlockedPct,
                found: "a string",
            }
        );

        let raw = mapping(json!({ "max_blocked_pct": true }));
        assert!(ThresholdConfig::try_from(raw).is_err());
    }

    #[test]
    fn rejects_percentage_above_hundred() {
        let raw = mapping(json!({ "min_completed_pct": 120 }));
        assert!(matches!(
            ThresholdConfig::try_from(raw),
            Err(InvalidThresholdError::OutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_fractional_day_count() {
        let raw = mapping(json!({ "max_in_progress_days": 2.5 }));
        assert!(matches!(
            ThresholdConfig::try_from(raw),
            Err(InvalidThresholdError::NotInteger { .. })
        ));
    }

    #[test]
    fn rejects_unknown_key() {
        let raw = mapping(json!({ "stale_issue_days": 7 }));
        assert_eq!(
            ThresholdConfig::try_from(raw).unwrap_err(),
            InvalidThresholdError::UnknownGuideline("stale_issue_days".to_string())
        );
    }

    #[test]
    fn builder_validates() {
        assert!(ThresholdConfig::unconfigured()
            .with(GuidelineId::MaxOverdueDays, f64::NAN)
            .is_err());
        let config = ThresholdConfig::unconfigured()
            .with(GuidelineId::MaxOverdueDays, 3.0)
            .unwrap();
        assert_eq!(config.iter().count(), 1);
    }

    #[test]
    fn merge_prefers_overrides() {
        let overrides = ThresholdConfig::unconfigured()
            .with(GuidelineId::MaxTasksPerDev, 8.0)
            .unwrap();
        let merged = ThresholdConfig::default().merged_with(&overrides);
        assert_eq!(merged.get(GuidelineId::MaxTasksPerDev), Some(8.0));
        assert_eq!(merged.get(GuidelineId::MaxNoUpdateDays), Some(7.0));
    }

    #[test]
    fn deserializes_from_yaml() {
        let yaml = "max_overdue_days: 1\nmax_unestimated_pct: 15\n";
        let config: ThresholdConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.get(GuidelineId::MaxUnestimatedPct), Some(15.0));
    }

    #[test]
    fn serializes_as_key_map() {
        let config = ThresholdConfig::unconfigured()
            .with(GuidelineId::MaxOverdueDays, 2.0)
            .unwrap();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json, json!({ "max_overdue_days": 2.0 }));
    }
}
