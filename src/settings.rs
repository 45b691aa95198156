//! Settings file loading and environment overrides.
//!
//! A settings file is YAML (or JSON when the extension is `.json`):
//!
//! ```yaml
//! guidelines:
//!   max_overdue_days: 2
//!   max_scope_change_pct: null   # disable this check
//! statuses:
//!   review_pending: ["In Review", "QA"]
//! blocker_labels: [blocker, waiting-on-vendor]
//! near_deadline_days: 3
//! top_risks: 10
//! jira_browse_url: https://example.atlassian.net/browse
//! ```
//!
//! Guidelines listed in the file override the recommended defaults; `null`
//! turns a guideline off. Everything else falls back to its default.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::hygiene::{RiskOptions, DEFAULT_NEAR_DEADLINE_DAYS};
use crate::normalize::{default_blocker_labels, StatusMapping};
use crate::report::render::DEFAULT_TOP_RISKS;
use crate::report::{OutputFormat, RenderOptions, ReportMode};
use crate::thresholds::{GuidelineId, InvalidThresholdError, ThresholdConfig};

pub const CONFIG_ENV: &str = "SPRINT_HEALTH_CONFIG";
pub const MODE_ENV: &str = "SPRINT_HEALTH_MODE";
pub const FORMAT_ENV: &str = "SPRINT_HEALTH_FORMAT";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Threshold(#[from] InvalidThresholdError),
    #[error("near_deadline_days must not be negative (got {0})")]
    NegativeNearDeadline(i64),
    #[error("top_risks must be at least 1")]
    NoTopRisks,
}

/// Effective analysis settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub guidelines: ThresholdConfig,
    pub statuses: StatusMapping,
    pub blocker_labels: Vec<String>,
    pub near_deadline_days: i64,
    pub top_risks: usize,
    pub jira_browse_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            guidelines: ThresholdConfig::default(),
            statuses: StatusMapping::default(),
            blocker_labels: default_blocker_labels(),
            near_deadline_days: DEFAULT_NEAR_DEADLINE_DAYS,
            top_risks: DEFAULT_TOP_RISKS,
            jira_browse_url: None,
        }
    }
}

/// On-disk shape. Guidelines stay loosely typed until validated.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SettingsFile {
    guidelines: BTreeMap<String, Value>,
    statuses: Option<StatusMapping>,
    blocker_labels: Option<Vec<String>>,
    near_deadline_days: Option<i64>,
    top_risks: Option<usize>,
    jira_browse_url: Option<String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a file, picking the parser by extension.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let file: SettingsFile = if is_json {
            serde_json::from_str(&text).map_err(|source| SettingsError::Json {
                path: path.to_path_buf(),
                source,
            })?
        } else if text.trim().is_empty() {
            SettingsFile::default()
        } else {
            serde_yaml::from_str(&text).map_err(|source| SettingsError::Yaml {
                path: path.to_path_buf(),
                source,
            })?
        };

        log::debug!("loaded settings from {}", path.display());
        Self::from_file(file)
    }

    /// Parse settings from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, SettingsError> {
        let file: SettingsFile = if text.trim().is_empty() {
            SettingsFile::default()
        } else {
            serde_yaml::from_str(text).map_err(|source| SettingsError::Yaml {
                path: PathBuf::from("<inline>"),
                source,
            })?
        };
        Self::from_file(file)
    }

    fn from_file(file: SettingsFile) -> Result<Self, SettingsError> {
        let defaults = Self::default();

        let near_deadline_days = file
            .near_deadline_days
            .unwrap_or(defaults.near_deadline_days);
        if near_deadline_days < 0 {
            return Err(SettingsError::NegativeNearDeadline(near_deadline_days));
        }
        let top_risks = file.top_risks.unwrap_or(defaults.top_risks);
        if top_risks == 0 {
            return Err(SettingsError::NoTopRisks);
        }

        Ok(Self {
            guidelines: overlay_guidelines(defaults.guidelines, &file.guidelines)?,
            statuses: file.statuses.unwrap_or(defaults.statuses),
            blocker_labels: file.blocker_labels.unwrap_or(defaults.blocker_labels),
            near_deadline_days,
            top_risks,
            jira_browse_url: file.jira_browse_url.filter(|url| !url.trim().is_empty()),
        })
    }

    pub fn risk_options(&self) -> RiskOptions {
        RiskOptions {
            near_deadline_days: self.near_deadline_days,
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        let options = RenderOptions::default().with_top_risks(self.top_risks);
        match &self.jira_browse_url {
            Some(url) => options.with_browse_url(url.clone()),
            None => options,
        }
    }
}

/// Apply file guideline values on top of `base`; `null` removes a guideline.
fn overlay_guidelines(
    base: ThresholdConfig,
    raw: &BTreeMap<String, Value>,
) -> Result<ThresholdConfig, InvalidThresholdError> {
    let overrides = ThresholdConfig::from_mapping(raw.iter())?;
    let mut config = base.merged_with(&overrides);
    for (key, value) in raw {
        if value.is_null() {
            config = config.without(key.parse::<GuidelineId>()?);
        }
    }
    Ok(config)
}

/// Per-run choices that can come from the environment or the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub config_path: Option<PathBuf>,
    pub mode: ReportMode,
    pub format: OutputFormat,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create options from environment variables.
    ///
    /// Reads:
    /// - `SPRINT_HEALTH_CONFIG` - settings file path
    /// - `SPRINT_HEALTH_MODE` - daily, full or previous
    /// - `SPRINT_HEALTH_FORMAT` - markdown or json
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let config_path = env::var_os(CONFIG_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let mode = env::var(MODE_ENV)
            .ok()
            .and_then(|value| match value.parse::<ReportMode>() {
                Ok(mode) => Some(mode),
                Err(err) => {
                    log::warn!("Ignoring {}: {}", MODE_ENV, err);
                    None
                }
            })
            .unwrap_or_default();

        let format = env::var(FORMAT_ENV)
            .ok()
            .and_then(|value| match value.trim().to_ascii_lowercase().as_str() {
                "markdown" | "md" => Some(OutputFormat::Markdown),
                "json" => Some(OutputFormat::Json),
                other => {
                    log::warn!("Ignoring {}: unknown format '{}'", FORMAT_ENV, other);
                    None
                }
            })
            .unwrap_or_default();

        Self {
            config_path,
            mode,
            format,
        }
    }

    /// Merge with CLI overrides. CLI values take precedence.
    pub fn with_overrides(
        mut self,
        config_path: Option<PathBuf>,
        mode: Option<ReportMode>,
        format: Option<OutputFormat>,
    ) -> Self {
        if let Some(path) = config_path {
            self.config_path = Some(path);
        }
        if let Some(m) = mode {
            self.mode = m;
        }
        if let Some(f) = format {
            self.format = f;
        }
        self
    }

    /// Load the configured settings file, or defaults when none is set.
    pub fn load_settings(&self) -> Result<Settings, SettingsError> {
        match &self.config_path {
            Some(path) => Settings::load(path),
            None => Ok(Settings::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = Settings::from_yaml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.guidelines.get(GuidelineId::MaxOverdueDays), Some(0.0));
    }

    #[test]
    fn guidelines_overlay_and_null_disables() {
        let settings = Settings::from_yaml(
            "guidelines:\n  max_overdue_days: 3\n  max_scope_change_pct: null\nnear_deadline_days: 4\n",
        )
        .unwrap();
        assert_eq!(settings.guidelines.get(GuidelineId::MaxOverdueDays), Some(3.0));
        assert!(!settings.guidelines.is_configured(GuidelineId::MaxScopeChangePct));
        assert_eq!(settings.guidelines.get(GuidelineId::MinCompletedPct), Some(70.0));
        assert_eq!(settings.risk_options().near_deadline_days, 4);
    }

    #[test]
    fn invalid_guideline_is_a_threshold_error() {
        let err = Settings::from_yaml("guidelines:\n  max_unassigned_pct: 120\n").unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Threshold(InvalidThresholdError::OutOfRange { .. })
        ));

        let err = Settings::from_yaml("guidelines:\n  max_velocity: 3\n").unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Threshold(InvalidThresholdError::UnknownGuideline(_))
        ));

        let err = Settings::from_yaml("guidelines:\n  max_overdue_days: 1.5\n").unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Threshold(InvalidThresholdError::NotInteger { .. })
        ));
    }

    #[test]
    fn unknown_top_level_key_is_rejected() {
        assert!(matches!(
            Settings::from_yaml("colour: blue\n"),
            Err(SettingsError::Yaml { .. })
        ));
    }

    #[test]
    fn zero_top_risks_rejected() {
        assert!(matches!(
            Settings::from_yaml("top_risks: 0\n"),
            Err(SettingsError::NoTopRisks)
        ));
    }

    #[test]
    fn loads_json_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"guidelines": {{"max_tasks_per_dev": 8}}, "jira_browse_url": "https://jira.example.com/browse"}}"#
        )
        .unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.guidelines.get(GuidelineId::MaxTasksPerDev), Some(8.0));
        assert_eq!(
            settings.render_options().browse_url.as_deref(),
            Some("https://jira.example.com/browse")
        );
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }

    #[test]
    fn cli_overrides_take_precedence() {
        let options = RunOptions {
            config_path: Some(PathBuf::from("env.yaml")),
            mode: ReportMode::Daily,
            format: OutputFormat::Markdown,
        }
        .with_overrides(None, Some(ReportMode::Previous), Some(OutputFormat::Json));

        assert_eq!(options.config_path, Some(PathBuf::from("env.yaml")));
        assert_eq!(options.mode, ReportMode::Previous);
        assert_eq!(options.format, OutputFormat::Json);
    }
}
