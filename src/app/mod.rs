//! Application layer: turns a parsed [`Command`] into file I/O around the
//! analysis engine.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::info;

use crate::cli::{AnalyzeArgs, CheckConfigArgs, Command, GuidelinesArgs};
use crate::engine::{EngineError, SprintAnalyzer};
use crate::models::SprintSnapshot;
use crate::report::{render, SprintReport};
use crate::settings::{RunOptions, Settings, SettingsError};
use crate::thresholds::{GuidelineId, ThresholdConfig};
use crate::utils::parse_timestamp;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("failed to read snapshot {path}: {source}")]
    ReadSnapshot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid snapshot {path}: {source}")]
    ParseSnapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0}")]
    User(String),
}

/// Main application wiring the engine to files and stdout.
pub struct App<W: Write> {
    env: RunOptions,
    out: W,
}

impl App<io::Stdout> {
    /// Application writing to stdout, with defaults from the environment.
    pub fn from_env() -> Self {
        Self::new(RunOptions::from_env(), io::stdout())
    }
}

impl<W: Write> App<W> {
    pub fn new(env: RunOptions, out: W) -> Self {
        Self { env, out }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub fn run(&mut self, command: Command) -> Result<(), AppError> {
        match command {
            Command::Analyze(args) => self.handle_analyze(args),
            Command::CheckConfig(args) => self.handle_check_config(args),
            Command::Guidelines(args) => self.handle_guidelines(args),
        }
    }

    fn handle_analyze(&mut self, args: AnalyzeArgs) -> Result<(), AppError> {
        let options = self
            .env
            .clone()
            .with_overrides(args.config, args.mode, args.format);
        let settings = options.load_settings()?;
        let as_of = resolve_as_of(args.as_of.as_deref())?;
        let snapshot = read_snapshot(&args.snapshot)?;

        let analyzer = SprintAnalyzer::new(settings);
        let report = analyzer.analyze(&snapshot, as_of)?.with_mode(options.mode);
        let rendered = render(&report, options.format, &analyzer.settings().render_options());

        match &args.output {
            Some(path) => {
                fs::write(path, ensure_newline(rendered)).map_err(|source| AppError::Write {
                    path: path.clone(),
                    source,
                })?;
                info!("Wrote {} report to {}", report.mode, path.display());
            }
            None => self.emit(&ensure_newline(rendered))?,
        }

        log_summary(&report);
        Ok(())
    }

    fn handle_check_config(&mut self, args: CheckConfigArgs) -> Result<(), AppError> {
        let settings = Settings::load(&args.config)?;
        info!("{} is valid", args.config.display());
        let table = format_guidelines(&settings.guidelines);
        self.emit(&table)
    }

    fn handle_guidelines(&mut self, args: GuidelinesArgs) -> Result<(), AppError> {
        let options = self.env.clone().with_overrides(args.config, None, None);
        let settings = options.load_settings()?;
        let table = format_guidelines(&settings.guidelines);
        self.emit(&table)
    }

    fn emit(&mut self, text: &str) -> Result<(), AppError> {
        self.out
            .write_all(text.as_bytes())
            .and_then(|_| self.out.flush())
            .map_err(|source| AppError::Write {
                path: PathBuf::from("<stdout>"),
                source,
            })
    }
}

fn resolve_as_of(raw: Option<&str>) -> Result<DateTime<Utc>, AppError> {
    match raw {
        Some(text) => parse_timestamp(text).ok_or_else(|| {
            AppError::User(format!(
                "invalid --as-of '{}': expected RFC 3339 or YYYY-MM-DD",
                text
            ))
        }),
        None => Ok(Utc::now()),
    }
}

fn read_snapshot(path: &Path) -> Result<SprintSnapshot, AppError> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|source| AppError::ReadSnapshot {
                path: path.to_path_buf(),
                source,
            })?;
        buf
    } else {
        fs::read_to_string(path).map_err(|source| AppError::ReadSnapshot {
            path: path.to_path_buf(),
            source,
        })?
    };

    serde_json::from_str(&text).map_err(|source| AppError::ParseSnapshot {
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

fn log_summary(report: &SprintReport) {
    if report.is_healthy() {
        info!("Sprint '{}' looks healthy", report.sprint.name);
    } else {
        info!(
            "Sprint '{}': {:.1}% complete, {} violation(s), {} risk(s)",
            report.sprint.name,
            report.metrics.completed_pct,
            report.violations.len(),
            report.risk_flags.len()
        );
    }
}

/// Plain-text table of every guideline and its effective value.
pub fn format_guidelines(config: &ThresholdConfig) -> String {
    let mut output = String::new();
    output.push_str(&format!("{:<38} {:<10} {}\n", "GUIDELINE", "VALUE", "DESCRIPTION"));
    for &id in GuidelineId::all() {
        let value = config
            .get(id)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "off".to_string());
        output.push_str(&format!("{:<38} {:<10} {}\n", id.key(), value, id.name()));
    }
    output
}
