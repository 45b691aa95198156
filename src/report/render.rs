//! Report formatting for sprint health output.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::hygiene::RiskFlag;
use crate::report::types::{DeveloperWorkload, EpicSummary, IssueRow, ReportMode, SprintReport};

/// Default number of risks shown in a daily report.
pub const DEFAULT_TOP_RISKS: usize = 5;

/// Output format for sprint reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Markdown report shaped by the report mode.
    #[default]
    Markdown,
    /// The full report model as JSON.
    Json,
}

/// Presentation knobs that do not affect the report model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Base for issue links, e.g. `https://example.atlassian.net/browse`.
    pub browse_url: Option<String>,
    pub top_risks: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            browse_url: None,
            top_risks: DEFAULT_TOP_RISKS,
        }
    }
}

impl RenderOptions {
    pub fn with_browse_url(mut self, url: impl Into<String>) -> Self {
        self.browse_url = Some(url.into());
        self
    }

    pub fn with_top_risks(mut self, top_risks: usize) -> Self {
        self.top_risks = top_risks;
        self
    }

    fn link(&self, key: &str) -> String {
        match &self.browse_url {
            Some(base) => format!("[{}]({}/{})", key, base.trim_end_matches('/'), key),
            None => key.to_string(),
        }
    }
}

/// Format a report for output.
pub fn render(report: &SprintReport, format: OutputFormat, options: &RenderOptions) -> String {
    match format {
        OutputFormat::Json => format_json(report),
        OutputFormat::Markdown => match report.mode {
            ReportMode::Daily => format_daily(report, options),
            ReportMode::Full => format_full(report, options),
            ReportMode::Previous => format_previous(report, options),
        },
    }
}

fn format_json(report: &SprintReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|e| format!("Error: {}", e))
}

fn format_daily(report: &SprintReport, options: &RenderOptions) -> String {
    let mut output = format_header(report, "Daily Sprint Health");
    output.push_str(&format_headline(report));
    output.push_str(&format_violation_list(report));

    let top = report.top_risks(options.top_risks);
    output.push_str(&format!(
        "## Top Risks ({} of {})\n\n",
        top.len(),
        report.risk_flags.len()
    ));
    output.push_str(&format_risk_table(top, options));
    output.push_str(&format_warnings(report));
    output
}

fn format_full(report: &SprintReport, options: &RenderOptions) -> String {
    let mut output = format_header(report, "Sprint Health Report");
    output.push_str(&format_body(report, options));
    output
}

fn format_previous(report: &SprintReport, options: &RenderOptions) -> String {
    let mut output = format_header(report, "Previous Sprint Review");
    output.push_str(&format_body(report, options));

    output.push_str("## Completed After Sprint End\n\n");
    output.push_str(&format_issue_table(
        &report.details.completed_after_sprint_end,
        options,
    ));

    output.push_str("## Removed From Sprint\n\n");
    if report.details.removed_issue_keys.is_empty() {
        if report.metrics.scope_removed_known {
            output.push_str("_None._\n\n");
        } else {
            output.push_str("_Removed issues are not tracked for this board._\n\n");
        }
    } else {
        for key in &report.details.removed_issue_keys {
            output.push_str(&format!("- {}\n", options.link(key)));
        }
        output.push('\n');
    }

    output
}

fn format_body(report: &SprintReport, options: &RenderOptions) -> String {
    let mut output = format_headline(report);
    output.push_str(&format_status_breakdown(report));
    output.push_str(&format_violation_table(report, options));

    output.push_str(&format!("## Risks ({})\n\n", report.risk_flags.len()));
    output.push_str(&format_risk_table(&report.risk_flags, options));

    output.push_str("## Workload\n\n");
    output.push_str(&format_workload(&report.details.workload, options));

    if !report.details.epics.is_empty() {
        output.push_str("## Epics\n\n");
        output.push_str(&format_epics(&report.details.epics, options));
    }

    output.push_str("## Issues Without Fix Version\n\n");
    output.push_str(&format_issue_table(&report.details.without_fix_versions, options));

    output.push_str("## Unestimated Issues\n\n");
    output.push_str(&format_issue_table(&report.details.unestimated, options));

    output.push_str(&format_warnings(report));
    output
}

fn format_header(report: &SprintReport, title: &str) -> String {
    let sprint = &report.sprint;
    let mut output = format!("# {}: {}\n\n", title, sprint.name);

    if let Some(board) = &sprint.board.name {
        output.push_str(&format!("**Board**: {}\n", board));
    }
    output.push_str(&format!(
        "**Dates**: {} to {}\n",
        sprint.start_date, sprint.end_date
    ));
    output.push_str(&format!(
        "**As of**: {} (working day {}, {} day(s) left)\n",
        report.generated_at.format("%Y-%m-%d"),
        report.metrics.working_day_number,
        report.metrics.days_remaining
    ));
    if let Some(goal) = &sprint.goal {
        output.push_str(&format!("**Goal**: {}\n", goal));
    }
    output.push('\n');
    output
}

fn format_headline(report: &SprintReport) -> String {
    let metrics = &report.metrics;
    let mut output = String::from("## Summary\n\n| Metric | Value |\n|--------|-------|\n");

    output.push_str(&format!(
        "| Completion | {:.1}% ({} of {}) |\n",
        metrics.completed_pct, metrics.completed_count, metrics.total_issues
    ));
    output.push_str(&format!(
        "| Story points | {} of {} done |\n",
        metrics.completed_story_points, metrics.total_story_points
    ));
    output.push_str(&format!(
        "| Scope | +{} / -{} |\n",
        metrics.scope_added_count,
        if metrics.scope_removed_known {
            metrics.scope_removed_count.to_string()
        } else {
            "n/a".to_string()
        }
    ));
    output.push_str(&format!(
        "| Carried over | {} |\n",
        if metrics.carried_over_known {
            metrics.carried_over_count.to_string()
        } else {
            "n/a".to_string()
        }
    ));
    output.push_str(&format!(
        "| Violations | {} |\n| Risks | {} |\n",
        report.violations.len(),
        report.risk_flags.len()
    ));
    if metrics.cancelled_count > 0 {
        output.push_str(&format!("| Cancelled | {} |\n", metrics.cancelled_count));
    }
    output.push('\n');
    output
}

fn format_status_breakdown(report: &SprintReport) -> String {
    let breakdown = &report.metrics.status_breakdown;
    format!(
        "## Status\n\n| To Do | In Progress | Review | Done | Other |\n|-------|-------------|--------|------|-------|\n| {} | {} | {} | {} | {} |\n\n",
        breakdown.to_do,
        breakdown.in_progress,
        breakdown.review_pending,
        breakdown.done,
        breakdown.other
    )
}

fn format_violation_list(report: &SprintReport) -> String {
    let mut output = format!("## Hygiene ({} violation(s))\n\n", report.violations.len());
    if report.violations.is_empty() {
        output.push_str("_All configured guidelines met._\n\n");
        return output;
    }
    for violation in &report.violations {
        output.push_str(&format!(
            "- **{}**: {}\n",
            violation.category, violation.description
        ));
    }
    output.push('\n');
    output
}

fn format_violation_table(report: &SprintReport, options: &RenderOptions) -> String {
    let mut output = format!("## Hygiene ({} violation(s))\n\n", report.violations.len());
    if report.violations.is_empty() {
        output.push_str("_All configured guidelines met._\n\n");
        return output;
    }

    output.push_str(
        "| Guideline | Measured | Limit | Details | Issues |\n|-----------|----------|-------|---------|--------|\n",
    );
    for violation in &report.violations {
        let issues: Vec<String> = violation
            .affected_issue_keys
            .iter()
            .map(|k| options.link(k))
            .collect();
        output.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            violation.category,
            format_number(violation.measured_value),
            format_number(violation.threshold_value),
            violation.description,
            issues.join(", ")
        ));
    }
    output.push('\n');
    output
}

fn format_risk_table(flags: &[RiskFlag], options: &RenderOptions) -> String {
    if flags.is_empty() {
        return "_No risks flagged._\n\n".to_string();
    }

    let mut output = String::from("| Issue | Severity | Reasons |\n|-------|----------|---------|\n");
    for flag in flags {
        let reasons: Vec<String> = flag.reasons.iter().map(|r| r.to_string()).collect();
        output.push_str(&format!(
            "| {} | {} | {} |\n",
            options.link(&flag.issue_key),
            flag.severity,
            reasons.join(", ")
        ));
    }
    output.push('\n');
    output
}

fn format_workload(workload: &[DeveloperWorkload], options: &RenderOptions) -> String {
    if workload.is_empty() {
        return "_No issues._\n\n".to_string();
    }

    let mut output = String::from(
        "| Developer | Tasks | Open | Story Points |\n|-----------|-------|------|--------------|\n",
    );
    for entry in workload {
        output.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            entry.developer.as_deref().unwrap_or("Unassigned"),
            entry.task_count,
            entry.open_count,
            entry.story_points
        ));
    }
    output.push('\n');

    for entry in workload {
        output.push_str(&format!(
            "### {}\n\n",
            entry.developer.as_deref().unwrap_or("Unassigned")
        ));
        output.push_str(&format_issue_table(&entry.issues, options));
    }
    output
}

fn format_epics(epics: &[EpicSummary], options: &RenderOptions) -> String {
    let mut output = String::from(
        "| Epic | Issues | Done | Story Points | Sprint Issues |\n|------|--------|------|--------------|---------------|\n",
    );
    for epic in epics {
        let keys: Vec<String> = epic.issues.iter().map(|row| options.link(&row.key)).collect();
        output.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            options.link(&epic.epic),
            epic.issue_count,
            epic.done_count,
            format_number(epic.story_points),
            keys.join(", ")
        ));
    }
    output.push('\n');
    output
}

fn format_issue_table(rows: &[IssueRow], options: &RenderOptions) -> String {
    if rows.is_empty() {
        return "_None._\n\n".to_string();
    }

    let mut output = String::from(
        "| Issue | Type | Status | Assignee | Points | Due | Age (days) | Summary |\n|-------|------|--------|----------|--------|-----|------------|---------|\n",
    );
    for row in rows {
        output.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
            options.link(&row.key),
            row.issue_type,
            row.status_name,
            row.assignee.as_deref().unwrap_or("-"),
            row.story_points.map(format_number).unwrap_or_else(|| "-".to_string()),
            row.due_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
            row.days_since_created
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
            row.summary.as_deref().unwrap_or("").replace('|', "\\|")
        ));
    }
    output.push('\n');
    output
}

fn format_warnings(report: &SprintReport) -> String {
    if report.warnings.is_empty() {
        return String::new();
    }
    let mut output = String::from("## Data Quality\n\n");
    for warning in &report.warnings {
        output.push_str(&format!("- {}\n", warning));
    }
    output.push('\n');
    output
}

/// Whole numbers without a trailing `.0`, others to one decimal.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}
