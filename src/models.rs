use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::flexible_date;

/// A loosely-typed issue record as handed over by the Jira collaborator.
///
/// Fields are looked up first at the top level and then inside a nested
/// `fields` object, so both flattened records and raw Jira REST payloads work.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawIssueRecord(pub Map<String, Value>);

impl RawIssueRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter, mostly useful for fixtures.
    pub fn with(mut self, field_id: impl Into<String>, value: Value) -> Self {
        self.0.insert(field_id.into(), value);
        self
    }

    /// Look up a provider field. `null` counts as absent.
    pub fn get(&self, field_id: &str) -> Option<&Value> {
        let value = self.0.get(field_id).or_else(|| {
            self.0
                .get("fields")
                .and_then(Value::as_object)
                .and_then(|fields| fields.get(field_id))
        })?;
        if value.is_null() {
            None
        } else {
            Some(value)
        }
    }
}

impl From<Value> for RawIssueRecord {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }
}

/// Logical fields the normalizer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalField {
    Key,
    Status,
    Summary,
    IssueType,
    Assignee,
    Reporter,
    Priority,
    StoryPoints,
    DueDate,
    Created,
    Updated,
    StatusEnteredAt,
    ResolutionDate,
    FixVersions,
    Labels,
    Blocked,
    Cancelled,
    Reopened,
    CarriedOver,
    AddedDuringSprint,
    EpicLink,
}

impl LogicalField {
    /// Provider field id used when the mapping does not override it.
    ///
    /// `None` for fields Jira has no stable id for: they are read only when
    /// explicitly mapped. Jira's `statuscategorychangedate` is not a stand-in
    /// for [`Self::StatusEnteredAt`] since it does not move between statuses
    /// of the same category (In Progress to In Review).
    pub fn default_field_id(&self) -> Option<&'static str> {
        let id = match self {
            Self::Key => "key",
            Self::Status => "status",
            Self::Summary => "summary",
            Self::IssueType => "issuetype",
            Self::Assignee => "assignee",
            Self::Reporter => "reporter",
            Self::Priority => "priority",
            Self::StoryPoints => "customfield_10016",
            Self::DueDate => "duedate",
            Self::Created => "created",
            Self::Updated => "updated",
            Self::ResolutionDate => "resolutiondate",
            Self::FixVersions => "fixVersions",
            Self::Labels => "labels",
            Self::Blocked => "flagged",
            Self::Cancelled => "cancelled",
            Self::Reopened => "reopened",
            Self::CarriedOver => "carried_over",
            Self::AddedDuringSprint => "added_during_sprint",
            Self::StatusEnteredAt | Self::EpicLink => return None,
        };
        Some(id)
    }
}

/// Logical field name to provider field id (e.g. `story_points -> customfield_10026`).
///
/// Must be fully resolved before the engine runs; unmapped fields fall back to
/// [`LogicalField::default_field_id`], and fields without a default are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping {
    overrides: BTreeMap<LogicalField, String>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: LogicalField, field_id: impl Into<String>) -> Self {
        self.overrides.insert(field, field_id.into());
        self
    }

    pub fn field_id(&self, field: LogicalField) -> Option<&str> {
        self.overrides
            .get(&field)
            .map(String::as_str)
            .or_else(|| field.default_field_id())
    }
}

/// Canonical workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    ToDo,
    InProgress,
    ReviewPending,
    Done,
    Cancelled,
    Other,
}

impl IssueStatus {
    /// Not done and not cancelled.
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Done | Self::Cancelled)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ToDo => "To Do",
            Self::InProgress => "In Progress",
            Self::ReviewPending => "Review Pending",
            Self::Done => "Done",
            Self::Cancelled => "Cancelled",
            Self::Other => "Other",
        }
    }
}

impl Display for IssueStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Jira priority, ordered from lowest to highest.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Priority {
    Lowest,
    Low,
    #[default]
    Medium,
    High,
    Highest,
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lowest" | "trivial" => Ok(Self::Lowest),
            "low" | "minor" => Ok(Self::Low),
            "medium" | "normal" => Ok(Self::Medium),
            "high" | "major" => Ok(Self::High),
            "highest" | "critical" | "blocker" => Ok(Self::Highest),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Lowest => "Lowest",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Highest => "Highest",
        };
        f.write_str(name)
    }
}

/// Issue type assumed when the record does not carry one.
pub const DEFAULT_ISSUE_TYPE: &str = "Task";

/// A normalized, strictly-typed sprint issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub key: String,
    pub status: IssueStatus,
    /// Status text as the provider reported it.
    pub status_name: String,
    pub issue_type: String,
    pub summary: Option<String>,
    pub assignee: Option<String>,
    pub reporter: Option<String>,
    pub story_points: Option<f64>,
    pub due_date: Option<NaiveDate>,
    pub created: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
    /// When the issue entered its current status, if the provider knows.
    pub status_entered_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_during_sprint: bool,
    /// `None` when the provider does not track carry-over.
    pub carried_over: Option<bool>,
    pub reopened: bool,
    pub fix_versions: BTreeSet<String>,
    pub labels: BTreeSet<String>,
    pub is_blocked: bool,
    pub priority: Priority,
    /// Key of the epic the issue belongs to.
    pub epic: Option<String>,
}

impl Issue {
    /// Minimal issue with every optional field absent.
    pub fn new(key: impl Into<String>, status: IssueStatus) -> Self {
        Self {
            key: key.into(),
            status,
            status_name: status.name().to_string(),
            issue_type: DEFAULT_ISSUE_TYPE.to_string(),
            summary: None,
            assignee: None,
            reporter: None,
            story_points: None,
            due_date: None,
            created: None,
            last_updated: None,
            status_entered_at: None,
            resolved_at: None,
            created_during_sprint: false,
            carried_over: None,
            reopened: false,
            fix_versions: BTreeSet::new(),
            labels: BTreeSet::new(),
            is_blocked: false,
            priority: Priority::default(),
            epic: None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == IssueStatus::Cancelled
    }

    pub fn is_done(&self) -> bool {
        self.status == IssueStatus::Done
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    pub fn is_bug(&self) -> bool {
        self.issue_type.eq_ignore_ascii_case("bug")
    }

    /// Best available timestamp for when the issue entered its current state.
    pub fn state_entered(&self) -> Option<DateTime<Utc>> {
        self.status_entered_at.or(self.last_updated)
    }
}

/// Board the sprint belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardIdentity {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub project_key: Option<String>,
}

/// Which sprint a snapshot describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintIdentity {
    pub id: u64,
    pub name: String,
    #[serde(with = "flexible_date")]
    pub start_date: NaiveDate,
    #[serde(with = "flexible_date")]
    pub end_date: NaiveDate,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub board: BoardIdentity,
}

/// Everything the Jira collaborator hands to the engine for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintSnapshot {
    pub sprint: SprintIdentity,
    #[serde(default)]
    pub issues: Vec<RawIssueRecord>,
    /// Keys removed from the sprint after it started, when the provider tracks them.
    #[serde(default)]
    pub removed_issue_keys: Option<Vec<String>>,
    #[serde(default)]
    pub field_mapping: FieldMapping,
}
