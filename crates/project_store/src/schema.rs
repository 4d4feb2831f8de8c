use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Paused,
    Archived,
}

impl ProjectStatus {
    pub const ALL: [Self; 3] = [Self::Active, Self::Paused, Self::Archived];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Archived => "archived",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

/// Lifecycle phase of a project. Advanced only by explicit user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectPhase {
    #[default]
    Onboarding,
    Architecture,
    Build,
    Debug,
    Deploy,
}

impl ProjectPhase {
    pub const ALL: [Self; 5] = [
        Self::Onboarding,
        Self::Architecture,
        Self::Build,
        Self::Debug,
        Self::Deploy,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Onboarding => "onboarding",
            Self::Architecture => "architecture",
            Self::Build => "build",
            Self::Debug => "debug",
            Self::Deploy => "deploy",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|phase| phase.as_str().eq_ignore_ascii_case(value.trim()))
    }

    /// Returns the phase after this one; `Deploy` is terminal.
    #[must_use]
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Onboarding => Some(Self::Architecture),
            Self::Architecture => Some(Self::Build),
            Self::Build => Some(Self::Debug),
            Self::Debug => Some(Self::Deploy),
            Self::Deploy => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnippetCategory {
    #[default]
    Frontend,
    Backend,
    Database,
    Config,
}

impl SnippetCategory {
    pub const ALL: [Self; 4] = [Self::Frontend, Self::Backend, Self::Database, Self::Config];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Frontend => "frontend",
            Self::Backend => "backend",
            Self::Database => "database",
            Self::Config => "config",
        }
    }

    /// Case-insensitive lookup of a category marker value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: Timestamp,
}

/// Code block extracted from an assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSnippet {
    pub id: String,
    pub filename: String,
    pub language: String,
    pub code: String,
    pub category: SnippetCategory,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub passed: bool,
    pub summary: String,
    #[serde(default)]
    pub issues: Vec<String>,
    pub ran_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub snippets: Vec<CodeSnippet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation: Option<SimulationResult>,
    #[serde(default)]
    pub decisions: Vec<Value>,
    #[serde(default)]
    pub agent_assignments: BTreeMap<String, Value>,
    #[serde(default)]
    pub memory_context: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub snapshot_id: String,
    pub label: String,
    pub created_at: Timestamp,
    pub workspace: Workspace,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetadata {
    pub remote_id: Option<String>,
    pub last_synced_at: Option<Timestamp>,
    #[serde(default)]
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubMetadata {
    pub repository: String,
    pub branch: String,
    pub last_commit_sha: Option<String>,
    pub last_pushed_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub project_id: String,
    pub name: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub current_phase: ProjectPhase,
    pub created_at: Timestamp,
    pub last_modified: Timestamp,
    #[serde(default)]
    pub workspace: Workspace,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub snapshots: Vec<Snapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GitHubMetadata>,
}

impl Project {
    /// Creates an active onboarding-phase project with an empty workspace.
    #[must_use]
    pub fn new(project_id: impl Into<String>, name: impl Into<String>, now: Timestamp) -> Self {
        Self {
            project_id: project_id.into(),
            name: name.into(),
            status: ProjectStatus::Active,
            current_phase: ProjectPhase::Onboarding,
            created_at: now,
            last_modified: now,
            workspace: Workspace::default(),
            snapshots: Vec::new(),
            sync: None,
            github: None,
        }
    }
}
