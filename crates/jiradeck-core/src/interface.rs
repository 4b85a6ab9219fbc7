use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure taxonomy for the three query kinds. Every failure is recorded in
/// session state; none of them aborts the process or the session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("jira credentials are missing or incomplete")]
    InvalidConfiguration,
    #[error("jira request failed: {0}")]
    Network(String),
    #[error("jira response was malformed: {0}")]
    Decode(String),
    #[error("jira rejected the configured credentials")]
    Auth,
}

/// Site credentials, read from the settings collaborator. Treated as an
/// immutable snapshot for the duration of each request.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    pub project_name: String,
    pub user_name: String,
    pub api_key: String,
}

impl Credentials {
    pub fn from_settings(settings: &jiradeck_config::Settings) -> Self {
        Self {
            project_name: settings.project_name.trim().to_owned(),
            user_name: settings.user_name.trim().to_owned(),
            api_key: settings.api_key.trim().to_owned(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.project_name.trim().is_empty()
            && !self.user_name.trim().is_empty()
            && !self.api_key.trim().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("project_name", &self.project_name)
            .field("user_name", &self.user_name)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    Backlog,
    InProgress,
    Done,
}

impl StatusFilter {
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Backlog => "Backlog",
            Self::InProgress => "In-Progress",
            Self::Done => "Done",
        }
    }

    /// The quoted JQL value, or `None` when the filter matches everything.
    pub const fn jql_value(self) -> Option<&'static str> {
        match self {
            Self::All => None,
            other => Some(other.label()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IssueTypeFilter {
    #[default]
    All,
    Story,
    Bug,
    Task,
}

impl IssueTypeFilter {
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Story => "Story",
            Self::Bug => "Bug",
            Self::Task => "Task",
        }
    }

    pub const fn jql_value(self) -> Option<&'static str> {
        match self {
            Self::All => None,
            other => Some(other.label()),
        }
    }
}

/// User-selected filters. Owned by the session; every mutation invalidates
/// the current result set and triggers a new query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub status: StatusFilter,
    pub issue_type: IssueTypeFilter,
    pub assigned_to_me: bool,
    pub search_text: String,
}

/// List-view projection of one issue, in the order the service returned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub id: String,
    pub key: String,
    pub summary: String,
    pub status: String,
    pub issue_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueAssignee {
    pub display_name: String,
    pub email: String,
}

/// Detail-view projection for exactly one issue key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDetail {
    pub id: String,
    pub key: String,
    pub issue_type: String,
    pub summary: String,
    pub description: Option<String>,
    pub creator: String,
    pub due_date: Option<String>,
    pub status: String,
    pub priority: String,
    pub assignee: Option<IssueAssignee>,
}

/// Transport seam for the three query operations. The session only ever
/// talks to the remote service through this trait, so tests can swap in an
/// in-memory stub.
#[async_trait::async_trait]
pub trait IssueTransport: Send + Sync {
    async fn fetch_issue_list(
        &self,
        credentials: &Credentials,
        jql: &str,
    ) -> Result<Vec<IssueSummary>, QueryError>;

    async fn fetch_suggestions(
        &self,
        credentials: &Credentials,
        jql: &str,
    ) -> Result<Vec<IssueSummary>, QueryError>;

    async fn fetch_issue_detail(
        &self,
        credentials: &Credentials,
        key: &str,
    ) -> Result<IssueDetail, QueryError>;
}
