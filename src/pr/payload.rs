//! Typed view of `pull_request` webhook payloads.

use serde::Deserialize;

/// Actions that trigger analysis and review.
pub const ACTIONS_TO_PROCESS_PR: &[&str] = &["opened", "synchronize", "reopened"];

/// Actions that trigger description normalization.
pub const ACTIONS_TO_UPDATE_DESC: &[&str] = &["opened", "edited"];

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    pub pull_request: PullRequest,
    pub repository: Repository,
    #[serde(default)]
    pub installation: Option<Installation>,
}

impl PullRequestEvent {
    pub fn owner(&self) -> &str {
        &self.repository.owner.login
    }

    pub fn repo(&self) -> &str {
        &self.repository.name
    }

    pub fn number(&self) -> u64 {
        self.pull_request.number
    }

    pub fn installation_id(&self) -> Option<u64> {
        self.installation.as_ref().map(|i| i.id)
    }

    pub fn should_process(&self) -> bool {
        ACTIONS_TO_PROCESS_PR.contains(&self.action.as_str())
    }

    pub fn should_update_description(&self) -> bool {
        ACTIONS_TO_UPDATE_DESC.contains(&self.action.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub user: User,
    pub head: GitRef,
    pub base: GitRef,
    #[serde(default)]
    pub html_url: String,
}

impl PullRequest {
    pub fn body_or_empty(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitRef {
    pub sha: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Installation {
    pub id: u64,
}
