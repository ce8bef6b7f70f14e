//! GitHub API client for pull request operations.
//!
//! The client owns its installation token. One client is built per
//! webhook-processing task, so the cached token is never shared between
//! tasks and needs no locking.

use chrono::{DateTime, Duration, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::endpoints::Endpoints;
use super::token_manager::{
    create_assertion, exchange_for_installation_token, AppCredential, InstallationToken,
};
use super::{API_VERSION, USER_AGENT};
use crate::error::{GitHubError, GitHubResult};

/// A cached token is refreshed this long before it actually expires.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

enum CachedToken {
    /// Handed in by the caller; its lifetime is unknown, so it is always reused.
    Supplied(String),
    Issued(InstallationToken),
}

impl CachedToken {
    fn token(&self) -> &str {
        match self {
            CachedToken::Supplied(token) => token,
            CachedToken::Issued(issued) => &issued.token,
        }
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self {
            CachedToken::Supplied(_) => true,
            CachedToken::Issued(issued) => {
                !issued.expires_within(now, Duration::seconds(TOKEN_REFRESH_MARGIN_SECS))
            }
        }
    }
}

/// GitHub API client for installation-based operations.
pub struct GitHubClient {
    http: reqwest::Client,
    endpoints: Endpoints,
    credential: Option<AppCredential>,
    installation_id: Option<u64>,
    token: Option<CachedToken>,
}

impl GitHubClient {
    /// Create a client that obtains its token for `installation_id` on first use.
    pub fn for_installation(
        http: reqwest::Client,
        endpoints: Endpoints,
        credential: AppCredential,
        installation_id: u64,
    ) -> Self {
        Self {
            http,
            endpoints,
            credential: Some(credential),
            installation_id: Some(installation_id),
            token: None,
        }
    }

    /// Create a client around an already issued token.
    pub fn with_token(http: reqwest::Client, endpoints: Endpoints, token: impl Into<String>) -> Self {
        Self {
            http,
            endpoints,
            credential: None,
            installation_id: None,
            token: Some(CachedToken::Supplied(token.into())),
        }
    }

    /// Create a client from whatever the caller has. With neither a token nor
    /// an installation id every call fails with [`GitHubError::Auth`].
    pub fn new(
        http: reqwest::Client,
        endpoints: Endpoints,
        credential: AppCredential,
        installation_id: Option<u64>,
    ) -> Self {
        Self {
            http,
            endpoints,
            credential: Some(credential),
            installation_id,
            token: None,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Whether the client currently holds a token (fresh or not).
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Return a valid installation token, exchanging a new assertion for one
    /// when nothing usable is cached.
    pub async fn ensure_token(&mut self) -> GitHubResult<String> {
        if let Some(cached) = &self.token {
            if cached.is_fresh(Utc::now()) {
                return Ok(cached.token().to_string());
            }
        }

        let installation_id = self.installation_id.ok_or_else(|| {
            GitHubError::Auth("no token or installation_id provided".to_string())
        })?;
        let credential = self
            .credential
            .as_ref()
            .ok_or_else(|| GitHubError::Configuration("no app credential".to_string()))?;

        let assertion = create_assertion(credential)?;
        let issued =
            exchange_for_installation_token(&self.http, &self.endpoints, &assertion, installation_id)
                .await?;

        let token = issued.token.clone();
        self.token = Some(CachedToken::Issued(issued));
        Ok(token)
    }

    /// Make an authenticated request to the GitHub API.
    ///
    /// Returns the parsed JSON body, or `None` when the response has no body.
    pub async fn request(
        &mut self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> GitHubResult<Option<Value>> {
        let token = self.ensure_token().await?;

        let mut builder = self
            .http
            .request(method.clone(), url)
            .bearer_auth(token)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .header("X-GitHub-Api-Version", API_VERSION);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.as_u16() >= 400 {
            tracing::error!(%method, url, status = status.as_u16(), "GitHub API error: {}", text);
            return Err(GitHubError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| GitHubError::Decode(format!("{} {}: {}", method, url, e)))
    }

    pub async fn get(&mut self, url: &str) -> GitHubResult<Option<Value>> {
        self.request(Method::GET, url, None).await
    }

    pub async fn post(&mut self, url: &str, body: Option<&Value>) -> GitHubResult<Option<Value>> {
        self.request(Method::POST, url, body).await
    }

    pub async fn patch(&mut self, url: &str, body: Option<&Value>) -> GitHubResult<Option<Value>> {
        self.request(Method::PATCH, url, body).await
    }

    pub async fn put(&mut self, url: &str, body: Option<&Value>) -> GitHubResult<Option<Value>> {
        self.request(Method::PUT, url, body).await
    }

    pub async fn delete(&mut self, url: &str) -> GitHubResult<Option<Value>> {
        self.request(Method::DELETE, url, None).await
    }

    /// List files changed in a pull request (first 100).
    pub async fn list_pull_request_files(
        &mut self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> GitHubResult<Vec<PullRequestFile>> {
        let url = format!(
            "{}?per_page=100",
            self.endpoints.pull_files(owner, repo, number)
        );
        decode(self.get(&url).await?, "pull request files")
    }

    /// Fetch a pull request as raw JSON.
    pub async fn get_pull_request(
        &mut self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> GitHubResult<Value> {
        let url = self.endpoints.pull(owner, repo, number);
        decode(self.get(&url).await?, "pull request")
    }

    pub async fn list_pull_request_reviews(
        &mut self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> GitHubResult<Vec<PullRequestReview>> {
        let url = self.endpoints.pull_reviews(owner, repo, number);
        decode(self.get(&url).await?, "pull request reviews")
    }

    /// Repository contents at `path`, optionally at a given ref. A file
    /// comes back as an object, a directory as an array.
    pub async fn get_contents(
        &mut self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: Option<&str>,
    ) -> GitHubResult<Value> {
        let mut url = reqwest::Url::parse(&self.endpoints.contents(owner, repo, path))
            .map_err(|e| GitHubError::Configuration(format!("invalid API URL: {}", e)))?;
        if let Some(git_ref) = git_ref {
            url.query_pairs_mut().append_pair("ref", git_ref);
        }
        decode(self.get(url.as_str()).await?, "contents")
    }

    /// Post a comment on an issue or pull request. Returns the comment ID.
    pub async fn post_issue_comment(
        &mut self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> GitHubResult<u64> {
        let url = self.endpoints.pull_comments(owner, repo, number);
        let response: CommentResponse =
            decode(self.post(&url, Some(&json!({ "body": body }))).await?, "comment")?;
        Ok(response.id)
    }

    /// Replace the description of a pull request.
    pub async fn update_pull_request_body(
        &mut self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> GitHubResult<()> {
        let url = self.endpoints.pull(owner, repo, number);
        self.patch(&url, Some(&json!({ "body": body }))).await?;
        Ok(())
    }

    /// Set a commit status on `sha`.
    pub async fn create_commit_status(
        &mut self,
        owner: &str,
        repo: &str,
        sha: &str,
        status: &CommitStatus,
    ) -> GitHubResult<()> {
        let url = self.endpoints.statuses(owner, repo, sha);
        let body = serde_json::to_value(status)
            .map_err(|e| GitHubError::Decode(format!("commit status: {}", e)))?;
        self.post(&url, Some(&body)).await?;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(value: Option<Value>, what: &str) -> GitHubResult<T> {
    let value = value.ok_or_else(|| GitHubError::Decode(format!("empty {} response", what)))?;
    serde_json::from_value(value).map_err(|e| GitHubError::Decode(format!("{}: {}", what, e)))
}

/// A file changed by a pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestFile {
    pub filename: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub changes: u64,
    /// Unified diff; absent for binary or very large files
    #[serde(default)]
    pub patch: Option<String>,
}

/// A submitted review on a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestReview {
    pub id: u64,
    pub state: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub user: Option<ReviewAuthor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewAuthor {
    pub login: String,
}

#[derive(Debug, Deserialize)]
struct CommentResponse {
    id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitState {
    Pending,
    Success,
    Error,
    Failure,
}

/// Body of a commit status update.
#[derive(Debug, Clone, Serialize)]
pub struct CommitStatus {
    pub state: CommitState,
    pub description: String,
    pub context: String,
}

impl CommitStatus {
    pub fn new(state: CommitState, description: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            state,
            description: description.into(),
            context: context.into(),
        }
    }
}
