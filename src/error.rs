//! Error taxonomy for GitHub App authentication and REST calls.

use thiserror::Error;

/// Errors raised while authenticating as the app or talking to the GitHub API.
#[derive(Error, Debug)]
pub enum GitHubError {
    /// App id or private key missing from configuration.
    #[error("GitHub App is not configured: {0}")]
    Configuration(String),

    /// The private key could not be parsed, or signing the assertion failed.
    #[error("Failed to sign app assertion: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// The installation token endpoint answered with something other than 201.
    #[error("Installation token exchange failed: {status} - {body}")]
    AuthExchange { status: u16, body: String },

    /// A downstream API call answered with status >= 400.
    #[error("GitHub API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// The client has neither a token nor an installation to obtain one for.
    #[error("Cannot authenticate: {0}")]
    Auth(String),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response did not have the shape we expected.
    #[error("Unexpected response from GitHub: {0}")]
    Decode(String),
}

impl GitHubError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            GitHubError::AuthExchange { status, .. } | GitHubError::Api { status, .. } => {
                Some(*status)
            }
            GitHubError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type GitHubResult<T> = std::result::Result<T, GitHubError>;
