//! GitHub integration module for GitHub App support.
//!
//! This module provides:
//! - App assertion signing and installation access token exchange
//! - Webhook signature verification
//! - GitHub API client for pull request operations

pub mod api_client;
pub mod endpoints;
pub mod signature;
pub mod token_manager;

pub use api_client::{
    CommitState, CommitStatus, GitHubClient, PullRequestFile, PullRequestReview,
};
pub use endpoints::Endpoints;
pub use token_manager::{
    create_assertion, exchange_for_installation_token, AppCredential, InstallationToken,
    SignedAssertion,
};

/// Sent as `User-Agent` on every GitHub request.
pub const USER_AGENT: &str = "prpilot";

/// REST API version pinned via `X-GitHub-Api-Version`.
pub const API_VERSION: &str = "2022-11-28";
