//! AI code review collaborator.
//!
//! A [`ReviewGenerator`] turns a description of a pull request into free-form
//! markdown review text. The service behind it is opaque: it returns text or
//! an error, nothing more.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub mod gemini;

pub use gemini::GeminiReviewer;

/// Instructions sent ahead of every pull request.
pub const REVIEW_PROMPT: &str = "You are an experienced software engineer reviewing a pull request. \
Review the changes described in the JSON below. Point out bugs, risky logic, missing error \
handling, security problems and missing tests. Reference files by name, keep each point short, \
and skip praise. Answer in GitHub-flavored markdown. If the changes look fine, say so in one sentence.";

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("AI request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("AI service returned no text")]
    EmptyResponse,
}

/// What the reviewer gets to see about a pull request.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewRequest {
    pub title: String,
    pub author: String,
    pub base_branch: String,
    pub head_branch: String,
    pub files: Vec<FileDiff>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileDiff {
    pub filename: String,
    pub status: String,
    pub additions: u64,
    pub deletions: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

impl ReviewRequest {
    /// The full prompt: fixed instructions followed by the PR as JSON.
    pub fn prompt(&self) -> String {
        let pr = serde_json::to_string_pretty(self).unwrap_or_default();
        format!("{}\n\n```json\n{}\n```", REVIEW_PROMPT, pr)
    }
}

/// A text-generation service that reviews pull requests.
#[async_trait]
pub trait ReviewGenerator: Send + Sync {
    /// Generate a markdown review for the pull request.
    async fn review(&self, request: &ReviewRequest) -> Result<String, ReviewError>;
}
