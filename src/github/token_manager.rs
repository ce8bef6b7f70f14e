//! Token management for GitHub App authentication.
//!
//! GitHub Apps use two types of authentication:
//! 1. App assertion - Short-lived JWT signed with the app's private key (for app-level operations)
//! 2. Installation Access Token - Token for a specific installation (for repo operations)

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use metrics::counter;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::endpoints::Endpoints;
use super::{API_VERSION, USER_AGENT};
use crate::api::metrics::INSTALLATION_TOKENS_ISSUED_TOTAL;
use crate::error::{GitHubError, GitHubResult};

/// Seconds the issue time is backdated to tolerate clock drift.
pub const ISSUED_AT_SKEW_SECS: i64 = 60;

/// Seconds until the assertion expires (GitHub's maximum is 10 minutes).
pub const ASSERTION_LIFETIME_SECS: i64 = 600;

/// The app identity: app id plus its PEM-encoded RSA private key.
#[derive(Clone)]
pub struct AppCredential {
    app_id: String,
    private_key: String,
}

impl AppCredential {
    pub fn new(app_id: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            private_key: private_key.into(),
        }
    }
}

impl fmt::Debug for AppCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppCredential")
            .field("app_id", &self.app_id)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// JWT claims for GitHub App authentication.
/// GitHub requires: iat (issued at), exp (expiration), iss (issuer = app_id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Issued at time (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp) - max 10 minutes
    pub exp: i64,
    /// Issuer - the GitHub App ID
    pub iss: String,
}

/// A signed, time-bounded app assertion. Never cached.
#[derive(Clone)]
pub struct SignedAssertion {
    token: String,
    claims: AssertionClaims,
}

impl SignedAssertion {
    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn claims(&self) -> &AssertionClaims {
        &self.claims
    }
}

impl fmt::Debug for SignedAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedAssertion")
            .field("claims", &self.claims)
            .finish_non_exhaustive()
    }
}

/// Create an app assertion signed with RS256.
pub fn create_assertion(credential: &AppCredential) -> GitHubResult<SignedAssertion> {
    create_assertion_at(credential, Utc::now())
}

/// Same as [`create_assertion`] with an explicit clock reading.
pub fn create_assertion_at(
    credential: &AppCredential,
    now: DateTime<Utc>,
) -> GitHubResult<SignedAssertion> {
    if credential.app_id.trim().is_empty() {
        return Err(GitHubError::Configuration("app_id is empty".to_string()));
    }
    if credential.private_key.trim().is_empty() {
        return Err(GitHubError::Configuration("private_key is empty".to_string()));
    }

    let claims = AssertionClaims {
        iat: (now - Duration::seconds(ISSUED_AT_SKEW_SECS)).timestamp(),
        exp: (now + Duration::seconds(ASSERTION_LIFETIME_SECS)).timestamp(),
        iss: credential.app_id.clone(),
    };

    let pem = normalize_private_key(&credential.private_key);
    let encoding_key = EncodingKey::from_rsa_pem(pem.as_bytes()).map_err(GitHubError::Signing)?;
    let token = encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
        .map_err(GitHubError::Signing)?;

    Ok(SignedAssertion { token, claims })
}

/// Keys pasted into environment variables often carry literal `\n` escapes
/// instead of line breaks.
fn normalize_private_key(key: &str) -> Cow<'_, str> {
    let key = key.trim();
    if key.contains("\\n") && !key.contains('\n') {
        Cow::Owned(key.replace("\\n", "\n"))
    } else {
        Cow::Borrowed(key)
    }
}

/// Response from GitHub's installation access token endpoint.
#[derive(Clone, Deserialize)]
pub struct InstallationToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl InstallationToken {
    /// Whether the token is expired, or will be within `margin`, at `now`.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at <= now + margin
    }
}

impl fmt::Debug for InstallationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallationToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Exchange an app assertion for an installation-specific access token.
///
/// Anything but `201 Created` is fatal for the caller: a bad assertion or a
/// revoked installation will not succeed on retry.
pub async fn exchange_for_installation_token(
    http: &reqwest::Client,
    endpoints: &Endpoints,
    assertion: &SignedAssertion,
    installation_id: u64,
) -> GitHubResult<InstallationToken> {
    let response = http
        .post(endpoints.access_token(installation_id))
        .bearer_auth(assertion.as_str())
        .header("Accept", "application/vnd.github+json")
        .header("User-Agent", USER_AGENT)
        .header("X-GitHub-Api-Version", API_VERSION)
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;

    if status != StatusCode::CREATED {
        tracing::error!(
            installation_id,
            status = status.as_u16(),
            "Failed to get installation token: {}",
            body
        );
        return Err(GitHubError::AuthExchange {
            status: status.as_u16(),
            body,
        });
    }

    let token: InstallationToken = serde_json::from_str(&body)
        .map_err(|e| GitHubError::Decode(format!("installation token response: {}", e)))?;

    counter!(INSTALLATION_TOKENS_ISSUED_TOTAL).increment(1);
    tracing::info!(
        installation_id,
        expires_at = %token.expires_at,
        "Obtained installation token"
    );

    Ok(token)
}
