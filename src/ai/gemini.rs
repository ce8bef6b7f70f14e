use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{ReviewError, ReviewGenerator, ReviewRequest};
use crate::config::AiConfig;

/// Reviews pull requests with the Google Gemini `generateContent` API.
pub struct GeminiReviewer {
    api_key: String,
    model: String,
    api_url: String,
    http: reqwest::Client,
}

impl GeminiReviewer {
    pub fn new(
        http: reqwest::Client,
        api_key: impl Into<String>,
        model: impl Into<String>,
        api_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Build a reviewer from configuration; `None` without an API key.
    pub fn from_config(http: reqwest::Client, config: &AiConfig) -> Option<Self> {
        let api_key = config.api_key.as_deref()?;
        Some(Self::new(http, api_key, &config.model, &config.api_url))
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url, self.model
        )
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[async_trait]
impl ReviewGenerator for GeminiReviewer {
    async fn review(&self, request: &ReviewRequest) -> Result<String, ReviewError> {
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.prompt() }]
            }]
        });

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ReviewError::Status { status, body });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ReviewError::EmptyResponse);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::FileDiff;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ReviewRequest {
        ReviewRequest {
            title: "Fix typo".to_string(),
            author: "octocat".to_string(),
            base_branch: "main".to_string(),
            head_branch: "typo".to_string(),
            files: vec![FileDiff {
                filename: "README.md".to_string(),
                status: "modified".to_string(),
                additions: 1,
                deletions: 1,
                patch: Some("-teh\n+the".to_string()),
            }],
        }
    }

    #[tokio::test]
    async fn test_review_joins_candidate_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:generateContent"))
            .and(header("x-goog-api-key", "k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"parts": [{"text": "Looks "}, {"text": "good."}]}
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reviewer = GeminiReviewer::new(reqwest::Client::new(), "k", "gemini-test", server.uri());
        let text = reviewer.review(&request()).await.unwrap();
        assert_eq!(text, "Looks good.");
    }

    #[tokio::test]
    async fn test_review_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
            .mount(&server)
            .await;

        let reviewer = GeminiReviewer::new(reqwest::Client::new(), "k", "m", server.uri());
        let err = reviewer.review(&request()).await.unwrap_err();
        assert!(matches!(err, ReviewError::Status { status: 429, .. }));
    }

    #[tokio::test]
    async fn test_review_without_candidates_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let reviewer = GeminiReviewer::new(reqwest::Client::new(), "k", "m", server.uri());
        let err = reviewer.review(&request()).await.unwrap_err();
        assert!(matches!(err, ReviewError::EmptyResponse));
    }

    #[test]
    fn test_no_reviewer_without_api_key() {
        let config = AiConfig::default();
        assert!(GeminiReviewer::from_config(reqwest::Client::new(), &config).is_none());
    }
}
