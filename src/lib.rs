pub mod ai;
pub mod api;
pub mod config;
pub mod error;
pub mod github;
pub mod pr;
pub mod tasks;

use config::{Config, HttpConfig};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;

use crate::ai::ReviewGenerator;
use crate::github::{Endpoints, GitHubClient};

pub struct AppState {
    pub config: Arc<Config>,
    pub http: reqwest::Client,
    pub reviewer: Option<Arc<dyn ReviewGenerator>>,
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Config, http: reqwest::Client) -> Self {
        Self {
            config: Arc::new(config),
            http,
            reviewer: None,
            metrics_handle: None,
        }
    }

    /// Set the Prometheus metrics handle
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Attach an AI reviewer; without one PR comments have no AI section.
    pub fn with_reviewer(mut self, reviewer: Arc<dyn ReviewGenerator>) -> Self {
        self.reviewer = Some(reviewer);
        self
    }

    /// A fresh client for one unit of work. Tokens are never shared
    /// between clients.
    pub fn github_client(&self, installation_id: Option<u64>) -> GitHubClient {
        GitHubClient::new(
            self.http.clone(),
            Endpoints::new(&self.config.api_base_url),
            self.config.app_credential(),
            installation_id,
        )
    }
}

/// Build the HTTP client shared by all outbound calls.
pub fn build_http_client(config: &HttpConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(github::USER_AGENT)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .build()
}
