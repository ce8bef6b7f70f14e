use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::path::Path;
use tracing::{error, info, warn};

use crate::github::AppCredential;

/// Environment variable holding the whole configuration as a JSON object.
pub const CONFIG_ENV_VAR: &str = "GITHUB_APP_CONFIG";

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// GitHub App ID. Accepts a JSON number as well as a string.
    #[serde(default, deserialize_with = "string_or_number")]
    pub app_id: String,
    /// PEM-encoded RSA private key of the app
    #[serde(default)]
    pub private_key: String,
    /// Secret for verifying webhook signatures (HMAC-SHA256)
    #[serde(default)]
    pub webhook_secret: Option<String>,
    #[serde(default = "default_true")]
    pub check_signature: bool,
    #[serde(default = "default_true")]
    pub auto_pr_review: bool,
    #[serde(default = "default_true")]
    pub edit_pr_desc: bool,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub ai: AiConfig,
}

fn default_true() -> bool {
    true
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Transport settings shared by every outbound call.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Total request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Connect timeout in seconds (default: 10)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

/// Generative AI reviewer settings. No API key means no AI review.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_ai_model")]
    pub model: String,
    #[serde(default = "default_ai_api_url")]
    pub api_url: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_ai_model(),
            api_url: default_ai_api_url(),
        }
    }
}

fn default_ai_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_ai_api_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            private_key: String::new(),
            webhook_secret: None,
            check_signature: true,
            auto_pr_review: true,
            edit_pr_desc: true,
            api_base_url: default_api_base_url(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            http: HttpConfig::default(),
            ai: AiConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment and `path`.
    pub fn load(path: &Path) -> Result<Self> {
        Self::resolve(path, |key| std::env::var(key).ok())
    }

    /// Resolve configuration in priority order: the `GITHUB_APP_CONFIG` JSON
    /// blob, then the config file, then individual variables, then defaults.
    /// The first source that yields a configuration is used as a whole.
    pub fn resolve<F>(path: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(blob) = lookup(CONFIG_ENV_VAR) {
            match serde_json::from_str::<Config>(&blob) {
                Ok(config) => {
                    info!("Loading configuration from {}", CONFIG_ENV_VAR);
                    return Ok(config.normalized());
                }
                Err(e) => error!(
                    "Failed to parse {} environment variable as JSON: {}",
                    CONFIG_ENV_VAR, e
                ),
            }
        }

        if path.exists() {
            match Self::from_file(path) {
                Ok(config) => {
                    info!("Loading configuration from {}", path.display());
                    return Ok(config.normalized());
                }
                Err(e) => error!("Failed to load config file: {:#}", e),
            }
        }

        Ok(Self::from_lookup(&lookup)?.normalized())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            toml::from_str(&content).context("Failed to parse TOML configuration file")
        } else {
            serde_json::from_str(&content).context("Failed to parse JSON configuration file")
        }
    }

    fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str| {
            lookup(key)
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(true)
        };
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT value: {}", v))?,
            None => defaults.server.port,
        };
        let timeout_secs = match lookup("HTTP_TIMEOUT_SECS") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("Invalid HTTP_TIMEOUT_SECS value: {}", v))?,
            None => defaults.http.timeout_secs,
        };

        Ok(Self {
            app_id: lookup("GITHUB_APP_ID").unwrap_or_default(),
            private_key: lookup("GITHUB_PRIVATE_KEY").unwrap_or_default(),
            webhook_secret: lookup("GITHUB_WEBHOOK_SECRET"),
            check_signature: flag("CHECK_SIGNATURE"),
            auto_pr_review: flag("AUTO_PR_REVIEW"),
            edit_pr_desc: flag("EDIT_PR_DESC"),
            api_base_url: lookup("GITHUB_API_URL").unwrap_or(defaults.api_base_url),
            server: ServerConfig {
                host: lookup("HOST").unwrap_or(defaults.server.host),
                port,
            },
            logging: LoggingConfig {
                level: lookup("LOG_LEVEL").unwrap_or(defaults.logging.level),
            },
            http: HttpConfig {
                timeout_secs,
                ..defaults.http
            },
            ai: AiConfig {
                api_key: lookup("GEMINI_API_KEY"),
                model: lookup("GEMINI_MODEL").unwrap_or(defaults.ai.model),
                api_url: lookup("GEMINI_API_URL").unwrap_or(defaults.ai.api_url),
            },
        })
    }

    fn normalized(mut self) -> Self {
        if self.webhook_secret.as_deref().is_some_and(str::is_empty) {
            self.webhook_secret = None;
        }
        if self.ai.api_key.as_deref().is_some_and(str::is_empty) {
            self.ai.api_key = None;
        }
        let trimmed = self.api_base_url.trim_end_matches('/').len();
        self.api_base_url.truncate(trimmed);
        self
    }

    /// Emit warnings about configuration that silently disables behavior.
    pub fn warn_on_gaps(&self) {
        if self.check_signature && self.webhook_secret.is_none() {
            warn!("webhook_secret not set -- webhook signature verification disabled");
        }
        if !self.check_signature {
            warn!("check_signature is false -- webhook signatures are not verified");
        }
        if self.app_id.is_empty() || self.private_key.is_empty() {
            warn!("GitHub App credentials missing -- pull request processing will fail");
        }
        if self.ai.api_key.is_none() {
            info!("No AI API key configured, comments will not include an AI review");
        }
    }

    pub fn app_credential(&self) -> AppCredential {
        AppCredential::new(self.app_id.clone(), self.private_key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn missing_path() -> &'static Path {
        Path::new("/nonexistent/prpilot/config.json")
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = Config::resolve(missing_path(), lookup_from(&[])).unwrap();
        assert!(config.check_signature);
        assert!(config.auto_pr_review);
        assert!(config.edit_pr_desc);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert!(config.webhook_secret.is_none());
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn test_individual_env_vars() {
        let lookup = lookup_from(&[
            ("GITHUB_APP_ID", "1234"),
            ("GITHUB_PRIVATE_KEY", "pem"),
            ("GITHUB_WEBHOOK_SECRET", "s3cr3t"),
            ("CHECK_SIGNATURE", "FALSE"),
            ("AUTO_PR_REVIEW", "true"),
            ("EDIT_PR_DESC", "no"),
            ("GITHUB_API_URL", "https://ghe.example.com/api/v3/"),
            ("PORT", "9000"),
        ]);
        let config = Config::resolve(missing_path(), lookup).unwrap();
        assert_eq!(config.app_id, "1234");
        assert_eq!(config.webhook_secret.as_deref(), Some("s3cr3t"));
        assert!(!config.check_signature);
        assert!(config.auto_pr_review);
        assert!(!config.edit_pr_desc);
        assert_eq!(config.api_base_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let result = Config::resolve(missing_path(), lookup_from(&[("PORT", "http")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_json_blob_wins_over_env_vars() {
        let lookup = lookup_from(&[
            (CONFIG_ENV_VAR, r#"{"app_id": 42, "edit_pr_desc": false}"#),
            ("GITHUB_APP_ID", "1234"),
        ]);
        let config = Config::resolve(missing_path(), lookup).unwrap();
        assert_eq!(config.app_id, "42");
        assert!(!config.edit_pr_desc);
        assert!(config.auto_pr_review);
    }

    #[test]
    fn test_malformed_json_blob_falls_through() {
        let lookup = lookup_from(&[(CONFIG_ENV_VAR, "{not json"), ("GITHUB_APP_ID", "7")]);
        let config = Config::resolve(missing_path(), lookup).unwrap();
        assert_eq!(config.app_id, "7");
    }

    #[test]
    fn test_json_file_wins_over_env_vars() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"app_id": "99", "webhook_secret": "", "server": {{"port": 8123}}}}"#
        )
        .unwrap();

        let lookup = lookup_from(&[("GITHUB_APP_ID", "1234")]);
        let config = Config::resolve(file.path(), lookup).unwrap();
        assert_eq!(config.app_id, "99");
        assert!(config.webhook_secret.is_none());
        assert_eq!(config.server.port, 8123);
    }

    #[test]
    fn test_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "app_id = \"5\"\ncheck_signature = false\n\n[ai]\napi_key = \"k\"\nmodel = \"gemini-pro\""
        )
        .unwrap();

        let config = Config::resolve(file.path(), lookup_from(&[])).unwrap();
        assert_eq!(config.app_id, "5");
        assert!(!config.check_signature);
        assert_eq!(config.ai.api_key.as_deref(), Some("k"));
        assert_eq!(config.ai.model, "gemini-pro");
    }
}
