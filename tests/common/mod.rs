#![allow(dead_code)]

use prpilot::config::Config;
use prpilot::AppState;
use serde_json::{json, Value};

pub const APP_ID: &str = "12345";
pub const INSTALLATION_ID: u64 = 42;
pub const PRIVATE_KEY: &str = include_str!("../fixtures/app_key.pem");
pub const PUBLIC_KEY: &str = include_str!("../fixtures/app_key.pub.pem");

/// Configuration pointing every GitHub call at `api_base_url`.
pub fn config(api_base_url: &str) -> Config {
    Config {
        app_id: APP_ID.to_string(),
        private_key: PRIVATE_KEY.to_string(),
        api_base_url: api_base_url.to_string(),
        ..Config::default()
    }
}

pub fn state(config: Config) -> AppState {
    AppState::new(config, reqwest::Client::new())
}

pub fn token_response(expires_at: &str) -> Value {
    json!({ "token": "ghs_installation", "expires_at": expires_at })
}

pub fn pull_request_payload(action: &str, body: Option<&str>) -> Value {
    json!({
        "action": action,
        "number": 7,
        "pull_request": {
            "number": 7,
            "title": "Add greeting endpoint",
            "body": body,
            "user": {"login": "octocat"},
            "head": {"sha": "abc123", "ref": "greeting"},
            "base": {"sha": "def456", "ref": "main"},
            "html_url": "https://github.com/octo/hello/pull/7"
        },
        "repository": {"name": "hello", "full_name": "octo/hello", "owner": {"login": "octo"}},
        "installation": {"id": INSTALLATION_ID}
    })
}

pub fn pull_request_files() -> Value {
    json!([
        {
            "filename": "src/greeting.rs",
            "status": "added",
            "additions": 40,
            "deletions": 0,
            "changes": 40,
            "patch": "@@ -0,0 +1,40 @@\n+pub fn greet() {}"
        },
        {
            "filename": "tests/greeting_test.rs",
            "status": "added",
            "additions": 12,
            "deletions": 0,
            "changes": 12
        }
    ])
}
