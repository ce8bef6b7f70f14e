//! REST endpoint URLs, templated from the configured API base URL.

#[derive(Debug, Clone)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        let mut base = api_base_url.into();
        let trimmed = base.trim_end_matches('/').len();
        base.truncate(trimmed);
        Self { base }
    }

    /// URL for exchanging an app assertion for an installation access token.
    pub fn access_token(&self, installation_id: u64) -> String {
        format!(
            "{}/app/installations/{}/access_tokens",
            self.base, installation_id
        )
    }

    pub fn repo(&self, owner: &str, repo: &str) -> String {
        format!("{}/repos/{}/{}", self.base, owner, repo)
    }

    pub fn pulls(&self, owner: &str, repo: &str) -> String {
        format!("{}/pulls", self.repo(owner, repo))
    }

    pub fn pull(&self, owner: &str, repo: &str, number: u64) -> String {
        format!("{}/{}", self.pulls(owner, repo), number)
    }

    pub fn pull_files(&self, owner: &str, repo: &str, number: u64) -> String {
        format!("{}/files", self.pull(owner, repo, number))
    }

    /// PR conversation comments live under the issues API.
    pub fn pull_comments(&self, owner: &str, repo: &str, number: u64) -> String {
        format!("{}/issues/{}/comments", self.repo(owner, repo), number)
    }

    pub fn pull_reviews(&self, owner: &str, repo: &str, number: u64) -> String {
        format!("{}/reviews", self.pull(owner, repo, number))
    }

    pub fn commits(&self, owner: &str, repo: &str) -> String {
        format!("{}/commits", self.repo(owner, repo))
    }

    pub fn commit(&self, owner: &str, repo: &str, sha: &str) -> String {
        format!("{}/{}", self.commits(owner, repo), sha)
    }

    pub fn statuses(&self, owner: &str, repo: &str, sha: &str) -> String {
        format!("{}/statuses/{}", self.repo(owner, repo), sha)
    }

    pub fn contents(&self, owner: &str, repo: &str, path: &str) -> String {
        let base = format!("{}/contents", self.repo(owner, repo));
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            base
        } else {
            format!("{}/{}", base, path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates() {
        let e = Endpoints::new("https://api.github.com/");
        assert_eq!(
            e.access_token(42),
            "https://api.github.com/app/installations/42/access_tokens"
        );
        assert_eq!(
            e.pull_files("octo", "hello", 7),
            "https://api.github.com/repos/octo/hello/pulls/7/files"
        );
        assert_eq!(
            e.pull_comments("octo", "hello", 7),
            "https://api.github.com/repos/octo/hello/issues/7/comments"
        );
        assert_eq!(
            e.statuses("octo", "hello", "abc123"),
            "https://api.github.com/repos/octo/hello/statuses/abc123"
        );
        assert_eq!(
            e.commit("octo", "hello", "abc123"),
            "https://api.github.com/repos/octo/hello/commits/abc123"
        );
    }

    #[test]
    fn test_contents_with_and_without_path() {
        let e = Endpoints::new("http://localhost:9999");
        assert_eq!(
            e.contents("o", "r", ""),
            "http://localhost:9999/repos/o/r/contents"
        );
        assert_eq!(
            e.contents("o", "r", "/src/lib.rs"),
            "http://localhost:9999/repos/o/r/contents/src/lib.rs"
        );
    }
}
