//! GitHub: `/users/<u>` for profiles, `/users/<u>/events/public` for posts,
//! plus an optional best-effort commit-email miner.

use std::collections::HashMap;

use osint_core::adapter::{canonical_profile_url, SourceAdapter};
use osint_core::credentials::CredentialProvider;
use osint_core::error::CoreError;
use osint_core::model::{NormalizedPost, NormalizedProfile, Platform};
use osint_core::rate_limit::RateLimitPolicy;
use osint_core::transport::Transport;
use serde_json::Value;

use crate::harness::{classify_status, parse_timestamp, str_field, u64_field, AdapterGuard, StatusOutcome};

const PLATFORM: &str = "github";
const BASE: &str = "https://api.github.com";

/// Maximum repos/commits visited by [`GitHubAdapter::mine_commit_emails`].
/// Kept small: this is a courtesy best-effort scan, not an exhaustive one.
const MAX_REPOS: usize = 5;
const MAX_COMMITS_PER_REPO: usize = 20;

/// GitHub adapter. Unauthenticated calls work against the public API at a
/// much lower rate limit; a configured token raises it substantially.
pub struct GitHubAdapter<T, C> {
    transport: T,
    credentials: C,
    guard: AdapterGuard,
}

impl<T: Transport, C: CredentialProvider> GitHubAdapter<T, C> {
    #[must_use]
    pub fn new(transport: T, credentials: C) -> Self {
        Self { transport, credentials, guard: AdapterGuard::new(RateLimitPolicy::new(60, 3600.0)) }
    }

    fn headers(&self) -> Result<HashMap<String, String>, CoreError> {
        let mut headers = HashMap::new();
        headers.insert("user-agent".to_string(), "osint-aggregator/1.0".to_string());
        headers.insert("accept".to_string(), "application/vnd.github+json".to_string());
        if let Some(token) = self.credentials.next_token(PLATFORM)? {
            headers.insert("authorization".to_string(), format!("Bearer {token}"));
        }
        Ok(headers)
    }

    /// Iterate up to [`MAX_REPOS`] public repos and [`MAX_COMMITS_PER_REPO`]
    /// commits each, collecting distinct non-`noreply` author emails.
    ///
    /// This is explicitly optional per the platform table: orchestration
    /// code may call it to enrich a profile, but it is never part of the
    /// required `fetch_profile`/`fetch_posts` pair.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Transient`] if the repo list itself can't be fetched.
    /// Failures mining an individual repo's commits are swallowed.
    pub async fn mine_commit_emails(&self, username: &str) -> Result<Vec<String>, CoreError> {
        let headers = self.headers()?;
        let url = format!("{BASE}/users/{username}/repos?per_page={MAX_REPOS}&sort=updated");
        let resp = self.guard.get(&self.transport, &url, &headers).await?;
        if classify_status(&resp) != StatusOutcome::Proceed {
            return Ok(Vec::new());
        }
        let Ok(repos) = resp.json() else { return Ok(Vec::new()) };
        let Some(repos) = repos.as_array() else { return Ok(Vec::new()) };

        let mut emails = Vec::new();
        for repo in repos.iter().take(MAX_REPOS) {
            let Some(name) = str_field(repo, "name") else { continue };
            let commits_url = format!("{BASE}/repos/{username}/{name}/commits?per_page={MAX_COMMITS_PER_REPO}");
            let Ok(commits_resp) = self.guard.get(&self.transport, &commits_url, &headers).await else { continue };
            if classify_status(&commits_resp) != StatusOutcome::Proceed {
                continue;
            }
            let Ok(commits) = commits_resp.json() else { continue };
            let Some(commits) = commits.as_array() else { continue };
            for commit in commits.iter().take(MAX_COMMITS_PER_REPO) {
                if let Some(email) = commit
                    .get("commit")
                    .and_then(|c| c.get("author"))
                    .and_then(|a| str_field(a, "email"))
                    .filter(|e| !e.ends_with("@users.noreply.github.com"))
                {
                    emails.push(email.to_lowercase());
                }
            }
        }

        emails.sort();
        emails.dedup();
        Ok(emails)
    }
}

impl<T: Transport + Send + Sync, C: CredentialProvider + Send + Sync> SourceAdapter for GitHubAdapter<T, C> {
    fn platform(&self) -> Platform {
        Platform::new(PLATFORM)
    }

    fn profile_url(&self, username: &str) -> String {
        canonical_profile_url(&self.platform(), username)
    }

    async fn fetch_profile(&self, username: &str) -> Result<Option<NormalizedProfile>, CoreError> {
        let headers = self.headers()?;
        let url = format!("{BASE}/users/{username}");
        let resp = self.guard.get(&self.transport, &url, &headers).await?;
        match classify_status(&resp) {
            StatusOutcome::NotFound => return Ok(None),
            StatusOutcome::Error => return Err(CoreError::source(PLATFORM, format!("http {}", resp.status))),
            StatusOutcome::Proceed => {},
        }

        let body = resp.json()?;
        let mut profile = NormalizedProfile::new(self.platform(), username, self.profile_url(username));
        profile.display_name = str_field(&body, "name").map(str::to_string);
        profile.bio = str_field(&body, "bio").map(str::to_string);
        profile.location = str_field(&body, "location").map(str::to_string);
        profile.follower_count = u64_field(&body, "followers");
        profile.following_count = u64_field(&body, "following");
        profile.post_count = u64_field(&body, "public_repos");
        profile.profile_image_url = str_field(&body, "avatar_url").map(str::to_string);
        profile.created_at = str_field(&body, "created_at").and_then(parse_timestamp);
        profile.raw = body;

        Ok(Some(profile))
    }

    async fn fetch_posts(&self, username: &str, max_items: usize) -> Result<Vec<NormalizedPost>, CoreError> {
        let headers = self.headers()?;
        let url = format!("{BASE}/users/{username}/events/public?per_page={}", max_items.min(100));
        let resp = self.guard.get(&self.transport, &url, &headers).await?;
        match classify_status(&resp) {
            StatusOutcome::NotFound | StatusOutcome::Error => return Ok(Vec::new()),
            StatusOutcome::Proceed => {},
        }

        let body = resp.json()?;
        let Some(events) = body.as_array() else { return Ok(Vec::new()) };

        let posts = events.iter().take(max_items).map(|event| to_post(username, event)).collect();
        Ok(posts)
    }
}

fn to_post(username: &str, event: &Value) -> NormalizedPost {
    let mut post = NormalizedPost::new(PLATFORM, username);
    post.post_id = str_field(event, "id").map(str::to_string);
    post.title = str_field(event, "type").map(str::to_string);
    post.created_at = str_field(event, "created_at").and_then(parse_timestamp);
    if let Some(repo_name) = event.get("repo").and_then(|r| str_field(r, "name")) {
        post.url = Some(format!("https://github.com/{repo_name}"));
        post.content = Some(format!("{} on {repo_name}", post.title.clone().unwrap_or_default()));
    }
    post.raw = event.clone();
    post
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FixedTransport, NoopCredentials, NoopTransport};

    #[test]
    fn profile_url_is_canonical() {
        let adapter = GitHubAdapter::new(NoopTransport, NoopCredentials);
        assert_eq!(adapter.profile_url("octocat"), "https://github.com/octocat");
    }

    #[tokio::test]
    async fn parses_profile_fields() {
        let body = serde_json::json!({"name": "Octo Cat", "bio": "I build things", "followers": 10, "public_repos": 3}).to_string();
        let adapter = GitHubAdapter::new(FixedTransport { status: 200, body }, NoopCredentials);
        let profile = adapter.fetch_profile("octocat").await.unwrap().unwrap();
        assert_eq!(profile.display_name.as_deref(), Some("Octo Cat"));
        assert_eq!(profile.follower_count, Some(10));
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let adapter = GitHubAdapter::new(FixedTransport { status: 404, body: String::new() }, NoopCredentials);
        assert!(adapter.fetch_profile("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn commit_email_mining_ignores_noreply_addresses() {
        let adapter = GitHubAdapter::new(FixedTransport { status: 200, body: "[]".to_string() }, NoopCredentials);
        assert!(adapter.mine_commit_emails("octocat").await.unwrap().is_empty());
    }
}
