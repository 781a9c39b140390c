//! Discord: `users/{id}` lookup, gated on the identifier being snowflake-shaped
//! and a bot token being configured. No public search exists otherwise.

use std::collections::HashMap;

use osint_core::adapter::{canonical_profile_url, is_discord_id, SourceAdapter};
use osint_core::credentials::CredentialProvider;
use osint_core::error::CoreError;
use osint_core::model::{NormalizedPost, NormalizedProfile, Platform};
use osint_core::rate_limit::RateLimitPolicy;
use osint_core::transport::Transport;

use crate::harness::{classify_status, str_field, AdapterGuard, StatusOutcome};

const PLATFORM: &str = "discord";
const API_BASE: &str = "https://discord.com/api/v10";

/// Discord adapter. There is no username search: a lookup only succeeds
/// when `username` is already a 16-20 digit snowflake id and a bot token is
/// configured. Never produces posts.
pub struct DiscordAdapter<T, C> {
    transport: T,
    credentials: C,
    guard: AdapterGuard,
}

impl<T: Transport, C: CredentialProvider> DiscordAdapter<T, C> {
    #[must_use]
    pub fn new(transport: T, credentials: C) -> Self {
        Self { transport, credentials, guard: AdapterGuard::new(RateLimitPolicy::new(50, 1.0)) }
    }
}

impl<T: Transport + Send + Sync, C: CredentialProvider + Send + Sync> SourceAdapter for DiscordAdapter<T, C> {
    fn platform(&self) -> Platform {
        Platform::new(PLATFORM)
    }

    fn profile_url(&self, username: &str) -> String {
        canonical_profile_url(&self.platform(), username)
    }

    async fn fetch_profile(&self, username: &str) -> Result<Option<NormalizedProfile>, CoreError> {
        if !is_discord_id(username) {
            return Ok(None);
        }
        let Some(token) = self.credentials.next_token(PLATFORM)? else {
            return Ok(None);
        };

        let mut headers = HashMap::new();
        headers.insert("authorization".to_string(), format!("Bot {token}"));

        let url = format!("{API_BASE}/users/{username}");
        let resp = self.guard.get(&self.transport, &url, &headers).await?;
        match classify_status(&resp) {
            StatusOutcome::NotFound => return Ok(None),
            StatusOutcome::Error => return Err(CoreError::source(PLATFORM, format!("http {}", resp.status))),
            StatusOutcome::Proceed => {},
        }

        let body = resp.json()?;
        let mut profile = NormalizedProfile::new(self.platform(), username, self.profile_url(username));
        profile.display_name = str_field(&body, "global_name").or_else(|| str_field(&body, "username")).map(str::to_string);
        profile.profile_image_url = str_field(&body, "avatar").map(|hash| format!("https://cdn.discordapp.com/avatars/{username}/{hash}.png"));
        profile.raw = body;

        Ok(Some(profile))
    }

    async fn fetch_posts(&self, _username: &str, _max_items: usize) -> Result<Vec<NormalizedPost>, CoreError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{NoopCredentials, NoopTransport};

    #[test]
    fn profile_url_requires_id_shape() {
        let adapter = DiscordAdapter::new(NoopTransport, NoopCredentials);
        assert_eq!(adapter.profile_url("123456789012345678"), "https://discord.com/users/123456789012345678");
        assert_eq!(adapter.profile_url("not_an_id"), "https://discord.com/");
    }

    #[tokio::test]
    async fn non_id_shaped_username_is_rejected_before_any_request() {
        let adapter = DiscordAdapter::new(NoopTransport, NoopCredentials);
        assert!(adapter.fetch_profile("definitely_not_an_id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn no_bot_token_is_no_auth_mode() {
        let adapter = DiscordAdapter::new(NoopTransport, NoopCredentials);
        assert!(adapter.fetch_profile("123456789012345678").await.unwrap().is_none());
    }
}
