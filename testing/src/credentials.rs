//! A [`CredentialProvider`] double backed by a fixed, in-memory token table.

use std::collections::HashMap;
use std::sync::Mutex;

use osint_core::credentials::CredentialProvider;
use osint_core::error::CoreError;

/// Round-robins a fixed list of tokens per platform. Platforms with no
/// entry are in no-auth mode, matching the production credential provider's
/// behavior when a platform has nothing configured.
pub struct MapCredentials {
    tokens: HashMap<String, Vec<String>>,
    cursors: Mutex<HashMap<String, usize>>,
}

impl MapCredentials {
    /// Build from `(platform, tokens)` pairs.
    #[must_use]
    pub fn new(tokens: HashMap<String, Vec<String>>) -> Self {
        Self { tokens, cursors: Mutex::new(HashMap::new()) }
    }

    /// A provider with a single token for `platform`.
    #[must_use]
    pub fn single(platform: impl Into<String>, token: impl Into<String>) -> Self {
        let mut tokens = HashMap::new();
        tokens.insert(platform.into(), vec![token.into()]);
        Self::new(tokens)
    }
}

impl CredentialProvider for MapCredentials {
    fn tokens(&self, platform: &str) -> Result<Vec<String>, CoreError> {
        Ok(self.tokens.get(platform).cloned().unwrap_or_default())
    }

    fn next_token(&self, platform: &str) -> Result<Option<String>, CoreError> {
        let Some(list) = self.tokens.get(platform) else { return Ok(None) };
        if list.is_empty() {
            return Ok(None);
        }
        let mut cursors = self.cursors.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let cursor = cursors.entry(platform.to_string()).or_insert(0);
        let token = list[*cursor % list.len()].clone();
        *cursor += 1;
        Ok(Some(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotates_round_robin_per_platform() {
        let creds = MapCredentials::new(HashMap::from([("github".to_string(), vec!["a".to_string(), "b".to_string()])]));
        assert_eq!(creds.next_token("github").unwrap(), Some("a".to_string()));
        assert_eq!(creds.next_token("github").unwrap(), Some("b".to_string()));
        assert_eq!(creds.next_token("github").unwrap(), Some("a".to_string()));
    }

    #[test]
    fn unconfigured_platform_is_no_auth() {
        let creds = MapCredentials::new(HashMap::new());
        assert_eq!(creds.next_token("reddit").unwrap(), None);
    }
}
