//! The production `CredentialProvider`: reads a config map, decrypts
//! `ENC(...)` values, and hands out tokens round-robin.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use osint_core::credentials::CredentialProvider;
use osint_core::error::CoreError;

use crate::fernet::FernetKey;

const ENC_PREFIX: &str = "ENC(";
const ENC_SUFFIX: &str = ")";

/// Reads `{PLATFORM}_TOKENS` / `{PLATFORM}_TOKEN` style entries from a
/// caller-supplied map (typically `std::env::vars().collect()`), decrypting
/// any `ENC(...)` wrapped value against `SOCIAL_MEDIA_FERNET_KEY`.
///
/// The round-robin index is one atomic counter per platform, matching the
/// single-counter-no-cross-platform-sharing rule.
pub struct EnvCredentialProvider {
    config: HashMap<String, String>,
    fernet_key: Option<FernetKey>,
    cursors: Mutex<HashMap<String, AtomicUsize>>,
}

impl EnvCredentialProvider {
    /// Build a provider from a flat key/value config map.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigError`] when `SOCIAL_MEDIA_FERNET_KEY` is
    /// present but not a valid Fernet key.
    pub fn new(config: HashMap<String, String>) -> Result<Self, CoreError> {
        let fernet_key = match config.get("SOCIAL_MEDIA_FERNET_KEY") {
            Some(raw) => Some(
                FernetKey::decode(raw).map_err(|e| CoreError::ConfigError(format!("SOCIAL_MEDIA_FERNET_KEY: {e}")))?,
            ),
            None => None,
        };
        Ok(Self { config, fernet_key, cursors: Mutex::new(HashMap::new()) })
    }

    /// Build a provider seeded directly from the process environment.
    ///
    /// # Errors
    ///
    /// See [`EnvCredentialProvider::new`].
    pub fn from_env() -> Result<Self, CoreError> {
        Self::new(std::env::vars().collect())
    }

    fn raw_values(&self, platform: &str) -> Option<&str> {
        let upper = platform.to_uppercase();
        self.config
            .get(&format!("{upper}_TOKENS"))
            .or_else(|| self.config.get(&format!("{upper}_TOKEN")))
            .map(String::as_str)
    }

    fn decrypt_one(&self, value: &str) -> Result<String, CoreError> {
        let trimmed = value.trim();
        let Some(inner) = trimmed.strip_prefix(ENC_PREFIX).and_then(|s| s.strip_suffix(ENC_SUFFIX)) else {
            return Ok(trimmed.to_string());
        };
        let key = self
            .fernet_key
            .as_ref()
            .ok_or_else(|| CoreError::ConfigError("ENC(...) credential present but SOCIAL_MEDIA_FERNET_KEY is unset".to_string()))?;
        key.decrypt(inner).map_err(|e| CoreError::ConfigError(format!("credential decryption failed: {e}")))
    }
}

impl CredentialProvider for EnvCredentialProvider {
    fn tokens(&self, platform: &str) -> Result<Vec<String>, CoreError> {
        let Some(raw) = self.raw_values(platform) else {
            return Ok(Vec::new());
        };
        raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(|s| self.decrypt_one(s)).collect()
    }

    fn next_token(&self, platform: &str) -> Result<Option<String>, CoreError> {
        let tokens = self.tokens(platform)?;
        if tokens.is_empty() {
            return Ok(None);
        }

        #[allow(clippy::unwrap_used)]
        let mut cursors = self.cursors.lock().unwrap();
        let cursor = cursors.entry(platform.to_lowercase()).or_insert_with(|| AtomicUsize::new(0));
        let index = cursor.fetch_add(1, Ordering::SeqCst) % tokens.len();
        Ok(Some(tokens[index].clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(pairs: &[(&str, &str)]) -> EnvCredentialProvider {
        let config = pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        EnvCredentialProvider::new(config).unwrap()
    }

    #[test]
    fn prefers_plural_tokens_key_over_singular() {
        let p = provider(&[("GITHUB_TOKENS", "a,b"), ("GITHUB_TOKEN", "c")]);
        assert_eq!(p.tokens("github").unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn falls_back_to_singular_token_key() {
        let p = provider(&[("TWITCH_TOKEN", "solo")]);
        assert_eq!(p.tokens("twitch").unwrap(), vec!["solo".to_string()]);
    }

    #[test]
    fn missing_platform_is_no_auth_mode() {
        let p = provider(&[]);
        assert_eq!(p.tokens("reddit").unwrap(), Vec::<String>::new());
        assert_eq!(p.next_token("reddit").unwrap(), None);
    }

    #[test]
    fn next_token_round_robins() {
        let p = provider(&[("GITHUB_TOKENS", "a,b,c")]);
        let seen: Vec<_> = (0..4).map(|_| p.next_token("github").unwrap().unwrap()).collect();
        assert_eq!(seen, vec!["a", "b", "c", "a"]);
    }

    #[test]
    fn enc_without_key_is_a_config_error() {
        let p = provider(&[("GITHUB_TOKENS", "ENC(abc123)")]);
        assert!(matches!(p.tokens("github"), Err(CoreError::ConfigError(_))));
    }
}
