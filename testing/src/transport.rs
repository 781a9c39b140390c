//! A scripted [`Transport`] double: requests are matched against a table of
//! canned responses keyed by URL substring, checked in registration order.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use osint_core::error::CoreError;
use osint_core::transport::{Response, Transport};

/// One scripted rule: the first call whose URL contains `matches` gets `response`.
struct Rule {
    matches: String,
    response: Response,
}

/// Scripted HTTP transport. Every call (`get`/`post`/`post_form`) is routed
/// through the same rule table and recorded for later inspection.
pub struct ScriptedTransport {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    /// An empty transport; every call fails with [`CoreError::Transient`]
    /// until a rule is registered.
    #[must_use]
    pub fn new() -> Self {
        Self { rules: Mutex::new(Vec::new()), calls: Mutex::new(Vec::new()) }
    }

    /// Register a canned `status`/`body` response for any URL containing `matches`.
    #[must_use]
    pub fn with_response(self, matches: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        self.rules.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(Rule {
            matches: matches.into(),
            response: Response { status, headers: HashMap::new(), text: body.into() },
        });
        self
    }

    /// URLs requested so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    fn resolve(&self, url: &str) -> Result<Response, CoreError> {
        self.calls.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(url.to_string());
        self.rules
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .find(|rule| url.contains(&rule.matches))
            .map(|rule| rule.response.clone())
            .ok_or_else(|| CoreError::Transient(format!("no scripted response for {url}")))
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ScriptedTransport {
    async fn get(&self, url: &str, _headers: &HashMap<String, String>, _timeout: Duration) -> Result<Response, CoreError> {
        self.resolve(url)
    }

    async fn post(&self, url: &str, _body: &[u8], _headers: &HashMap<String, String>, _timeout: Duration) -> Result<Response, CoreError> {
        self.resolve(url)
    }

    async fn post_form(
        &self,
        url: &str,
        _form: &HashMap<String, String>,
        _headers: &HashMap<String, String>,
        _timeout: Duration,
    ) -> Result<Response, CoreError> {
        self.resolve(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_matching_rule_wins() {
        let transport = ScriptedTransport::new().with_response("/users/carol", 200, r#"{"id":1}"#).with_response("/users/", 404, "");
        let resp = transport.get("https://example.com/users/carol", &HashMap::new(), Duration::from_secs(1)).await.unwrap();
        assert_eq!(resp.status, 200);
    }

    #[tokio::test]
    async fn unmatched_url_is_a_transient_error() {
        let transport = ScriptedTransport::new();
        let err = transport.get("https://example.com/nope", &HashMap::new(), Duration::from_secs(1)).await;
        assert!(matches!(err, Err(CoreError::Transient(_))));
    }
}
