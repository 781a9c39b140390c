//! Minimal stand-ins for [`Transport`] and [`CredentialProvider`], shared by
//! every platform adapter's unit tests. None of these are exercised for real
//! network behavior here; that's `osint-testing`'s job for integration tests.

#![cfg(test)]

use std::collections::HashMap;
use std::time::Duration;

use osint_core::credentials::CredentialProvider;
use osint_core::error::CoreError;
use osint_core::transport::{Response, Transport};

/// A transport that panics if called. Useful for adapter tests that only
/// exercise pure helpers (`profile_url`, `platform`) and never reach the
/// network branch.
pub struct NoopTransport;

impl Transport for NoopTransport {
    async fn get(&self, _url: &str, _headers: &HashMap<String, String>, _timeout: Duration) -> Result<Response, CoreError> {
        unreachable!("NoopTransport is not wired to answer requests")
    }

    async fn post(&self, _url: &str, _body: &[u8], _headers: &HashMap<String, String>, _timeout: Duration) -> Result<Response, CoreError> {
        unreachable!("NoopTransport is not wired to answer requests")
    }

    async fn post_form(
        &self,
        _url: &str,
        _form: &HashMap<String, String>,
        _headers: &HashMap<String, String>,
        _timeout: Duration,
    ) -> Result<Response, CoreError> {
        unreachable!("NoopTransport is not wired to answer requests")
    }
}

/// A credential provider with nothing configured: every platform is in "no-auth mode".
pub struct NoopCredentials;

impl CredentialProvider for NoopCredentials {
    fn tokens(&self, _platform: &str) -> Result<Vec<String>, CoreError> {
        Ok(Vec::new())
    }

    fn next_token(&self, _platform: &str) -> Result<Option<String>, CoreError> {
        Ok(None)
    }
}

/// A transport that always returns a fixed canned response, for adapters
/// whose tests need to exercise the parsing branch.
pub struct FixedTransport {
    pub status: u16,
    pub body: String,
}

impl Transport for FixedTransport {
    async fn get(&self, _url: &str, _headers: &HashMap<String, String>, _timeout: Duration) -> Result<Response, CoreError> {
        Ok(Response { status: self.status, headers: HashMap::new(), text: self.body.clone() })
    }

    async fn post(&self, _url: &str, _body: &[u8], _headers: &HashMap<String, String>, _timeout: Duration) -> Result<Response, CoreError> {
        Ok(Response { status: self.status, headers: HashMap::new(), text: self.body.clone() })
    }

    async fn post_form(
        &self,
        _url: &str,
        _form: &HashMap<String, String>,
        _headers: &HashMap<String, String>,
        _timeout: Duration,
    ) -> Result<Response, CoreError> {
        Ok(Response { status: self.status, headers: HashMap::new(), text: self.body.clone() })
    }
}

/// A credential provider with a single fixed token for every platform.
pub struct FixedCredentials(pub &'static str);

impl CredentialProvider for FixedCredentials {
    fn tokens(&self, _platform: &str) -> Result<Vec<String>, CoreError> {
        Ok(vec![self.0.to_string()])
    }

    fn next_token(&self, _platform: &str) -> Result<Option<String>, CoreError> {
        Ok(Some(self.0.to_string()))
    }
}
