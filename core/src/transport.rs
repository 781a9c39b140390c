//! The `Transport` boundary: the only way any adapter talks to the network.
//!
//! Concrete implementations (a `reqwest`-backed client in production, a
//! scripted stub in tests) live outside this crate; `osint-core` only
//! defines the contract adapters are written against.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

use crate::error::CoreError;

/// The outcome of a `Transport` request.
///
/// Non-2xx responses are not transport failures: the adapter inspects
/// `status` and branches (404 -> not-found, >=400 -> source error). Only
/// network- and timeout-level faults surface as a transport error.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, lowercased keys.
    pub headers: HashMap<String, String>,
    /// Raw response body as text.
    pub text: String,
}

impl Response {
    /// `true` when `status` is in `200..300`.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// `true` when the source told us the resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Lazily parse the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Serde`] when the body is not valid JSON.
    pub fn json(&self) -> Result<Value, CoreError> {
        Ok(serde_json::from_str(&self.text)?)
    }
}

/// Async HTTP transport used by every `SourceAdapter`.
///
/// Implementations are expected to be cheap to clone (an `Arc`-wrapped
/// client) and safe to share across adapters and tasks.
pub trait Transport: Send + Sync {
    /// Issue a GET request.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Transient`] on network/timeout failures. Any
    /// HTTP status, including 4xx/5xx, is a successful [`Response`].
    fn get(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> impl std::future::Future<Output = Result<Response, CoreError>> + Send;

    /// Issue a POST request with a raw body.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Transient`] on network/timeout failures.
    fn post(
        &self,
        url: &str,
        body: &[u8],
        headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> impl std::future::Future<Output = Result<Response, CoreError>> + Send;

    /// Issue a POST request with a `application/x-www-form-urlencoded` body.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Transient`] on network/timeout failures.
    fn post_form(
        &self,
        url: &str,
        form: &HashMap<String, String>,
        headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> impl std::future::Future<Output = Result<Response, CoreError>> + Send;
}

/// Default per-request timeout, used when a caller doesn't specify one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Delegating impl so an `Arc<T>` can stand in for `T` wherever a `Transport`
/// is expected. Lets a single client be shared across every adapter in a
/// registry without requiring the concrete transport itself to be cheap to
/// clone.
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn get(&self, url: &str, headers: &HashMap<String, String>, timeout: Duration) -> Result<Response, CoreError> {
        (**self).get(url, headers, timeout).await
    }

    async fn post(&self, url: &str, body: &[u8], headers: &HashMap<String, String>, timeout: Duration) -> Result<Response, CoreError> {
        (**self).post(url, body, headers, timeout).await
    }

    async fn post_form(
        &self,
        url: &str,
        form: &HashMap<String, String>,
        headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<Response, CoreError> {
        (**self).post_form(url, form, headers, timeout).await
    }
}
