//! `reqwest`-backed [`Transport`] implementation.

use std::collections::HashMap;
use std::time::Duration;

use osint_core::error::CoreError;
use osint_core::transport::{Response, Transport};
use reqwest::Client;

/// Production transport backed by a shared `reqwest::Client`.
///
/// Cheap to clone: `reqwest::Client` is itself `Arc`-backed internally.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport around a default-configured client.
    ///
    /// # Panics
    ///
    /// Panics if the underlying TLS backend fails to initialize, which only
    /// happens in a misconfigured environment (missing root certificates).
    #[must_use]
    pub fn new() -> Self {
        #[allow(clippy::unwrap_used)]
        let client = Client::builder().build().unwrap();
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn header_map(headers: &HashMap<String, String>) -> reqwest::header::HeaderMap {
    let mut map = reqwest::header::HeaderMap::new();
    for (key, value) in headers {
        if let (Ok(name), Ok(val)) = (
            reqwest::header::HeaderName::from_bytes(key.as_bytes()),
            reqwest::header::HeaderValue::from_str(value),
        ) {
            map.insert(name, val);
        }
    }
    map
}

async fn to_response(resp: reqwest::Response) -> Result<Response, CoreError> {
    let status = resp.status().as_u16();
    let headers = resp
        .headers()
        .iter()
        .map(|(k, v)| (k.as_str().to_lowercase(), v.to_str().unwrap_or_default().to_string()))
        .collect();
    let text = resp.text().await.map_err(|e| CoreError::Transient(e.to_string()))?;
    Ok(Response { status, headers, text })
}

impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, headers: &HashMap<String, String>, timeout: Duration) -> Result<Response, CoreError> {
        let resp = self
            .client
            .get(url)
            .headers(header_map(headers))
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| CoreError::Transient(e.to_string()))?;
        to_response(resp).await
    }

    async fn post(
        &self,
        url: &str,
        body: &[u8],
        headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<Response, CoreError> {
        let resp = self
            .client
            .post(url)
            .headers(header_map(headers))
            .timeout(timeout)
            .body(body.to_vec())
            .send()
            .await
            .map_err(|e| CoreError::Transient(e.to_string()))?;
        to_response(resp).await
    }

    async fn post_form(
        &self,
        url: &str,
        form: &HashMap<String, String>,
        headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<Response, CoreError> {
        let resp = self
            .client
            .post(url)
            .headers(header_map(headers))
            .timeout(timeout)
            .form(form)
            .send()
            .await
            .map_err(|e| CoreError::Transient(e.to_string()))?;
        to_response(resp).await
    }
}
