//! # OSINT Adapters
//!
//! One [`osint_core::adapter::SourceAdapter`] implementation per platform
//! (§4.7's table), plus the plumbing they share: a rate-limited/retried HTTP
//! call harness, a Fernet-token credential provider, and the Open Graph
//! fallback used when a platform has no structured API.
//!
//! `SourceAdapter` and `Transport` use `async fn` in their trait definitions,
//! which makes them trait-object-incompatible. Every adapter here is
//! therefore generic over its transport and credential provider (`T: Transport,
//! C: CredentialProvider`) rather than boxed; a caller that needs a single
//! registry of heterogeneous adapters builds an enum wrapper over these
//! concrete types instead of reaching for `dyn`.

pub mod credentials;
pub mod fernet;
pub mod harness;
pub mod opengraph;
pub mod platforms;

#[cfg(test)]
mod test_support;

pub use credentials::EnvCredentialProvider;
pub use fernet::{FernetError, FernetKey};
pub use harness::{classify_status, AdapterGuard, StatusOutcome};
