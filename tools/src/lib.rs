//! # OSINT Tools
//!
//! Transport, rate limiting, retry, and caching infrastructure that every
//! `SourceAdapter` is built on top of.
//!
//! - `transport`: production `Transport` implementation over `reqwest`.
//! - `rate_limiter`: per-platform sliding-window admission gate.
//! - `retry`: bounded exponential backoff with jitter.
//! - `cache`: concurrency-safe TTL cache shared in front of the fetchers.

pub mod cache;
pub mod rate_limiter;
pub mod retry;
pub mod transport;

pub use cache::TtlCache;
pub use rate_limiter::SlidingWindowRateLimiter;
pub use retry::RetryPolicy;
pub use transport::ReqwestTransport;
