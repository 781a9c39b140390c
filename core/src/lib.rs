//! # OSINT Core
//!
//! Domain model, trait contracts, and pure text-extraction logic for the
//! OSINT aggregation engine.
//!
//! This crate has no knowledge of HTTP, databases, or graph backends. It
//! defines:
//!
//! - **Model**: [`model::NormalizedProfile`], [`model::NormalizedPost`],
//!   [`model::LinkedAccount`], and the identity-resolution tables.
//! - **Traits**: [`transport::Transport`], [`credentials::CredentialProvider`],
//!   [`rate_limit::RateLimiter`], [`adapter::SourceAdapter`],
//!   [`store::RelationalStore`], [`graph::GraphStore`].
//! - **Extraction**: pure regex-based mining in [`extraction`].
//!
//! Concrete implementations of every trait here live in sibling crates
//! (`osint-tools`, `osint-adapters`, `osint-store`, `osint-graph`) so this
//! crate can be depended on without pulling in `reqwest`, `sqlx`, or
//! `neo4rs`.

pub mod adapter;
pub mod credentials;
pub mod error;
pub mod extraction;
pub mod graph;
pub mod model;
pub mod rate_limit;
pub mod store;
pub mod transport;

pub use error::{CoreError, Result};
