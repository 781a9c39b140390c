//! The optional `GraphStore` boundary.
//!
//! The identity graph is intentionally cyclic (a `LinkedAccount` chain can
//! loop back on itself across platforms), so every write here is
//! MERGE-semantic: create-if-absent, update properties, bump `updated_at`.
//! Implementers must never attempt to topologically order these writes.

use crate::error::CoreError;
use crate::model::Platform;

/// A node upserted into the graph.
#[derive(Debug, Clone)]
pub enum GraphNode {
    /// `Username{value, platform}`.
    Username { value: String, platform: Platform },
    /// `Email{address}`.
    Email { address: String },
    /// `Phone{number}`.
    Phone { number: String },
    /// `Platform{name}`.
    Platform { name: Platform },
    /// `Profile{url, platform, confidence}`.
    Profile { url: String, platform: Platform, confidence: f64 },
}

/// A relationship upserted between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipKind {
    /// A username was found on a platform.
    FoundOn,
    /// A username is associated with an email.
    EmailAssociated,
    /// A username is associated with a phone number.
    PhoneAssociated,
    /// One username is a generated variation of another.
    VariationOf,
    /// A username uses an email as contact info.
    UsesEmail,
    /// A username uses a phone number as contact info.
    UsesPhone,
    /// A username is linked to another account (see `LinkedAccount`).
    LinkedTo,
}

/// Upserts nodes and relationships for the identity graph.
///
/// When the graph backend isn't configured, implementers use a no-op
/// implementation; the orchestrator must behave identically apart from
/// missing graph data, i.e. callers must never branch on whether a graph
/// backend is present.
pub trait GraphStore: Send + Sync {
    /// MERGE a node into the graph.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Graph`] on any persistence failure.
    fn upsert_node(&self, node: GraphNode) -> impl std::future::Future<Output = Result<(), CoreError>> + Send;

    /// MERGE a relationship between two already-upserted nodes, identified
    /// by their natural keys (the `value`/`address`/`number`/`url` used when
    /// upserting them).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Graph`] on any persistence failure.
    fn upsert_relationship(
        &self,
        from_key: &str,
        to_key: &str,
        kind: RelationshipKind,
    ) -> impl std::future::Future<Output = Result<(), CoreError>> + Send;
}

/// A `GraphStore` that performs no I/O, used when no graph backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGraphStore;

impl GraphStore for NoopGraphStore {
    async fn upsert_node(&self, _node: GraphNode) -> Result<(), CoreError> {
        Ok(())
    }

    async fn upsert_relationship(
        &self,
        _from_key: &str,
        _to_key: &str,
        _kind: RelationshipKind,
    ) -> Result<(), CoreError> {
        Ok(())
    }
}
