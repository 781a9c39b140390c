//! # OSINT Graph
//!
//! The `Neo4j`-backed [`osint_core::graph::GraphStore`] implementation.
//! Every write is a `MERGE`: nodes are matched on their natural key
//! (`value`/`address`/`number`/`url`/`name`) and relationships are matched
//! on the pair of natural keys implied by their [`RelationshipKind`], so a
//! repeated discovery of the same edge updates it in place rather than
//! duplicating it.
//!
//! When no `NEO4J_URI` is configured, callers use
//! [`osint_core::graph::NoopGraphStore`] instead of this crate; the
//! orchestrator must behave identically either way.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use neo4rs::{query, Graph};
use osint_core::error::CoreError;
use osint_core::graph::{GraphNode, GraphStore, RelationshipKind};

/// `Neo4j`-backed graph store.
#[derive(Clone)]
pub struct Neo4jGraphStore {
    graph: Graph,
}

impl Neo4jGraphStore {
    /// Connect to a `Neo4j` instance at `uri` with the given credentials.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Graph`] if the driver fails to establish a
    /// connection.
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self, CoreError> {
        let graph = Graph::new(uri, user, password).await.map_err(|e| CoreError::Graph(format!("connect: {e}")))?;
        tracing::info!(%uri, "neo4j graph store connected");
        Ok(Self { graph })
    }
}

impl GraphStore for Neo4jGraphStore {
    async fn upsert_node(&self, node: GraphNode) -> Result<(), CoreError> {
        let q = match &node {
            GraphNode::Username { value, platform } => query(
                "MERGE (u:Username {value: $value, platform: $platform}) \
                 ON CREATE SET u.created_at = datetime() \
                 SET u.updated_at = datetime()",
            )
            .param("value", value.as_str())
            .param("platform", platform.as_str()),
            GraphNode::Email { address } => query(
                "MERGE (e:Email {address: $address}) \
                 ON CREATE SET e.created_at = datetime() \
                 SET e.updated_at = datetime()",
            )
            .param("address", address.as_str()),
            GraphNode::Phone { number } => query(
                "MERGE (p:Phone {number: $number}) \
                 ON CREATE SET p.created_at = datetime() \
                 SET p.updated_at = datetime()",
            )
            .param("number", number.as_str()),
            GraphNode::Platform { name } => query(
                "MERGE (pl:Platform {name: $name}) \
                 ON CREATE SET pl.created_at = datetime() \
                 SET pl.updated_at = datetime()",
            )
            .param("name", name.as_str()),
            GraphNode::Profile { url, platform, confidence } => query(
                "MERGE (pr:Profile {url: $url}) \
                 ON CREATE SET pr.created_at = datetime() \
                 SET pr.platform = $platform, pr.confidence = $confidence, pr.updated_at = datetime()",
            )
            .param("url", url.as_str())
            .param("platform", platform.as_str())
            .param("confidence", *confidence),
        };

        self.graph.run(q).await.map_err(|e| CoreError::Graph(format!("upsert_node: {e}")))
    }

    async fn upsert_relationship(&self, from_key: &str, to_key: &str, kind: RelationshipKind) -> Result<(), CoreError> {
        let (from_label, from_prop, rel, to_label, to_prop) = relationship_shape(kind);
        let cypher = format!(
            "MATCH (a:{from_label} {{{from_prop}: $from}}), (b:{to_label} {{{to_prop}: $to}}) \
             MERGE (a)-[r:{rel}]->(b) \
             ON CREATE SET r.discovered_at = datetime() \
             SET r.updated_at = datetime()"
        );
        let q = query(&cypher).param("from", from_key).param("to", to_key);
        self.graph.run(q).await.map_err(|e| CoreError::Graph(format!("upsert_relationship: {e}")))
    }
}

/// The node-label / property-key pair implied by each relationship kind.
/// `FoundOn` links a username to the platform it was found on; the rest
/// mirror the corresponding field on `LinkedAccount`/`IdentityAttribute`.
const fn relationship_shape(kind: RelationshipKind) -> (&'static str, &'static str, &'static str, &'static str, &'static str) {
    match kind {
        RelationshipKind::FoundOn => ("Username", "value", "FOUND_ON", "Platform", "name"),
        RelationshipKind::EmailAssociated => ("Username", "value", "EMAIL_ASSOCIATED", "Email", "address"),
        RelationshipKind::PhoneAssociated => ("Username", "value", "PHONE_ASSOCIATED", "Phone", "number"),
        RelationshipKind::VariationOf => ("Username", "value", "VARIATION_OF", "Username", "value"),
        RelationshipKind::UsesEmail => ("Username", "value", "USES_EMAIL", "Email", "address"),
        RelationshipKind::UsesPhone => ("Username", "value", "USES_PHONE", "Phone", "number"),
        RelationshipKind::LinkedTo => ("Profile", "url", "LINKED_TO", "Profile", "url"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relationship_shape_matches_found_on_to_platform() {
        assert_eq!(relationship_shape(RelationshipKind::FoundOn), ("Username", "value", "FOUND_ON", "Platform", "name"));
    }

    #[test]
    fn relationship_shape_matches_linked_to_between_profiles() {
        assert_eq!(relationship_shape(RelationshipKind::LinkedTo), ("Profile", "url", "LINKED_TO", "Profile", "url"));
    }
}
