//! Graph backend selection, folded into the same enum-dispatch shape as
//! [`osint_store::Store`] and [`crate::adapters::AnyAdapter`]: `GraphStore`
//! is `async fn`-based and therefore not object-safe.

use osint_core::error::CoreError;
use osint_core::graph::{GraphNode, GraphStore, NoopGraphStore, RelationshipKind};
use osint_graph::Neo4jGraphStore;

/// Whichever graph backend was selected at startup. The orchestrator never
/// branches on which variant it holds; behavior differs only in whether
/// writes actually land anywhere.
#[derive(Clone)]
pub enum AnyGraph {
    /// `Neo4j`, configured via `NEO4J_URI`/`NEO4J_USER`/`NEO4J_PASSWORD`.
    Neo4j(Neo4jGraphStore),
    /// No graph backend configured.
    Noop(NoopGraphStore),
}

impl GraphStore for AnyGraph {
    async fn upsert_node(&self, node: GraphNode) -> Result<(), CoreError> {
        match self {
            Self::Neo4j(g) => g.upsert_node(node).await,
            Self::Noop(g) => g.upsert_node(node).await,
        }
    }

    async fn upsert_relationship(&self, from_key: &str, to_key: &str, kind: RelationshipKind) -> Result<(), CoreError> {
        match self {
            Self::Neo4j(g) => g.upsert_relationship(from_key, to_key, kind).await,
            Self::Noop(g) => g.upsert_relationship(from_key, to_key, kind).await,
        }
    }
}

impl AnyGraph {
    /// Select a backend per §6: all three of `NEO4J_URI`/`NEO4J_USER`/`NEO4J_PASSWORD`
    /// present connects to `Neo4j`; otherwise the no-op backend is used.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Graph`] if `Neo4j` connection parameters are
    /// present but the driver fails to connect.
    pub async fn from_env() -> Result<Self, CoreError> {
        let uri = std::env::var("NEO4J_URI").ok();
        let user = std::env::var("NEO4J_USER").ok();
        let password = std::env::var("NEO4J_PASSWORD").ok();

        match (uri, user, password) {
            (Some(uri), Some(user), Some(password)) => {
                Ok(Self::Neo4j(Neo4jGraphStore::connect(&uri, &user, &password).await?))
            },
            _ => Ok(Self::Noop(NoopGraphStore)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_backend_accepts_every_write() {
        let graph = AnyGraph::Noop(NoopGraphStore);
        graph.upsert_node(GraphNode::Email { address: "carol@example.com".to_string() }).await.unwrap();
        graph.upsert_relationship("a", "b", RelationshipKind::UsesEmail).await.unwrap();
    }
}
