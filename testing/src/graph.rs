//! An in-memory [`GraphStore`] double that records every write for
//! assertions instead of talking to `Neo4j`.

use std::sync::Mutex;

use osint_core::error::CoreError;
use osint_core::graph::{GraphNode, GraphStore, RelationshipKind};

/// One recorded relationship write.
#[derive(Debug, Clone)]
pub struct RecordedRelationship {
    /// Natural key of the source node.
    pub from_key: String,
    /// Natural key of the target node.
    pub to_key: String,
    /// The relationship kind.
    pub kind: RelationshipKind,
}

/// Records every `upsert_node`/`upsert_relationship` call in order, for
/// orchestrator tests that assert on what was written without a real graph.
#[derive(Default)]
pub struct RecordingGraphStore {
    nodes: Mutex<Vec<GraphNode>>,
    relationships: Mutex<Vec<RecordedRelationship>>,
}

impl RecordingGraphStore {
    /// An empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes upserted so far, in call order.
    #[must_use]
    pub fn nodes(&self) -> Vec<GraphNode> {
        self.nodes.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    /// Relationships upserted so far, in call order.
    #[must_use]
    pub fn relationships(&self) -> Vec<RecordedRelationship> {
        self.relationships.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }
}

impl GraphStore for RecordingGraphStore {
    async fn upsert_node(&self, node: GraphNode) -> Result<(), CoreError> {
        self.nodes.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(node);
        Ok(())
    }

    async fn upsert_relationship(&self, from_key: &str, to_key: &str, kind: RelationshipKind) -> Result<(), CoreError> {
        self.relationships.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(RecordedRelationship {
            from_key: from_key.to_string(),
            to_key: to_key.to_string(),
            kind,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_nodes_and_relationships_in_order() {
        let graph = RecordingGraphStore::new();
        graph.upsert_node(GraphNode::Email { address: "carol@example.com".to_string() }).await.unwrap();
        graph.upsert_relationship("carol", "carol@example.com", RelationshipKind::UsesEmail).await.unwrap();

        assert_eq!(graph.nodes().len(), 1);
        assert_eq!(graph.relationships().len(), 1);
        assert_eq!(graph.relationships()[0].kind, RelationshipKind::UsesEmail);
    }
}
