//! # OSINT Testing
//!
//! In-memory test doubles for the four I/O boundaries
//! (`Transport`, `CredentialProvider`, `RelationalStore`, `GraphStore`),
//! used by `osint-orchestrator`'s integration tests so they can exercise
//! the fan-out and resolution logic without a network or a database.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod credentials;
pub mod graph;
pub mod store;
pub mod transport;

pub use credentials::MapCredentials;
pub use graph::{RecordedRelationship, RecordingGraphStore};
pub use store::InMemoryStore;
pub use transport::ScriptedTransport;
