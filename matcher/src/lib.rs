//! # OSINT Matcher
//!
//! Pure algorithms for identity resolution: candidate-handle generation and
//! fuzzy scoring ([`identity_matcher`]), link discovery from a profile's
//! content ([`link_discovery`]), identity-chain construction
//! ([`cross_reference`]), and the confidence-score formula ([`confidence`]).
//!
//! Nothing in this crate performs I/O; `osint-orchestrator` is the caller
//! that wires these algorithms to the network and the stores.

pub mod confidence;
pub mod cross_reference;
pub mod identity_matcher;
pub mod link_discovery;

pub use cross_reference::{build_identity_chain, find_related_usernames, IdentityChain, MatchCandidate};
pub use identity_matcher::{fuzzy_match, match_type, similarity, variations, MatchType, Tolerance};
pub use link_discovery::discover_linked_accounts;
