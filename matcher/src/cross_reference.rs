//! Building identity chains from matches and discovered links.
//!
//! Where [`crate::identity_matcher`] answers "how similar are these two
//! handles", this module answers "given everything matched so far, what
//! does a single coherent identity look like". It is the pure, synchronous
//! half of the resolver; `osint-orchestrator` drives the I/O around it and
//! hands the result to `RelationalStore::store_search_results`.

use serde::{Deserialize, Serialize};

use crate::identity_matcher::{match_type, similarity, MatchType};

/// One platform-level match considered while resolving an identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCandidate {
    /// Platform the candidate was observed on.
    pub platform: String,
    /// The matched handle.
    pub username: String,
    /// Confidence contributed by this candidate, in `[0, 1]`.
    pub confidence: f64,
}

/// A resolved chain: the seed handle plus every candidate judged to belong
/// to the same identity, grouped by how it was matched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityChain {
    /// The original search seed.
    pub seed: String,
    /// Candidates that matched the seed exactly or as a known variation.
    pub confirmed: Vec<MatchCandidate>,
    /// Candidates that only cleared the fuzzy threshold.
    pub fuzzy: Vec<MatchCandidate>,
    /// Aggregate confidence across `confirmed` and `fuzzy`, per
    /// [`crate::confidence::aggregate_confidence`].
    pub confidence_score: f64,
}

/// Classify every candidate against `seed` and group them into a chain.
///
/// `fuzzy_threshold` is the `similarity` score (0-100) a candidate must
/// clear to be included at all; candidates below it are dropped entirely
/// rather than surfaced as low-confidence noise.
#[must_use]
pub fn build_identity_chain(seed: &str, candidates: &[MatchCandidate], fuzzy_threshold: u32) -> IdentityChain {
    let mut confirmed = Vec::new();
    let mut fuzzy = Vec::new();

    for candidate in candidates {
        let score = similarity(seed, &candidate.username);
        if score < fuzzy_threshold {
            continue;
        }
        match match_type(seed, &candidate.username, score) {
            MatchType::Exact | MatchType::Variation => confirmed.push(candidate.clone()),
            MatchType::Fuzzy => fuzzy.push(candidate.clone()),
            MatchType::Pattern => {},
        }
    }

    let all_scores: Vec<f64> = confirmed.iter().chain(fuzzy.iter()).map(|c| c.confidence).collect();
    let confidence_score = crate::confidence::aggregate_confidence(&all_scores);

    IdentityChain { seed: seed.to_string(), confirmed, fuzzy, confidence_score }
}

/// Rank `known_usernames` by similarity to `username`, returning
/// `(candidate, score, match_type)` tuples above `threshold`, most similar first.
#[must_use]
pub fn find_related_usernames(
    username: &str,
    known_usernames: &[String],
    threshold: u32,
) -> Vec<(String, u32, MatchType)> {
    let mut related: Vec<(String, u32, MatchType)> = known_usernames
        .iter()
        .filter(|candidate| candidate.as_str() != username)
        .map(|candidate| {
            let score = similarity(username, candidate);
            (candidate.clone(), score, match_type(username, candidate, score))
        })
        .filter(|(_, score, _)| *score >= threshold)
        .collect();

    related.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    related
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_candidates_by_match_strength() {
        let candidates = vec![
            MatchCandidate { platform: "github".to_string(), username: "johnsmith".to_string(), confidence: 0.9 },
            MatchCandidate { platform: "reddit".to_string(), username: "john_smith".to_string(), confidence: 0.8 },
            MatchCandidate { platform: "tiktok".to_string(), username: "totally_unrelated".to_string(), confidence: 0.1 },
        ];

        let chain = build_identity_chain("johnsmith", &candidates, 60);
        assert_eq!(chain.confirmed.len(), 2);
        assert!(chain.fuzzy.is_empty());
        assert!(chain.confidence_score > 0.0);
    }

    #[test]
    fn find_related_excludes_the_query_itself() {
        let known = vec!["johnsmith".to_string(), "john_smith".to_string()];
        let related = find_related_usernames("johnsmith", &known, 60);
        assert!(!related.iter().any(|(name, _, _)| name == "johnsmith"));
        assert!(related.iter().any(|(name, _, _)| name == "john_smith"));
    }
}
