//! Candidate-handle generation for [`crate::FanoutOrchestrator::search_identity`],
//! the username-enumeration flow: given one seed identifier, probe a bounded
//! set of variations/extractions across platforms rather than only the
//! literal seed.
//!
//! Grounded on the original service's `enumerate_username`/`fuzzy_match_search`:
//! the seed is always tried verbatim, then supplemented with a handful of
//! [`osint_matcher::identity_matcher`] candidates appropriate to the
//! identifier's kind.

use osint_matcher::identity_matcher::{from_email, from_name, from_phone, match_type, similarity, variations, MatchType};

/// Cap on non-seed candidates probed per identifier, keeping the fan-out
/// proportional to `platforms * (1 + MAX_CANDIDATES)` rather than unbounded.
pub const MAX_CANDIDATES: usize = 5;

/// Build the ordered list of handles to probe for `identifier`, given
/// `search_type` (`"username"`, `"email"`, `"phone"`, or anything else,
/// which is treated as a bare name). The seed itself is always first.
#[must_use]
pub fn candidate_handles(identifier: &str, search_type: &str) -> Vec<String> {
    let mut candidates = vec![identifier.to_string()];
    let generated = match search_type {
        "email" => from_email(identifier),
        "phone" => from_phone(identifier),
        "username" => variations(identifier, MAX_CANDIDATES),
        _ => from_name(identifier),
    };
    for candidate in generated {
        if candidate != identifier && !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates.truncate(1 + MAX_CANDIDATES);
    candidates
}

/// How a probed `candidate` relates back to the original `identifier`, and
/// the confidence that should be attributed to a `found` result for it.
#[must_use]
pub fn detection(identifier: &str, candidate: &str) -> (&'static str, f64) {
    if identifier.eq_ignore_ascii_case(candidate) {
        return ("exact", 1.0);
    }
    let score = similarity(identifier, candidate);
    let method = match match_type(identifier, candidate, score) {
        MatchType::Exact => "exact",
        MatchType::Variation => "variation",
        MatchType::Fuzzy => "fuzzy",
        MatchType::Pattern => "pattern",
    };
    (method, f64::from(score) / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_is_always_first_and_present() {
        let candidates = candidate_handles("johnsmith", "username");
        assert_eq!(candidates.first(), Some(&"johnsmith".to_string()));
    }

    #[test]
    fn email_candidates_derive_from_local_part() {
        let candidates = candidate_handles("john.smith+work@gmail.com", "email");
        assert!(candidates.iter().any(|c| c == "john.smith"));
    }

    #[test]
    fn exact_seed_detection_is_full_confidence() {
        assert_eq!(detection("carol", "carol"), ("exact", 1.0));
    }
}
