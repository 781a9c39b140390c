//! Candidate-handle generation, fuzzy scoring, and extractors from
//! email/name/phone seeds.

use std::collections::BTreeSet;

/// Default cap on the number of variations [`variations`] returns.
pub const DEFAULT_MAX_VARIATIONS: usize = 50;

/// How closely two handles are believed to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    /// Equal, case-insensitive.
    Exact,
    /// Equal once separators are stripped.
    Variation,
    /// A string-similarity score cleared the fuzzy threshold.
    Fuzzy,
    /// Related by a known generation pattern, but below the fuzzy threshold.
    Pattern,
}

/// Named tolerance presets mapping to `similarity` thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tolerance {
    /// Threshold 80.
    Low,
    /// Threshold 70.
    Medium,
    /// Threshold 60.
    High,
}

impl Tolerance {
    /// The `similarity` threshold this tolerance preset maps to.
    #[must_use]
    pub const fn threshold(self) -> u32 {
        match self {
            Self::Low => 80,
            Self::Medium => 70,
            Self::High => 60,
        }
    }
}

const SEPARATORS: [char; 3] = ['_', '.', '-'];

const LEET_SUBSTITUTIONS: &[(char, &[&str])] = &[
    ('a', &["4", "@", "*", "æ"]),
    ('b', &["8", "6", "|3"]),
    ('e', &["3", "€"]),
    ('g', &["9", "6"]),
    ('i', &["1", "!", "|", "ï"]),
    ('l', &["1", "|", "£"]),
    ('o', &["0", "@"]),
    ('s', &["5", "$", "z"]),
    ('t', &["7", "+", "†"]),
    ('z', &["2", "s"]),
];

const NUMERIC_SUFFIXES: &[&str] = &["1", "123", "007", "42", "69", "99", "365", "777"];

const COMMON_PREFIXES: &[&str] = &["the", "mr", "mrs", "ms", "dr", "real", "iam", "its", "im"];
const COMMON_SUFFIXES: &[&str] = &["official", "real", "verified", "xoxo", "xo", "xx", "lol", "yolo"];

/// T9 keypad letter groups, indexed by digit `0..=9`.
const T9: [&str; 10] = ["", "", "abc", "def", "ghi", "jkl", "mno", "pqrs", "tuv", "wxyz"];

/// Generate up to `max_variations` candidate handles for `handle`.
///
/// Families are applied in a fixed order (separator swaps, leet-speak, case
/// variants, pattern strips, numeric suffixes, common affixes) so that when
/// the cap truncates the list, the earlier, higher-signal families survive.
#[must_use]
pub fn variations(handle: &str, max_variations: usize) -> Vec<String> {
    let mut out: BTreeSet<String> = BTreeSet::new();
    let mut ordered: Vec<String> = Vec::new();
    let mut push = |ordered: &mut Vec<String>, out: &mut BTreeSet<String>, candidate: String| {
        if candidate != handle && out.insert(candidate.clone()) {
            ordered.push(candidate);
        }
    };

    for v in separator_swaps(handle) {
        push(&mut ordered, &mut out, v);
    }
    for v in leet_substitutions(handle) {
        push(&mut ordered, &mut out, v);
    }
    for v in case_variants(handle) {
        push(&mut ordered, &mut out, v);
    }
    for v in pattern_strips(handle) {
        push(&mut ordered, &mut out, v);
    }
    for v in numeric_suffix_variants(handle) {
        push(&mut ordered, &mut out, v);
    }
    for v in affix_variants(handle) {
        push(&mut ordered, &mut out, v);
    }

    ordered.truncate(max_variations);
    ordered
}

fn separator_swaps(handle: &str) -> Vec<String> {
    let mut out = Vec::new();
    let present: Vec<char> = handle.chars().filter(|c| SEPARATORS.contains(c)).collect();

    for &sep in &SEPARATORS {
        if present.iter().any(|&p| p != sep) {
            let swapped: String =
                handle.chars().map(|c| if SEPARATORS.contains(&c) { sep } else { c }).collect();
            out.push(swapped);
        }
    }

    // Remove existing separators entirely (the "no separator" option).
    if !present.is_empty() {
        out.push(handle.chars().filter(|c| !SEPARATORS.contains(c)).collect());
    }

    // Insert a separator at letter<->digit boundaries.
    let chars: Vec<char> = handle.chars().collect();
    for &sep in &SEPARATORS {
        let mut boundary = String::new();
        for (i, &c) in chars.iter().enumerate() {
            if i > 0 {
                let prev = chars[i - 1];
                if prev.is_ascii_alphabetic() != c.is_ascii_alphabetic() && prev.is_ascii_digit() != c.is_ascii_digit()
                {
                    boundary.push(sep);
                }
            }
            boundary.push(c);
        }
        out.push(boundary);
    }

    out
}

fn leet_substitutions(handle: &str) -> Vec<String> {
    let lower = handle.to_lowercase();
    let mut first_pass = Vec::new();

    for &(letter, subs) in LEET_SUBSTITUTIONS {
        if lower.contains(letter) {
            for &sub in subs {
                first_pass.push(lower.replacen(letter, sub, 1));
                first_pass.push(lower.replace(letter, sub));
            }
        }
    }

    let mut second_pass = Vec::new();
    for candidate in &first_pass {
        for &(letter, subs) in LEET_SUBSTITUTIONS {
            if candidate.contains(letter) {
                if let Some(&sub) = subs.first() {
                    second_pass.push(candidate.replace(letter, sub));
                }
            }
        }
    }

    first_pass.extend(second_pass);
    first_pass.sort();
    first_pass.dedup();
    first_pass
}

fn case_variants(handle: &str) -> Vec<String> {
    vec![handle.to_lowercase(), handle.to_uppercase(), title_case(handle)]
}

fn title_case(handle: &str) -> String {
    let mut chars = handle.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn pattern_strips(handle: &str) -> Vec<String> {
    let mut out = Vec::new();

    let stripped: String = handle.trim_end_matches(|c: char| c.is_ascii_digit()).to_string();
    if !stripped.is_empty() && stripped != handle {
        out.push(stripped);
    }

    if handle.chars().any(|c| SEPARATORS.contains(&c)) {
        let parts: Vec<&str> = handle.split(SEPARATORS).filter(|p| !p.is_empty()).collect();
        if parts.len() > 1 {
            let initials: String = parts.iter().filter_map(|p| p.chars().next()).collect();
            if !initials.is_empty() {
                out.push(initials);
            }
        }
    }

    out
}

fn numeric_suffix_variants(handle: &str) -> Vec<String> {
    let base: String = handle.trim_end_matches(|c: char| c.is_ascii_digit()).to_string();
    let base = if base.is_empty() { handle.to_string() } else { base };

    let mut out: Vec<String> = NUMERIC_SUFFIXES.iter().map(|suffix| format!("{base}{suffix}")).collect();
    for year in 90..=99 {
        out.push(format!("{base}{year:02}"));
    }
    for year in 0..=9 {
        out.push(format!("{base}{year:02}"));
    }
    out
}

fn affix_variants(handle: &str) -> Vec<String> {
    let mut out = Vec::new();
    for prefix in COMMON_PREFIXES {
        out.push(format!("{prefix}{handle}"));
        out.push(format!("{prefix}_{handle}"));
    }
    for suffix in COMMON_SUFFIXES {
        out.push(format!("{handle}{suffix}"));
        out.push(format!("{handle}_{suffix}"));
    }
    out
}

/// Candidate handles derived from an email address's local part.
#[must_use]
pub fn from_email(email: &str) -> Vec<String> {
    let Some((local, _domain)) = email.split_once('@') else { return Vec::new() };
    let local = local.to_lowercase();
    let without_tag = local.split('+').next().unwrap_or(&local).to_string();

    let mut out: BTreeSet<String> = BTreeSet::new();
    out.insert(local.clone());
    out.insert(without_tag.clone());
    out.insert(without_tag.replace('.', ""));
    out.insert(local.replace('.', ""));

    if without_tag.contains('.') {
        let parts: Vec<&str> = without_tag.split('.').filter(|p| !p.is_empty()).collect();
        if parts.len() >= 2 {
            for &sep in &['_', '-', '.'] {
                out.insert(parts.join(&sep.to_string()));
            }
            out.insert(parts.concat());
        }
    }

    out.into_iter().collect()
}

/// Candidate handles derived from a person's display name.
#[must_use]
pub fn from_name(name: &str) -> Vec<String> {
    let tokens: Vec<String> = name
        .split_whitespace()
        .map(|t| t.chars().filter(|c| c.is_alphabetic()).collect::<String>().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    let mut out: BTreeSet<String> = BTreeSet::new();
    if let Some(first) = tokens.first() {
        out.insert(first.clone());
    }

    if tokens.len() >= 2 {
        let first = &tokens[0];
        let last = &tokens[tokens.len() - 1];
        let first_initial = first.chars().next().map(String::from).unwrap_or_default();
        let last_initial = last.chars().next().map(String::from).unwrap_or_default();

        out.insert(format!("{first}{last}"));
        out.insert(format!("{first}.{last}"));
        out.insert(format!("{first}_{last}"));
        out.insert(format!("{first}-{last}"));
        out.insert(format!("{first}{last_initial}"));
        out.insert(format!("{first_initial}{last}"));
        out.insert(format!("{last}{first}"));

        if tokens.len() >= 3 {
            for middle in &tokens[1..tokens.len() - 1] {
                let middle_initial = middle.chars().next().map(String::from).unwrap_or_default();
                out.insert(format!("{first}{middle_initial}{last}"));
                out.insert(format!("{first}.{middle_initial}.{last}"));
            }
        }
    }

    out.into_iter().collect()
}

/// Candidate handles derived from a phone number: trailing-digit slices and
/// T9 letter decodings of the last four digits (bounded at 10 results).
#[must_use]
pub fn from_phone(phone: &str) -> Vec<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    let mut out = Vec::new();

    for take in [4, 6, 7] {
        if digits.len() >= take {
            out.push(digits[digits.len() - take..].to_string());
        }
    }

    if digits.len() >= 4 {
        let last_four = &digits[digits.len() - 4..];
        let letter_groups: Vec<&str> = last_four
            .chars()
            .map(|d| T9[d.to_digit(10).unwrap_or(0) as usize])
            .collect();

        let mut decodings = vec![String::new()];
        for group in letter_groups {
            if group.is_empty() {
                continue;
            }
            let mut next = Vec::new();
            for prefix in &decodings {
                for letter in group.chars() {
                    next.push(format!("{prefix}{letter}"));
                }
            }
            decodings = next;
        }
        out.extend(decodings.into_iter().take(10));
    }

    out
}

/// Similarity score in `[0, 100]`. Exact case-insensitive equality scores
/// 100; empty inputs score 0; otherwise a normalized string-similarity
/// metric is used.
#[must_use]
pub fn similarity(a: &str, b: &str) -> u32 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    if a.eq_ignore_ascii_case(b) {
        return 100;
    }
    let ratio = strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase());
    (ratio * 100.0).round() as u32
}

/// Return up to `limit` `(candidate, score)` pairs with `score >= threshold`,
/// sorted by descending score.
#[must_use]
pub fn fuzzy_match(query: &str, candidates: &[String], threshold: u32, limit: usize) -> Vec<(String, u32)> {
    let mut scored: Vec<(String, u32)> = candidates
        .iter()
        .map(|c| (c.clone(), similarity(query, c)))
        .filter(|(_, score)| *score >= threshold)
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    scored.truncate(limit);
    scored
}

/// Classify how closely `a` and `b` match, given a precomputed [`similarity`] score.
#[must_use]
pub fn match_type(a: &str, b: &str, score: u32) -> MatchType {
    if a.eq_ignore_ascii_case(b) {
        return MatchType::Exact;
    }
    let strip = |s: &str| s.chars().filter(|c| !SEPARATORS.contains(c)).collect::<String>().to_lowercase();
    if strip(a) == strip(b) {
        return MatchType::Variation;
    }
    if score >= 70 {
        MatchType::Fuzzy
    } else {
        MatchType::Pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similarity_is_reflexive_and_bounded() {
        assert_eq!(similarity("john_doe", "john_doe"), 100);
        let s = similarity("johnathan", "jonathan");
        assert!(s <= 100);
        assert_eq!(similarity("", "anything"), 0);
    }

    #[test]
    fn similarity_is_symmetric() {
        assert_eq!(similarity("alice", "alicia"), similarity("alicia", "alice"));
    }

    #[test]
    fn variations_include_a_digit_substitution_and_numeric_suffix() {
        let vs = variations("johnsmith", DEFAULT_MAX_VARIATIONS);
        assert!(vs.iter().any(|v| v.chars().any(|c| c.is_ascii_digit()) && !v.contains("johnsmith1")));
        assert!(vs.contains(&"johnsmith1".to_string()));
    }

    #[test]
    fn from_email_extracts_local_part_variants() {
        let vs = from_email("john.smith+work@gmail.com");
        assert!(vs.contains(&"john.smith".to_string()));
        assert!(vs.contains(&"johnsmith".to_string()));
    }

    #[test]
    fn from_name_generates_first_last_combinations() {
        let vs = from_name("John Smith");
        assert!(vs.contains(&"johnsmith".to_string()));
        assert!(vs.contains(&"john.smith".to_string()));
        assert!(vs.contains(&"smithjohn".to_string()));
    }

    #[test]
    fn from_phone_decodes_t9_and_bounds_results() {
        let vs = from_phone("+1 (415) 555-2663");
        assert!(vs.contains(&"2663".to_string()));
        assert!(vs.len() <= 13);
    }

    #[test]
    fn match_type_detects_variation_after_stripping_separators() {
        let mt = match_type("john_doe", "johndoe", 0);
        assert_eq!(mt, MatchType::Variation);
    }

    #[test]
    fn fuzzy_match_respects_threshold_and_limit() {
        let candidates = vec!["johnsmith".to_string(), "john_smith".to_string(), "totally_different".to_string()];
        let results = fuzzy_match("johnsmith", &candidates, 70, 1);
        assert_eq!(results.len(), 1);
        assert!(results[0].1 >= 70);
    }

    proptest::proptest! {
        #[test]
        fn similarity_is_always_symmetric_and_bounded(a in "[a-zA-Z0-9_.]{0,20}", b in "[a-zA-Z0-9_.]{0,20}") {
            let forward = similarity(&a, &b);
            let backward = similarity(&b, &a);
            prop_assert_eq!(forward, backward);
            prop_assert!(forward <= 100);
        }

        #[test]
        fn similarity_of_identical_strings_is_always_100(s in "[a-zA-Z0-9_.]{1,20}") {
            prop_assert_eq!(similarity(&s, &s), 100);
        }
    }
}
