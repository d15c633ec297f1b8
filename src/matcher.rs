use std::cmp::min;

/// How closely a submission matches an expected callsign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Perfect,
    Partial,
    None,
}

/// Classifies a submitted callsign against an expected one.
///
/// Implementations must be deterministic and case-insensitive. Callers strip
/// a trailing `?` from the submission before classifying.
pub trait CallsignMatcher {
    fn classify(&self, expected: &str, submitted: &str) -> MatchKind;
}

/// Default matching policy.
///
/// * equal after trimming/uppercasing: `Perfect`
/// * a fragment of at least `min_fragment` characters found inside the
///   expected callsign (e.g. `ABC` for `K1ABC`): `Partial`
/// * Levenshtein distance at most `max(1, len(expected) / 3)`: `Partial`
/// * anything else, including an empty submission: `None`
#[derive(Debug, Clone, Copy)]
pub struct EditDistanceMatcher {
    pub min_fragment: usize,
}

impl Default for EditDistanceMatcher {
    fn default() -> Self {
        Self { min_fragment: 2 }
    }
}

impl CallsignMatcher for EditDistanceMatcher {
    fn classify(&self, expected: &str, submitted: &str) -> MatchKind {
        let expected = expected.trim().to_uppercase();
        let submitted = submitted.trim().to_uppercase();

        if expected.is_empty() || submitted.is_empty() {
            return MatchKind::None;
        }
        if expected == submitted {
            return MatchKind::Perfect;
        }

        if submitted.chars().count() >= self.min_fragment && expected.contains(&submitted) {
            return MatchKind::Partial;
        }

        let allowed = (expected.chars().count() / 3).max(1);
        if levenshtein(&expected, &submitted) <= allowed {
            MatchKind::Partial
        } else {
            MatchKind::None
        }
    }
}

pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = min(min(prev[j + 1] + 1, curr[j] + 1), prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("", "ABC"), 3);
        assert_eq!(levenshtein("K1ABC", "K1ABC"), 0);
        assert_eq!(levenshtein("K1ABC", "K1ABD"), 1);
        assert_eq!(levenshtein("K1ABC", "K1AB"), 1);
        assert_eq!(levenshtein("KITTEN", "SITTING"), 3);
    }

    #[test]
    fn test_perfect_is_reflexive() {
        let m = EditDistanceMatcher::default();
        for call in ["K1ABC", "W9XYZ/4", "VE3A", "N", "xe2abc"] {
            assert_eq!(m.classify(call, call), MatchKind::Perfect);
        }
    }

    #[test]
    fn test_case_insensitive() {
        let m = EditDistanceMatcher::default();
        assert_eq!(m.classify("K1ABC", "k1abc"), MatchKind::Perfect);
        assert_eq!(m.classify("k1abc", " K1ABC "), MatchKind::Perfect);
    }

    #[test]
    fn test_partial_matches() {
        let m = EditDistanceMatcher::default();
        assert_eq!(m.classify("K1ABC", "ABC"), MatchKind::Partial);
        assert_eq!(m.classify("K1ABC", "K1ABD"), MatchKind::Partial);
        assert_eq!(m.classify("K1ABC", "K1AB"), MatchKind::Partial);
    }

    #[test]
    fn test_no_match() {
        let m = EditDistanceMatcher::default();
        assert_eq!(m.classify("K1ABC", "W9XYZ"), MatchKind::None);
        assert_eq!(m.classify("K1ABC", ""), MatchKind::None);
        assert_eq!(m.classify("K1ABC", "Q"), MatchKind::None);
    }

    #[test]
    fn test_single_character_fragment_is_too_short() {
        let m = EditDistanceMatcher::default();
        assert_eq!(m.classify("K1ABC", "A"), MatchKind::None);
    }
}
