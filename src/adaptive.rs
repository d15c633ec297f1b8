use rand::Rng;
use std::collections::HashMap;
use tracing::debug;

/// Weight every character starts with.
pub const BASE_WEIGHT: f64 = 1.0;
/// Weight added per recorded mistake.
pub const MISTAKE_WEIGHT_MULTIPLIER: f64 = 0.5;
/// Upper bound for any character weight.
pub const MAX_WEIGHT_MULTIPLIER: f64 = 5.0;

/// Session-scoped record of which callsign characters the trainee got wrong.
///
/// Counts only ever grow until [`MistakeTracker::reset`] is called; the
/// station generator reads them through [`MistakeTracker::sample_weighted`]
/// to draw troublesome characters more often.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MistakeTracker {
    mistakes: HashMap<char, u32>,
}

impl MistakeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `expected` and `actual` position by position and count every
    /// expected alphanumeric character that was missed or mistyped.
    pub fn record_mistake(&mut self, expected: &str, actual: &str) {
        let expected: Vec<char> = expected.to_uppercase().chars().collect();
        let actual: Vec<char> = actual.to_uppercase().chars().collect();

        let max_len = expected.len().max(actual.len());
        for idx in 0..max_len {
            let Some(&want) = expected.get(idx) else {
                continue;
            };
            if !is_tracked(want) || actual.get(idx) == Some(&want) {
                continue;
            }
            let count = self.mistakes.entry(want).or_insert(0);
            *count += 1;
            debug!(character = %want, total = *count, "recorded mistake");
        }
    }

    pub fn mistakes_for(&self, c: char) -> u32 {
        self.mistakes
            .get(&normalize(c))
            .copied()
            .unwrap_or_default()
    }

    /// `min(BASE + count * MULTIPLIER, MAX)`
    pub fn weight(&self, c: char) -> f64 {
        let count = self.mistakes_for(c) as f64;
        (BASE_WEIGHT + count * MISTAKE_WEIGHT_MULTIPLIER).min(MAX_WEIGHT_MULTIPLIER)
    }

    /// Pick one character from `alphabet` with probability proportional to its
    /// weight. Returns `None` only for an empty alphabet.
    pub fn sample_weighted<R: Rng + ?Sized>(&self, alphabet: &[char], rng: &mut R) -> Option<char> {
        if alphabet.is_empty() {
            return None;
        }

        let weights: Vec<f64> = alphabet.iter().map(|&c| self.weight(c)).collect();
        let total: f64 = weights.iter().sum();

        if total <= 0.0 || !total.is_finite() {
            return alphabet.get(rng.gen_range(0..alphabet.len())).copied();
        }

        let target = rng.gen::<f64>() * total;
        let mut cumulative = 0.0;
        for (&c, w) in alphabet.iter().zip(weights) {
            cumulative += w;
            if target < cumulative {
                return Some(c);
            }
        }

        // float rounding can leave target == total
        alphabet.last().copied()
    }

    pub fn reset(&mut self) {
        if !self.mistakes.is_empty() {
            debug!("cleared adaptive mistake data");
        }
        self.mistakes.clear();
    }

    /// Owned copy of the mistake counts.
    pub fn snapshot(&self) -> HashMap<char, u32> {
        self.mistakes.clone()
    }

    pub fn has_mistakes(&self) -> bool {
        !self.mistakes.is_empty()
    }

    /// Characters ordered by mistake count, worst first.
    pub fn troubled_characters(&self) -> Vec<(char, u32)> {
        let mut ranked: Vec<(char, u32)> = self.mistakes.iter().map(|(&c, &n)| (c, n)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }
}

fn normalize(c: char) -> char {
    c.to_ascii_uppercase()
}

fn is_tracked(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_record_mistake_counts_mismatched_positions() {
        let mut tracker = MistakeTracker::new();
        tracker.record_mistake("K1ABC", "K1AXC");

        assert_eq!(tracker.mistakes_for('B'), 1);
        assert_eq!(tracker.mistakes_for('K'), 0);
        assert_eq!(tracker.snapshot().len(), 1);
    }

    #[test]
    fn test_record_mistake_counts_missing_tail() {
        let mut tracker = MistakeTracker::new();
        tracker.record_mistake("W9XYZ", "W9");

        assert_eq!(tracker.mistakes_for('X'), 1);
        assert_eq!(tracker.mistakes_for('Y'), 1);
        assert_eq!(tracker.mistakes_for('Z'), 1);
        assert_eq!(tracker.mistakes_for('W'), 0);
    }

    #[test]
    fn test_record_mistake_is_case_insensitive() {
        let mut tracker = MistakeTracker::new();
        tracker.record_mistake("k1abc", "K1ABC");
        assert!(!tracker.has_mistakes());

        tracker.record_mistake("n2q", "n2x");
        assert_eq!(tracker.mistakes_for('q'), 1);
        assert_eq!(tracker.mistakes_for('Q'), 1);
    }

    #[test]
    fn test_record_mistake_ignores_separators() {
        let mut tracker = MistakeTracker::new();
        tracker.record_mistake("K1ABC/4", "K1ABC 4");

        assert!(!tracker.has_mistakes());
    }

    #[test]
    fn test_record_mistake_ignores_extra_actual_chars() {
        let mut tracker = MistakeTracker::new();
        tracker.record_mistake("AB", "ABXYZ");

        assert!(!tracker.has_mistakes());
    }

    #[test]
    fn test_weight_bounds() {
        let mut tracker = MistakeTracker::new();
        assert_eq!(tracker.weight('Q'), BASE_WEIGHT);

        let mut previous = tracker.weight('Q');
        for _ in 0..20 {
            tracker.record_mistake("Q", "");
            let w = tracker.weight('Q');
            assert!(w >= previous);
            assert!(w <= MAX_WEIGHT_MULTIPLIER);
            assert!(w >= BASE_WEIGHT);
            previous = w;
        }
        assert_eq!(tracker.weight('Q'), MAX_WEIGHT_MULTIPLIER);
    }

    #[test]
    fn test_weight_after_two_mistakes() {
        let mut tracker = MistakeTracker::new();
        tracker.record_mistake("X", "Y");
        tracker.record_mistake("X", "Y");
        assert_eq!(tracker.weight('X'), 2.0);
    }

    #[test]
    fn test_sample_single_character_alphabet() {
        let tracker = MistakeTracker::new();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            assert_eq!(tracker.sample_weighted(&['Z'], &mut rng), Some('Z'));
        }
    }

    #[test]
    fn test_sample_empty_alphabet() {
        let tracker = MistakeTracker::new();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(tracker.sample_weighted(&[], &mut rng), None);
    }

    #[test]
    fn test_sample_prefers_mistaken_characters() {
        let mut tracker = MistakeTracker::new();
        for _ in 0..10 {
            tracker.record_mistake("Q", "");
        }
        let mut rng = StdRng::seed_from_u64(42);
        let alphabet = ['A', 'Q'];

        let trials = 2000;
        let q_count = (0..trials)
            .filter(|_| tracker.sample_weighted(&alphabet, &mut rng) == Some('Q'))
            .count();

        // expected ratio 5/6
        assert!(
            q_count > trials * 3 / 4,
            "Q should dominate (got {q_count} of {trials})"
        );
        assert!(q_count < trials, "A should still appear");
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut tracker = MistakeTracker::new();
        tracker.record_mistake("ABC", "XYZ");
        assert!(tracker.has_mistakes());

        tracker.reset();
        tracker.reset();
        assert!(tracker.snapshot().is_empty());
        assert_eq!(tracker, MistakeTracker::new());
    }

    #[test]
    fn test_snapshot_does_not_alias() {
        let mut tracker = MistakeTracker::new();
        tracker.record_mistake("A", "B");

        let mut snap = tracker.snapshot();
        snap.insert('Z', 99);
        snap.clear();

        assert_eq!(tracker.mistakes_for('A'), 1);
        assert_eq!(tracker.mistakes_for('Z'), 0);
    }

    #[test]
    fn test_troubled_characters_order() {
        let mut tracker = MistakeTracker::new();
        tracker.record_mistake("AB", "");
        tracker.record_mistake("B", "");

        assert_eq!(tracker.troubled_characters(), vec![('B', 2), ('A', 1)]);
    }
}
