//! Word error rate between a reference prompt and a transcript.

use crate::analysis::disfluency::tokenize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlignmentResult {
    /// Word-level Levenshtein distance (substitutions, insertions, deletions).
    pub edit_distance: usize,
    /// Number of reference tokens.
    pub reference_length: usize,
    /// `edit_distance / reference_length`. Can exceed 1 with many insertions.
    pub wer: f64,
}

impl AlignmentResult {
    /// `max(0, round((1 - wer) * 100))`.
    pub fn accuracy_percent(&self) -> u8 {
        accuracy_percent(self.wer)
    }
}

/// Accuracy shown to the user for a given word error rate.
pub fn accuracy_percent(wer: f64) -> u8 {
    ((1.0 - wer) * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Aligns a transcript against its reference after shared tokenization.
///
/// An empty reference yields `wer = 0` for an empty hypothesis and `wer = 1`
/// otherwise.
pub fn align(reference: &str, hypothesis: &str) -> AlignmentResult {
    let reference = tokenize(reference);
    let hypothesis = tokenize(hypothesis);
    let edit_distance = word_edit_distance(&reference, &hypothesis);
    let reference_length = reference.len();

    let wer = if reference_length == 0 {
        if hypothesis.is_empty() { 0.0 } else { 1.0 }
    } else {
        edit_distance as f64 / reference_length as f64
    };

    AlignmentResult {
        edit_distance,
        reference_length,
        wer,
    }
}

pub fn compute_wer(reference: &str, hypothesis: &str) -> f64 {
    align(reference, hypothesis).wer
}

/// Levenshtein distance over token slices, two rolling rows.
pub fn word_edit_distance<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    let n = b.len();

    let mut prev = (0..=n).collect::<Vec<_>>();
    let mut curr = vec![0; n + 1];

    for (i, token_a) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, token_b) in b.iter().enumerate() {
            let cost = usize::from(token_a != token_b);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_text_has_zero_wer() {
        let text = "she sells seashells by the seashore";
        assert_eq!(compute_wer(text, text), 0.0);
    }

    #[test]
    fn test_empty_reference_cases() {
        assert_eq!(compute_wer("", ""), 0.0);
        assert_eq!(compute_wer("", "anything at all"), 1.0);
    }

    #[test]
    fn test_empty_hypothesis_deletes_everything() {
        let result = align("a b c", "");
        assert_eq!(result.edit_distance, 3);
        assert_eq!(result.wer, 1.0);
    }

    #[test]
    fn test_case_and_punctuation_do_not_count() {
        let result = align(
            "The quick brown fox jumps over the lazy dog.",
            "the quick brown fox jumps over the lazy dog",
        );
        assert_eq!(result.wer, 0.0);
        assert_eq!(result.reference_length, 9);
        assert_eq!(result.accuracy_percent(), 100);
    }

    #[test]
    fn test_single_substitution() {
        let result = align("consistency is the key", "consistency was the key");
        assert_eq!(result.edit_distance, 1);
        assert!((result.wer - 0.25).abs() < 1e-12);
        assert_eq!(result.accuracy_percent(), 75);
    }

    #[test]
    fn test_insertions_can_push_wer_above_one() {
        let result = align("hello", "well hello there friend");
        assert_eq!(result.edit_distance, 3);
        assert_eq!(result.wer, 3.0);
        assert_eq!(result.accuracy_percent(), 0);
    }

    #[test]
    fn test_rolling_rows_match_full_table() {
        fn full_table(a: &[&str], b: &[&str]) -> usize {
            let mut dp = vec![vec![0usize; b.len() + 1]; a.len() + 1];
            for (i, row) in dp.iter_mut().enumerate() {
                row[0] = i;
            }
            for j in 0..=b.len() {
                dp[0][j] = j;
            }
            for i in 1..=a.len() {
                for j in 1..=b.len() {
                    dp[i][j] = if a[i - 1] == b[j - 1] {
                        dp[i - 1][j - 1]
                    } else {
                        1 + dp[i - 1][j].min(dp[i][j - 1]).min(dp[i - 1][j - 1])
                    };
                }
            }
            dp[a.len()][b.len()]
        }

        let cases: [(&[&str], &[&str]); 4] = [
            (&["a", "b", "c", "d"], &["a", "x", "c"]),
            (&["red", "lorry", "yellow", "lorry"], &["red", "red", "lorry"]),
            (&[], &["x"]),
            (&["one", "two"], &["two", "one"]),
        ];
        for (a, b) in cases {
            assert_eq!(word_edit_distance(a, b), full_table(a, b), "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn test_accuracy_percent_rounds() {
        assert_eq!(accuracy_percent(0.0), 100);
        assert_eq!(accuracy_percent(1.0 / 3.0), 67);
        assert_eq!(accuracy_percent(1.5), 0);
    }
}
