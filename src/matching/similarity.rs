//! String similarity metrics
//!
//! The default metric is the Ratcliff/Obershelp "gestalt" ratio:
//! `2 * M / T`, where `M` is the number of characters in the matching
//! blocks found by recursively taking the longest common substring, and `T`
//! is the combined length of both strings. Ties between equally long common
//! substrings go to the one starting earliest in `a`, then earliest in `b`.

use serde::{Deserialize, Serialize};

/// Metric used to score a label against a name variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    #[default]
    RatcliffObershelp,
    JaroWinkler,
}

impl SimilarityMetric {
    /// Similarity in `0.0..=1.0`
    pub fn score(&self, a: &str, b: &str) -> f64 {
        match self {
            SimilarityMetric::RatcliffObershelp => ratcliff_obershelp(a, b),
            SimilarityMetric::JaroWinkler => strsim::jaro_winkler(a, b),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityMetric::RatcliffObershelp => "ratcliff_obershelp",
            SimilarityMetric::JaroWinkler => "jaro_winkler",
        }
    }
}

/// Ratcliff/Obershelp ratio over Unicode scalar values.
///
/// Two empty strings are identical (1.0).
pub fn ratcliff_obershelp(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

/// Sum of the matching block sizes
fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }
    matched
}

/// Longest common substring of `a[alo..ahi]` and `b[blo..bhi]`.
///
/// Returns `(start_in_a, start_in_b, length)`; the earliest such block wins.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best) = (alo, blo, 0);
    let width = bhi.saturating_sub(blo) + 1;

    // prev[k] / current[k]: length of the common run ending at b[blo + k - 1]
    let mut prev = vec![0usize; width];
    let mut current = vec![0usize; width];

    for i in alo..ahi {
        for j in blo..bhi {
            let k = j - blo + 1;
            if a[i] == b[j] {
                let run = prev[k - 1] + 1;
                current[k] = run;
                if run > best {
                    best_i = i + 1 - run;
                    best_j = j + 1 - run;
                    best = run;
                }
            } else {
                current[k] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut current);
    }

    (best_i, best_j, best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_identical_and_empty() {
        assert!(close(ratcliff_obershelp("devanagari", "devanagari"), 1.0));
        assert!(close(ratcliff_obershelp("", ""), 1.0));
        assert!(close(ratcliff_obershelp("abc", ""), 0.0));
        assert!(close(ratcliff_obershelp("abc", "xyz"), 0.0));
    }

    #[test]
    fn test_known_ratios() {
        assert!(close(ratcliff_obershelp("abcd", "bcde"), 0.75));
        // WIKIM + IA
        assert!(close(ratcliff_obershelp("WIKIMEDIA", "WIKIMANIA"), 14.0 / 18.0));
        assert!(close(
            ratcliff_obershelp("devanagari script", "devanagari"),
            20.0 / 27.0
        ));
    }

    #[test]
    fn test_symmetric_for_distinct_blocks() {
        let ab = ratcliff_obershelp("tifinagh", "tifinag");
        let ba = ratcliff_obershelp("tifinag", "tifinagh");
        assert!(close(ab, ba));
        assert!(close(ab, 14.0 / 15.0));
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        assert!(close(ratcliff_obershelp("ñandeva", "nandeva"), 12.0 / 14.0));
    }

    #[test]
    fn test_jaro_winkler_metric() {
        let metric = SimilarityMetric::JaroWinkler;
        assert!(close(metric.score("tamil", "tamil"), 1.0));
        assert!(metric.score("tamil", "tamul") > 0.85);
        assert!(metric.score("tamil", "zzzzz") < 0.5);
    }
}
