//! Fuzzy matching of entity labels against one code table
//!
//! Every label is scored against every name variant of every code. Per
//! code, only the best `(label, variant)` pairing is kept; candidates below
//! the threshold are discarded, the rest are ranked by descending score with
//! ties broken by code, and the top `max_candidates` are returned.

use super::code_table::{CodeStandard, CodeTable, NameField};
use super::normalize::LabelNormalizer;
use super::similarity::SimilarityMetric;
use crate::config::MatchingConfig;
use crate::path::CanonicalId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Ranked candidates for one entity; usually three or fewer
pub type Candidates = SmallVec<[MatchResult; 3]>;

/// One accepted candidate code for an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub entity_id: CanonicalId,
    pub candidate_code: String,
    /// Similarity in `0.0..=1.0`
    pub score: f64,
    pub matched_field: NameField,
    /// The entity label that produced the score, as scraped
    pub omniglot_label: String,
    /// The name variant that produced the score, as listed in the table
    pub candidate_name: String,
}

/// Name variant with its normalized form computed once
#[derive(Debug, Clone)]
struct PreparedName {
    code: String,
    field: NameField,
    name: String,
    normalized: String,
}

/// Matcher bound to one code table
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    standard: CodeStandard,
    names: Vec<PreparedName>,
    normalizer: LabelNormalizer,
    metric: SimilarityMetric,
    threshold: f64,
    max_candidates: usize,
}

impl FuzzyMatcher {
    pub fn new(table: &CodeTable, config: &MatchingConfig) -> Self {
        let normalizer = config.label_normalizer();
        let names = table
            .entries()
            .flat_map(|entry| {
                entry.names.iter().map(|(field, name)| PreparedName {
                    code: entry.code.clone(),
                    field: *field,
                    name: name.clone(),
                    normalized: normalizer.normalize(name),
                })
            })
            .filter(|prepared| !prepared.normalized.is_empty())
            .collect();

        Self {
            standard: table.standard,
            names,
            normalizer,
            metric: config.metric,
            threshold: config.threshold,
            max_candidates: config.max_candidates,
        }
    }

    pub fn standard(&self) -> CodeStandard {
        self.standard
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Rank candidate codes for `labels`.
    ///
    /// Labels are visited in the order given; pass a sorted set for fully
    /// deterministic output. An empty result means the entity is unmapped.
    pub fn match_labels<'a, I>(&self, entity_id: &CanonicalId, labels: I) -> Candidates
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut best: BTreeMap<&str, MatchResult> = BTreeMap::new();

        for label in labels {
            let normalized = self.normalizer.normalize(label);
            if normalized.is_empty() {
                continue;
            }
            for prepared in &self.names {
                let score = self.metric.score(&normalized, &prepared.normalized);
                if score < self.threshold {
                    continue;
                }
                let improves = best
                    .get(prepared.code.as_str())
                    .map_or(true, |current| score > current.score);
                if improves {
                    best.insert(
                        prepared.code.as_str(),
                        MatchResult {
                            entity_id: entity_id.clone(),
                            candidate_code: prepared.code.clone(),
                            score,
                            matched_field: prepared.field,
                            omniglot_label: label.to_string(),
                            candidate_name: prepared.name.clone(),
                        },
                    );
                }
            }
        }

        let mut ranked: Vec<MatchResult> = best.into_values().collect();
        ranked.sort_by(rank_order);
        ranked.truncate(self.max_candidates);
        ranked.into_iter().collect()
    }
}

/// Descending score, then ascending code
pub fn rank_order(a: &MatchResult, b: &MatchResult) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.candidate_code.cmp(&b.candidate_code))
}
