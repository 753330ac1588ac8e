//! Batch dispatch of fuzzy matching across worker threads
//!
//! The eligible entities are split into static partitions of roughly
//! `total / workers`, each partition is matched on a rayon pool with no
//! shared state, and the per-partition results are concatenated and sorted
//! by entity id. The report is therefore identical for any worker count.

use super::matcher::{Candidates, FuzzyMatcher};
use crate::classify::ResolvedType;
use crate::config::MatchingConfig;
use crate::error::Result;
use crate::path::CanonicalId;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// One entity offered to the matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTarget {
    pub id: CanonicalId,
    pub resolved_type: ResolvedType,
    pub labels: BTreeSet<String>,
}

/// Why an entity was not matched at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// In-page anchor, not a page of its own
    Fragment,
    /// No code table was supplied for the entity's type
    NoCodeTable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchOutcome {
    Matched { candidates: Candidates },
    Unmapped,
    Skipped { reason: SkipReason },
}

impl MatchOutcome {
    /// Top-ranked candidate code, the one that drives mapping decisions
    pub fn top_code(&self) -> Option<&str> {
        match self {
            MatchOutcome::Matched { candidates } => {
                candidates.first().map(|c| c.candidate_code.as_str())
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMatch {
    pub entity_id: CanonicalId,
    pub resolved_type: ResolvedType,
    pub outcome: MatchOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCounts {
    pub mapped: usize,
    pub unmapped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub by_type: BTreeMap<ResolvedType, TypeCounts>,
    pub skipped_fragments: usize,
    pub skipped_no_table: usize,
}

impl MatchSummary {
    pub fn mapped(&self) -> usize {
        self.by_type.values().map(|c| c.mapped).sum()
    }

    pub fn unmapped(&self) -> usize {
        self.by_type.values().map(|c| c.unmapped).sum()
    }
}

/// Per-entity outcomes in entity-id order plus aggregate counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub entities: Vec<EntityMatch>,
    pub summary: MatchSummary,
}

impl MatchReport {
    pub fn unmapped_ids(&self) -> impl Iterator<Item = &CanonicalId> {
        self.entities
            .iter()
            .filter(|m| m.outcome == MatchOutcome::Unmapped)
            .map(|m| &m.entity_id)
    }
}

/// Routes each entity to the matcher for its resolved type
pub struct BatchMatcher {
    language: Option<FuzzyMatcher>,
    writing_system: Option<FuzzyMatcher>,
    workers: usize,
    skip_fragments: bool,
}

impl BatchMatcher {
    pub fn new(config: &MatchingConfig) -> Self {
        Self {
            language: None,
            writing_system: None,
            workers: config.workers,
            skip_fragments: config.skip_fragments,
        }
    }

    /// Register a matcher for the type its code standard covers.
    pub fn with_matcher(mut self, matcher: FuzzyMatcher) -> Self {
        match matcher.standard().target_type() {
            ResolvedType::Language => self.language = Some(matcher),
            ResolvedType::WritingSystem => self.writing_system = Some(matcher),
        }
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    fn matcher_for(&self, resolved_type: ResolvedType) -> Option<&FuzzyMatcher> {
        match resolved_type {
            ResolvedType::Language => self.language.as_ref(),
            ResolvedType::WritingSystem => self.writing_system.as_ref(),
        }
    }

    /// Match every target and build the report.
    pub fn run(&self, targets: &[MatchTarget]) -> Result<MatchReport> {
        let mut report = MatchReport::default();
        let mut eligible: Vec<&MatchTarget> = Vec::with_capacity(targets.len());

        for target in targets {
            let reason = if self.skip_fragments && target.id.is_fragment() {
                Some(SkipReason::Fragment)
            } else if self.matcher_for(target.resolved_type).is_none() {
                Some(SkipReason::NoCodeTable)
            } else {
                None
            };

            match reason {
                Some(reason) => {
                    match reason {
                        SkipReason::Fragment => report.summary.skipped_fragments += 1,
                        SkipReason::NoCodeTable => report.summary.skipped_no_table += 1,
                    }
                    report.entities.push(EntityMatch {
                        entity_id: target.id.clone(),
                        resolved_type: target.resolved_type,
                        outcome: MatchOutcome::Skipped { reason },
                    });
                }
                None => eligible.push(target),
            }
        }

        let workers = if self.workers == 0 {
            rayon::current_num_threads()
        } else {
            self.workers
        };
        let partition = eligible.len().div_ceil(workers).max(1);
        debug!(
            eligible = eligible.len(),
            workers,
            partition,
            "Dispatching fuzzy matching"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()?;
        let partitions: Vec<Vec<EntityMatch>> = pool.install(|| {
            eligible
                .par_chunks(partition)
                .map(|chunk| chunk.iter().map(|target| self.match_one(target)).collect())
                .collect()
        });

        for matched in partitions.into_iter().flatten() {
            let counts = report
                .summary
                .by_type
                .entry(matched.resolved_type)
                .or_default();
            match matched.outcome {
                MatchOutcome::Matched { .. } => counts.mapped += 1,
                _ => counts.unmapped += 1,
            }
            report.entities.push(matched);
        }
        report.entities.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));

        info!(
            mapped = report.summary.mapped(),
            unmapped = report.summary.unmapped(),
            skipped_fragments = report.summary.skipped_fragments,
            skipped_no_table = report.summary.skipped_no_table,
            "Fuzzy matching complete"
        );
        Ok(report)
    }

    fn match_one(&self, target: &MatchTarget) -> EntityMatch {
        let outcome = match self.matcher_for(target.resolved_type) {
            Some(matcher) => {
                let candidates =
                    matcher.match_labels(&target.id, target.labels.iter().map(String::as_str));
                if candidates.is_empty() {
                    MatchOutcome::Unmapped
                } else {
                    MatchOutcome::Matched { candidates }
                }
            }
            None => MatchOutcome::Skipped {
                reason: SkipReason::NoCodeTable,
            },
        };

        EntityMatch {
            entity_id: target.id.clone(),
            resolved_type: target.resolved_type,
            outcome,
        }
    }
}
