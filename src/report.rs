//! Catalog statistics and diagnostics
//!
//! Everything here is derived from a finished run and is read-only: the
//! category frequency table, source-combination statistics, path analysis,
//! and the diagnostics report (anomalies, confidence breakdown, flags,
//! unmapped counts).

use crate::classify::{Confidence, ResolvedType};
use crate::evidence::{Anomaly, AnomalyKind, Collection, SourceOrigin};
use crate::matching::MatchReport;
use crate::merge::MergeOutcome;
use crate::path::CanonicalId;
use crate::pipeline::{Catalog, CatalogEntry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

// =============================================================================
// CATEGORY FREQUENCY
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeCount {
    pub code: String,
    pub count: usize,
}

/// Entities per category code, most frequent first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFrequency {
    pub total_entities: usize,
    pub codes: Vec<CodeCount>,
}

impl CategoryFrequency {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let codes = catalog
            .by_category()
            .into_iter()
            .map(|(code, entries)| CodeCount {
                code,
                count: entries.len(),
            })
            .collect();
        Self {
            total_entities: catalog.len(),
            codes: sorted_by_count(codes),
        }
    }

    pub fn count(&self, code: &str) -> usize {
        self.codes
            .iter()
            .find(|c| c.code == code)
            .map_or(0, |c| c.count)
    }
}

fn sorted_by_count(mut codes: Vec<CodeCount>) -> Vec<CodeCount> {
    codes.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.code.cmp(&b.code)));
    codes
}

// =============================================================================
// SOURCE COMBINATIONS
// =============================================================================

/// `source:role` key → number of records with that key
pub type Combination = BTreeMap<String, usize>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinationCount {
    pub combination: Combination,
    pub frequency: usize,
}

/// How often each multiset of `source:role` keys occurs across entities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCombinations {
    pub total_entities: usize,
    pub unique_combinations: usize,
    /// Most frequent first, ties by combination
    pub combinations: Vec<CombinationCount>,
    pub role_totals: BTreeMap<String, usize>,
}

/// Combination of one entity's evidence
pub fn combination_of(entry: &CatalogEntry) -> Combination {
    let mut combination = Combination::new();
    for record in &entry.entity.evidence {
        *combination.entry(record.role_key()).or_default() += 1;
    }
    combination
}

impl SourceCombinations {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut frequency: BTreeMap<Combination, usize> = BTreeMap::new();
        let mut role_totals: BTreeMap<String, usize> = BTreeMap::new();

        for entry in catalog.entries() {
            let combination = combination_of(entry);
            for (role, count) in &combination {
                *role_totals.entry(role.clone()).or_default() += count;
            }
            *frequency.entry(combination).or_default() += 1;
        }

        let mut combinations: Vec<CombinationCount> = frequency
            .into_iter()
            .map(|(combination, frequency)| CombinationCount {
                combination,
                frequency,
            })
            .collect();
        combinations.sort_by(|a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then_with(|| a.combination.cmp(&b.combination))
        });

        Self {
            total_entities: catalog.len(),
            unique_combinations: combinations.len(),
            combinations,
            role_totals,
        }
    }

    pub fn frequency_of(&self, combination: &Combination) -> usize {
        self.combinations
            .iter()
            .find(|c| c.combination == *combination)
            .map_or(0, |c| c.frequency)
    }
}

/// An entity whose source combination is rare
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowFrequencyEntity {
    pub id: CanonicalId,
    pub combination: Combination,
    pub frequency: usize,
    /// `source:label` for every record
    pub sources: Vec<String>,
}

/// Entities whose combination occurs on fewer than `below` entities,
/// ordered by frequency then id.
pub fn low_frequency_entities(
    catalog: &Catalog,
    combinations: &SourceCombinations,
    below: usize,
) -> Vec<LowFrequencyEntity> {
    let mut rare: Vec<LowFrequencyEntity> = catalog
        .entries()
        .filter_map(|entry| {
            let combination = combination_of(entry);
            let frequency = combinations.frequency_of(&combination);
            (frequency < below).then(|| LowFrequencyEntity {
                id: entry.entity.id.clone(),
                combination,
                frequency,
                sources: entry
                    .entity
                    .evidence
                    .iter()
                    .map(|r| format!("{}:{}", r.source_origin.feed_name(), r.assertion()))
                    .collect(),
            })
        })
        .collect();
    rare.sort_by(|a, b| a.frequency.cmp(&b.frequency).then_with(|| a.id.cmp(&b.id)));
    rare
}

// =============================================================================
// PATH ANALYSIS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathAnalysis {
    pub links_seen: usize,
    /// Malformed and off-site links together
    pub links_dropped: usize,
    pub links_off_site: usize,
    pub records_collected: usize,
    pub records_by_source: BTreeMap<SourceOrigin, usize>,
    pub aliased_extension_links: usize,
    pub entities: usize,
    pub fragment_entities: usize,
    /// Distinct pages once fragments are ignored
    pub base_pages: usize,
}

impl PathAnalysis {
    pub fn new(collection: &Collection, merged: &MergeOutcome) -> Self {
        let mut records_by_source = BTreeMap::new();
        for resolved in &collection.records {
            *records_by_source
                .entry(resolved.record.source_origin)
                .or_default() += 1;
        }

        let base_pages: BTreeSet<&str> = merged.entities.keys().map(|id| id.base_path()).collect();

        Self {
            links_seen: collection.links_seen,
            links_dropped: collection.dropped_links(),
            links_off_site: collection.off_site_links(),
            records_collected: collection.records.len(),
            records_by_source,
            aliased_extension_links: collection.aliased_extension_links,
            entities: merged.entities.len(),
            fragment_entities: merged.entities.keys().filter(|id| id.is_fragment()).count(),
            base_pages: base_pages.len(),
        }
    }
}

// =============================================================================
// DIAGNOSTICS
// =============================================================================

/// Data-quality report produced by every run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub anomalies: Vec<Anomaly>,
    pub anomaly_counts: BTreeMap<AnomalyKind, usize>,
    pub missing_feeds: Vec<SourceOrigin>,
    pub dropped_links: usize,
    pub corrections_applied: usize,
    pub redirects_applied: usize,
    pub duplicates_skipped: usize,
    pub by_type: BTreeMap<ResolvedType, usize>,
    pub confidence: BTreeMap<Confidence, usize>,
    pub by_rule: BTreeMap<String, usize>,
    pub dual_role: usize,
    pub requires_review: Vec<CanonicalId>,
    pub type_conflicts: Vec<CanonicalId>,
    pub unmapped: BTreeMap<ResolvedType, usize>,
}

impl Diagnostics {
    pub fn new(
        collection: &Collection,
        merged: &MergeOutcome,
        catalog: &Catalog,
        matches: &MatchReport,
    ) -> Self {
        let mut diagnostics = Self {
            anomalies: collection.anomalies.clone(),
            missing_feeds: collection.missing_feeds.clone(),
            dropped_links: collection.dropped_links(),
            corrections_applied: merged.corrections_applied,
            redirects_applied: merged.redirects_applied,
            duplicates_skipped: merged.duplicates_skipped,
            ..Self::default()
        };

        for entry in catalog.entries() {
            let classification = &entry.classification;
            if classification.category_code.is_empty() {
                diagnostics.anomalies.push(Anomaly::new(
                    AnomalyKind::EmptyEvidence,
                    None,
                    entry.entity.id.to_string(),
                ));
            }
            *diagnostics
                .by_type
                .entry(classification.resolved_type)
                .or_default() += 1;
            *diagnostics
                .confidence
                .entry(classification.confidence)
                .or_default() += 1;
            *diagnostics
                .by_rule
                .entry(classification.rule.clone())
                .or_default() += 1;
            if classification.dual_role.is_some() {
                diagnostics.dual_role += 1;
            }
            if classification.requires_review {
                diagnostics.requires_review.push(entry.entity.id.clone());
            }
            if entry.entity.has_type_conflict() {
                diagnostics.type_conflicts.push(entry.entity.id.clone());
            }
        }

        for (resolved_type, counts) in &matches.summary.by_type {
            diagnostics.unmapped.insert(*resolved_type, counts.unmapped);
        }

        for anomaly in &diagnostics.anomalies {
            *diagnostics.anomaly_counts.entry(anomaly.kind).or_default() += 1;
        }
        let structural = diagnostics
            .anomalies
            .len()
            .saturating_sub(diagnostics.dropped_links);
        if structural > 0 {
            warn!(
                anomalies = structural,
                "Structural anomalies found, see diagnostics"
            );
        }
        diagnostics
    }

    pub fn anomaly_count(&self, kind: AnomalyKind) -> usize {
        self.anomaly_counts.get(&kind).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classifier;
    use crate::evidence::{EvidenceRecord, ResolvedEvidence, RoleHint};
    use crate::merge::{merge, PathCorrections};

    fn resolved(
        path: &str,
        fragment: Option<&str>,
        source: SourceOrigin,
        role: RoleHint,
        label: &str,
    ) -> ResolvedEvidence {
        ResolvedEvidence {
            id: CanonicalId::new(path, fragment.map(str::to_string)),
            record: EvidenceRecord::new(source, role, path, label),
        }
    }

    fn fixture() -> (Collection, MergeOutcome, Catalog) {
        let records = vec![
            resolved(
                "/writing/zulu.htm",
                None,
                SourceOrigin::LanguageIndex,
                RoleHint::Language,
                "Zulu",
            ),
            resolved(
                "/writing/xhosa.htm",
                None,
                SourceOrigin::LanguageIndex,
                RoleHint::Language,
                "Xhosa",
            ),
            resolved(
                "/writing/ogham.htm",
                None,
                SourceOrigin::WritingIndex,
                RoleHint::WritingSystem,
                "Ogham",
            ),
            resolved(
                "/writing/ogham.htm",
                Some("numerals"),
                SourceOrigin::WritingIndex,
                RoleHint::WritingSystem,
                "Ogham numerals",
            ),
            resolved(
                "/writing/cree.htm",
                None,
                SourceOrigin::LanguageIndex,
                RoleHint::Language,
                "Cree",
            ),
            resolved(
                "/writing/cree.htm",
                None,
                SourceOrigin::WritingIndex,
                RoleHint::WritingSystem,
                "Cree",
            ),
        ];
        let collection = Collection {
            records: records.clone(),
            links_seen: 7,
            anomalies: vec![Anomaly::new(
                AnomalyKind::MalformedLink,
                Some(SourceOrigin::LanguageIndex),
                "'#top' (Top)",
            )],
            ..Collection::default()
        };
        let merged = merge(&records, &PathCorrections::default());
        let catalog = Catalog::classify(&merged, &Classifier::default());
        (collection, merged, catalog)
    }

    #[test]
    fn test_category_frequency_sorted_by_count_then_code() {
        let (_, _, catalog) = fixture();
        let frequency = CategoryFrequency::from_catalog(&catalog);
        let codes: Vec<(&str, usize)> = frequency
            .codes
            .iter()
            .map(|c| (c.code.as_str(), c.count))
            .collect();
        assert_eq!(codes, vec![("1l", 2), ("1w", 2), ("1w-1l", 1)]);
        assert_eq!(frequency.total_entities, 5);
    }

    #[test]
    fn test_source_combinations() {
        let (_, _, catalog) = fixture();
        let stats = SourceCombinations::from_catalog(&catalog);
        assert_eq!(stats.unique_combinations, 3);
        assert_eq!(stats.role_totals["language.csv:language"], 3);
        assert_eq!(stats.role_totals["writing.csv:writing_system"], 3);
        assert_eq!(stats.combinations[0].frequency, 2);

        let rare = low_frequency_entities(&catalog, &stats, 2);
        assert_eq!(rare.len(), 1);
        assert_eq!(rare[0].id.base_path(), "/writing/cree.htm");
        assert_eq!(rare[0].sources, vec!["language.csv:Cree", "writing.csv:Cree"]);
    }

    #[test]
    fn test_path_analysis() {
        let (collection, merged, _) = fixture();
        let analysis = PathAnalysis::new(&collection, &merged);
        assert_eq!(analysis.entities, 5);
        assert_eq!(analysis.fragment_entities, 1);
        assert_eq!(analysis.base_pages, 4);
        assert_eq!(analysis.links_dropped, 1);
        assert_eq!(analysis.links_off_site, 0);
        assert_eq!(analysis.records_by_source[&SourceOrigin::WritingIndex], 3);
    }

    #[test]
    fn test_diagnostics() {
        let (collection, merged, catalog) = fixture();
        let diagnostics =
            Diagnostics::new(&collection, &merged, &catalog, &MatchReport::default());
        assert_eq!(diagnostics.anomaly_count(AnomalyKind::MalformedLink), 1);
        assert_eq!(diagnostics.by_type[&ResolvedType::Language], 3);
        assert_eq!(diagnostics.by_type[&ResolvedType::WritingSystem], 2);
        assert_eq!(diagnostics.dual_role, 1);
        assert_eq!(diagnostics.type_conflicts.len(), 1);
        assert_eq!(diagnostics.requires_review[0].base_path(), "/writing/cree.htm");
    }
}
