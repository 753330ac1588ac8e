//! End-to-end catalog run
//!
//! ```text
//! feeds ─► EvidenceCollector ─► merge ─► Classifier ─► BatchMatcher
//!             (normalize)      (correct)                (ISO tables)
//! ```
//!
//! Every stage is a pure transform over the previous stage's output; all
//! inputs are loaded before the run starts. The only errors a run can
//! return come from configuration (bad site origin) or the worker pool.

use crate::classify::{Classification, Classifier};
use crate::config::CatalogConfig;
use crate::error::Result;
use crate::evidence::{EvidenceCollector, FeedSet};
use crate::matching::{BatchMatcher, CodeTable, FuzzyMatcher, MatchReport, MatchTarget};
use crate::merge::{merge, MergeOutcome, MergedEntity};
use crate::path::CanonicalId;
use crate::report::{
    low_frequency_entities, CategoryFrequency, Diagnostics, LowFrequencyEntity, PathAnalysis,
    SourceCombinations,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::info;

// =============================================================================
// CATALOG
// =============================================================================

/// One merged entity with its classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub entity: MergedEntity,
    pub classification: Classification,
}

/// The classified catalog, one entry per canonical identity in id order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Classify every merged entity as a final pass.
    pub fn classify(merged: &MergeOutcome, classifier: &Classifier) -> Self {
        let entries = merged
            .entities
            .values()
            .map(|entity| CatalogEntry {
                classification: classifier.classify(entity),
                entity: entity.clone(),
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    pub fn get(&self, id: &CanonicalId) -> Option<&CatalogEntry> {
        self.entries
            .binary_search_by(|entry| entry.entity.id.cmp(id))
            .ok()
            .map(|index| &self.entries[index])
    }

    /// Entry for a page, looked up case-insensitively and without fragment
    pub fn page(&self, absolute_path: &str) -> Option<&CatalogEntry> {
        self.get(&CanonicalId::new(absolute_path, None).folded())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries grouped by category code
    pub fn by_category(&self) -> BTreeMap<String, Vec<&CatalogEntry>> {
        let mut groups: BTreeMap<String, Vec<&CatalogEntry>> = BTreeMap::new();
        for entry in &self.entries {
            groups
                .entry(entry.classification.category_code.to_string())
                .or_default()
                .push(entry);
        }
        groups
    }

    /// Entities offered to the fuzzy matcher, labelled with their plain labels
    pub fn match_targets(&self) -> Vec<MatchTarget> {
        self.entries
            .iter()
            .map(|entry| MatchTarget {
                id: entry.entity.id.clone(),
                resolved_type: entry.classification.resolved_type,
                labels: entry.entity.labels(),
            })
            .collect()
    }

    /// SHA-256 (hex) over the canonical JSON of all entries.
    ///
    /// Only ordered collections feed the serialization, so identical input
    /// gives an identical fingerprint.
    pub fn fingerprint(&self) -> Result<String> {
        let bytes = serde_json::to_vec(&self.entries)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(hex::encode(hasher.finalize()))
    }
}

// =============================================================================
// PIPELINE
// =============================================================================

/// Everything a run consumes, fully loaded
#[derive(Debug, Clone, Default)]
pub struct CatalogInputs {
    pub feeds: FeedSet,
    /// Observed site redirects, applied after the static corrections
    pub redirects: Option<BTreeMap<String, String>>,
    pub iso639_3: Option<CodeTable>,
    pub iso15924: Option<CodeTable>,
}

/// Complete output of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub catalog: Catalog,
    pub category_frequency: CategoryFrequency,
    pub source_combinations: SourceCombinations,
    pub low_frequency: Vec<LowFrequencyEntity>,
    pub path_analysis: PathAnalysis,
    pub match_report: MatchReport,
    pub diagnostics: Diagnostics,
    pub fingerprint: String,
}

pub struct CatalogPipeline {
    config: CatalogConfig,
}

impl CatalogPipeline {
    pub fn new(config: CatalogConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn run(&self, inputs: &CatalogInputs) -> Result<PipelineOutput> {
        let config = &self.config;

        let normalizer = config.path_normalizer()?;
        let collection = EvidenceCollector::new(
            &normalizer,
            &config.paths.base_contexts,
            config.collection.min_mapping_rows,
        )
        .collect(&inputs.feeds);

        let corrections = config.path_corrections(&normalizer, inputs.redirects.as_ref());
        let merged = merge(&collection.records, &corrections);

        let catalog = Catalog::classify(&merged, &Classifier::new(config.rule_set()));

        let mut matcher = BatchMatcher::new(&config.matching);
        for table in [&inputs.iso639_3, &inputs.iso15924].into_iter().flatten() {
            matcher = matcher.with_matcher(FuzzyMatcher::new(table, &config.matching));
        }
        let match_report = matcher.run(&catalog.match_targets())?;

        let category_frequency = CategoryFrequency::from_catalog(&catalog);
        let source_combinations = SourceCombinations::from_catalog(&catalog);
        let low_frequency = low_frequency_entities(
            &catalog,
            &source_combinations,
            config.reporting.low_frequency_below,
        );
        let path_analysis = PathAnalysis::new(&collection, &merged);
        let diagnostics = Diagnostics::new(&collection, &merged, &catalog, &match_report);
        let fingerprint = catalog.fingerprint()?;

        info!(
            entities = catalog.len(),
            categories = category_frequency.codes.len(),
            requires_review = diagnostics.requires_review.len(),
            fingerprint = %fingerprint,
            "Catalog built"
        );

        Ok(PipelineOutput {
            catalog,
            category_frequency,
            source_combinations,
            low_frequency,
            path_analysis,
            match_report,
            diagnostics,
            fingerprint,
        })
    }
}
