//! Entity merging: one entity per canonical identity
//!
//! Merging is an explicit step over an immutable evidence list that returns
//! a fresh entity map. Records are grouped by their case-folded
//! `(absolute_path, fragment)` key after the static correction table and
//! the redirect table have been applied, each exactly once.

use crate::evidence::{EvidenceRecord, ResolvedEvidence, RoleHint, SourceOrigin};
use crate::path::{CanonicalId, PathNormalizer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info};

// =============================================================================
// PATH CORRECTIONS
// =============================================================================

/// Known-wrong absolute paths and where they should point
#[derive(Debug, Clone, Default)]
pub struct PathCorrections {
    corrections: BTreeMap<String, String>,
    redirects: BTreeMap<String, String>,
}

/// Result of correcting one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectedPath {
    pub path: String,
    pub corrected: bool,
    pub redirected: bool,
}

impl PathCorrections {
    /// Static corrections for known scrape inconsistencies
    pub fn new<I, K, V>(corrections: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self {
            corrections: fold_table(corrections),
            redirects: BTreeMap::new(),
        }
    }

    /// Add observed site redirects, consulted after the static corrections.
    pub fn with_redirects<I, K, V>(mut self, redirects: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.redirects = fold_table(redirects);
        self
    }

    /// Rewrite both tables through the normalizer's extension aliases.
    ///
    /// Lookups use normalized ids, so an entry keyed on `crees.php` must be
    /// stored as `crees.htm` to ever match. Entries that become self-maps
    /// (`mbugu.php -> mbugu.htm`) are already covered by the alias and drop
    /// out.
    pub fn canonicalized(self, normalizer: &PathNormalizer) -> Self {
        let rewrite = |table: BTreeMap<String, String>| {
            fold_table(table.into_iter().map(|(from, to)| {
                (normalizer.canonical_path(&from), normalizer.canonical_path(&to))
            }))
        };
        Self {
            corrections: rewrite(self.corrections),
            redirects: rewrite(self.redirects),
        }
    }

    pub fn len(&self) -> usize {
        self.corrections.len() + self.redirects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply the correction table, then the redirect table, one lookup each.
    pub fn apply(&self, folded_path: &str) -> CorrectedPath {
        let (path, corrected) = match self.corrections.get(folded_path) {
            Some(target) => (target.clone(), true),
            None => (folded_path.to_string(), false),
        };
        match self.redirects.get(&path) {
            Some(target) => CorrectedPath {
                path: target.clone(),
                corrected,
                redirected: true,
            },
            None => CorrectedPath {
                path,
                corrected,
                redirected: false,
            },
        }
    }
}

fn fold_table<I, K, V>(entries: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    entries
        .into_iter()
        .map(|(from, to)| {
            (
                from.as_ref().trim().to_lowercase(),
                to.as_ref().trim().to_lowercase(),
            )
        })
        .filter(|(from, to)| !from.is_empty() && !to.is_empty() && from != to)
        .collect()
}

// =============================================================================
// MERGED ENTITIES
// =============================================================================

/// All evidence about one canonical identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedEntity {
    pub id: CanonicalId,

    /// Deduplicated evidence in first-seen order
    pub evidence: Vec<EvidenceRecord>,

    /// Every raw link string that resolved to this identity
    pub raw_paths: BTreeSet<String>,
}

impl MergedEntity {
    fn new(id: CanonicalId) -> Self {
        Self {
            id,
            evidence: Vec::new(),
            raw_paths: BTreeSet::new(),
        }
    }

    /// Distinct plain labels across all evidence
    pub fn labels(&self) -> BTreeSet<String> {
        self.evidence.iter().map(|e| e.label.clone()).collect()
    }

    pub fn sources(&self) -> BTreeSet<SourceOrigin> {
        self.evidence.iter().map(|e| e.source_origin).collect()
    }

    pub fn role_hints(&self) -> BTreeSet<RoleHint> {
        self.evidence.iter().map(|e| e.role_hint).collect()
    }

    pub fn has_role(&self, role: RoleHint) -> bool {
        self.evidence.iter().any(|e| e.role_hint == role)
    }

    /// Role hints that cannot describe a single kind of thing.
    ///
    /// Compatible sets are subsets of {language, multi-language script} or
    /// of the three writing-system hints.
    pub fn has_type_conflict(&self) -> bool {
        let hints = self.role_hints();
        if hints.len() <= 1 {
            return false;
        }
        let language_side = hints
            .iter()
            .all(|h| matches!(h, RoleHint::Language | RoleHint::MultiLangWritingSystem));
        let writing_side = hints.iter().all(RoleHint::is_writing_system);
        !(language_side || writing_side)
    }

    /// Union one record in; returns false if an identical assertion exists.
    fn absorb(
        &mut self,
        record: &EvidenceRecord,
        seen: &mut HashSet<(SourceOrigin, RoleHint, String)>,
    ) -> bool {
        self.raw_paths.insert(record.raw_path.clone());
        if seen.insert(record.dedup_key()) {
            self.evidence.push(record.clone());
            true
        } else {
            false
        }
    }
}

/// Merge output plus bookkeeping for diagnostics
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub entities: BTreeMap<CanonicalId, MergedEntity>,
    pub corrections_applied: usize,
    pub redirects_applied: usize,
    pub duplicates_skipped: usize,
}

/// Group resolved evidence into one entity per identity.
pub fn merge(records: &[ResolvedEvidence], corrections: &PathCorrections) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();
    let mut seen: BTreeMap<CanonicalId, HashSet<(SourceOrigin, RoleHint, String)>> =
        BTreeMap::new();

    for resolved in records {
        let folded = resolved.id.folded();
        let corrected = corrections.apply(&folded.absolute_path);
        if corrected.corrected {
            outcome.corrections_applied += 1;
        }
        if corrected.redirected {
            outcome.redirects_applied += 1;
        }
        if corrected.corrected || corrected.redirected {
            debug!(
                from = %folded.absolute_path,
                to = %corrected.path,
                "Path corrected before merge"
            );
        }
        let key = folded.with_path(corrected.path);

        let entity = outcome
            .entities
            .entry(key.clone())
            .or_insert_with(|| MergedEntity::new(key.clone()));
        let keys = seen.entry(key).or_default();
        if !entity.absorb(&resolved.record, keys) {
            outcome.duplicates_skipped += 1;
        }
    }

    info!(
        records = records.len(),
        entities = outcome.entities.len(),
        duplicates = outcome.duplicates_skipped,
        corrections = outcome.corrections_applied,
        redirects = outcome.redirects_applied,
        "Evidence merged"
    );
    outcome
}
