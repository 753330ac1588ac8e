//! Evidence collection from the four source feeds
//!
//! Every feed is an ordered list of scraped links. The collector normalizes
//! each link against the base path of the page it was scraped from, derives
//! the record's role from its feed, and drops links that name no page.
//! Missing feeds and structural surprises are reported, never fatal.

use super::{
    Anomaly, AnomalyKind, EvidenceRecord, MappingRow, RawLink, ResolvedEvidence, RoleHint,
    SourceOrigin,
};
use crate::path::{LinkRejection, PathNormalizer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Base path each feed's links are relative to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseContexts {
    pub language_index: String,
    pub writing_index: String,
    pub single_script_index: String,
    pub mapping_table: String,
}

impl Default for BaseContexts {
    fn default() -> Self {
        Self {
            language_index: "/writing/".to_string(),
            writing_index: "/writing/".to_string(),
            single_script_index: "/writing/".to_string(),
            mapping_table: "/writing/".to_string(),
        }
    }
}

impl BaseContexts {
    pub fn for_source(&self, source: SourceOrigin) -> &str {
        match source {
            SourceOrigin::LanguageIndex => &self.language_index,
            SourceOrigin::WritingIndex => &self.writing_index,
            SourceOrigin::SingleScriptIndex => &self.single_script_index,
            SourceOrigin::MappingTable => &self.mapping_table,
        }
    }
}

/// All feeds of one run; `None` marks a feed that could not be found
#[derive(Debug, Clone, Default)]
pub struct FeedSet {
    pub language_index: Option<Vec<RawLink>>,
    pub writing_index: Option<Vec<RawLink>>,
    pub single_script_index: Option<Vec<RawLink>>,
    pub mapping_table: Option<Vec<MappingRow>>,
}

/// Output of collection: evidence in feed order plus what went wrong
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub records: Vec<ResolvedEvidence>,
    pub anomalies: Vec<Anomaly>,
    pub missing_feeds: Vec<SourceOrigin>,
    /// Raw links seen across all feeds, including dropped ones
    pub links_seen: usize,
    /// Kept links whose page used an aliased extension
    pub aliased_extension_links: usize,
}

impl Collection {
    /// Links dropped for any reason, malformed or off-site
    pub fn dropped_links(&self) -> usize {
        self.anomalies
            .iter()
            .filter(|a| matches!(a.kind, AnomalyKind::MalformedLink | AnomalyKind::OffSiteLink))
            .count()
    }

    pub fn off_site_links(&self) -> usize {
        self.anomalies
            .iter()
            .filter(|a| a.kind == AnomalyKind::OffSiteLink)
            .count()
    }
}

/// Turns feeds into resolved evidence records
pub struct EvidenceCollector<'a> {
    normalizer: &'a PathNormalizer,
    contexts: &'a BaseContexts,
    min_mapping_rows: usize,
}

impl<'a> EvidenceCollector<'a> {
    pub fn new(
        normalizer: &'a PathNormalizer,
        contexts: &'a BaseContexts,
        min_mapping_rows: usize,
    ) -> Self {
        Self {
            normalizer,
            contexts,
            min_mapping_rows,
        }
    }

    /// Collect every feed in fixed order: language, writing, single-script,
    /// mapping table.
    pub fn collect(&self, feeds: &FeedSet) -> Collection {
        let mut collection = Collection::default();

        self.collect_index(
            SourceOrigin::LanguageIndex,
            feeds.language_index.as_deref(),
            &mut collection,
        );
        self.collect_index(
            SourceOrigin::WritingIndex,
            feeds.writing_index.as_deref(),
            &mut collection,
        );
        self.collect_index(
            SourceOrigin::SingleScriptIndex,
            feeds.single_script_index.as_deref(),
            &mut collection,
        );
        self.collect_mapping_table(feeds.mapping_table.as_deref(), &mut collection);

        info!(
            records = collection.records.len(),
            links_seen = collection.links_seen,
            dropped = collection.dropped_links(),
            missing_feeds = collection.missing_feeds.len(),
            "Evidence collected"
        );
        collection
    }

    fn collect_index(
        &self,
        source: SourceOrigin,
        links: Option<&[RawLink]>,
        collection: &mut Collection,
    ) {
        let Some(links) = links else {
            warn!(feed = source.feed_name(), "Source feed missing, continuing without it");
            collection.missing_feeds.push(source);
            return;
        };

        let role = index_role(source);
        for link in links {
            let record = EvidenceRecord::new(source, role, link.href.as_str(), link.label.trim());
            self.push(record, collection);
        }
    }

    fn collect_mapping_table(&self, rows: Option<&[MappingRow]>, collection: &mut Collection) {
        let source = SourceOrigin::MappingTable;
        let Some(rows) = rows else {
            warn!(feed = source.feed_name(), "Source feed missing, continuing without it");
            collection.missing_feeds.push(source);
            return;
        };

        if rows.len() < self.min_mapping_rows {
            warn!(
                rows = rows.len(),
                expected_at_least = self.min_mapping_rows,
                "Mapping table has implausibly few rows"
            );
            collection.anomalies.push(Anomaly::new(
                AnomalyKind::TooFewMappingRows,
                Some(source),
                format!(
                    "{} rows, expected at least {}",
                    rows.len(),
                    self.min_mapping_rows
                ),
            ));
        }

        for (index, row) in rows.iter().enumerate() {
            if let Some(columns) = row.columns {
                if columns != 1 && columns != 2 {
                    warn!(row = index + 1, columns, "Mapping row has unexpected column count");
                    collection.anomalies.push(Anomaly::new(
                        AnomalyKind::UnexpectedColumnCount,
                        Some(source),
                        format!("row {}: {} columns, expected 1 or 2", index + 1, columns),
                    ));
                }
            }

            let writing_label = row.writing.label.trim();
            if row.writing.href.trim().is_empty() {
                collection.anomalies.push(Anomaly::new(
                    AnomalyKind::MissingMappingWriting,
                    Some(source),
                    format!("row {}: writing cell '{}' has no link", index + 1, writing_label),
                ));
                collection.links_seen += 1;
            } else {
                let record = EvidenceRecord::new(
                    source,
                    RoleHint::MultiLangWritingSystem,
                    row.writing.href.as_str(),
                    writing_label,
                )
                .with_partner(row.languages.len().to_string());
                self.push(record, collection);
            }

            for language in &row.languages {
                let record = EvidenceRecord::new(
                    source,
                    RoleHint::Language,
                    language.href.as_str(),
                    language.label.trim(),
                )
                .with_partner(writing_label);
                self.push(record, collection);
            }
        }
    }

    fn push(&self, record: EvidenceRecord, collection: &mut Collection) {
        collection.links_seen += 1;
        let context = self.contexts.for_source(record.source_origin);

        match self.normalizer.resolve(&record.raw_path, context) {
            Ok(id) => {
                if self.normalizer.uses_aliased_extension(&record.raw_path) {
                    collection.aliased_extension_links += 1;
                }
                collection.records.push(ResolvedEvidence { id, record });
            }
            Err(rejection) => {
                let kind = match rejection {
                    LinkRejection::Malformed => AnomalyKind::MalformedLink,
                    LinkRejection::OffSite => AnomalyKind::OffSiteLink,
                };
                debug!(
                    feed = record.source_origin.feed_name(),
                    raw = %record.raw_path,
                    ?kind,
                    "Dropping link that names no on-site page"
                );
                collection.anomalies.push(Anomaly::new(
                    kind,
                    Some(record.source_origin),
                    format!("'{}' ({})", record.raw_path, record.label),
                ));
            }
        }
    }
}

/// Role implied by an index feed
fn index_role(source: SourceOrigin) -> RoleHint {
    match source {
        SourceOrigin::LanguageIndex => RoleHint::Language,
        SourceOrigin::WritingIndex => RoleHint::WritingSystem,
        SourceOrigin::SingleScriptIndex => RoleHint::SingleLangWritingSystem,
        SourceOrigin::MappingTable => RoleHint::MultiLangWritingSystem,
    }
}
