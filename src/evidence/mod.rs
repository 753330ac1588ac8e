//! Evidence records: one source feed's assertion that a page exists
//!
//! Each scraped `(href, label)` pair becomes exactly one [`EvidenceRecord`]
//! tagged with the feed it came from and the role that feed implies. Records
//! are immutable once collected; the merger only moves them into entities.

pub mod collector;

pub use collector::{BaseContexts, Collection, EvidenceCollector, FeedSet};

use crate::path::CanonicalId;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// SOURCE FEEDS
// =============================================================================

/// The four feeds scraped from the reference site
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceOrigin {
    /// Language index page (`language.csv`)
    LanguageIndex,
    /// Writing-system index page (`writing.csv`)
    WritingIndex,
    /// Scripts used by a single language (`langalphSingle.csv`)
    SingleScriptIndex,
    /// Script → languages table (`langalphMap.json`)
    MappingTable,
}

impl SourceOrigin {
    pub const ALL: [SourceOrigin; 4] = [
        SourceOrigin::LanguageIndex,
        SourceOrigin::WritingIndex,
        SourceOrigin::SingleScriptIndex,
        SourceOrigin::MappingTable,
    ];

    /// File name of the feed as produced by the scraper
    pub fn feed_name(&self) -> &'static str {
        match self {
            SourceOrigin::LanguageIndex => "language.csv",
            SourceOrigin::WritingIndex => "writing.csv",
            SourceOrigin::SingleScriptIndex => "langalphSingle.csv",
            SourceOrigin::MappingTable => "langalphMap.json",
        }
    }
}

impl fmt::Display for SourceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.feed_name())
    }
}

/// Role a record's source implies for the linked page
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleHint {
    Language,
    WritingSystem,
    SingleLangWritingSystem,
    MultiLangWritingSystem,
}

impl RoleHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleHint::Language => "language",
            RoleHint::WritingSystem => "writing_system",
            RoleHint::SingleLangWritingSystem => "single_lang_writing_system",
            RoleHint::MultiLangWritingSystem => "multi_lang_writing_system",
        }
    }

    pub fn is_writing_system(&self) -> bool {
        !matches!(self, RoleHint::Language)
    }
}

impl fmt::Display for RoleHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// RAW INPUT
// =============================================================================

/// A scraped `(href, label)` pair, before normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLink {
    pub href: String,
    pub label: String,
}

impl RawLink {
    pub fn new(href: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            label: label.into(),
        }
    }
}

/// One row of the script → languages table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRow {
    /// The writing system the row describes
    pub writing: RawLink,

    /// Languages written with it
    pub languages: Vec<RawLink>,

    /// Number of table cells the row was scraped from, when known.
    /// Rows are expected to have one or two.
    #[serde(default)]
    pub columns: Option<usize>,
}

// =============================================================================
// EVIDENCE
// =============================================================================

/// One feed's assertion about one linked page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub source_origin: SourceOrigin,
    pub role_hint: RoleHint,

    /// Link string exactly as scraped
    pub raw_path: String,

    /// Display text exactly as scraped
    pub label: String,

    /// Mapping-table pairing: the writing label for a language half, the
    /// language count for the writing half. `None` for index feeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner: Option<String>,
}

impl EvidenceRecord {
    pub fn new(
        source_origin: SourceOrigin,
        role_hint: RoleHint,
        raw_path: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            source_origin,
            role_hint,
            raw_path: raw_path.into(),
            label: label.into(),
            partner: None,
        }
    }

    pub fn with_partner(mut self, partner: impl Into<String>) -> Self {
        self.partner = Some(partner.into());
        self
    }

    /// The asserted label, qualified by the mapping pairing when present.
    ///
    /// `Hindi` using `Devanagari` and `Hindi` using `Latin` are different
    /// assertions even though both point at the same page.
    pub fn assertion(&self) -> String {
        match (&self.partner, self.role_hint) {
            (Some(count), RoleHint::MultiLangWritingSystem) => {
                format!("{}_for_{}_languages", self.label, count)
            }
            (Some(writing), _) => format!("{}_using_{}", self.label, writing),
            (None, _) => self.label.clone(),
        }
    }

    /// Key for byte-for-byte duplicate detection within an entity
    pub fn dedup_key(&self) -> (SourceOrigin, RoleHint, String) {
        (self.source_origin, self.role_hint, self.assertion())
    }

    /// `source:role` key used by the source-combination statistics.
    ///
    /// Only the language / writing-system distinction is kept, so the two
    /// halves of a mapping row get different keys.
    pub fn role_key(&self) -> String {
        let role = if self.role_hint.is_writing_system() {
            RoleHint::WritingSystem
        } else {
            RoleHint::Language
        };
        format!("{}:{}", self.source_origin.feed_name(), role.as_str())
    }
}

/// An evidence record paired with the identity its link resolved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEvidence {
    pub id: CanonicalId,
    pub record: EvidenceRecord,
}

// =============================================================================
// ANOMALIES
// =============================================================================

/// Kinds of data-quality problems reported alongside normal output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Link named no page and the record was dropped
    MalformedLink,
    /// Link pointed off the site (other host or non-HTTP scheme) and the
    /// record was dropped
    OffSiteLink,
    /// Mapping row scraped from neither one nor two cells
    UnexpectedColumnCount,
    /// Mapping table has implausibly few rows
    TooFewMappingRows,
    /// Mapping row whose writing cell carried no usable link
    MissingMappingWriting,
    /// Entity reached classification with no evidence
    EmptyEvidence,
}

/// A single reported anomaly; never fatal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceOrigin>,
    pub detail: String,
}

impl Anomaly {
    pub fn new(kind: AnomalyKind, source: Option<SourceOrigin>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            source,
            detail: detail.into(),
        }
    }
}
