//! Omniglot catalog - entity resolution for scraped language and script links
//!
//! Reconciles the link lists scraped from the Omniglot site into one
//! deduplicated catalog of languages and writing systems, tags each entity
//! with the shape of the evidence behind it, and cross-references entities
//! to ISO 639-3 / ISO 15924 codes by approximate name matching.
//!
//! ## Pipeline
//! feeds -> Path Normalizer -> Evidence Collector -> Entity Merger
//!       -> Classification Engine -> Fuzzy Matcher -> reports
//!
//! ## Quick Start
//!
//! ```rust
//! use omniglot_catalog::{CatalogConfig, CatalogInputs, CatalogPipeline, FeedSet, RawLink};
//!
//! let inputs = CatalogInputs {
//!     feeds: FeedSet {
//!         writing_index: Some(vec![RawLink::new("ogham.htm", "Ogham")]),
//!         ..FeedSet::default()
//!     },
//!     ..CatalogInputs::default()
//! };
//! let output = CatalogPipeline::new(CatalogConfig::default())?.run(&inputs)?;
//! assert_eq!(output.category_frequency.count("1w"), 1);
//! # Ok::<(), omniglot_catalog::CatalogError>(())
//! ```

// Core error handling
pub mod error;

// Configuration (config/catalog.yaml)
pub mod config;

// Resolution stages
pub mod classify;
pub mod evidence;
pub mod matching;
pub mod merge;
pub mod path;

// Reports and the end-to-end run
pub mod pipeline;
pub mod report;

// File loaders
pub mod feeds;

pub use classify::{CategoryCode, Classification, Classifier, Confidence, ResolvedType, RuleSet};
pub use config::CatalogConfig;
pub use error::{CatalogError, Result};
pub use evidence::{EvidenceRecord, FeedSet, MappingRow, RawLink, RoleHint, SourceOrigin};
pub use matching::{CodeTable, FuzzyMatcher, MatchOutcome, MatchReport, MatchResult};
pub use merge::{merge, MergedEntity, PathCorrections};
pub use path::{CanonicalId, PathNormalizer};
pub use pipeline::{Catalog, CatalogEntry, CatalogInputs, CatalogPipeline, PipelineOutput};
