//! Fuzzy matching of catalog entities to standard codes
//!
//! Language entities are matched against ISO 639-3 names and writing
//! systems against ISO 15924 names. Matching is best-effort: entities with
//! no candidate at or above the threshold are reported as unmapped.

pub mod batch;
pub mod code_table;
pub mod matcher;
pub mod normalize;
pub mod similarity;

pub use batch::{
    BatchMatcher, EntityMatch, MatchOutcome, MatchReport, MatchSummary, MatchTarget, SkipReason,
    TypeCounts,
};
pub use code_table::{CodeEntry, CodeStandard, CodeTable, NameField};
pub use matcher::{Candidates, FuzzyMatcher, MatchResult};
pub use normalize::{normalize_label, LabelNormalizer};
pub use similarity::{ratcliff_obershelp, SimilarityMetric};
