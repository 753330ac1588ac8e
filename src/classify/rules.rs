//! Ordered type-resolution rules
//!
//! A [`RuleSet`] is a list of `(predicate, outcome)` pairs evaluated top to
//! bottom; the first rule whose predicate holds decides the entity's type.
//! The built-in cascade is [`RuleSet::standard`]. Rule sets can also be
//! loaded from YAML to reorder or replace rules without code changes.

use crate::evidence::{RoleHint, SourceOrigin};
use crate::merge::MergedEntity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Keywords whose presence in a label suggests a writing system
pub const WRITING_SYSTEM_KEYWORDS: &[&str] = &[
    "script",
    "alphabet",
    "syllabary",
    "writing",
    "cuneiform",
    "hieroglyph",
];

// =============================================================================
// OUTCOMES
// =============================================================================

/// Final type of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedType {
    Language,
    WritingSystem,
}

impl ResolvedType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolvedType::Language => "language",
            ResolvedType::WritingSystem => "writing_system",
        }
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

/// What a rule decides when it fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub resolved_type: ResolvedType,
    pub confidence: Confidence,

    /// Secondary type the entity may also play
    #[serde(default)]
    pub dual_role: Option<ResolvedType>,

    #[serde(default)]
    pub requires_review: bool,
}

impl RuleOutcome {
    pub fn new(resolved_type: ResolvedType, confidence: Confidence) -> Self {
        Self {
            resolved_type,
            confidence,
            dual_role: None,
            requires_review: false,
        }
    }

    pub fn with_dual_role(mut self, dual_role: ResolvedType) -> Self {
        self.dual_role = Some(dual_role);
        self
    }

    pub fn flagged(mut self) -> Self {
        self.requires_review = true;
        self
    }
}

// =============================================================================
// PREDICATES
// =============================================================================

/// Condition over an entity's evidence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "when", rename_all = "snake_case")]
pub enum RulePredicate {
    /// Some record carries this role hint
    HasRole { role: RoleHint },

    /// Evidence exists and every record comes from one of these sources
    OnlySources { sources: Vec<SourceOrigin> },

    /// Some label contains one of the keywords (case-insensitive substring)
    LabelKeywords { keywords: Vec<String> },

    /// More than one distinct role hint or more than one distinct source
    MixedEvidence,

    /// Always holds; use as the last rule
    Always,
}

impl RulePredicate {
    pub fn holds(&self, entity: &MergedEntity) -> bool {
        match self {
            RulePredicate::HasRole { role } => entity.has_role(*role),
            RulePredicate::OnlySources { sources } => {
                !entity.evidence.is_empty()
                    && entity
                        .evidence
                        .iter()
                        .all(|e| sources.contains(&e.source_origin))
            }
            RulePredicate::LabelKeywords { keywords } => {
                let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
                entity.evidence.iter().any(|e| {
                    let label = e.label.to_lowercase();
                    keywords.iter().any(|k| label.contains(k.as_str()))
                })
            }
            RulePredicate::MixedEvidence => {
                entity.role_hints().len() > 1 || entity.sources().len() > 1
            }
            RulePredicate::Always => true,
        }
    }
}

// =============================================================================
// RULES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRule {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub predicate: RulePredicate,
    pub outcome: RuleOutcome,
}

impl ClassificationRule {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        predicate: RulePredicate,
        outcome: RuleOutcome,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            predicate,
            outcome,
        }
    }
}

/// First-match-wins rule cascade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub rules: Vec<ClassificationRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    /// The standard seven-rule cascade.
    ///
    /// Rules 1-4 are high/medium confidence and final. Rules 5-7 are low
    /// confidence; rules 6 and 7 are flagged for review. Rule 6 defaults
    /// mixed evidence to language as a stated heuristic, not an inference.
    pub fn standard() -> Self {
        use ResolvedType::{Language, WritingSystem};

        Self::new(vec![
            ClassificationRule::new(
                "single_lang_writing_system",
                "listed as the script of a single language",
                RulePredicate::HasRole {
                    role: RoleHint::SingleLangWritingSystem,
                },
                RuleOutcome::new(WritingSystem, Confidence::High),
            ),
            ClassificationRule::new(
                "multi_lang_writing_system",
                "listed in the script table as written for several languages",
                RulePredicate::HasRole {
                    role: RoleHint::MultiLangWritingSystem,
                },
                RuleOutcome::new(WritingSystem, Confidence::High),
            ),
            ClassificationRule::new(
                "writing_index_only",
                "only the writing-system index links here",
                RulePredicate::OnlySources {
                    sources: vec![SourceOrigin::WritingIndex],
                },
                RuleOutcome::new(WritingSystem, Confidence::Medium),
            ),
            ClassificationRule::new(
                "language_index_only",
                "only the language index links here",
                RulePredicate::OnlySources {
                    sources: vec![SourceOrigin::LanguageIndex],
                },
                RuleOutcome::new(Language, Confidence::Medium),
            ),
            ClassificationRule::new(
                "writing_system_keywords",
                "a label names a script, alphabet or similar",
                RulePredicate::LabelKeywords {
                    keywords: WRITING_SYSTEM_KEYWORDS.iter().map(|k| k.to_string()).collect(),
                },
                RuleOutcome::new(WritingSystem, Confidence::Low),
            ),
            ClassificationRule::new(
                "mixed_evidence",
                "evidence spans several roles or sources; possible dual role",
                RulePredicate::MixedEvidence,
                RuleOutcome::new(Language, Confidence::Low)
                    .with_dual_role(WritingSystem)
                    .flagged(),
            ),
            ClassificationRule::new(
                "default_language",
                "nothing else applied",
                RulePredicate::Always,
                RuleOutcome::new(Language, Confidence::Low).flagged(),
            ),
        ])
    }

    /// First rule whose predicate holds for `entity`
    pub fn first_match(&self, entity: &MergedEntity) -> Option<&ClassificationRule> {
        self.rules.iter().find(|rule| rule.predicate.holds(entity))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Load a rule set from YAML (a `rules:` list)
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        let rules: RuleSet = serde_yaml::from_str(yaml)?;
        Ok(rules)
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}
