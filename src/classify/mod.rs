//! Classification engine
//!
//! Computes two things for each merged entity, both pure functions of its
//! evidence: a [`CategoryCode`] describing the evidence shape, and a resolved
//! type chosen by the first matching rule of a [`RuleSet`].

pub mod category;
pub mod rules;

pub use category::{CategoryCode, EvidenceRole, Multiplicity, EMPTY_CODE};
pub use rules::{
    ClassificationRule, Confidence, ResolvedType, RuleOutcome, RulePredicate, RuleSet,
    WRITING_SYSTEM_KEYWORDS,
};

use crate::merge::MergedEntity;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Rule name recorded when no rule in the set applies
pub const FALLBACK_RULE: &str = "no_rule_matched";

/// Rule name recorded for entities that reach the classifier with no evidence
pub const EMPTY_EVIDENCE_RULE: &str = "empty_evidence";

/// Classification of one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category_code: CategoryCode,
    pub resolved_type: ResolvedType,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dual_role: Option<ResolvedType>,
    pub requires_review: bool,
    /// Name of the rule that decided the type
    pub rule: String,
}

impl Classification {
    fn from_outcome(category_code: CategoryCode, rule: &str, outcome: &RuleOutcome) -> Self {
        Self {
            category_code,
            resolved_type: outcome.resolved_type,
            confidence: outcome.confidence,
            dual_role: outcome.dual_role,
            requires_review: outcome.requires_review,
            rule: rule.to_string(),
        }
    }

    /// Low-confidence language guess, always flagged
    fn unresolved(category_code: CategoryCode, rule: &str) -> Self {
        let outcome = RuleOutcome::new(ResolvedType::Language, Confidence::Low).flagged();
        Self::from_outcome(category_code, rule, &outcome)
    }
}

/// Applies a rule set to merged entities
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    rules: RuleSet,
}

impl Classifier {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn classify(&self, entity: &MergedEntity) -> Classification {
        let code = CategoryCode::from_evidence(&entity.evidence);

        if entity.evidence.is_empty() {
            warn!(entity = %entity.id, "Entity has no evidence, flagging for review");
            return Classification::unresolved(code, EMPTY_EVIDENCE_RULE);
        }

        match self.rules.first_match(entity) {
            Some(rule) => Classification::from_outcome(code, &rule.name, &rule.outcome),
            None => Classification::unresolved(code, FALLBACK_RULE),
        }
    }
}
