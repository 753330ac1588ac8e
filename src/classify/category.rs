//! Category codes: a compact summary of an entity's evidence shape
//!
//! Naming rule: `[Xw][-Yl][-Zml][-Zmw]`, zero roles omitted, where
//! - `w`  writing-system index (the writing index and the single-script index pooled)
//! - `l`  language index
//! - `ml` mapping table, language half
//! - `mw` mapping table, writing half
//!
//! and the digit is `1` for exactly one distinct assertion, `2` for two or more.

use crate::evidence::{EvidenceRecord, RoleHint, SourceOrigin};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Sentinel code for an entity with no evidence in any role
pub const EMPTY_CODE: &str = "empty";

/// Evidence roles in canonical code order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceRole {
    WritingIndex,
    LanguageIndex,
    MappingLanguage,
    MappingWriting,
}

impl EvidenceRole {
    pub const ORDER: [EvidenceRole; 4] = [
        EvidenceRole::WritingIndex,
        EvidenceRole::LanguageIndex,
        EvidenceRole::MappingLanguage,
        EvidenceRole::MappingWriting,
    ];

    pub fn suffix(&self) -> &'static str {
        match self {
            EvidenceRole::WritingIndex => "w",
            EvidenceRole::LanguageIndex => "l",
            EvidenceRole::MappingLanguage => "ml",
            EvidenceRole::MappingWriting => "mw",
        }
    }

    /// Role a record counts towards
    pub fn of(record: &EvidenceRecord) -> EvidenceRole {
        match (record.source_origin, record.role_hint) {
            (SourceOrigin::MappingTable, RoleHint::Language) => EvidenceRole::MappingLanguage,
            (SourceOrigin::MappingTable, _) => EvidenceRole::MappingWriting,
            (SourceOrigin::LanguageIndex, _) => EvidenceRole::LanguageIndex,
            (SourceOrigin::WritingIndex | SourceOrigin::SingleScriptIndex, _) => {
                EvidenceRole::WritingIndex
            }
        }
    }

    fn from_suffix(suffix: &str) -> Option<EvidenceRole> {
        EvidenceRole::ORDER
            .into_iter()
            .find(|role| role.suffix() == suffix)
    }
}

/// Single vs. multiple assertions; higher multiplicities are not tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Multiplicity {
    Single,
    Multiple,
}

impl Multiplicity {
    pub fn from_count(count: usize) -> Option<Multiplicity> {
        match count {
            0 => None,
            1 => Some(Multiplicity::Single),
            _ => Some(Multiplicity::Multiple),
        }
    }

    fn digit(&self) -> char {
        match self {
            Multiplicity::Single => '1',
            Multiplicity::Multiple => '2',
        }
    }
}

/// Evidence shape of one entity, e.g. `1w-2l`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct CategoryCode {
    parts: Vec<(EvidenceRole, Multiplicity)>,
}

impl CategoryCode {
    /// Build the code from an evidence set.
    ///
    /// Counts distinct `(source, role hint, assertion)` keys per role, so the
    /// result does not depend on evidence order or on duplicates.
    pub fn from_evidence<'a, I>(evidence: I) -> Self
    where
        I: IntoIterator<Item = &'a EvidenceRecord>,
    {
        let mut distinct: [BTreeSet<(SourceOrigin, RoleHint, String)>; 4] = Default::default();
        for record in evidence {
            let slot = EvidenceRole::of(record) as usize;
            distinct[slot].insert(record.dedup_key());
        }

        let parts = EvidenceRole::ORDER
            .into_iter()
            .filter_map(|role| {
                Multiplicity::from_count(distinct[role as usize].len()).map(|m| (role, m))
            })
            .collect();
        Self { parts }
    }

    pub fn empty() -> Self {
        Self { parts: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn multiplicity(&self, role: EvidenceRole) -> Option<Multiplicity> {
        self.parts
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, m)| *m)
    }

    pub fn roles(&self) -> impl Iterator<Item = EvidenceRole> + '_ {
        self.parts.iter().map(|(role, _)| *role)
    }
}

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parts.is_empty() {
            return f.write_str(EMPTY_CODE);
        }
        for (i, (role, multiplicity)) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str("-")?;
            }
            write!(f, "{}{}", multiplicity.digit(), role.suffix())?;
        }
        Ok(())
    }
}

impl From<CategoryCode> for String {
    fn from(code: CategoryCode) -> Self {
        code.to_string()
    }
}

impl FromStr for CategoryCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == EMPTY_CODE {
            return Ok(CategoryCode::empty());
        }

        let mut parts = Vec::new();
        for part in s.split('-') {
            let mut chars = part.chars();
            let multiplicity = match chars.next() {
                Some('1') => Multiplicity::Single,
                Some('2') => Multiplicity::Multiple,
                _ => return Err(format!("Invalid multiplicity in category part '{}'", part)),
            };
            let role = EvidenceRole::from_suffix(chars.as_str())
                .ok_or_else(|| format!("Unknown role suffix in category part '{}'", part))?;
            if let Some((last, _)) = parts.last() {
                if role <= *last {
                    return Err(format!("Category part '{}' is out of canonical order", part));
                }
            }
            parts.push((role, multiplicity));
        }
        Ok(Self { parts })
    }
}

impl TryFrom<String> for CategoryCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
