//! External standard code tables
//!
//! Two tables are supported: ISO 639-3 (languages; print name plus an
//! optional inverted name) and ISO 15924 (scripts; English name plus an
//! optional alias). Each code carries one or two name variants.

use crate::classify::ResolvedType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeStandard {
    #[serde(rename = "iso639_3")]
    Iso639_3,
    Iso15924,
}

impl CodeStandard {
    /// Entity type whose labels are matched against this standard
    pub fn target_type(&self) -> ResolvedType {
        match self {
            CodeStandard::Iso639_3 => ResolvedType::Language,
            CodeStandard::Iso15924 => ResolvedType::WritingSystem,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CodeStandard::Iso639_3 => "iso639_3",
            CodeStandard::Iso15924 => "iso15924",
        }
    }
}

impl fmt::Display for CodeStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which name column a variant came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameField {
    PrintName,
    InvertedName,
    EnglishName,
    Alias,
}

/// One code and its name variants, primary name first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeEntry {
    pub code: String,
    pub names: Vec<(NameField, String)>,
}

impl CodeEntry {
    fn new(code: &str, primary: (NameField, &str), alternate: Option<(NameField, &str)>) -> Self {
        let mut names = vec![(primary.0, primary.1.trim().to_string())];
        if let Some((field, name)) = alternate {
            let name = name.trim();
            if !name.is_empty() && name != names[0].1 {
                names.push((field, name.to_string()));
            }
        }
        names.retain(|(_, name)| !name.is_empty());
        Self {
            code: code.trim().to_string(),
            names,
        }
    }
}

/// A code table keyed by code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeTable {
    pub standard: CodeStandard,
    entries: BTreeMap<String, CodeEntry>,
}

impl CodeTable {
    pub fn new(standard: CodeStandard) -> Self {
        Self {
            standard,
            entries: BTreeMap::new(),
        }
    }

    /// ISO 639-3 table from `(code, print_name, inverted_name)` rows
    pub fn iso639_3<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = (S, S, Option<S>)>,
        S: AsRef<str>,
    {
        let mut table = Self::new(CodeStandard::Iso639_3);
        for (code, print_name, inverted) in rows {
            table.insert(CodeEntry::new(
                code.as_ref(),
                (NameField::PrintName, print_name.as_ref()),
                inverted
                    .as_ref()
                    .map(|n| (NameField::InvertedName, n.as_ref())),
            ));
        }
        table
    }

    /// ISO 15924 table from `(code, english_name, alias)` rows
    pub fn iso15924<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = (S, S, Option<S>)>,
        S: AsRef<str>,
    {
        let mut table = Self::new(CodeStandard::Iso15924);
        for (code, english_name, alias) in rows {
            table.insert(CodeEntry::new(
                code.as_ref(),
                (NameField::EnglishName, english_name.as_ref()),
                alias.as_ref().map(|n| (NameField::Alias, n.as_ref())),
            ));
        }
        table
    }

    /// Add an entry; entries with an empty code or no names are ignored.
    ///
    /// The ISO 639-3 name index lists some codes on several rows, so a
    /// repeated code adds its new name variants to the existing entry.
    pub fn insert(&mut self, entry: CodeEntry) {
        if entry.code.is_empty() || entry.names.is_empty() {
            return;
        }
        match self.entries.get_mut(&entry.code) {
            Some(existing) => {
                for variant in entry.names {
                    if !existing.names.iter().any(|(_, name)| *name == variant.1) {
                        existing.names.push(variant);
                    }
                }
            }
            None => {
                self.entries.insert(entry.code.clone(), entry);
            }
        }
    }

    pub fn get(&self, code: &str) -> Option<&CodeEntry> {
        self.entries.get(code)
    }

    /// Entries in code order
    pub fn entries(&self) -> impl Iterator<Item = &CodeEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
