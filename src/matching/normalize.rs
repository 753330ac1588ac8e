//! Label normalization for fuzzy matching
//!
//! Scraped labels and standard-code names are both passed through the same
//! normalizer before comparison:
//! - Unicode NFKC fold
//! - Parenthetical asides removed (`Cree (Eastern)` → `cree`)
//! - Punctuation replaced with space
//! - Lowercase, whitespace collapsed
//! - Generic type words (`script`, `alphabet`, ...) dropped

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Parenthetical aside, including an unclosed trailing one
static PARENTHETICAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*(\)|$)").unwrap());

/// Words that name the kind of thing rather than the thing itself
pub const DEFAULT_GENERIC_TERMS: &[&str] = &[
    "script",
    "scripts",
    "alphabet",
    "syllabary",
    "abjad",
    "abugida",
    "writing",
    "system",
    "language",
    "languages",
];

/// Normalize a label without dropping generic terms.
///
/// ```
/// use omniglot_catalog::matching::normalize::normalize_label;
///
/// assert_eq!(normalize_label("Cree (Eastern)"), "cree");
/// assert_eq!(normalize_label("  Tai  Lü, New "), "tai lü new");
/// ```
pub fn normalize_label(label: &str) -> String {
    tokens(label).join(" ")
}

fn tokens(label: &str) -> Vec<String> {
    let folded: String = label.nfkc().collect();
    let without_asides = PARENTHETICAL_RE.replace_all(&folded, " ");

    let stripped: String = without_asides
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    stripped
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect()
}

/// Normalizer with a configurable generic-term list
#[derive(Debug, Clone)]
pub struct LabelNormalizer {
    generic_terms: BTreeSet<String>,
}

impl LabelNormalizer {
    pub fn new<I, S>(generic_terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            generic_terms: generic_terms
                .into_iter()
                .map(|t| normalize_label(t.as_ref()))
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Normalize `label` and drop generic terms.
    ///
    /// If only generic terms remain (`Writing`), they are kept so the label
    /// never normalizes to nothing.
    pub fn normalize(&self, label: &str) -> String {
        let tokens = tokens(label);
        let kept: Vec<&str> = tokens
            .iter()
            .map(String::as_str)
            .filter(|t| !self.generic_terms.contains(*t))
            .collect();

        if kept.is_empty() {
            tokens.join(" ")
        } else {
            kept.join(" ")
        }
    }
}

impl Default for LabelNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_GENERIC_TERMS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parentheticals_and_punctuation() {
        assert_eq!(normalize_label("Cree (Eastern)"), "cree");
        assert_eq!(normalize_label("Ge'ez / Ethiopic"), "ge ez ethiopic");
        assert_eq!(normalize_label("Naxi (Dongba"), "naxi");
        assert_eq!(normalize_label(""), "");
    }

    #[test]
    fn test_unicode_fold_and_lowercase() {
        assert_eq!(normalize_label("ＴＡＭＩＬ"), "tamil");
        assert_eq!(normalize_label("Ñandeva"), "ñandeva");
    }

    #[test]
    fn test_generic_terms_dropped() {
        let normalizer = LabelNormalizer::default();
        assert_eq!(normalizer.normalize("Devanagari script"), "devanagari");
        assert_eq!(normalizer.normalize("Cherokee Syllabary"), "cherokee");
        assert_eq!(normalizer.normalize("Xyzzyscript"), "xyzzyscript");
    }

    #[test]
    fn test_all_generic_label_is_kept() {
        let normalizer = LabelNormalizer::default();
        assert_eq!(normalizer.normalize("Writing System"), "writing system");
    }

    #[test]
    fn test_custom_generic_terms() {
        let normalizer = LabelNormalizer::new(["Script"]);
        assert_eq!(normalizer.normalize("Old Hungarian Alphabet"), "old hungarian alphabet");
        assert_eq!(normalizer.normalize("Old Hungarian Script"), "old hungarian");
    }
}
