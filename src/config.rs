//! Catalog pipeline configuration
//!
//! Defines the serde schema for `config/catalog.yaml`. Every field has a
//! default, so an empty document is a valid configuration that reproduces
//! the standard pipeline.

use crate::classify::{ClassificationRule, RuleSet};
use crate::error::{CatalogError, Result};
use crate::evidence::BaseContexts;
use crate::matching::normalize::{LabelNormalizer, DEFAULT_GENERIC_TERMS};
use crate::matching::similarity::SimilarityMetric;
use crate::merge::PathCorrections;
use crate::path::{ExtensionAlias, PathNormalizer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub paths: PathsConfig,

    /// Known-wrong absolute paths and their corrections
    pub corrections: BTreeMap<String, String>,

    pub collection: CollectionConfig,
    pub classification: ClassificationConfig,
    pub reporting: ReportingConfig,
    pub matching: MatchingConfig,
}

/// How raw links are resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Origin every relative link is resolved against
    pub site_origin: String,

    /// Hosts whose absolute links count as on-site
    pub site_hosts: Vec<String>,

    pub base_contexts: BaseContexts,
    pub extension_aliases: Vec<ExtensionAlias>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            site_origin: "https://www.omniglot.com".to_string(),
            site_hosts: vec!["www.omniglot.com".to_string(), "omniglot.com".to_string()],
            base_contexts: BaseContexts::default(),
            extension_aliases: vec![ExtensionAlias::new("php", "htm")],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Fewer mapping-table rows than this is reported as an anomaly
    pub min_mapping_rows: usize,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            min_mapping_rows: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Ordered rule list; `None` uses the standard cascade
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<ClassificationRule>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    /// Source combinations seen on fewer entities than this are listed
    pub low_frequency_below: usize,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            low_frequency_below: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum accepted similarity, inclusive
    pub threshold: f64,

    /// Ranked candidates kept per entity
    pub max_candidates: usize,

    pub metric: SimilarityMetric,

    /// Worker threads for batch matching; 0 uses rayon's default
    pub workers: usize,

    /// Leave fragment (in-page anchor) entities unmatched
    pub skip_fragments: bool,

    /// Tokens dropped from labels and names before comparison
    pub generic_terms: Vec<String>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: 0.85,
            max_candidates: 3,
            metric: SimilarityMetric::default(),
            workers: 0,
            skip_fragments: true,
            generic_terms: DEFAULT_GENERIC_TERMS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl MatchingConfig {
    pub fn label_normalizer(&self) -> LabelNormalizer {
        LabelNormalizer::new(&self.generic_terms)
    }
}

/// Static corrections for known scrape inconsistencies on the source site
pub fn default_corrections() -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            "/writing/mbugu.php".to_string(),
            "/writing/mbugu.htm".to_string(),
        ),
        (
            "/writing/belanadaviri.htm".to_string(),
            "/writing/belandaviri.htm".to_string(),
        ),
    ])
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            corrections: default_corrections(),
            collection: CollectionConfig::default(),
            classification: ClassificationConfig::default(),
            reporting: ReportingConfig::default(),
            matching: MatchingConfig::default(),
        }
    }
}

impl CatalogConfig {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Load configuration from YAML string (for testing)
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: CatalogConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.matching.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(CatalogError::config(format!(
                "matching.threshold must be within 0..=1, got {}",
                threshold
            )));
        }
        if self.matching.max_candidates == 0 {
            return Err(CatalogError::config(
                "matching.max_candidates must be at least 1",
            ));
        }
        if let Some(rules) = &self.classification.rules {
            if rules.is_empty() {
                return Err(CatalogError::config(
                    "classification.rules is present but empty",
                ));
            }
        }
        if self.paths.base_contexts.language_index.is_empty()
            || self.paths.base_contexts.writing_index.is_empty()
            || self.paths.base_contexts.single_script_index.is_empty()
            || self.paths.base_contexts.mapping_table.is_empty()
        {
            return Err(CatalogError::config("paths.base_contexts must not be empty"));
        }
        Ok(())
    }

    pub fn path_normalizer(&self) -> Result<PathNormalizer> {
        PathNormalizer::new(
            &self.paths.site_origin,
            &self.paths.site_hosts,
            self.paths.extension_aliases.clone(),
        )
    }

    /// Correction table, optionally extended with observed redirects.
    ///
    /// Both tables go through `normalizer`'s extension aliases so their keys
    /// line up with normalized ids.
    pub fn path_corrections(
        &self,
        normalizer: &PathNormalizer,
        redirects: Option<&BTreeMap<String, String>>,
    ) -> PathCorrections {
        let corrections = PathCorrections::new(&self.corrections);
        let corrections = match redirects {
            Some(redirects) => corrections.with_redirects(redirects),
            None => corrections,
        };
        corrections.canonicalized(normalizer)
    }

    pub fn rule_set(&self) -> RuleSet {
        match &self.classification.rules {
            Some(rules) => RuleSet::new(rules.clone()),
            None => RuleSet::standard(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Confidence, ResolvedType, RulePredicate};

    #[test]
    fn test_empty_yaml_is_default() {
        let config = CatalogConfig::from_yaml("").unwrap();
        assert_eq!(config, CatalogConfig::default());
        assert_eq!(config.matching.threshold, 0.85);
        assert_eq!(config.matching.max_candidates, 3);
        assert_eq!(config.collection.min_mapping_rows, 10);
        assert_eq!(config.rule_set(), RuleSet::standard());
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let config = CatalogConfig::from_yaml(include_str!("../config/catalog.yaml")).unwrap();
        assert_eq!(config, CatalogConfig::default());
    }

    #[test]
    fn test_load_config() {
        let yaml = r#"
paths:
  site_origin: "https://example.org"
  base_contexts:
    language_index: /charts/
  extension_aliases:
    - from: php
      to: html
corrections:
  /writing/oldname.htm: /writing/newname.htm
matching:
  threshold: 0.9
  metric: jaro_winkler
  workers: 4
  generic_terms: [script]
classification:
  rules:
    - name: everything_is_a_language
      predicate:
        when: always
      outcome:
        resolved_type: language
        confidence: low
"#;
        let config = CatalogConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.paths.site_origin, "https://example.org");
        assert_eq!(config.paths.base_contexts.language_index, "/charts/");
        assert_eq!(config.paths.base_contexts.writing_index, "/writing/");
        assert_eq!(config.matching.metric, SimilarityMetric::JaroWinkler);
        assert_eq!(config.matching.max_candidates, 3); // default
        // an explicit table replaces the built-in one
        assert_eq!(config.corrections.len(), 1);

        let rules = config.rule_set();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.rules[0].predicate, RulePredicate::Always);
        assert_eq!(rules.rules[0].outcome.resolved_type, ResolvedType::Language);
        assert_eq!(rules.rules[0].outcome.confidence, Confidence::Low);
    }

    #[test]
    fn test_invalid_threshold_is_rejected() {
        let err = CatalogConfig::from_yaml("matching:\n  threshold: 1.5\n").unwrap_err();
        assert!(matches!(err, CatalogError::Config { .. }));
    }

    #[test]
    fn test_zero_candidates_is_rejected() {
        let err = CatalogConfig::from_yaml("matching:\n  max_candidates: 0\n").unwrap_err();
        assert!(err.to_string().contains("max_candidates"));
    }

    #[test]
    fn test_default_includes_corrections() {
        let config = CatalogConfig::default();
        let normalizer = config.path_normalizer().unwrap();
        let corrections = config.path_corrections(&normalizer, None);
        assert_eq!(
            corrections.apply("/writing/belanadaviri.htm").path,
            "/writing/belandaviri.htm"
        );
    }

    #[test]
    fn test_php_correction_applies_only_without_alias() {
        let mut config = CatalogConfig::default();
        let normalizer = config.path_normalizer().unwrap();
        let mbugu = normalizer.normalize("mbugu.php", "/writing/").unwrap();
        assert_eq!(mbugu.absolute_path, "/writing/mbugu.htm");
        let corrections = config.path_corrections(&normalizer, None);
        assert_eq!(corrections.apply(&mbugu.absolute_path).path, "/writing/mbugu.htm");

        config.paths.extension_aliases.clear();
        let normalizer = config.path_normalizer().unwrap();
        let mbugu = normalizer.normalize("mbugu.php", "/writing/").unwrap();
        let corrected = config
            .path_corrections(&normalizer, None)
            .apply(&mbugu.absolute_path);
        assert!(corrected.corrected);
        assert_eq!(corrected.path, "/writing/mbugu.htm");
    }

    #[test]
    fn test_php_keyed_redirects_match_normalized_paths() {
        let config = CatalogConfig::default();
        let normalizer = config.path_normalizer().unwrap();
        let redirects = BTreeMap::from([(
            "/writing/crees.php".to_string(),
            "/writing/cree.htm".to_string(),
        )]);
        let corrections = config.path_corrections(&normalizer, Some(&redirects));
        let crees = normalizer.normalize("crees.php", "/writing/").unwrap();
        assert_eq!(corrections.apply(&crees.absolute_path).path, "/writing/cree.htm");
    }
}
