//! End-to-end tests for the catalog pipeline
//!
//! Tests verify:
//! 1. Extension aliases and fragments resolve to one identity
//! 2. Category codes and resolved types for typical evidence shapes
//! 3. Fuzzy matching against a script table (accept and unmapped)
//! 4. Correction and redirect tables merge differently spelled pages
//! 5. Partial inputs still produce a complete catalog with diagnostics

use omniglot_catalog::evidence::AnomalyKind;
use omniglot_catalog::matching::MatchOutcome;
use omniglot_catalog::{
    CanonicalId, CatalogConfig, CatalogInputs, CatalogPipeline, CodeTable, Confidence, FeedSet,
    MappingRow, PipelineOutput, RawLink, ResolvedType, SourceOrigin,
};
use std::collections::BTreeMap;

// ============================================================================
// FIXTURES
// ============================================================================

fn run(config: CatalogConfig, inputs: &CatalogInputs) -> PipelineOutput {
    CatalogPipeline::new(config).unwrap().run(inputs).unwrap()
}

fn quiet_config() -> CatalogConfig {
    let mut config = CatalogConfig::default();
    config.collection.min_mapping_rows = 0;
    config
}

fn links(pairs: &[(&str, &str)]) -> Option<Vec<RawLink>> {
    Some(pairs.iter().map(|(h, l)| RawLink::new(*h, *l)).collect())
}

fn script_table() -> CodeTable {
    CodeTable::iso15924([
        ("Deva", "Devanagari (Nagari)", None),
        ("Latn", "Latin", None),
        ("Ogam", "Ogham", None),
    ])
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn test_php_and_htm_fragment_links_merge() {
    let inputs = CatalogInputs {
        feeds: FeedSet {
            writing_index: links(&[("/writing/zulu.htm#alphabet", "Zulu alphabet")]),
            single_script_index: links(&[("/writing/zulu.php#alphabet", "Zulu")]),
            ..FeedSet::default()
        },
        ..CatalogInputs::default()
    };
    let output = run(quiet_config(), &inputs);

    assert_eq!(output.catalog.len(), 1);
    let id = CanonicalId::new("/writing/zulu.htm", Some("alphabet".to_string()));
    let entry = output.catalog.get(&id).expect("merged fragment entity");
    assert_eq!(entry.entity.evidence.len(), 2);
    assert_eq!(entry.entity.raw_paths.len(), 2);
    assert_eq!(output.path_analysis.aliased_extension_links, 1);
    assert_eq!(output.path_analysis.fragment_entities, 1);
}

#[test]
fn test_writing_index_only_entity() {
    let inputs = CatalogInputs {
        feeds: FeedSet {
            writing_index: links(&[("ogham.htm", "Ogham")]),
            ..FeedSet::default()
        },
        ..CatalogInputs::default()
    };
    let output = run(quiet_config(), &inputs);

    let entry = output.catalog.page("/writing/ogham.htm").unwrap();
    assert_eq!(entry.classification.category_code.to_string(), "1w");
    assert_eq!(entry.classification.resolved_type, ResolvedType::WritingSystem);
    assert_eq!(entry.classification.confidence, Confidence::Medium);
    assert!(!entry.classification.requires_review);

    let combination = &output.source_combinations.combinations[0].combination;
    assert_eq!(combination.get("writing.csv:writing_system"), Some(&1));
}

#[test]
fn test_language_index_plus_mapping_language() {
    let inputs = CatalogInputs {
        feeds: FeedSet {
            language_index: links(&[("zulu.htm", "Zulu")]),
            mapping_table: Some(vec![MappingRow {
                writing: RawLink::new("latin.htm", "Latin"),
                languages: vec![RawLink::new("zulu.htm", "Zulu")],
                columns: Some(2),
            }]),
            ..FeedSet::default()
        },
        ..CatalogInputs::default()
    };
    let output = run(quiet_config(), &inputs);

    let zulu = output.catalog.page("/writing/zulu.htm").unwrap();
    assert_eq!(zulu.classification.category_code.to_string(), "1l-1ml");
    assert_eq!(zulu.classification.resolved_type, ResolvedType::Language);

    let latin = output.catalog.page("/writing/latin.htm").unwrap();
    assert_eq!(latin.classification.category_code.to_string(), "1mw");
    assert_eq!(latin.classification.resolved_type, ResolvedType::WritingSystem);
    assert_eq!(latin.classification.confidence, Confidence::High);
}

#[test]
fn test_script_label_matching() {
    let inputs = CatalogInputs {
        feeds: FeedSet {
            writing_index: links(&[
                ("devanagari.htm", "Devanagari script"),
                ("xyzzy.htm", "Xyzzyscript"),
            ]),
            ..FeedSet::default()
        },
        iso15924: Some(script_table()),
        ..CatalogInputs::default()
    };
    let output = run(quiet_config(), &inputs);
    let report = &output.match_report;

    let outcome_of = |path: &str| {
        report
            .entities
            .iter()
            .find(|m| m.entity_id.base_path() == path)
            .map(|m| m.outcome.clone())
            .unwrap()
    };

    match outcome_of("/writing/devanagari.htm") {
        MatchOutcome::Matched { candidates } => {
            assert_eq!(candidates[0].candidate_code, "Deva");
            assert!(candidates[0].score >= 0.85);
            assert_eq!(candidates[0].omniglot_label, "Devanagari script");
        }
        other => panic!("expected a match, got {:?}", other),
    }
    assert_eq!(outcome_of("/writing/xyzzy.htm"), MatchOutcome::Unmapped);

    let counts = report.summary.by_type[&ResolvedType::WritingSystem];
    assert_eq!((counts.mapped, counts.unmapped), (1, 1));
    assert_eq!(output.diagnostics.unmapped[&ResolvedType::WritingSystem], 1);
}

#[test]
fn test_correction_merges_renamed_page() {
    let mut config = quiet_config();
    config.corrections =
        BTreeMap::from([("/writing/oldname.htm".to_string(), "/writing/newname.htm".to_string())]);
    let inputs = CatalogInputs {
        feeds: FeedSet {
            language_index: links(&[("newname.htm", "New name")]),
            writing_index: links(&[("oldname.htm", "Old name")]),
            ..FeedSet::default()
        },
        ..CatalogInputs::default()
    };
    let output = run(config, &inputs);

    assert_eq!(output.catalog.len(), 1);
    let entry = output.catalog.page("/writing/newname.htm").unwrap();
    let sources: Vec<SourceOrigin> = entry.entity.sources().into_iter().collect();
    assert_eq!(sources, vec![SourceOrigin::LanguageIndex, SourceOrigin::WritingIndex]);
    assert_eq!(entry.classification.category_code.to_string(), "1w-1l");
    assert_eq!(output.diagnostics.corrections_applied, 1);
}

// ============================================================================
// ROBUSTNESS
// ============================================================================

#[test]
fn test_redirects_apply_after_corrections() {
    let inputs = CatalogInputs {
        feeds: FeedSet {
            language_index: links(&[("cree.htm", "Cree"), ("crees.htm", "Cree")]),
            ..FeedSet::default()
        },
        redirects: Some(BTreeMap::from([(
            "/writing/crees.htm".to_string(),
            "/writing/cree.htm".to_string(),
        )])),
        ..CatalogInputs::default()
    };
    let output = run(quiet_config(), &inputs);

    assert_eq!(output.catalog.len(), 1);
    assert_eq!(output.diagnostics.redirects_applied, 1);
    // same source, same label: stored once
    assert_eq!(output.diagnostics.duplicates_skipped, 1);
}

#[test]
fn test_php_keyed_redirect_merges_into_target() {
    let inputs = CatalogInputs {
        feeds: FeedSet {
            language_index: links(&[("cree.htm", "Cree"), ("crees.php", "Plains Cree")]),
            ..FeedSet::default()
        },
        redirects: Some(BTreeMap::from([(
            "/writing/crees.php".to_string(),
            "/writing/cree.htm".to_string(),
        )])),
        ..CatalogInputs::default()
    };
    let output = run(quiet_config(), &inputs);

    assert_eq!(output.catalog.len(), 1);
    assert_eq!(output.diagnostics.redirects_applied, 1);
    let cree = output.catalog.page("/writing/cree.htm").unwrap();
    assert_eq!(cree.entity.evidence.len(), 2);
    assert!(cree.entity.raw_paths.contains("crees.php"));
}

#[test]
fn test_off_site_links_are_counted_apart_from_malformed() {
    let inputs = CatalogInputs {
        feeds: FeedSet {
            writing_index: links(&[
                ("https://en.wikipedia.org/wiki/Ogham", "Ogham (Wikipedia)"),
                ("#top", "Top"),
                ("ogham.htm", "Ogham"),
            ]),
            ..FeedSet::default()
        },
        ..CatalogInputs::default()
    };
    let output = run(quiet_config(), &inputs);
    let diagnostics = &output.diagnostics;

    assert_eq!(output.catalog.len(), 1);
    assert_eq!(diagnostics.anomaly_count(AnomalyKind::OffSiteLink), 1);
    assert_eq!(diagnostics.anomaly_count(AnomalyKind::MalformedLink), 1);
    assert_eq!(diagnostics.dropped_links, 2);
    assert_eq!(output.path_analysis.links_off_site, 1);
}

#[test]
fn test_partial_feeds_and_noise_are_reported_not_fatal() {
    let inputs = CatalogInputs {
        feeds: FeedSet {
            language_index: links(&[("#top", "Top"), ("", "Blank"), ("hindi.htm", "Hindi")]),
            mapping_table: Some(vec![MappingRow {
                writing: RawLink::new("devanagari.htm", "Devanagari"),
                languages: vec![RawLink::new("hindi.htm", "Hindi")],
                columns: Some(4),
            }]),
            ..FeedSet::default()
        },
        ..CatalogInputs::default()
    };
    let output = run(CatalogConfig::default(), &inputs);
    let diagnostics = &output.diagnostics;

    assert_eq!(output.catalog.len(), 2);
    assert_eq!(diagnostics.dropped_links, 2);
    assert_eq!(
        diagnostics.missing_feeds,
        vec![SourceOrigin::WritingIndex, SourceOrigin::SingleScriptIndex]
    );
    assert_eq!(diagnostics.anomaly_count(AnomalyKind::TooFewMappingRows), 1);
    assert_eq!(diagnostics.anomaly_count(AnomalyKind::UnexpectedColumnCount), 1);

    let hindi = output.catalog.page("/writing/hindi.htm").unwrap();
    assert!(hindi.classification.requires_review);
    assert_eq!(hindi.classification.dual_role, Some(ResolvedType::WritingSystem));
}

#[test]
fn test_output_is_reproducible_and_serializable() {
    let inputs = CatalogInputs {
        feeds: FeedSet {
            language_index: links(&[("zulu.htm", "Zulu"), ("hindi.htm", "Hindi")]),
            writing_index: links(&[("latin.htm", "Latin"), ("ogham.htm", "Ogham")]),
            ..FeedSet::default()
        },
        iso15924: Some(script_table()),
        ..CatalogInputs::default()
    };
    let mut one_worker = quiet_config();
    one_worker.matching.workers = 1;
    let mut four_workers = quiet_config();
    four_workers.matching.workers = 4;

    let first = run(one_worker, &inputs);
    let second = run(four_workers, &inputs);
    assert_eq!(first.fingerprint, second.fingerprint);
    assert_eq!(first.match_report, second.match_report);

    let json = serde_json::to_value(&first).unwrap();
    for key in [
        "catalog",
        "category_frequency",
        "source_combinations",
        "path_analysis",
        "match_report",
        "diagnostics",
        "fingerprint",
    ] {
        assert!(json.get(key).is_some(), "missing '{}'", key);
    }
}
