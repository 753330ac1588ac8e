//! Loading feeds and code tables from disk
//!
//! Thin I/O wrappers that turn scraper output into the in-memory inputs of
//! a run. A feed file that does not exist is not an error: the loader logs
//! a warning and returns `None`, and the run continues without that feed.

use crate::error::{CatalogError, Result};
use crate::evidence::{FeedSet, MappingRow, RawLink, SourceOrigin};
use crate::matching::CodeTable;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Redirect table file name inside an input directory
pub const REDIRECTS_FILE: &str = "redirects.csv";

/// Load a headerless two-column `href,label` feed.
///
/// Rows with fewer than two columns are skipped; values are trimmed.
pub fn load_link_csv(path: &Path) -> Result<Option<Vec<RawLink>>> {
    let Some(file) = open_optional(path)? else {
        return Ok(None);
    };
    read_link_csv(file).map(Some)
}

pub fn read_link_csv<R: Read>(reader: R) -> Result<Vec<RawLink>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut links = Vec::new();
    for row in reader.records() {
        let row = row?;
        if let (Some(href), Some(label)) = (row.get(0), row.get(1)) {
            links.push(RawLink::new(href.trim(), label.trim()));
        }
    }
    Ok(links)
}

#[derive(Debug, Deserialize)]
struct MappingEntry {
    writing: WritingCell,
    #[serde(default)]
    language: Vec<Vec<String>>,
    #[serde(default)]
    columns: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct WritingCell {
    #[serde(rename = "Link", default)]
    link: String,
    #[serde(rename = "Label", default)]
    label: String,
}

/// Load the script → languages mapping table (`langalphMap.json`).
pub fn load_mapping_table(path: &Path) -> Result<Option<Vec<MappingRow>>> {
    let Some(file) = open_optional(path)? else {
        return Ok(None);
    };
    read_mapping_table(file).map(Some)
}

pub fn read_mapping_table<R: Read>(reader: R) -> Result<Vec<MappingRow>> {
    let entries: Vec<MappingEntry> = serde_json::from_reader(reader)?;
    Ok(entries
        .into_iter()
        .map(|entry| MappingRow {
            writing: RawLink::new(entry.writing.link.trim(), entry.writing.label.trim()),
            languages: entry
                .language
                .into_iter()
                .filter_map(|pair| match pair.as_slice() {
                    [href, label, ..] => Some(RawLink::new(href.trim(), label.trim())),
                    _ => None,
                })
                .collect(),
            columns: entry.columns,
        })
        .collect())
}

/// Load all four feeds from `dir` by their scraper file names.
pub fn load_feed_dir(dir: &Path) -> Result<FeedSet> {
    let feed_path = |source: SourceOrigin| dir.join(source.feed_name());
    let feeds = FeedSet {
        language_index: load_link_csv(&feed_path(SourceOrigin::LanguageIndex))?,
        writing_index: load_link_csv(&feed_path(SourceOrigin::WritingIndex))?,
        single_script_index: load_link_csv(&feed_path(SourceOrigin::SingleScriptIndex))?,
        mapping_table: load_mapping_table(&feed_path(SourceOrigin::MappingTable))?,
    };
    info!(dir = %dir.display(), "Feeds loaded");
    Ok(feeds)
}

/// Load a JSON object of `wrong path → corrected path`.
pub fn load_corrections(path: &Path) -> Result<BTreeMap<String, String>> {
    let content = std::fs::read_to_string(path)?;
    let corrections: BTreeMap<String, String> = serde_json::from_str(&content)?;
    Ok(corrections)
}

#[derive(Debug, Deserialize)]
struct RedirectRow {
    source_path: String,
    target_path: String,
}

/// Load observed redirects (`source_path,target_path` with header).
pub fn load_redirects(path: &Path) -> Result<Option<BTreeMap<String, String>>> {
    let Some(file) = open_optional(path)? else {
        return Ok(None);
    };
    read_redirects(file).map(Some)
}

pub fn read_redirects<R: Read>(reader: R) -> Result<BTreeMap<String, String>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut redirects = BTreeMap::new();
    for row in reader.deserialize() {
        let row: RedirectRow = row?;
        let source = row.source_path.trim();
        let target = row.target_path.trim();
        if !source.is_empty() && !target.is_empty() && source != target {
            redirects.insert(source.to_string(), target.to_string());
        }
    }
    Ok(redirects)
}

/// Load the ISO 639-3 name index (tab-separated, `Id`, `Print_Name`,
/// `Inverted_Name`).
pub fn load_iso639_3(path: &Path) -> Result<CodeTable> {
    let file = std::fs::File::open(path)?;
    read_iso639_3(file)
}

pub fn read_iso639_3<R: Read>(reader: R) -> Result<CodeTable> {
    let rows = read_tsv(reader, "ISO 639-3", &["Id", "Print_Name", "Inverted_Name"])?;
    Ok(CodeTable::iso639_3(rows))
}

/// Load the ISO 15924 code list (tab-separated, `Code`, `English Name`,
/// `Alias`).
pub fn load_iso15924(path: &Path) -> Result<CodeTable> {
    let file = std::fs::File::open(path)?;
    read_iso15924(file)
}

pub fn read_iso15924<R: Read>(reader: R) -> Result<CodeTable> {
    let rows = read_tsv(reader, "ISO 15924", &["Code", "English Name", "Alias"])?;
    Ok(CodeTable::iso15924(rows))
}

/// Read `(code, name, optional alternate)` from the named columns.
fn read_tsv<R: Read>(
    reader: R,
    table: &str,
    columns: &[&str; 3],
) -> Result<Vec<(String, String, Option<String>)>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h.trim() == name);
    let (Some(code), Some(name)) = (position(columns[0]), position(columns[1])) else {
        return Err(CatalogError::malformed_feed(
            table,
            format!("missing '{}' or '{}' column", columns[0], columns[1]),
        ));
    };
    let alternate = position(columns[2]);

    let mut rows = Vec::new();
    for row in reader.records() {
        let row = row?;
        let field = |index: usize| row.get(index).map(str::trim).unwrap_or_default();
        let alternate_name = alternate
            .map(field)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        rows.push((field(code).to_string(), field(name).to_string(), alternate_name));
    }
    Ok(rows)
}

fn open_optional(path: &Path) -> Result<Option<std::fs::File>> {
    match std::fs::File::open(path) {
        Ok(file) => Ok(Some(file)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "Feed file not found");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}
