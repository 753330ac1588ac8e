//! Path normalization for scraped site links
//!
//! Turns a raw `href` plus the base path of the page it was scraped from
//! into a [`CanonicalId`]: a site-root-relative path with relative segments
//! resolved, aliased extensions rewritten, and the in-page fragment split off.
//!
//! Resolution uses standard relative-URL semantics (`url::Url::join`)
//! against the configured site origin, so `../language/articles/x.htm`
//! scraped under `/writing/` resolves to `/language/articles/x.htm`.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Canonical identity of one entity: absolute path plus optional fragment.
///
/// Two ids that differ only by fragment are distinct entities that share a
/// [`CanonicalId::base_path`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CanonicalId {
    /// Site-root-relative path, e.g. `/writing/zulu.htm`
    pub absolute_path: String,

    /// In-page anchor without the leading `#`
    pub fragment: Option<String>,
}

impl CanonicalId {
    pub fn new(absolute_path: impl Into<String>, fragment: Option<String>) -> Self {
        Self {
            absolute_path: absolute_path.into(),
            fragment,
        }
    }

    /// The page this id lives on (the path without any fragment)
    pub fn base_path(&self) -> &str {
        &self.absolute_path
    }

    pub fn is_fragment(&self) -> bool {
        self.fragment.is_some()
    }

    /// Case-folded, trimmed form used as the merge key.
    pub fn folded(&self) -> Self {
        Self {
            absolute_path: self.absolute_path.trim().to_lowercase(),
            fragment: self
                .fragment
                .as_deref()
                .map(|f| f.trim().to_lowercase())
                .filter(|f| !f.is_empty()),
        }
    }

    /// Same identity, different page (used when a correction remaps the path).
    pub fn with_path(&self, absolute_path: impl Into<String>) -> Self {
        Self {
            absolute_path: absolute_path.into(),
            fragment: self.fragment.clone(),
        }
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.fragment {
            Some(fragment) => write!(f, "{}#{}", self.absolute_path, fragment),
            None => write!(f, "{}", self.absolute_path),
        }
    }
}

/// An alternate server-side extension that serves the same content as the
/// canonical markup extension (`php` → `htm` on the source site).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionAlias {
    pub from: String,
    pub to: String,
}

impl ExtensionAlias {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Rewrite `path` if its last segment ends in the aliased extension.
    fn apply(&self, path: &str) -> Option<String> {
        let suffix = format!(".{}", self.from.trim_start_matches('.'));
        let last_segment = path.rsplit('/').next().unwrap_or(path);
        if last_segment.len() <= suffix.len() {
            return None;
        }
        let lower = last_segment.to_ascii_lowercase();
        if !lower.ends_with(&suffix.to_ascii_lowercase()) {
            return None;
        }
        let stem = &path[..path.len() - suffix.len()];
        Some(format!("{}.{}", stem, self.to.trim_start_matches('.')))
    }
}

/// Split a raw link at the first `#`.
///
/// Returns the page part and the fragment; an empty fragment (`page#`) is
/// treated as no fragment.
pub fn split_fragment(raw: &str) -> (&str, Option<&str>) {
    match raw.split_once('#') {
        Some((page, fragment)) => {
            let fragment = fragment.trim();
            (page.trim(), (!fragment.is_empty()).then_some(fragment))
        }
        None => (raw.trim(), None),
    }
}

/// Why a raw link was not turned into a canonical id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRejection {
    /// Names no page: empty, a pure fragment, or unparseable
    Malformed,
    /// Well formed, but not an HTTP(S) link to the site
    OffSite,
}

/// Resolves raw links into canonical ids.
#[derive(Debug, Clone)]
pub struct PathNormalizer {
    origin: Url,
    site_hosts: Vec<String>,
    extension_aliases: Vec<ExtensionAlias>,
}

impl PathNormalizer {
    /// Build a normalizer for links scraped from `site_origin`.
    ///
    /// `site_hosts` lists additional host names whose absolute links count
    /// as on-site; the origin's own host always does.
    pub fn new(
        site_origin: &str,
        site_hosts: &[String],
        extension_aliases: Vec<ExtensionAlias>,
    ) -> crate::error::Result<Self> {
        let origin = Url::parse(site_origin)?;
        let mut hosts: Vec<String> = site_hosts.iter().map(|h| h.to_ascii_lowercase()).collect();
        if let Some(host) = origin.host_str() {
            hosts.push(host.to_ascii_lowercase());
        }
        hosts.sort();
        hosts.dedup();

        Ok(Self {
            origin,
            site_hosts: hosts,
            extension_aliases,
        })
    }

    /// Normalize `raw` as scraped from a page under `base_context`.
    ///
    /// Returns `None` for links that name no on-site page. See
    /// [`PathNormalizer::resolve`] for why a link was rejected.
    pub fn normalize(&self, raw: &str, base_context: &str) -> Option<CanonicalId> {
        self.resolve(raw, base_context).ok()
    }

    /// Resolve `raw` as scraped from a page under `base_context`.
    ///
    /// Pure fragments, empty strings and unparseable input are
    /// [`LinkRejection::Malformed`]; non-HTTP schemes and off-site hosts are
    /// [`LinkRejection::OffSite`]. The caller drops either kind.
    pub fn resolve(&self, raw: &str, base_context: &str) -> Result<CanonicalId, LinkRejection> {
        let (page, fragment) = split_fragment(raw.trim());
        if page.is_empty() {
            return Err(LinkRejection::Malformed);
        }

        let base = self
            .origin
            .join(base_context)
            .map_err(|_| LinkRejection::Malformed)?;
        let resolved = base.join(page).map_err(|_| LinkRejection::Malformed)?;
        if !self.is_on_site(&resolved) {
            return Err(LinkRejection::OffSite);
        }

        let mut absolute_path = self.apply_extension_aliases(resolved.path());
        if let Some(query) = resolved.query() {
            absolute_path.push('?');
            absolute_path.push_str(query);
        }

        Ok(CanonicalId::new(absolute_path, fragment.map(str::to_string)))
    }

    /// Rewrite the aliased extension of an already site-absolute path.
    ///
    /// Used for paths that bypass [`PathNormalizer::normalize`], such as
    /// correction and redirect table entries, so they compare equal to
    /// normalized ids. A query string is kept as is.
    pub fn canonical_path(&self, path: &str) -> String {
        let path = path.trim();
        match path.split_once('?') {
            Some((page, query)) => format!("{}?{}", self.apply_extension_aliases(page), query),
            None => self.apply_extension_aliases(path),
        }
    }

    /// True if the raw link's page ends in one of the aliased extensions.
    pub fn uses_aliased_extension(&self, raw: &str) -> bool {
        let (page, _) = split_fragment(raw);
        let page = page.split('?').next().unwrap_or(page);
        self.extension_aliases
            .iter()
            .any(|alias| alias.apply(page).is_some())
    }

    fn is_on_site(&self, url: &Url) -> bool {
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        url.host_str()
            .map(|host| {
                let host = host.to_ascii_lowercase();
                self.site_hosts.iter().any(|h| *h == host)
            })
            .unwrap_or(false)
    }

    fn apply_extension_aliases(&self, path: &str) -> String {
        self.extension_aliases
            .iter()
            .find_map(|alias| alias.apply(path))
            .unwrap_or_else(|| path.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> PathNormalizer {
        PathNormalizer::new(
            "https://www.omniglot.com",
            &["omniglot.com".to_string()],
            vec![ExtensionAlias::new("php", "htm")],
        )
        .unwrap()
    }

    #[test]
    fn test_split_fragment() {
        assert_eq!(split_fragment("zulu.htm#alphabet"), ("zulu.htm", Some("alphabet")));
        assert_eq!(split_fragment("zulu.htm"), ("zulu.htm", None));
        assert_eq!(split_fragment("zulu.htm#"), ("zulu.htm", None));
        assert_eq!(split_fragment("#top"), ("", Some("top")));
    }

    #[test]
    fn test_php_and_htm_share_identity() {
        let n = normalizer();
        let htm = n.normalize("/writing/zulu.htm#alphabet", "/writing/").unwrap();
        let php = n.normalize("/writing/zulu.php#alphabet", "/writing/").unwrap();
        assert_eq!(htm, php);
        assert_eq!(htm.absolute_path, "/writing/zulu.htm");
        assert_eq!(htm.fragment.as_deref(), Some("alphabet"));
    }

    #[test]
    fn test_relative_links_resolve_against_base() {
        let n = normalizer();
        let id = n.normalize("zulu.htm", "/writing/").unwrap();
        assert_eq!(id.absolute_path, "/writing/zulu.htm");

        let id = n
            .normalize("../language/articles/tonal.htm", "/writing/")
            .unwrap();
        assert_eq!(id.absolute_path, "/language/articles/tonal.htm");

        let id = n.normalize("pinyin.htm", "/charts/").unwrap();
        assert_eq!(id.absolute_path, "/charts/pinyin.htm");
    }

    #[test]
    fn test_pure_fragment_and_empty_are_dropped() {
        let n = normalizer();
        assert!(n.normalize("#top", "/writing/").is_none());
        assert!(n.normalize("", "/writing/").is_none());
        assert!(n.normalize("   ", "/writing/").is_none());
    }

    #[test]
    fn test_off_site_and_non_http_links_are_dropped() {
        let n = normalizer();
        assert!(n.normalize("https://en.wikipedia.org/wiki/Zulu", "/writing/").is_none());
        assert!(n.normalize("mailto:someone@example.org", "/writing/").is_none());
        assert!(n.normalize("//example.org/writing/zulu.htm", "/writing/").is_none());
    }

    #[test]
    fn test_rejections_tell_malformed_from_off_site() {
        let n = normalizer();
        assert_eq!(n.resolve("#top", "/writing/"), Err(LinkRejection::Malformed));
        assert_eq!(n.resolve("", "/writing/"), Err(LinkRejection::Malformed));
        assert_eq!(
            n.resolve("https://en.wikipedia.org/wiki/Zulu", "/writing/"),
            Err(LinkRejection::OffSite)
        );
        assert_eq!(
            n.resolve("mailto:someone@example.org", "/writing/"),
            Err(LinkRejection::OffSite)
        );
        assert!(n.resolve("zulu.htm", "/writing/").is_ok());
    }

    #[test]
    fn test_canonical_path_applies_aliases_to_absolute_paths() {
        let n = normalizer();
        assert_eq!(n.canonical_path("/writing/mbugu.php"), "/writing/mbugu.htm");
        assert_eq!(n.canonical_path(" /writing/x.PHP?lang=en "), "/writing/x.htm?lang=en");
        assert_eq!(n.canonical_path("/writing/cree.htm"), "/writing/cree.htm");
    }

    #[test]
    fn test_absolute_on_site_links_keep_their_path() {
        let n = normalizer();
        let id = n
            .normalize("https://omniglot.com/writing/cherokee.php", "/writing/")
            .unwrap();
        assert_eq!(id.absolute_path, "/writing/cherokee.htm");
    }

    #[test]
    fn test_idempotent_on_normalized_output() {
        let n = normalizer();
        let first = n.normalize("../writing/./x/../thai.php#tones", "/charts/").unwrap();
        let again = n.normalize(&first.to_string(), "/charts/").unwrap();
        assert_eq!(first, again);
        assert_eq!(first.absolute_path, "/writing/thai.htm");
    }

    #[test]
    fn test_alias_only_rewrites_last_segment_extension() {
        let n = normalizer();
        let id = n.normalize("/php/notes.htm", "/writing/").unwrap();
        assert_eq!(id.absolute_path, "/php/notes.htm");
        assert!(n.uses_aliased_extension("/writing/mbugu.php#x"));
        assert!(!n.uses_aliased_extension("/writing/mbugu.htm"));
    }

    #[test]
    fn test_folded_key() {
        let id = CanonicalId::new(" /Writing/Zulu.htm ", Some("Alphabet".to_string()));
        let folded = id.folded();
        assert_eq!(folded.absolute_path, "/writing/zulu.htm");
        assert_eq!(folded.fragment.as_deref(), Some("alphabet"));
        assert_eq!(folded.to_string(), "/writing/zulu.htm#alphabet");
    }
}
