//! Turning repository records into publishable sitemap items.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use regex::Regex;
use sitemapr_core::{ChangeFreq, Linkable, Record};
use tracing::debug;

use crate::{heuristics::change_frequency, registry::ClassRegistration};

/// A URL entry of a class sitemap.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapItem {
    pub class_id: String,

    /// Canonical absolute URL, unique across all classes.
    pub absolute_url: String,

    pub last_edited: DateTime<Utc>,

    pub change_frequency: ChangeFreq,

    /// Priority (0.0 to 1.0).
    pub priority: f32,
}

/// The site's URL space: resolves links against the absolute base URL and
/// tells same-site URLs from external ones.
#[derive(Debug, Clone)]
pub struct UrlScope {
    base_url: String,
    pattern: Regex,
}

impl UrlScope {
    /// `base_url` is the absolute base URL, normally ending in `/`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, regex::Error> {
        let base_url = base_url.into();
        let pattern = Regex::new(&format!("^{}", regex::escape(&base_url)))?;
        Ok(Self { base_url, pattern })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a link against the base URL; absolute links pass through.
    pub fn absolute_url(&self, link: &str) -> String {
        if has_http_scheme(link) {
            return link.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            link.trim_start_matches('/')
        )
    }

    /// Whether the URL lives under the base URL (case-sensitive).
    pub fn contains(&self, url: &str) -> bool {
        self.pattern.is_match(url)
    }

    /// Canonical URL of a linkable record: its sitemap URL when it has one,
    /// otherwise its resolved link.
    pub fn canonical_url(&self, item: &impl Linkable) -> Option<String> {
        item.sitemap_url()
            .map(str::to_string)
            .or_else(|| item.link().map(|link| self.absolute_url(link)))
    }
}

/// Schemes are case-insensitive, so `HTTPS://` counts as absolute.
fn has_http_scheme(link: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        link.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

/// Build the sitemap items of one class from its repository records.
///
/// `records` must already be sorted by `last_edited` descending; the order is
/// kept. Records without a URL are dropped, later duplicates of a URL are
/// dropped, and URLs outside the site are dropped.
pub fn select_items(
    registration: &ClassRegistration,
    records: Vec<Record>,
    scope: &UrlScope,
    now: DateTime<Utc>,
) -> Vec<SitemapItem> {
    let fetched = records.len();
    let strategy = registration.strategy();
    let mut seen = HashSet::new();
    let mut duplicates = 0usize;
    let mut external = 0usize;

    let items: Vec<SitemapItem> = records
        .into_iter()
        .filter_map(|record| scope.canonical_url(&record).map(|url| (url, record)))
        .filter(|(url, _)| {
            let first = seen.insert(url.clone());
            duplicates += usize::from(!first);
            first
        })
        .filter(|(url, _)| {
            let inside = scope.contains(url);
            external += usize::from(!inside);
            inside
        })
        .map(|(absolute_url, record)| SitemapItem {
            class_id: registration.class_id.clone(),
            absolute_url,
            last_edited: record.last_edited,
            change_frequency: change_frequency(registration.options.frequency, &record, now),
            priority: strategy.compute(&record),
        })
        .collect();

    debug!(
        class = %registration.class_id,
        fetched,
        duplicates,
        external,
        selected = items.len(),
        "selected sitemap items"
    );
    items
}
