//! Splitting class sitemaps into pages and describing them in the index.

use chrono::NaiveDate;

use crate::selector::SitemapItem;

/// Maximum number of URLs per sitemap page.
pub const PAGE_SIZE: usize = 1000;

/// One `<sitemap>` entry of the sitemap index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapIndexEntry {
    pub class_id: String,

    /// Page number; `None` for the first page, which needs no page suffix.
    pub page: Option<usize>,

    /// Most recent edit among the page's items.
    pub last_edited: NaiveDate,
}

impl SitemapIndexEntry {
    /// 1-based page number.
    pub fn page_number(&self) -> usize {
        self.page.unwrap_or(1)
    }
}

/// Number of pages needed for `len` items.
pub fn page_count(len: usize) -> usize {
    len.div_ceil(PAGE_SIZE)
}

/// Index entries for one class, one per non-empty page.
pub fn index_entries(class_id: &str, items: &[SitemapItem]) -> Vec<SitemapIndexEntry> {
    items
        .chunks(PAGE_SIZE)
        .enumerate()
        .filter_map(|(index, chunk)| {
            // Latest edit on the page, independent of item order.
            let latest = chunk.iter().map(|item| item.last_edited).max()?;
            let number = index + 1;
            Some(SitemapIndexEntry {
                class_id: class_id.to_string(),
                page: (number > 1).then_some(number),
                last_edited: latest.date_naive(),
            })
        })
        .collect()
}

/// The 1-based `page` of `items`. Pages out of range, including 0, are empty.
pub fn page_of(items: Vec<SitemapItem>, page: usize) -> Vec<SitemapItem> {
    let Some(offset) = page.checked_sub(1).and_then(|p| p.checked_mul(PAGE_SIZE)) else {
        return Vec::new();
    };
    items.into_iter().skip(offset).take(PAGE_SIZE).collect()
}
