//! XML rendering of sitemap pages and the sitemap index.

use crate::{paginator::SitemapIndexEntry, selector::SitemapItem};

/// Content type of both documents.
pub const CONTENT_TYPE: &str = r#"application/xml; charset="utf-8""#;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Absolute URL of a class sitemap page. The first page has no page suffix.
pub fn class_sitemap_url(base_url: &str, class_id: &str, page: Option<usize>) -> String {
    let base = base_url.trim_end_matches('/');
    match page {
        Some(page) => format!("{base}/sitemap.xml/sitemap/{class_id}/{page}"),
        None => format!("{base}/sitemap.xml/sitemap/{class_id}/"),
    }
}

/// Absolute URL of the sitemap index.
pub fn sitemap_index_url(base_url: &str) -> String {
    format!("{}/sitemap.xml", base_url.trim_end_matches('/'))
}

/// Render a `<urlset>` document.
pub fn render_urlset(items: &[SitemapItem]) -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push('\n');
    xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
    xml.push('\n');

    for item in items {
        xml.push_str(&url_to_xml(item));
    }

    xml.push_str("</urlset>\n");
    xml
}

fn url_to_xml(item: &SitemapItem) -> String {
    let mut xml = String::from("  <url>\n");
    xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&item.absolute_url)));
    xml.push_str(&format!(
        "    <lastmod>{}</lastmod>\n",
        item.last_edited.format("%Y-%m-%d")
    ));
    xml.push_str(&format!(
        "    <changefreq>{}</changefreq>\n",
        item.change_frequency.as_str()
    ));
    xml.push_str(&format!(
        "    <priority>{}</priority>\n",
        format_priority(item.priority)
    ));
    xml.push_str("  </url>\n");
    xml
}

/// Render a `<sitemapindex>` document pointing at each class page.
pub fn render_index(base_url: &str, entries: &[SitemapIndexEntry]) -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push('\n');
    xml.push_str(&format!(r#"<sitemapindex xmlns="{SITEMAP_NS}">"#));
    xml.push('\n');

    for entry in entries {
        let loc = class_sitemap_url(base_url, &entry.class_id, entry.page);
        xml.push_str("  <sitemap>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&loc)));
        xml.push_str(&format!(
            "    <lastmod>{}</lastmod>\n",
            entry.last_edited.format("%Y-%m-%d")
        ));
        xml.push_str("  </sitemap>\n");
    }

    xml.push_str("</sitemapindex>\n");
    xml
}

/// Priority with up to two decimals and at least one: `0.5`, `0.75`, `1.0`.
fn format_priority(priority: f32) -> String {
    let formatted = format!("{priority:.2}");
    let trimmed = formatted.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    }
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use sitemapr_core::ChangeFreq;

    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(escape_xml("<tag>"), "&lt;tag&gt;");
        assert_eq!(escape_xml("\"quoted\""), "&quot;quoted&quot;");
    }

    #[test]
    fn test_format_priority() {
        assert_eq!(format_priority(0.5), "0.5");
        assert_eq!(format_priority(0.75), "0.75");
        assert_eq!(format_priority(1.0), "1.0");
        assert_eq!(format_priority(0.1), "0.1");
        assert_eq!(format_priority(0.0), "0.0");
    }

    #[test]
    fn test_class_sitemap_url() {
        assert_eq!(
            class_sitemap_url("https://example.com/", "BlogPost", None),
            "https://example.com/sitemap.xml/sitemap/BlogPost/"
        );
        assert_eq!(
            class_sitemap_url("https://example.com", "BlogPost", Some(3)),
            "https://example.com/sitemap.xml/sitemap/BlogPost/3"
        );
        assert_eq!(sitemap_index_url("https://example.com/"), "https://example.com/sitemap.xml");
    }

    #[test]
    fn test_render_urlset() {
        let items = vec![SitemapItem {
            class_id: "Page".into(),
            absolute_url: "https://example.com/search?q=a&b".into(),
            last_edited: Utc.with_ymd_and_hms(2024, 7, 9, 8, 30, 0).unwrap(),
            change_frequency: ChangeFreq::Monthly,
            priority: 0.8,
        }];

        let xml = render_urlset(&items);

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#));
        assert!(xml.contains("<loc>https://example.com/search?q=a&amp;b</loc>"));
        assert!(xml.contains("<lastmod>2024-07-09</lastmod>"));
        assert!(xml.contains("<changefreq>monthly</changefreq>"));
        assert!(xml.contains("<priority>0.8</priority>"));
        assert!(xml.ends_with("</urlset>\n"));
    }

    #[test]
    fn test_render_index() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 9).unwrap();
        let entries = vec![
            SitemapIndexEntry {
                class_id: "Page".into(),
                page: None,
                last_edited: date,
            },
            SitemapIndexEntry {
                class_id: "Page".into(),
                page: Some(2),
                last_edited: date,
            },
        ];

        let xml = render_index("https://example.com/", &entries);

        assert!(xml.contains("<sitemapindex"));
        assert!(xml.contains("<loc>https://example.com/sitemap.xml/sitemap/Page/</loc>"));
        assert!(xml.contains("<loc>https://example.com/sitemap.xml/sitemap/Page/2</loc>"));
        assert_eq!(xml.matches("<lastmod>2024-07-09</lastmod>").count(), 2);
    }
}
