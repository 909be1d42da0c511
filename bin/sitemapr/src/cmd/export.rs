//! Export command - write the sitemap documents to disk

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use color_eyre::eyre::{Result, WrapErr};
use sitemapr_generator::{Sitemap, render};

/// Files written by an export.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportStats {
    pub pages: usize,
    pub classes: usize,
    pub index_written: bool,
}

/// Run the export command.
///
/// Writes the index to `<output>/sitemap.xml` and each class page to
/// `<output>/sitemap/<class>/<page>.xml`. Nothing is written for an empty
/// sitemap.
pub fn run(config_path: &Path, output: &Path) -> Result<ExportStats> {
    let start = Instant::now();
    tracing::info!(?config_path, ?output, "Starting export");

    let (_, sitemap) = crate::open_sitemap(config_path)?;
    let stats = export(&sitemap, output)?;

    println!();
    println!("  Export completed");
    println!();
    println!("  Classes:  {}", stats.classes);
    println!("  Pages:    {}", stats.pages);
    println!("  Duration: {:.2}s", start.elapsed().as_secs_f64());
    println!("  Output:   {}", output.display());
    println!();

    tracing::info!(?stats, "Export completed");
    Ok(stats)
}

/// Write every document `sitemap` would serve below `output`.
pub fn export(sitemap: &Sitemap, output: &Path) -> Result<ExportStats> {
    let entries = sitemap.build_index().wrap_err("Failed to build sitemap index")?;
    let mut stats = ExportStats::default();
    if entries.is_empty() {
        tracing::warn!("Sitemap is empty, nothing exported");
        return Ok(stats);
    }

    fs::create_dir_all(output)
        .wrap_err_with(|| format!("Failed to create {}", output.display()))?;
    write_file(
        &output.join("sitemap.xml"),
        &render::render_index(sitemap.base_url(), &entries),
    )?;
    stats.index_written = true;

    let mut last_class: Option<&str> = None;
    for entry in &entries {
        let page = entry.page_number();
        let Some(xml) = sitemap
            .render_page(&entry.class_id, page)
            .wrap_err_with(|| format!("Failed to render {} page {page}", entry.class_id))?
        else {
            continue;
        };

        write_file(&page_path(output, &entry.class_id, page), &xml)?;
        stats.pages += 1;
        if last_class != Some(entry.class_id.as_str()) {
            stats.classes += 1;
            last_class = Some(entry.class_id.as_str());
        }
    }

    Ok(stats)
}

fn page_path(output: &Path, class_id: &str, page: usize) -> PathBuf {
    output
        .join("sitemap")
        .join(class_id)
        .join(format!("{page}.xml"))
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).wrap_err_with(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Wrote sitemap document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_site(dir: &Path, records: usize) -> PathBuf {
        let mut yaml = String::from(if records == 0 { "records: []\n" } else { "records:\n" });
        for id in 1..=records {
            yaml.push_str(&format!(
                "  - {{ class: BlogPost, id: {id}, last_edited: 2025-01-10T08:00:00Z, link: /blog/{id}/ }}\n"
            ));
        }
        std::fs::write(dir.join("records.yaml"), yaml).expect("write records");

        let config_path = dir.join("sitemapr.toml");
        std::fs::write(
            &config_path,
            r#"
[site]
base_url = "https://example.com"

[sitemap]
include_site_tree = false
records = "records.yaml"

[[classes]]
class = "BlogPost"
priority = 0.8
"#,
        )
        .expect("write config");
        config_path
    }

    #[test]
    fn test_export_writes_index_and_pages() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = write_site(dir.path(), 1200);
        let output = dir.path().join("public");

        let stats = run(&config_path, &output).expect("export");

        assert_eq!(
            stats,
            ExportStats {
                pages: 2,
                classes: 1,
                index_written: true,
            }
        );

        let index = std::fs::read_to_string(output.join("sitemap.xml")).unwrap();
        assert!(index.contains("https://example.com/sitemap.xml/sitemap/BlogPost/2"));

        let first = std::fs::read_to_string(output.join("sitemap/BlogPost/1.xml")).unwrap();
        assert_eq!(first.matches("<url>").count(), 1000);
        assert!(first.contains("<priority>0.8</priority>"));

        let second = std::fs::read_to_string(output.join("sitemap/BlogPost/2.xml")).unwrap();
        assert_eq!(second.matches("<url>").count(), 200);
    }

    #[test]
    fn test_empty_sitemap_writes_nothing() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = write_site(dir.path(), 0);
        let output = dir.path().join("public");

        let stats = run(&config_path, &output).expect("export");

        assert_eq!(stats, ExportStats::default());
        assert!(!output.exists());
    }
}
