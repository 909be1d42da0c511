//! Check command - validate configuration, records and registrations

use std::{path::Path, sync::Arc};

use color_eyre::eyre::{Result, bail};
use sitemapr_core::{Config, InMemoryRepository};
use sitemapr_generator::{RegistrationOptions, Sitemap, TcpPing, paginator::page_count};

/// Validation result.
#[derive(Debug, Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Run the check command.
///
/// Loads the configuration and records, registers every configured class
/// and reports classes that would not show up in the sitemap.
pub fn run(config_path: &Path, strict: bool) -> Result<()> {
    tracing::info!(?config_path, strict, "Checking configuration and records");

    let mut result = ValidationResult::default();

    println!("Checking configuration...");
    match Config::load(config_path) {
        Ok(config) => {
            println!("  ✓ Configuration valid");
            check_config(config_path, &config, &mut result);
        }
        Err(e) => {
            result.add_error(format!("Configuration error: {e}"));
            println!("  ✗ Configuration invalid: {e}");
        }
    }

    println!();
    println!("Summary:");
    println!("  Errors:   {}", result.errors.len());
    println!("  Warnings: {}", result.warnings.len());

    if result.has_errors() {
        println!();
        println!("Errors:");
        for err in &result.errors {
            println!("  ✗ {err}");
        }
    }

    if result.has_warnings() {
        println!();
        println!("Warnings:");
        for warn in &result.warnings {
            println!("  ⚠ {warn}");
        }
    }

    if result.has_errors() {
        bail!("Validation failed with {} error(s)", result.errors.len());
    }

    if strict && result.has_warnings() {
        bail!(
            "Validation failed with {} warning(s) (strict mode)",
            result.warnings.len()
        );
    }

    println!();
    println!("✓ All checks passed");

    Ok(())
}

fn check_config(config_path: &Path, config: &Config, result: &mut ValidationResult) {
    if config.notifications.enabled && !config.is_live() {
        result.add_warning("notifications are enabled but site.mode is not live, no ping will be sent");
    }

    println!("\nChecking records...");
    let repository = match config.records_path(config_path) {
        Some(path) => match InMemoryRepository::load(&path) {
            Ok(repo) => {
                println!("  ✓ {} records loaded from {}", repo.len(), path.display());
                repo
            }
            Err(e) => {
                result.add_error(format!("Records error: {e}"));
                println!("  ✗ Records invalid: {e}");
                return;
            }
        },
        None => {
            result.add_warning("sitemap.records is not set, the sitemap will be empty");
            println!("  ⚠ No records file configured");
            InMemoryRepository::default()
        }
    };

    println!("\nChecking classes...");
    let notifier = Box::new(TcpPing::from(&config.notifications));
    let sitemap = match Sitemap::new(config, Arc::new(repository), notifier) {
        Ok(sitemap) => sitemap,
        Err(e) => {
            result.add_error(format!("Sitemap error: {e}"));
            return;
        }
    };

    for class in &config.classes {
        match sitemap.register(&class.class_id, RegistrationOptions::from(class)) {
            Ok(true) => {}
            Ok(false) if sitemap.is_registered(&class.class_id) => {
                result.add_warning(format!("class {} is listed more than once", class.class_id));
            }
            Ok(false) => {
                result.add_warning(format!("class {} has no records and is not declared", class.class_id));
                println!("  ⚠ {} unknown", class.class_id);
            }
            Err(e) => result.add_error(format!("class {}: {e}", class.class_id)),
        }
    }

    sitemap.ensure_default_class_registered();
    if config.sitemap.include_site_tree && !sitemap.is_registered(&config.sitemap.default_class) {
        result.add_warning(format!(
            "content tree class {} is unknown and will not be listed",
            config.sitemap.default_class
        ));
    }

    for class_id in sitemap.registered_classes() {
        match sitemap.select_items(&class_id) {
            Ok(items) if items.is_empty() => {
                result.add_warning(format!("class {class_id} has no publishable items"));
                println!("  ⚠ {class_id}: 0 items");
            }
            Ok(items) => println!("  ✓ {}", class_summary(&class_id, items.len())),
            Err(e) => result.add_error(format!("class {class_id}: {e}")),
        }
    }
}

fn class_summary(class_id: &str, items: usize) -> String {
    let pages = page_count(items);
    let unit = if pages == 1 { "page" } else { "pages" };
    format!("{class_id}: {items} items on {pages} {unit}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORDS: &str = r#"
classes: [Event]
records:
  - class: BlogPost
    id: 1
    last_edited: 2025-01-10T08:00:00Z
    link: /blog/first/
  - class: SiteTree
    id: 1
    last_edited: 2025-01-09T08:00:00Z
    link: /
    fields:
      ShowInSearch: true
"#;

    fn write_site(config: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::write(dir.path().join("sitemapr.toml"), config).expect("write config");
        std::fs::write(dir.path().join("records.yaml"), RECORDS).expect("write records");
        dir
    }

    #[test]
    fn test_class_summary_counts_pages() {
        assert_eq!(class_summary("BlogPost", 1), "BlogPost: 1 items on 1 page");
        assert_eq!(class_summary("BlogPost", 1000), "BlogPost: 1000 items on 1 page");
        assert_eq!(class_summary("Product", 2500), "Product: 2500 items on 3 pages");
    }

    #[test]
    fn test_check_passes() {
        let dir = write_site(
            r#"
[site]
base_url = "https://example.com"

[sitemap]
records = "records.yaml"

[[classes]]
class = "BlogPost"
"#,
        );
        assert!(run(&dir.path().join("sitemapr.toml"), true).is_ok());
    }

    #[test]
    fn test_empty_class_fails_strict_only() {
        let dir = write_site(
            r#"
[site]
base_url = "https://example.com"

[sitemap]
records = "records.yaml"

[[classes]]
class = "Event"
"#,
        );
        let config_path = dir.path().join("sitemapr.toml");
        assert!(run(&config_path, false).is_ok());

        let err = run(&config_path, true).unwrap_err();
        assert!(err.to_string().contains("strict mode"));
    }

    #[test]
    fn test_bad_records_file_fails() {
        let dir = write_site(
            r#"
[site]
base_url = "https://example.com"

[sitemap]
records = "missing.yaml"
"#,
        );
        let err = run(&dir.path().join("sitemapr.toml"), false).unwrap_err();
        assert!(err.to_string().contains("1 error"));
    }

    #[test]
    fn test_invalid_config_fails() {
        let dir = write_site("[site]\nbase_url = \"example.com\"\n");
        assert!(run(&dir.path().join("sitemapr.toml"), false).is_err());
    }
}
