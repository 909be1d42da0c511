//! Service configuration management.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::{CoreError, Result},
    query::WhereClause,
    record::{ChangeFreq, FieldMap},
};

/// Main configuration structure for sitemapr.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Site-wide settings.
    pub site: SiteConfig,

    /// Sitemap settings.
    #[serde(default)]
    pub sitemap: SitemapConfig,

    /// Search engine notification settings.
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Classes registered at startup, in order.
    #[serde(default)]
    pub classes: Vec<ClassConfig>,
}

/// Deployment mode of the host site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteMode {
    #[default]
    Dev,
    Test,
    Live,
}

/// Site-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Absolute base URL for the site (e.g., "https://example.com").
    pub base_url: String,

    /// Deployment mode; notifications only go out in `live`.
    #[serde(default)]
    pub mode: SiteMode,
}

/// Sitemap configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitemapConfig {
    /// Whether the content tree class is registered automatically.
    #[serde(default = "default_true")]
    pub include_site_tree: bool,

    /// Name of the content tree class.
    #[serde(default = "default_class")]
    pub default_class: String,

    /// Records file for the in-memory repository, relative to the config file.
    #[serde(default)]
    pub records: Option<PathBuf>,
}

/// Search engine ping configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Whether publish events ping the search engine.
    #[serde(default)]
    pub enabled: bool,

    /// Ping host.
    #[serde(default = "default_ping_host")]
    pub host: String,

    /// Ping path.
    #[serde(default = "default_ping_path")]
    pub path: String,

    /// Ping port.
    #[serde(default = "default_ping_port")]
    pub port: u16,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address.
    #[serde(default = "default_addr")]
    pub addr: String,
}

/// A class registered from configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassConfig {
    /// Class identifier.
    #[serde(rename = "class")]
    pub class_id: String,

    #[serde(default)]
    pub filter: FieldMap,

    #[serde(default, rename = "where")]
    pub where_clause: Option<String>,

    #[serde(default)]
    pub exclude: FieldMap,

    /// Change frequency override.
    #[serde(default)]
    pub frequency: Option<ChangeFreq>,

    /// Priority override (0.0 to 1.0).
    #[serde(default)]
    pub priority: Option<f32>,

    /// Derive priority from the record's depth in its hierarchy.
    #[serde(default)]
    pub depth_priority: bool,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_class() -> String {
    "SiteTree".to_string()
}

fn default_ping_host() -> String {
    "www.google.com".to_string()
}

fn default_ping_path() -> String {
    "/webmasters/sitemaps/ping".to_string()
}

fn default_ping_port() -> u16 {
    80
}

fn default_addr() -> String {
    "127.0.0.1:3000".to_string()
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            include_site_tree: true,
            default_class: default_class(),
            records: None,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_ping_host(),
            path: default_ping_path(),
            port: default_ping_port(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

impl Config {
    /// Configuration for a site with every other setting at its default.
    pub fn for_site(base_url: impl Into<String>) -> Self {
        Self {
            site: SiteConfig {
                base_url: base_url.into(),
                mode: SiteMode::default(),
            },
            sitemap: SitemapConfig::default(),
            notifications: NotificationConfig::default(),
            server: ServerConfig::default(),
            classes: Vec::new(),
        }
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration using the config crate, letting `SITEMAPR__*`
    /// environment variables override file values.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("SITEMAPR").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let base = &self.site.base_url;
        if base.is_empty() {
            return Err(CoreError::config("site.base_url cannot be empty"));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(CoreError::config(format!(
                "site.base_url must be an absolute http(s) URL, got `{base}`"
            )));
        }

        if self.sitemap.default_class.trim().is_empty() {
            return Err(CoreError::config("sitemap.default_class cannot be empty"));
        }

        for class in &self.classes {
            if class.class_id.trim().is_empty() {
                return Err(CoreError::config("classes[].class cannot be empty"));
            }
            if let Some(priority) = class.priority.filter(|p| !(0.0..=1.0).contains(p)) {
                return Err(CoreError::config(format!(
                    "priority for {} must be between 0.0 and 1.0, got {priority}",
                    class.class_id
                )));
            }
            if let Some(clause) = &class.where_clause {
                WhereClause::parse(clause).map_err(|e| {
                    CoreError::config_with_source(
                        format!("invalid where clause for {}", class.class_id),
                        e,
                    )
                })?;
            }
        }

        Ok(())
    }

    pub fn is_live(&self) -> bool {
        self.site.mode == SiteMode::Live
    }

    /// Base URL with exactly one trailing slash.
    pub fn absolute_base_url(&self) -> String {
        format!("{}/", self.site.base_url.trim_end_matches('/'))
    }

    /// Get the full URL for a path.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.site.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Records file resolved against the directory holding the config file.
    pub fn records_path(&self, config_path: &Path) -> Option<PathBuf> {
        let records = self.sitemap.records.as_ref()?;
        if records.is_absolute() {
            return Some(records.clone());
        }
        let dir = config_path.parent().unwrap_or(Path::new(""));
        Some(dir.join(records))
    }
}
