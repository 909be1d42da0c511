//! Sitemapr CLI Library
//!
//! This library provides the core functionality for the Sitemapr CLI.
//! It is used by the binary entry point and exposes the router and
//! commands for integration tests.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (serve, check, export, ping)
//! - [`server`] - HTTP endpoints serving the sitemap documents
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use sitemapr::cmd;
//!
//! // Write the sitemap documents to disk
//! cmd::export::run(Path::new("sitemapr.toml"), Path::new("public")).unwrap();
//! ```

use std::{path::Path, sync::Arc};

use color_eyre::eyre::{Result, WrapErr};

pub mod cmd;
pub mod server;

// Re-export core types for convenience
pub use sitemapr_core::{Config, InMemoryRepository};
pub use sitemapr_generator::{Sitemap, SitemapError};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

/// Load the configuration and its records file.
///
/// Without a records file the repository is empty and knows no classes.
pub fn load_site(config_path: &Path) -> Result<(Config, InMemoryRepository)> {
    let config = Config::load(config_path).wrap_err("Failed to load configuration")?;

    let repository = match config.records_path(config_path) {
        Some(path) => InMemoryRepository::load(&path)
            .wrap_err_with(|| format!("Failed to load records from {}", path.display()))?,
        None => {
            tracing::warn!("No records file configured, the sitemap will be empty");
            InMemoryRepository::default()
        }
    };

    tracing::debug!(?config, records = repository.len(), "Loaded site");
    Ok((config, repository))
}

/// Load the site and build the sitemap service with the configured classes
/// registered.
pub fn open_sitemap(config_path: &Path) -> Result<(Config, Arc<Sitemap>)> {
    let (config, repository) = load_site(config_path)?;
    let sitemap = Sitemap::from_config(&config, Arc::new(repository))
        .wrap_err("Failed to set up sitemap")?;
    Ok((config, Arc::new(sitemap)))
}
