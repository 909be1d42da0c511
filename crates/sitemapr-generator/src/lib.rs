//! Sitemapr Generator Library
//!
//! Sitemap registry and generation engine for Sitemapr.
//!
//! # Modules
//!
//! - [`registry`] - Registered classes and their options
//! - [`heuristics`] - Priority and change frequency estimation
//! - [`selector`] - Record selection and URL canonicalization
//! - [`paginator`] - Page splitting and index entries
//! - [`render`] - XML output
//! - [`notifier`] - Search engine pings
//! - [`sitemap`] - The service tying it all together

pub mod heuristics;
pub mod notifier;
pub mod paginator;
pub mod registry;
pub mod render;
pub mod selector;
pub mod sitemap;

pub use heuristics::PriorityStrategy;
pub use notifier::{Notifier, TcpPing};
pub use paginator::{PAGE_SIZE, SitemapIndexEntry};
pub use registry::{ClassRegistration, RegistrationOptions, Registry, RegistryError};
pub use selector::SitemapItem;
pub use sitemap::{Result, Sitemap, SitemapError};
pub use sitemapr_core::ChangeFreq;
