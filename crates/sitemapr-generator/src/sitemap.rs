//! The sitemap service: registry, repository and notifier behind one handle.

use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sitemapr_core::{ChangeFreq, Config, CoreError, RecordRepository};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    notifier::{Notifier, TcpPing, ping_query},
    paginator::{SitemapIndexEntry, index_entries, page_of},
    registry::{ClassRegistration, RegistrationOptions, Registry, RegistryError},
    render,
    selector::{SitemapItem, UrlScope, select_items},
};

/// Sitemap errors.
#[derive(Debug, Error)]
pub enum SitemapError {
    /// The class is not registered; callers treat this as "not found".
    #[error("class {0} is not registered")]
    NotRegistered(String),

    /// Invalid registration input.
    #[error("registration error: {0}")]
    Registry(#[from] RegistryError),

    /// The record repository failed.
    #[error("repository error: {0}")]
    Repository(#[from] CoreError),

    /// The base URL could not be turned into a match pattern.
    #[error("invalid base URL pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl SitemapError {
    /// Whether the error means "nothing to show" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotRegistered(_))
    }
}

/// Result type for sitemap operations.
pub type Result<T> = std::result::Result<T, SitemapError>;

/// Sitemap service for one site.
///
/// Created once at startup and shared by reference; the registry is only
/// written during bootstrap and when the content tree class gets registered
/// on first use.
pub struct Sitemap {
    registry: RwLock<Registry>,
    repository: Arc<dyn RecordRepository>,
    notifier: Box<dyn Notifier>,
    scope: UrlScope,
    live: bool,
}

impl std::fmt::Debug for Sitemap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sitemap")
            .field("registry", &*self.registry.read())
            .field("notifier", &self.notifier)
            .field("base_url", &self.scope.base_url())
            .field("live", &self.live)
            .finish_non_exhaustive()
    }
}

impl Sitemap {
    /// Create a service with the toggles from `config` and no classes
    /// registered yet.
    pub fn new(
        config: &Config,
        repository: Arc<dyn RecordRepository>,
        notifier: Box<dyn Notifier>,
    ) -> Result<Self> {
        let mut registry = Registry::new(&config.sitemap.default_class);
        if !config.sitemap.include_site_tree {
            registry.exclude_default_class();
        }
        if config.notifications.enabled {
            registry.enable_notifications();
        }

        Ok(Self {
            registry: RwLock::new(registry),
            repository,
            notifier,
            scope: UrlScope::new(config.absolute_base_url())?,
            live: config.is_live(),
        })
    }

    /// Create a service pinging over TCP and register the configured classes.
    pub fn from_config(config: &Config, repository: Arc<dyn RecordRepository>) -> Result<Self> {
        let notifier = Box::new(TcpPing::from(&config.notifications));
        let sitemap = Self::new(config, repository, notifier)?;
        for class in &config.classes {
            sitemap.register(&class.class_id, RegistrationOptions::from(class))?;
        }
        Ok(sitemap)
    }

    /// Register a class.
    ///
    /// Returns `Ok(false)` when the class is already registered or the
    /// repository does not know it.
    pub fn register(&self, class_id: &str, options: RegistrationOptions) -> Result<bool> {
        Registry::validate(class_id, &options)?;
        if !self.repository.class_exists(class_id) {
            debug!(class = class_id, "skipping registration of unknown class");
            return Ok(false);
        }
        Ok(self.registry.write().register(class_id, options)?)
    }

    pub fn unregister(&self, class_id: &str) {
        self.registry.write().unregister(class_id);
    }

    pub fn is_registered(&self, class_id: &str) -> bool {
        self.registry.read().is_registered(class_id)
    }

    /// Registered class ids in registration order.
    pub fn registered_classes(&self) -> Vec<String> {
        self.registry
            .read()
            .classes()
            .iter()
            .map(|c| c.class_id.clone())
            .collect()
    }

    pub fn frequency_for(&self, class_id: &str) -> Option<ChangeFreq> {
        self.registry.read().frequency_for(class_id)
    }

    pub fn priority_for(&self, class_id: &str) -> f32 {
        self.registry.read().priority_for(class_id)
    }

    /// Do not register the content tree class automatically.
    pub fn exclude_default_class(&self) {
        self.registry.write().exclude_default_class();
    }

    pub fn enable_notifications(&self) {
        self.registry.write().enable_notifications();
    }

    pub fn disable_notifications(&self) {
        self.registry.write().disable_notifications();
    }

    pub fn notifications_enabled(&self) -> bool {
        self.registry.read().notifications_enabled()
    }

    /// Register the content tree class if it is wanted, known to the
    /// repository and not registered yet.
    pub fn ensure_default_class_registered(&self) -> bool {
        if !self.registry.read().wants_default_class() {
            return false;
        }
        let repository = &self.repository;
        self.registry
            .write()
            .ensure_default_class_registered(|class| repository.class_exists(class))
    }

    /// Publishable items of a class, newest first.
    pub fn select_items(&self, class_id: &str) -> Result<Vec<SitemapItem>> {
        self.select_items_at(class_id, Utc::now())
    }

    /// [`Sitemap::select_items`] with an explicit clock for the change
    /// frequency estimate.
    ///
    /// URLs already published by a class registered earlier are left out, so
    /// every URL appears once across the whole sitemap.
    pub fn select_items_at(&self, class_id: &str, now: DateTime<Utc>) -> Result<Vec<SitemapItem>> {
        self.ensure_default_class_registered();

        let registrations = self.registrations();
        let position = registrations
            .iter()
            .position(|c| c.class_id == class_id)
            .ok_or_else(|| SitemapError::NotRegistered(class_id.to_string()))?;

        let mut seen = HashSet::new();
        for earlier in &registrations[..position] {
            seen.extend(self.class_items(earlier, now)?.into_iter().map(|i| i.absolute_url));
        }

        let mut items = self.class_items(&registrations[position], now)?;
        items.retain(|item| !seen.contains(&item.absolute_url));
        Ok(items)
    }

    /// Sitemap index entries for every registered class with items, in
    /// registration order.
    pub fn build_index(&self) -> Result<Vec<SitemapIndexEntry>> {
        self.ensure_default_class_registered();

        let now = Utc::now();
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for registration in self.registrations() {
            let mut items = self.class_items(&registration, now)?;
            items.retain(|item| seen.insert(item.absolute_url.clone()));
            entries.extend(index_entries(&registration.class_id, &items));
        }

        debug!(entries = entries.len(), "built sitemap index");
        Ok(entries)
    }

    /// Snapshot of the registrations so no lock is held while querying.
    fn registrations(&self) -> Vec<ClassRegistration> {
        self.registry.read().classes().to_vec()
    }

    fn class_items(
        &self,
        registration: &ClassRegistration,
        now: DateTime<Utc>,
    ) -> Result<Vec<SitemapItem>> {
        let records = self.repository.fetch(&registration.query())?;
        Ok(select_items(registration, records, &self.scope, now))
    }

    /// One 1000-item page of a class sitemap; `page` is 1-based and pages
    /// out of range are empty.
    pub fn page(&self, class_id: &str, page: usize) -> Result<Vec<SitemapItem>> {
        Ok(page_of(self.select_items(class_id)?, page))
    }

    pub fn base_url(&self) -> &str {
        self.scope.base_url()
    }

    /// Absolute URL of `sitemap.xml`.
    pub fn index_url(&self) -> String {
        render::sitemap_index_url(self.scope.base_url())
    }

    /// Render the sitemap index, or `None` when there is nothing to list.
    pub fn render_index(&self) -> Result<Option<String>> {
        let entries = self.build_index()?;
        if entries.is_empty() {
            return Ok(None);
        }
        Ok(Some(render::render_index(self.scope.base_url(), &entries)))
    }

    /// Render a class page, or `None` when the class is not registered or the
    /// page has no items.
    pub fn render_page(&self, class_id: &str, page: usize) -> Result<Option<String>> {
        let items = match self.page(class_id, page) {
            Ok(items) => items,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(render::render_urlset(&items)))
    }

    /// Tell the search engine the sitemap changed.
    ///
    /// Returns `None` without touching the network unless notifications are
    /// enabled and the site is live; otherwise the ping response (or the
    /// transport error message).
    pub fn notify_update(&self) -> Option<String> {
        if !self.notifications_enabled() {
            return None;
        }
        if !self.live {
            debug!("site is not live, skipping sitemap ping");
            return None;
        }

        let query = ping_query(&self.index_url());
        info!(%query, "pinging search engine");
        Some(self.notifier.ping(&query))
    }

    /// Hook for a record of `class_id` having been published.
    pub fn on_after_publish(&self, class_id: &str) -> Option<String> {
        self.on_lifecycle_event(class_id, "publish")
    }

    /// Hook for a record of `class_id` having been unpublished.
    pub fn on_after_unpublish(&self, class_id: &str) -> Option<String> {
        self.on_lifecycle_event(class_id, "unpublish")
    }

    fn on_lifecycle_event(&self, class_id: &str, event: &str) -> Option<String> {
        if !self.is_registered(class_id) {
            return None;
        }
        debug!(class = class_id, event, "sitemap content changed");
        self.notify_update()
    }
}
