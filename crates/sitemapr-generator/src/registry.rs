//! Registered sitemap classes and their publication options.

use serde::{Deserialize, Serialize};
use sitemapr_core::{ChangeFreq, ClassConfig, FieldMap, RecordQuery, ValueSet};
use thiserror::Error;
use tracing::{debug, info};

use crate::heuristics::{DEFAULT_PRIORITY, PriorityStrategy};

/// Registration errors.
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    /// The class identifier is empty.
    #[error("class identifier cannot be empty")]
    EmptyClassId,

    /// The priority override is outside `0.0..=1.0`.
    #[error("priority for {class_id} must be between 0.0 and 1.0, got {priority}")]
    InvalidPriority { class_id: String, priority: f32 },
}

/// Options a class is registered with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationOptions {
    #[serde(default)]
    pub filter: FieldMap,

    #[serde(default, rename = "where")]
    pub where_clause: Option<String>,

    #[serde(default)]
    pub exclude: FieldMap,

    #[serde(default)]
    pub frequency: Option<ChangeFreq>,

    #[serde(default)]
    pub priority: Option<f32>,

    /// Compute priority from hierarchy depth, ignoring `priority`.
    #[serde(default)]
    pub depth_priority: bool,
}

impl RegistrationOptions {
    /// Options registered for the content tree class: search-visible records,
    /// depth-based priority.
    pub fn site_tree() -> Self {
        let mut filter = FieldMap::new();
        filter.insert("ShowInSearch".to_string(), ValueSet::from(1_i64));
        Self {
            filter,
            depth_priority: true,
            ..Self::default()
        }
    }
}

impl From<&ClassConfig> for RegistrationOptions {
    fn from(class: &ClassConfig) -> Self {
        Self {
            filter: class.filter.clone(),
            where_clause: class.where_clause.clone(),
            exclude: class.exclude.clone(),
            frequency: class.frequency,
            priority: class.priority,
            depth_priority: class.depth_priority,
        }
    }
}

/// A registered class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassRegistration {
    pub class_id: String,
    pub options: RegistrationOptions,
}

impl ClassRegistration {
    /// Repository query selecting this class's candidate records.
    pub fn query(&self) -> RecordQuery {
        RecordQuery {
            class_id: self.class_id.clone(),
            filter: self.options.filter.clone(),
            where_clause: self.options.where_clause.clone(),
            exclude: self.options.exclude.clone(),
        }
    }

    pub fn strategy(&self) -> PriorityStrategy {
        if self.options.depth_priority {
            PriorityStrategy::DepthBased
        } else if let Some(priority) = self.options.priority {
            PriorityStrategy::Override(priority)
        } else {
            PriorityStrategy::Default
        }
    }
}

/// Classes published in the sitemap, in registration order.
#[derive(Debug, Clone)]
pub struct Registry {
    classes: Vec<ClassRegistration>,
    default_class: String,
    include_site_tree: bool,
    notifications_enabled: bool,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new("SiteTree")
    }
}

impl Registry {
    /// Empty registry whose content tree class is `default_class`.
    pub fn new(default_class: impl Into<String>) -> Self {
        Self {
            classes: Vec::new(),
            default_class: default_class.into(),
            include_site_tree: true,
            notifications_enabled: false,
        }
    }

    /// Register a class.
    ///
    /// Returns `Ok(false)` without touching the existing options when the
    /// class is already registered.
    pub fn register(
        &mut self,
        class_id: &str,
        options: RegistrationOptions,
    ) -> Result<bool, RegistryError> {
        Self::validate(class_id, &options)?;
        if self.is_registered(class_id) {
            debug!(class = class_id, "class already registered");
            return Ok(false);
        }

        info!(class = class_id, "registered sitemap class");
        self.classes.push(ClassRegistration {
            class_id: class_id.to_string(),
            options,
        });
        Ok(true)
    }

    /// Check registration input without registering anything.
    pub fn validate(class_id: &str, options: &RegistrationOptions) -> Result<(), RegistryError> {
        if class_id.trim().is_empty() {
            return Err(RegistryError::EmptyClassId);
        }
        if let Some(priority) = options.priority.filter(|p| !(0.0..=1.0).contains(p)) {
            return Err(RegistryError::InvalidPriority {
                class_id: class_id.to_string(),
                priority,
            });
        }
        Ok(())
    }

    /// Remove a class; unknown classes are ignored.
    pub fn unregister(&mut self, class_id: &str) {
        let before = self.classes.len();
        self.classes.retain(|c| c.class_id != class_id);
        if self.classes.len() != before {
            info!(class = class_id, "unregistered sitemap class");
        }
    }

    pub fn is_registered(&self, class_id: &str) -> bool {
        self.get(class_id).is_some()
    }

    pub fn get(&self, class_id: &str) -> Option<&ClassRegistration> {
        self.classes.iter().find(|c| c.class_id == class_id)
    }

    /// Registered classes in registration order.
    pub fn classes(&self) -> &[ClassRegistration] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Registered change frequency override, if any.
    pub fn frequency_for(&self, class_id: &str) -> Option<ChangeFreq> {
        self.get(class_id).and_then(|c| c.options.frequency)
    }

    /// Registered priority override, or [`DEFAULT_PRIORITY`].
    pub fn priority_for(&self, class_id: &str) -> f32 {
        self.get(class_id)
            .and_then(|c| c.options.priority)
            .unwrap_or(DEFAULT_PRIORITY)
    }

    /// Priority strategy for a class; unregistered classes get the default.
    pub fn strategy_for(&self, class_id: &str) -> PriorityStrategy {
        self.get(class_id)
            .map_or(PriorityStrategy::Default, ClassRegistration::strategy)
    }

    pub fn default_class(&self) -> &str {
        &self.default_class
    }

    /// Whether the content tree class still needs registering.
    pub fn wants_default_class(&self) -> bool {
        self.include_site_tree && !self.is_registered(&self.default_class)
    }

    /// Register the content tree class if it is wanted and `class_exists`
    /// says the host knows it. Returns whether it was registered now.
    pub fn ensure_default_class_registered(&mut self, class_exists: impl FnOnce(&str) -> bool) -> bool {
        if !self.wants_default_class() || !class_exists(&self.default_class) {
            return false;
        }
        let class_id = self.default_class.clone();
        matches!(
            self.register(&class_id, RegistrationOptions::site_tree()),
            Ok(true)
        )
    }

    pub fn include_site_tree(&self) -> bool {
        self.include_site_tree
    }

    /// Stop registering the content tree class automatically.
    pub fn exclude_default_class(&mut self) {
        self.include_site_tree = false;
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifications_enabled
    }

    pub fn enable_notifications(&mut self) {
        self.notifications_enabled = true;
    }

    pub fn disable_notifications(&mut self) {
        self.notifications_enabled = false;
    }
}
