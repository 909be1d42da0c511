//! Content records and the values their fields hold.

use std::{cmp::Ordering, collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Predicate map used by `filter` and `exclude` options: field name to
/// accepted value(s).
pub type FieldMap = BTreeMap<String, ValueSet>;

/// Change frequency for sitemap entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    /// Value as written in `<changefreq>`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeFreq {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "never" => Ok(Self::Never),
            other => Err(CoreError::config(format!("unknown change frequency `{other}`"))),
        }
    }
}

/// A scalar field value.
///
/// Comparisons are loose in the way a SQL column comparison is: `true`, `1`
/// and `"1"` are all equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Textual view of the value; booleans render as `1` / `0`.
    pub fn to_text(&self) -> String {
        match self {
            Self::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    /// Compare two values, numerically when both sides are numeric.
    pub fn loose_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => Some(self.to_text().cmp(&other.to_text())),
        }
    }

    pub fn loosely_eq(&self, other: &Self) -> bool {
        self.loose_cmp(other) == Some(Ordering::Equal)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One value or a list of accepted values (`IN (...)`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueSet {
    One(FieldValue),
    Many(Vec<FieldValue>),
}

impl ValueSet {
    /// Whether `value` is one of the accepted values.
    pub fn contains(&self, value: &FieldValue) -> bool {
        match self {
            Self::One(v) => v.loosely_eq(value),
            Self::Many(values) => values.iter().any(|v| v.loosely_eq(value)),
        }
    }
}

impl From<FieldValue> for ValueSet {
    fn from(value: FieldValue) -> Self {
        Self::One(value)
    }
}

impl From<bool> for ValueSet {
    fn from(value: bool) -> Self {
        Self::One(value.into())
    }
}

impl From<i64> for ValueSet {
    fn from(value: i64) -> Self {
        Self::One(value.into())
    }
}

impl From<&str> for ValueSet {
    fn from(value: &str) -> Self {
        Self::One(value.into())
    }
}

/// A content record as handed out by a [`RecordRepository`](crate::RecordRepository).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Class the record belongs to.
    #[serde(rename = "class")]
    pub class_id: String,

    /// Identifier, unique within the class.
    pub id: u64,

    /// Last modification time.
    pub last_edited: DateTime<Utc>,

    /// Creation time, if known.
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,

    /// Number of saved versions, if the class is versioned.
    #[serde(default)]
    pub version: Option<u32>,

    /// Site link, relative or absolute.
    #[serde(default)]
    pub link: Option<String>,

    /// Explicit absolute URL to publish instead of `link`.
    #[serde(default)]
    pub sitemap_url: Option<String>,

    /// Parent record in the same class.
    #[serde(default)]
    pub parent_id: Option<u64>,

    /// Free-form fields used by filter, exclude and where predicates.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,

    /// Number of ancestors above this record; filled in by the repository.
    #[serde(skip)]
    pub depth: usize,
}

impl Record {
    /// Create a record with only the required columns set.
    pub fn new(class_id: impl Into<String>, id: u64, last_edited: DateTime<Utc>) -> Self {
        Self {
            class_id: class_id.into(),
            id,
            last_edited,
            created: None,
            version: None,
            link: None,
            sitemap_url: None,
            parent_id: None,
            fields: BTreeMap::new(),
            depth: 0,
        }
    }

    #[must_use]
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Look up a predicate column: declared fields first, then the built-in
    /// `ID`, `ClassName`, `ParentID` and `Version` columns.
    pub fn value(&self, name: &str) -> Option<FieldValue> {
        if let Some(value) = self.fields.get(name) {
            return Some(value.clone());
        }
        match name {
            "ID" => Some(FieldValue::Int(self.id as i64)),
            "ClassName" => Some(FieldValue::Text(self.class_id.clone())),
            "ParentID" => Some(FieldValue::Int(self.parent_id.unwrap_or(0) as i64)),
            "Version" => self.version.map(|v| FieldValue::Int(i64::from(v))),
            _ => None,
        }
    }

    /// Whether every predicate in `map` matches this record.
    pub fn matches_all(&self, map: &FieldMap) -> bool {
        map.iter().all(|(field, accepted)| {
            self.value(field)
                .is_some_and(|value| accepted.contains(&value))
        })
    }
}

/// Something that can be published under a URL.
pub trait Linkable {
    /// Explicit absolute URL for the sitemap, preferred over [`Linkable::link`].
    fn sitemap_url(&self) -> Option<&str> {
        None
    }

    /// Regular site link, possibly relative to the site base URL.
    fn link(&self) -> Option<&str>;
}

impl Linkable for Record {
    fn sitemap_url(&self) -> Option<&str> {
        self.sitemap_url.as_deref()
    }

    fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }
}
