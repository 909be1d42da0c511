//! Record repository abstraction and the in-memory reference implementation.

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    path::Path,
};

use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    error::{CoreError, Result},
    query::WhereClause,
    record::{FieldMap, Record},
};

/// Selection of records for one class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordQuery {
    pub class_id: String,
    /// Keep records matching every entry.
    pub filter: FieldMap,
    /// Raw predicate understood by the repository.
    pub where_clause: Option<String>,
    /// Drop records matching every entry.
    pub exclude: FieldMap,
}

impl RecordQuery {
    pub fn new(class_id: impl Into<String>) -> Self {
        Self {
            class_id: class_id.into(),
            ..Self::default()
        }
    }
}

/// Source of content records.
///
/// Implementations return the records of `query.class_id` that pass the
/// query's predicates, sorted by `last_edited` descending. Ties keep the
/// repository's natural order.
pub trait RecordRepository: Send + Sync {
    /// Whether the host system knows the class at all.
    fn class_exists(&self, class_id: &str) -> bool;

    /// Run the query.
    fn fetch(&self, query: &RecordQuery) -> Result<Vec<Record>>;
}

/// On-disk layout of a records file.
#[derive(Debug, Deserialize)]
struct RecordsFile {
    /// Classes that exist even without records.
    #[serde(default)]
    classes: Vec<String>,
    #[serde(default)]
    records: Vec<Record>,
}

/// Repository over a fixed set of records held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    classes: BTreeSet<String>,
    records: Vec<Record>,
}

impl InMemoryRepository {
    /// Build a repository from records; record depths are derived from the
    /// `parent_id` chains.
    pub fn new(records: Vec<Record>) -> Self {
        let mut repo = Self {
            classes: BTreeSet::new(),
            records,
        };
        repo.resolve_depths();
        repo
    }

    /// Load a YAML records file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::data(path, "records file not found"));
        }

        let content = std::fs::read_to_string(path)?;
        let file: RecordsFile = serde_yaml::from_str(&content)
            .map_err(|e| CoreError::data(path, format!("failed to parse records: {e}")))?;

        let mut seen = HashSet::new();
        for record in &file.records {
            if !seen.insert((record.class_id.as_str(), record.id)) {
                return Err(CoreError::data(
                    path,
                    format!("duplicate id {} in class {}", record.id, record.class_id),
                ));
            }
        }

        let mut repo = Self::new(file.records);
        for class in file.classes {
            repo.declare_class(class);
        }

        info!(path = %path.display(), records = repo.len(), "loaded records");
        Ok(repo)
    }

    /// Make a class known even if it has no records.
    pub fn declare_class(&mut self, class_id: impl Into<String>) {
        self.classes.insert(class_id.into());
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Count ancestors by walking parent links within the same class.
    /// Unknown parents end the chain; cycles are cut at the first repeat.
    fn resolve_depths(&mut self) {
        let depths: Vec<usize> = {
            let parents: HashMap<(&str, u64), Option<u64>> = self
                .records
                .iter()
                .map(|r| ((r.class_id.as_str(), r.id), r.parent_id))
                .collect();

            self.records
                .iter()
                .map(|record| {
                    let class = record.class_id.as_str();
                    let mut visited = HashSet::from([record.id]);
                    let mut depth = 0;
                    let mut next = record.parent_id;
                    while let Some(parent) = next {
                        let Some(grandparent) = parents.get(&(class, parent)) else {
                            break;
                        };
                        if !visited.insert(parent) {
                            break;
                        }
                        depth += 1;
                        next = *grandparent;
                    }
                    depth
                })
                .collect()
        };

        for (record, depth) in self.records.iter_mut().zip(depths) {
            record.depth = depth;
        }
    }
}

impl RecordRepository for InMemoryRepository {
    fn class_exists(&self, class_id: &str) -> bool {
        self.classes.contains(class_id) || self.records.iter().any(|r| r.class_id == class_id)
    }

    fn fetch(&self, query: &RecordQuery) -> Result<Vec<Record>> {
        let clause = query
            .where_clause
            .as_deref()
            .map(WhereClause::parse)
            .transpose()?;

        let mut matched: Vec<Record> = self
            .records
            .iter()
            .filter(|r| r.class_id == query.class_id)
            .filter(|r| r.matches_all(&query.filter))
            .filter(|r| clause.as_ref().is_none_or(|c| c.matches(r)))
            .filter(|r| query.exclude.is_empty() || !r.matches_all(&query.exclude))
            .cloned()
            .collect();

        // Stable, so equal timestamps keep insertion order.
        matched.sort_by(|a, b| b.last_edited.cmp(&a.last_edited));

        debug!(class = %query.class_id, count = matched.len(), "fetched records");
        Ok(matched)
    }
}
