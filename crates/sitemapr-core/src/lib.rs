//! Sitemapr Core Library
//!
//! Configuration, error handling, the record model and the record repository
//! abstraction shared by the sitemap generator and the `sitemapr` binary.

pub mod config;
pub mod error;
pub mod query;
pub mod record;
pub mod repository;

pub use config::{ClassConfig, Config, SiteMode};
pub use error::{CoreError, Result};
pub use query::{Comparison, WhereClause};
pub use record::{ChangeFreq, FieldMap, FieldValue, Linkable, Record, ValueSet};
pub use repository::{InMemoryRepository, RecordQuery, RecordRepository};
