//! Soft-delete-aware record persistence.
//!
//! Every resource kind is stored as a [`Record`]: a typed envelope (id, audit
//! columns, `deleted_at`) around a JSON field map and the media slots attached
//! to it. [`RecordStore`] is the seam between the lifecycle and the backend.

mod memory;
mod sea;

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use memory::MemoryRecordStore;
pub use sea::SeaOrmRecordStore;

/// Paths of a stored image and its thumbnail, both relative blob keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MediaPair {
    #[schema(example = "articles/cover/hello-world-1718000000000.jpg")]
    pub path: String,
    #[schema(example = "articles/cover/thumbnail/hello-world-thumbnail-1718000000000.jpg")]
    pub thumbnail: String,
}

/// Media slot name to stored pair. A slot without a pair is simply absent.
pub type MediaRefs = BTreeMap<String, MediaPair>;

/// Which partition of a resource kind an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Active,
    Trashed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: i32,
    pub kind: String,
    pub fields: Map<String, Value>,
    pub media: MediaRefs,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
}

impl Record {
    pub fn scope(&self) -> Scope {
        if self.deleted_at.is_some() {
            Scope::Trashed
        } else {
            Scope::Active
        }
    }
}

/// Values for a record about to be inserted.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub kind: String,
    pub fields: Map<String, Value>,
    pub media: MediaRefs,
    pub actor: Option<i32>,
}

/// Full replacement of an Active record's mutable columns.
#[derive(Debug, Clone)]
pub struct RecordChanges {
    pub fields: Map<String, Value>,
    pub media: MediaRefs,
    pub actor: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    CreatedAt,
    UpdatedAt,
    /// A field inside the JSON map. `numeric` fields sort by value, others
    /// case-insensitively by text.
    Field { name: &'static str, numeric: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Fully validated list parameters handed to a store.
#[derive(Debug, Clone)]
pub struct ListSpec {
    pub scope: Scope,
    /// Lowercased, trimmed, non-empty search term.
    pub search: Option<String>,
    pub search_fields: Vec<&'static str>,
    pub sort: SortField,
    pub order: SortOrder,
    /// 1-based.
    pub page: u64,
    pub per_page: u64,
}

impl ListSpec {
    /// Rows to skip. Saturates instead of overflowing.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.per_page)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    /// A uniqueness constraint rejected the write. Carries the backend message,
    /// which names the violated index.
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Corrupt record {id}: {reason}")]
    Corrupt { id: i32, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistence operations the lifecycle needs.
///
/// Transitions are conditional: `soft_delete` only touches Active records,
/// `restore` and `hard_delete` only Trashed ones. Each returns whether a
/// record actually transitioned.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Active record by id.
    async fn find(&self, kind: &str, id: i32) -> Result<Option<Record>, StoreError>;

    /// Trashed record by id.
    async fn find_trashed(&self, kind: &str, id: i32) -> Result<Option<Record>, StoreError>;

    async fn query(&self, kind: &str, spec: &ListSpec) -> Result<Page<Record>, StoreError>;

    async fn insert(&self, record: NewRecord) -> Result<Record, StoreError>;

    /// Replace fields and media of an Active record. `None` if it is not Active.
    async fn update_fields(
        &self,
        kind: &str,
        id: i32,
        changes: RecordChanges,
    ) -> Result<Option<Record>, StoreError>;

    async fn soft_delete(&self, kind: &str, id: i32, at: DateTime<Utc>)
    -> Result<bool, StoreError>;

    async fn restore(&self, kind: &str, id: i32) -> Result<bool, StoreError>;

    async fn hard_delete(&self, kind: &str, id: i32) -> Result<bool, StoreError>;

    /// Ids of every Trashed record of a kind, ascending.
    async fn trashed_ids(&self, kind: &str) -> Result<Vec<i32>, StoreError>;

    /// Whether an Active record other than `exclude` holds `value` in `field`,
    /// compared case-insensitively.
    async fn is_taken(
        &self,
        kind: &str,
        field: &str,
        value: &str,
        exclude: Option<i32>,
    ) -> Result<bool, StoreError>;
}

/// Name of the partial unique index guarding `field` among Active records of
/// `kind`. Backends report this name in [`StoreError::UniqueViolation`].
pub fn unique_index_name(kind: &str, field: &str) -> String {
    format!("uq_{kind}_{field}")
}

/// Text form of a scalar JSON value, as `fields ->> 'name'` would render it.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Order two field values the way the SQL backend does: text compares
/// case-insensitively, numeric fields by value, missing values sort last in
/// ascending order.
pub(crate) fn compare_field_values(a: Option<&Value>, b: Option<&Value>, numeric: bool) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) if numeric => {
            let a = a.as_f64().unwrap_or(f64::MAX);
            let b = b.as_f64().unwrap_or(f64::MAX);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Some(a), Some(b)) => {
            let a = value_text(a).unwrap_or_default().to_lowercase();
            let b = value_text(b).unwrap_or_default().to_lowercase();
            a.cmp(&b)
        }
    }
}
