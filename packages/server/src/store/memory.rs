use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{
    ListSpec, NewRecord, Page, Record, RecordChanges, RecordStore, Scope, SortField, SortOrder,
    StoreError, compare_field_values, value_text,
};

#[derive(Default)]
struct Tables {
    next_id: i32,
    kinds: HashMap<String, BTreeMap<i32, Record>>,
}

/// In-process record store used for development (`database.url = "memory"`)
/// and tests. Ids are unique across all kinds, like a shared serial column.
#[derive(Default)]
pub struct MemoryRecordStore {
    tables: RwLock<Tables>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn in_scope(record: &Record, scope: Scope) -> bool {
    record.scope() == scope
}

fn matches_search(record: &Record, spec: &ListSpec) -> bool {
    let Some(term) = spec.search.as_deref() else {
        return true;
    };
    spec.search_fields.iter().any(|field| {
        record
            .fields
            .get(*field)
            .and_then(value_text)
            .is_some_and(|text| text.to_lowercase().contains(term))
    })
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find(&self, kind: &str, id: i32) -> Result<Option<Record>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .kinds
            .get(kind)
            .and_then(|rows| rows.get(&id))
            .filter(|r| in_scope(r, Scope::Active))
            .cloned())
    }

    async fn find_trashed(&self, kind: &str, id: i32) -> Result<Option<Record>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .kinds
            .get(kind)
            .and_then(|rows| rows.get(&id))
            .filter(|r| in_scope(r, Scope::Trashed))
            .cloned())
    }

    async fn query(&self, kind: &str, spec: &ListSpec) -> Result<Page<Record>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&Record> = tables
            .kinds
            .get(kind)
            .map(|rows| {
                rows.values()
                    .filter(|r| in_scope(r, spec.scope) && matches_search(r, spec))
                    .collect()
            })
            .unwrap_or_default();

        rows.sort_by(|a, b| {
            let primary = match spec.sort {
                SortField::Id => a.id.cmp(&b.id),
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                SortField::Field { name, numeric } => {
                    compare_field_values(a.fields.get(name), b.fields.get(name), numeric)
                }
            };
            let primary = match spec.order {
                SortOrder::Asc => primary,
                SortOrder::Desc => primary.reverse(),
            };
            primary.then(a.id.cmp(&b.id))
        });

        let total = rows.len() as u64;
        let items = rows
            .into_iter()
            .skip(usize::try_from(spec.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(spec.per_page).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(Page {
            items,
            total,
            page: spec.page,
            per_page: spec.per_page,
        })
    }

    async fn insert(&self, record: NewRecord) -> Result<Record, StoreError> {
        let mut tables = self.tables.write().await;
        tables.next_id += 1;
        let id = tables.next_id;
        let now = Utc::now();

        let row = Record {
            id,
            kind: record.kind.clone(),
            fields: record.fields,
            media: record.media,
            deleted_at: None,
            created_at: now,
            updated_at: now,
            created_by: record.actor,
            updated_by: record.actor,
        };
        tables
            .kinds
            .entry(record.kind)
            .or_default()
            .insert(id, row.clone());
        Ok(row)
    }

    async fn update_fields(
        &self,
        kind: &str,
        id: i32,
        changes: RecordChanges,
    ) -> Result<Option<Record>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables
            .kinds
            .get_mut(kind)
            .and_then(|rows| rows.get_mut(&id))
            .filter(|r| in_scope(r, Scope::Active))
        else {
            return Ok(None);
        };

        row.fields = changes.fields;
        row.media = changes.media;
        row.updated_by = changes.actor;
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn soft_delete(
        &self,
        kind: &str,
        id: i32,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        match tables
            .kinds
            .get_mut(kind)
            .and_then(|rows| rows.get_mut(&id))
            .filter(|r| in_scope(r, Scope::Active))
        {
            Some(row) => {
                row.deleted_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn restore(&self, kind: &str, id: i32) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        match tables
            .kinds
            .get_mut(kind)
            .and_then(|rows| rows.get_mut(&id))
            .filter(|r| in_scope(r, Scope::Trashed))
        {
            Some(row) => {
                row.deleted_at = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn hard_delete(&self, kind: &str, id: i32) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.kinds.get_mut(kind) else {
            return Ok(false);
        };
        if rows.get(&id).is_some_and(|r| in_scope(r, Scope::Trashed)) {
            rows.remove(&id);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn trashed_ids(&self, kind: &str) -> Result<Vec<i32>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .kinds
            .get(kind)
            .map(|rows| {
                rows.values()
                    .filter(|r| in_scope(r, Scope::Trashed))
                    .map(|r| r.id)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn is_taken(
        &self,
        kind: &str,
        field: &str,
        value: &str,
        exclude: Option<i32>,
    ) -> Result<bool, StoreError> {
        let needle = value.to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables.kinds.get(kind).is_some_and(|rows| {
            rows.values().any(|r| {
                in_scope(r, Scope::Active)
                    && Some(r.id) != exclude
                    && r.fields
                        .get(field)
                        .and_then(value_text)
                        .is_some_and(|text| text.to_lowercase() == needle)
            })
        }))
    }
}
