use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use serde_json::{Map, Value};

use super::{
    ListSpec, MediaRefs, NewRecord, Page, Record, RecordChanges, RecordStore, Scope, SortField,
    SortOrder, StoreError,
};
use crate::entity::resource_record::{self, Column, Entity};

/// PostgreSQL-backed record store over the `resource_record` table.
#[derive(Clone)]
pub struct SeaOrmRecordStore {
    db: DatabaseConnection,
}

impl SeaOrmRecordStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => StoreError::UniqueViolation(msg),
            _ => StoreError::Database(err.to_string()),
        }
    }
}

/// Escape LIKE wildcard characters in a search string.
fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// SQL for the text value of a JSON field. Field names come from static
/// schemas; quotes are doubled regardless.
fn json_text_sql(field: &str) -> String {
    format!("\"fields\" ->> '{}'", field.replace('\'', "''"))
}

fn json_sort_sql(field: &str, numeric: bool) -> String {
    if numeric {
        format!("CAST({} AS DOUBLE PRECISION)", json_text_sql(field))
    } else {
        format!("LOWER({})", json_text_sql(field))
    }
}

fn sql_order(order: SortOrder) -> Order {
    match order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    }
}

fn scoped(select: Select<Entity>, kind: &str, scope: Scope) -> Select<Entity> {
    let select = select.filter(Column::Kind.eq(kind));
    match scope {
        Scope::Active => select.filter(Column::DeletedAt.is_null()),
        Scope::Trashed => select.filter(Column::DeletedAt.is_not_null()),
    }
}

fn into_record(model: resource_record::Model) -> Result<Record, StoreError> {
    let fields = match model.fields {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(StoreError::Corrupt {
                id: model.id,
                reason: format!("fields is not an object: {other}"),
            });
        }
    };
    let media: MediaRefs = match model.media {
        Value::Null => MediaRefs::new(),
        other => serde_json::from_value(other).map_err(|e| StoreError::Corrupt {
            id: model.id,
            reason: format!("invalid media map: {e}"),
        })?,
    };

    Ok(Record {
        id: model.id,
        kind: model.kind,
        fields,
        media,
        deleted_at: model.deleted_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
        created_by: model.created_by,
        updated_by: model.updated_by,
    })
}

impl SeaOrmRecordStore {
    async fn find_in(
        &self,
        kind: &str,
        id: i32,
        scope: Scope,
    ) -> Result<Option<Record>, StoreError> {
        scoped(Entity::find_by_id(id), kind, scope)
            .one(&self.db)
            .await?
            .map(into_record)
            .transpose()
    }
}

#[async_trait]
impl RecordStore for SeaOrmRecordStore {
    async fn find(&self, kind: &str, id: i32) -> Result<Option<Record>, StoreError> {
        self.find_in(kind, id, Scope::Active).await
    }

    async fn find_trashed(&self, kind: &str, id: i32) -> Result<Option<Record>, StoreError> {
        self.find_in(kind, id, Scope::Trashed).await
    }

    async fn query(&self, kind: &str, spec: &ListSpec) -> Result<Page<Record>, StoreError> {
        let mut select = scoped(Entity::find(), kind, spec.scope);

        if let Some(ref term) = spec.search {
            let pattern = format!("%{}%", escape_like(term));
            let mut any = Condition::any();
            for field in &spec.search_fields {
                any = any.add(
                    Expr::expr(Func::lower(Expr::cust(json_text_sql(field))))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                );
            }
            select = select.filter(any);
        }

        let total = select
            .clone()
            .paginate(&self.db, spec.per_page)
            .num_items()
            .await?;

        select = match spec.sort {
            SortField::Id => select.order_by(Column::Id, sql_order(spec.order)),
            SortField::CreatedAt => select.order_by(Column::CreatedAt, sql_order(spec.order)),
            SortField::UpdatedAt => select.order_by(Column::UpdatedAt, sql_order(spec.order)),
            SortField::Field { name, numeric } => select.order_by(
                Expr::cust(json_sort_sql(name, numeric)),
                sql_order(spec.order),
            ),
        };
        if spec.sort != SortField::Id {
            select = select.order_by_asc(Column::Id);
        }

        let items = select
            .offset(Some(spec.offset()))
            .limit(Some(spec.per_page))
            .all(&self.db)
            .await?
            .into_iter()
            .map(into_record)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total,
            page: spec.page,
            per_page: spec.per_page,
        })
    }

    async fn insert(&self, record: NewRecord) -> Result<Record, StoreError> {
        let now = Utc::now();
        let model = resource_record::ActiveModel {
            kind: Set(record.kind),
            fields: Set(Value::Object(record.fields)),
            media: Set(serde_json::to_value(&record.media)?),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            created_by: Set(record.actor),
            updated_by: Set(record.actor),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        into_record(model)
    }

    async fn update_fields(
        &self,
        kind: &str,
        id: i32,
        changes: RecordChanges,
    ) -> Result<Option<Record>, StoreError> {
        let result = Entity::update_many()
            .col_expr(Column::Fields, Expr::value(Value::Object(changes.fields)))
            .col_expr(
                Column::Media,
                Expr::value(serde_json::to_value(&changes.media)?),
            )
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .col_expr(Column::UpdatedBy, Expr::value(changes.actor))
            .filter(Column::Id.eq(id))
            .filter(Column::Kind.eq(kind))
            .filter(Column::DeletedAt.is_null())
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.find(kind, id).await
    }

    async fn soft_delete(
        &self,
        kind: &str,
        id: i32,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = Entity::update_many()
            .col_expr(Column::DeletedAt, Expr::value(Some(at)))
            .filter(Column::Id.eq(id))
            .filter(Column::Kind.eq(kind))
            .filter(Column::DeletedAt.is_null())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn restore(&self, kind: &str, id: i32) -> Result<bool, StoreError> {
        let result = Entity::update_many()
            .col_expr(Column::DeletedAt, Expr::value(Option::<DateTime<Utc>>::None))
            .filter(Column::Id.eq(id))
            .filter(Column::Kind.eq(kind))
            .filter(Column::DeletedAt.is_not_null())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn hard_delete(&self, kind: &str, id: i32) -> Result<bool, StoreError> {
        let result = Entity::delete_many()
            .filter(Column::Id.eq(id))
            .filter(Column::Kind.eq(kind))
            .filter(Column::DeletedAt.is_not_null())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn trashed_ids(&self, kind: &str) -> Result<Vec<i32>, StoreError> {
        Ok(scoped(Entity::find(), kind, Scope::Trashed)
            .select_only()
            .column(Column::Id)
            .order_by_asc(Column::Id)
            .into_tuple::<i32>()
            .all(&self.db)
            .await?)
    }

    async fn is_taken(
        &self,
        kind: &str,
        field: &str,
        value: &str,
        exclude: Option<i32>,
    ) -> Result<bool, StoreError> {
        let mut select = scoped(Entity::find(), kind, Scope::Active).filter(
            Expr::expr(Func::lower(Expr::cust(json_text_sql(field)))).eq(value.to_lowercase()),
        );
        if let Some(id) = exclude {
            select = select.filter(Column::Id.ne(id));
        }
        Ok(select.count(&self.db).await? > 0)
    }
}
