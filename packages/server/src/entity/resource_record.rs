use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "resource_record")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Resource kind (e.g. "article", "team").
    pub kind: String,

    /// Declared fields of the kind, keyed by field name.
    #[sea_orm(column_type = "JsonBinary")]
    pub fields: Json,

    /// Media slot name to `{ "path", "thumbnail" }`.
    #[sea_orm(column_type = "JsonBinary")]
    pub media: Json,

    /// Set while the record is in the trash.
    pub deleted_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,

    /// Actor ids for audit.
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
}

impl ActiveModelBehavior for ActiveModel {}
