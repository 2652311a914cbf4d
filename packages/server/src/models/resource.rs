use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

pub use super::shared::Pagination;
use crate::schema::ResourceSchema;
use crate::store::{Page, Record};

/// Prefix under which stored blobs are served.
pub const MEDIA_URL_PREFIX: &str = "/media";

/// A stored image and its thumbnail, with URLs they are served from.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MediaView {
    #[schema(example = "articles/cover/hello-world-1718000000000.jpg")]
    pub path: String,
    #[schema(example = "articles/cover/thumbnail/hello-world-thumbnail-1718000000000.jpg")]
    pub thumbnail: String,
    #[schema(example = "/media/articles/cover/hello-world-1718000000000.jpg")]
    pub url: String,
    #[schema(example = "/media/articles/cover/thumbnail/hello-world-thumbnail-1718000000000.jpg")]
    pub thumbnail_url: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RecordResponse {
    pub id: i32,
    /// Field values of the resource. Hidden fields are never included.
    #[schema(value_type = Object, example = json!({"name": "Design", "slug": "design"}))]
    pub fields: Map<String, Value>,
    /// Media slot name to stored pair. Empty slots are absent.
    pub media: BTreeMap<String, MediaView>,
    /// Set while the record is in the trash.
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
}

impl RecordResponse {
    pub fn from_record(schema: &ResourceSchema, record: Record) -> Self {
        let mut fields = record.fields;
        for hidden in schema.hidden_fields() {
            fields.remove(hidden);
        }

        let media = record
            .media
            .into_iter()
            .map(|(slot, pair)| {
                let view = MediaView {
                    url: format!("{MEDIA_URL_PREFIX}/{}", pair.path),
                    thumbnail_url: format!("{MEDIA_URL_PREFIX}/{}", pair.thumbnail),
                    path: pair.path,
                    thumbnail: pair.thumbnail,
                };
                (slot, view)
            })
            .collect();

        Self {
            id: record.id,
            fields,
            media,
            deleted_at: record.deleted_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
            created_by: record.created_by,
            updated_by: record.updated_by,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RecordListResponse {
    pub items: Vec<RecordResponse>,
    pub pagination: Pagination,
}

impl RecordListResponse {
    pub fn from_page(schema: &ResourceSchema, page: Page<Record>) -> Self {
        let pagination = Pagination {
            page: page.page,
            per_page: page.per_page,
            total: page.total,
            total_pages: page.total_pages(),
        };
        Self {
            items: page
                .items
                .into_iter()
                .map(|r| RecordResponse::from_record(schema, r))
                .collect(),
            pagination,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DeletedResponse {
    #[schema(example = 42)]
    pub id: i32,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RestoreAllResponse {
    /// Number of records moved out of the trash.
    #[schema(example = 3)]
    pub restored: u64,
}
