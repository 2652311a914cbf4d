use std::time::Duration;

use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::{info, warn};

use crate::entity::resource_record;
use crate::schema::{SETTING, SchemaRegistry};
use crate::store::unique_index_name;

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // Set connection pool options
    opt.max_connections(50)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("server::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

/// Partial unique index keeping `field` unique among Active records of `kind`,
/// compared case-insensitively.
fn unique_index_sql(kind: &str, field: &str) -> String {
    format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS \"{name}\" ON resource_record \
         (LOWER(fields ->> '{field}')) WHERE kind = '{kind}' AND deleted_at IS NULL",
        name = unique_index_name(kind, field),
    )
}

async fn ensure(db: &DatabaseConnection, name: &str, sql: &str) {
    match db.execute_unprepared(sql).await {
        Ok(_) => info!("Ensured index {} exists", name),
        Err(e) => warn!("Failed to create index {}: {}", name, e),
    }
}

/// Create the lookup index and the soft-delete-aware unique indexes.
///
/// Unique indexes fail to build while duplicate Active values exist; that is
/// logged and the lifecycle's own checks still apply.
pub async fn ensure_indexes(db: &DatabaseConnection, registry: &SchemaRegistry) {
    // Listing queries: WHERE kind = ? AND deleted_at IS [NOT] NULL
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_resource_record_kind_deleted")
        .table(resource_record::Entity)
        .col(resource_record::Column::Kind)
        .col(resource_record::Column::DeletedAt)
        .to_string(PostgresQueryBuilder);
    ensure(db, "idx_resource_record_kind_deleted", &stmt).await;

    // Settings sit outside the routed registry but keep their keys unique.
    for schema in registry.iter().chain([&SETTING]) {
        for field in schema.unique_fields() {
            let name = unique_index_name(schema.kind, field);
            ensure(db, &name, &unique_index_sql(schema.kind, field)).await;
        }
    }
}
