use std::net::SocketAddr;
use std::sync::Arc;

use common::StorageBackend;
use common::storage::BlobStore;
use common::storage::filesystem::FilesystemBlobStore;
use common::storage::memory::MemoryBlobStore;
use tracing::{Level, info, warn};

use server::config::AppConfig;
use server::{database, seed};
use server::schema::SchemaRegistry;
use server::state::AppState;
use server::store::{MemoryRecordStore, RecordStore, SeaOrmRecordStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;
    let registry = Arc::new(SchemaRegistry::builtin());

    let store: Arc<dyn RecordStore> = if config.database.is_memory() {
        warn!("Using in-memory record store; data is lost on exit");
        Arc::new(MemoryRecordStore::new())
    } else {
        let db = database::init_db(&config.database.url).await?;
        database::ensure_indexes(&db, &registry).await;
        info!("Connected to database");
        Arc::new(SeaOrmRecordStore::new(db))
    };

    seed::seed_settings(store.as_ref()).await?;

    let blob_store: Arc<dyn BlobStore> = match config.storage.backend {
        StorageBackend::Filesystem => {
            let store = FilesystemBlobStore::new(
                config.storage.root.clone(),
                config.storage.max_upload_size,
            )
            .await?;
            info!("Storing media under {}", store.base_path().display());
            Arc::new(store)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory blob store; media is lost on exit");
            Arc::new(MemoryBlobStore::with_max_size(config.storage.max_upload_size))
        }
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppState {
        store,
        blob_store,
        registry,
        config,
    };
    let app = server::build_router(state);

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
