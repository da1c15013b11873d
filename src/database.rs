use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::store::{MemoryStore, PgStore, Store};

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Opens the configured store; `memory` selects the in-process store.
pub async fn connect(database_url: &str) -> Result<Arc<dyn Store>, sqlx::Error> {
    if database_url == "memory" {
        tracing::warn!("Using in-memory store; data is lost on shutdown");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let pool = create_pool(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");
    Ok(Arc::new(PgStore::new(pool)))
}
