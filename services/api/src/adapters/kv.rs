//! services/api/src/adapters/kv.rs
//!
//! A minimal key-value blob store. Every entity the service persists is serialized to a
//! JSON string and stored under a well-known key, mirroring how the browser client kept
//! its state. Two backends are provided: process memory and a single PostgreSQL table.

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use study_planner_core::ports::{PortError, PortResult};
use tokio::sync::RwLock;

//=========================================================================================
// The Blob Store Contract
//=========================================================================================

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    /// Inserts or replaces the value stored under `key`.
    async fn put(&self, key: &str, value: String) -> PortResult<()>;

    async fn delete(&self, key: &str) -> PortResult<()>;
}

//=========================================================================================
// In-Memory Backend
//=========================================================================================

/// Keeps blobs in a map for the lifetime of the process.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.blobs.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> PortResult<()> {
        self.blobs.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> PortResult<()> {
        self.blobs.write().await.remove(key);
        Ok(())
    }
}

//=========================================================================================
// PostgreSQL Backend
//=========================================================================================

/// Stores blobs in the `kv_blobs` table.
#[derive(Clone)]
pub struct PgBlobStore {
    pool: PgPool,
}

impl PgBlobStore {
    /// Creates a new `PgBlobStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl BlobStore for PgBlobStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT value FROM kv_blobs WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    async fn put(&self, key: &str, value: String) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO kv_blobs (key, value, updated_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM kv_blobs WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}
