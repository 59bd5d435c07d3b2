//! Entity storage over a key-value backend.
//!
//! Records are opaque bytes addressed by a derived key. Backends have no
//! native "list all", so every live key is also kept in an index set and
//! enumeration walks that set with a resumable cursor.
//!
//! A key is in the index exactly while its record exists. Both backends
//! apply the record write and the index write as one atomic step; see
//! `RedisStore` for how that is done on the server.

mod client;
mod memory;
mod redis;

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::Config;

pub use self::client::{ClientRepository, FindAllPage, FindResult, client_key};
pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// Name of the index set holding every live client key
pub const CLIENT_INDEX: &str = "clients";

/// Cursor value that starts a scan and, when returned, ends it
pub const CURSOR_END: u64 = 0;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record does not exist")]
    NotFound,
    #[error("record already exists")]
    AlreadyExists,
    #[error("store unavailable: {0}")]
    Unavailable(#[from] ::redis::RedisError),
    #[error("failed to encode or decode record: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// One page of a scan. `cursor` is `CURSOR_END` once the index is exhausted.
#[derive(Debug)]
pub struct ScanPage {
    pub records: Vec<Vec<u8>>,
    pub cursor: u64,
}

/// Conditional writes, point reads and index enumeration over one collection.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Store `record` only if `key` is free, and add `key` to the index.
    async fn insert(&self, key: &str, record: &[u8]) -> StoreResult<()>;

    async fn get(&self, key: &str) -> StoreResult<Vec<u8>>;

    /// Overwrite `record` only if `key` already holds one.
    async fn update(&self, key: &str, record: &[u8]) -> StoreResult<()>;

    /// Remove the record and its index entry.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Read about `size` records starting at `cursor`. Backends may treat
    /// `size` as a hint and return more.
    ///
    /// Pages are independent round trips. Writes made between pages may
    /// cause a record to be skipped or returned twice.
    async fn scan(&self, cursor: u64, size: u64) -> StoreResult<ScanPage>;
}

/// Build the store selected by `config`
pub async fn init(config: &Config) -> Result<Arc<dyn EntityStore>> {
    if config.memory {
        info!("using in-memory store");
        return Ok(Arc::new(MemoryStore::new(CLIENT_INDEX)));
    }

    let store = RedisStore::connect(config.redis_url(), CLIENT_INDEX)
        .await
        .with_context(|| format!("failed to connect to redis at {}", config.redis_url()))?;
    info!(url = %config.redis_url(), "connected to redis");

    Ok(Arc::new(store))
}
