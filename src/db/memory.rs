use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::warn;

use super::{CURSOR_END, EntityStore, ScanPage, StoreError, StoreResult};

#[derive(Default)]
struct Inner {
    records: HashMap<String, Vec<u8>>,
    index: BTreeSet<String>,
}

/// In-process store with the same conditional-write semantics as Redis.
///
/// Records and the index share one lock, so they can never be observed
/// out of step. The scan cursor is a position in the sorted index.
pub struct MemoryStore {
    name: String,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new(index: &str) -> Self {
        Self {
            name: index.to_string(),
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Every mutation below leaves Inner consistent before it can panic,
        // so a poisoned guard is still safe to use.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn insert(&self, key: &str, record: &[u8]) -> StoreResult<()> {
        let mut inner = self.lock();
        if inner.records.contains_key(key) {
            return Err(StoreError::AlreadyExists);
        }

        inner.records.insert(key.to_string(), record.to_vec());
        inner.index.insert(key.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        self.lock().records.get(key).cloned().ok_or(StoreError::NotFound)
    }

    async fn update(&self, key: &str, record: &[u8]) -> StoreResult<()> {
        let mut inner = self.lock();
        match inner.records.get_mut(key) {
            Some(existing) => {
                *existing = record.to_vec();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut inner = self.lock();
        if inner.records.remove(key).is_none() {
            return Err(StoreError::NotFound);
        }

        inner.index.remove(key);
        Ok(())
    }

    async fn scan(&self, cursor: u64, size: u64) -> StoreResult<ScanPage> {
        let inner = self.lock();
        let start = usize::try_from(cursor).unwrap_or(usize::MAX);
        let size = usize::try_from(size.max(1)).unwrap_or(usize::MAX);

        let mut records = Vec::new();
        for key in inner.index.iter().skip(start).take(size) {
            match inner.records.get(key) {
                Some(record) => records.push(record.clone()),
                None => warn!(%key, index = %self.name, "index entry has no record"),
            }
        }

        let end = start.saturating_add(size);
        let cursor = if end < inner.index.len() {
            end as u64
        } else {
            CURSOR_END
        };

        Ok(ScanPage { records, cursor })
    }
}
