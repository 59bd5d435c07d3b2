use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, Script};
use tracing::warn;

use super::{EntityStore, ScanPage, StoreError, StoreResult};

// SET NX and SADD in one script, so a record never exists without its index entry.
const INSERT_SCRIPT: &str = r"
if redis.call('SET', KEYS[1], ARGV[1], 'NX') then
    redis.call('SADD', KEYS[2], KEYS[1])
    return 1
end
return 0
";

const DELETE_SCRIPT: &str = r"
if redis.call('DEL', KEYS[1]) == 1 then
    redis.call('SREM', KEYS[2], KEYS[1])
    return 1
end
return 0
";

/// Redis backed store. Records are plain string values, the index is a set.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    index: String,
    insert: Script,
    delete: Script,
}

impl RedisStore {
    /// Open a managed connection and check the server answers
    pub async fn connect(url: &str, index: &str) -> StoreResult<Self> {
        let client = Client::open(url)?;
        let mut conn = ConnectionManager::new(client).await?;

        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        Ok(Self::new(conn, index))
    }

    pub fn new(conn: ConnectionManager, index: &str) -> Self {
        Self {
            conn,
            index: index.to_string(),
            insert: Script::new(INSERT_SCRIPT),
            delete: Script::new(DELETE_SCRIPT),
        }
    }
}

#[async_trait]
impl EntityStore for RedisStore {
    async fn insert(&self, key: &str, record: &[u8]) -> StoreResult<()> {
        let mut conn = self.conn.clone();

        let created: i64 = self
            .insert
            .key(key)
            .key(&self.index)
            .arg(record)
            .invoke_async(&mut conn)
            .await?;

        if created == 0 {
            return Err(StoreError::AlreadyExists);
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        let mut conn = self.conn.clone();

        let value: Option<Vec<u8>> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;

        value.ok_or(StoreError::NotFound)
    }

    async fn update(&self, key: &str, record: &[u8]) -> StoreResult<()> {
        let mut conn = self.conn.clone();

        // Nil reply means XX refused the write
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(record)
            .arg("XX")
            .query_async(&mut conn)
            .await?;

        match reply {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();

        let removed: i64 = self
            .delete
            .key(key)
            .key(&self.index)
            .invoke_async(&mut conn)
            .await?;

        if removed == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn scan(&self, cursor: u64, size: u64) -> StoreResult<ScanPage> {
        let mut conn = self.conn.clone();

        let (next, keys): (u64, Vec<String>) = redis::cmd("SSCAN")
            .arg(&self.index)
            .arg(cursor)
            .arg("COUNT")
            .arg(size.max(1))
            .query_async(&mut conn)
            .await?;

        // SSCAN may hand back an empty batch mid-iteration; keep the cursor.
        if keys.is_empty() {
            return Ok(ScanPage {
                records: Vec::new(),
                cursor: next,
            });
        }

        let values: Vec<Option<Vec<u8>>> = redis::cmd("MGET").arg(&keys).query_async(&mut conn).await?;

        let mut records = Vec::with_capacity(values.len());
        for (key, value) in keys.iter().zip(values) {
            match value {
                Some(record) => records.push(record),
                // Deleted between SSCAN and MGET, or written by something
                // that bypassed the scripts.
                None => warn!(%key, index = %self.index, "index entry has no record"),
            }
        }

        Ok(ScanPage {
            records,
            cursor: next,
        })
    }
}
