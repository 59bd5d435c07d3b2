use std::sync::Arc;

use uuid::Uuid;

use super::{EntityStore, StoreResult};
use crate::models::Client;

/// Store key for a client record. Changing this orphans every stored client.
pub fn client_key(id: Uuid) -> String {
    format!("client:{}", id.hyphenated())
}

/// Scan request. `offset` is the cursor returned by the previous page.
#[derive(Debug, Clone, Copy)]
pub struct FindAllPage {
    pub size: u64,
    pub offset: u64,
}

#[derive(Debug)]
pub struct FindResult {
    pub clients: Vec<Client>,
    pub cursor: u64,
}

/// Client CRUD over an entity store, with JSON as the record format
#[derive(Clone)]
pub struct ClientRepository {
    store: Arc<dyn EntityStore>,
}

impl ClientRepository {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub async fn insert(&self, client: &Client) -> StoreResult<()> {
        let data = serde_json::to_vec(client)?;
        self.store.insert(&client_key(client.id), &data).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> StoreResult<Client> {
        let data = self.store.get(&client_key(id)).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    pub async fn update(&self, client: &Client) -> StoreResult<()> {
        let data = serde_json::to_vec(client)?;
        self.store.update(&client_key(client.id), &data).await
    }

    pub async fn delete_by_id(&self, id: Uuid) -> StoreResult<()> {
        self.store.delete(&client_key(id)).await
    }

    pub async fn find_all(&self, page: FindAllPage) -> StoreResult<FindResult> {
        let scanned = self.store.scan(page.offset, page.size).await?;

        let clients = scanned
            .records
            .iter()
            .map(|data| serde_json::from_slice(data))
            .collect::<Result<Vec<Client>, _>>()?;

        Ok(FindResult {
            clients,
            cursor: scanned.cursor,
        })
    }
}
