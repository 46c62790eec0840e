//! On-chain storage map collection
//!
//! Binds [`RemoteCollection`] to a storage map on the chain node, addressed
//! by the hashed key prefix every entry of the map shares.

use crate::error::{Error, Result};
use crate::pagination::{RemoteCollection, StorageKey};
use crate::rpc::RpcClient;
use crate::types::{from_hex, BlockHash};
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// One block's worth of storage changes from `state_queryStorageAt`
#[derive(Debug, Deserialize)]
struct StorageChangeSet {
    changes: Vec<(StorageKey, Option<String>)>,
}

/// Storage map read through a chain node
#[derive(Debug, Clone)]
pub struct StorageMap {
    client: Arc<RpcClient>,
    name: String,
    prefix: StorageKey,
    at: Option<BlockHash>,
}

impl StorageMap {
    /// Create a collection over every key starting with `prefix`
    pub fn new(client: Arc<RpcClient>, name: impl Into<String>, prefix: StorageKey) -> Self {
        Self {
            client,
            name: name.into(),
            prefix,
            at: None,
        }
    }

    /// Read every page at block `at` instead of the best block
    #[must_use]
    pub fn pinned(mut self, at: impl Into<BlockHash>) -> Self {
        self.at = Some(at.into());
        self
    }

    /// Map name used in logs and CLI output
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared key prefix
    pub fn prefix(&self) -> &StorageKey {
        &self.prefix
    }

    /// Block the map is pinned to, if any
    pub fn at(&self) -> Option<&str> {
        self.at.as_deref()
    }

    /// `state_getKeysPaged`: up to `count` keys under the prefix after `start`
    async fn keys_paged(&self, start: Option<&StorageKey>, count: usize) -> Result<Vec<StorageKey>> {
        let mut params = vec![json!(self.prefix), json!(count)];
        if start.is_some() || self.at.is_some() {
            params.push(json!(start));
        }
        if let Some(at) = &self.at {
            params.push(json!(at));
        }

        let keys: Vec<StorageKey> = self.client.call("state_getKeysPaged", json!(params)).await?;
        debug!(map = %self.name, count = keys.len(), "Fetched storage keys");
        Ok(keys)
    }

    /// `state_queryStorageAt`: current values of `keys`
    async fn query_storage(&self, keys: &[StorageKey]) -> Result<HashMap<StorageKey, Bytes>> {
        let mut params = vec![json!(keys)];
        if let Some(at) = &self.at {
            params.push(json!(at));
        }

        let change_sets: Vec<StorageChangeSet> =
            self.client.call("state_queryStorageAt", json!(params)).await?;

        let mut values = HashMap::with_capacity(keys.len());
        for change_set in change_sets {
            for (key, value) in change_set.changes {
                if let Some(value) = value {
                    let bytes = from_hex(&value)
                        .map_err(|e| Error::decode(format!("storage value for {key}: {e}")))?;
                    values.insert(key, Bytes::from(bytes));
                }
            }
        }
        Ok(values)
    }
}

#[async_trait]
impl RemoteCollection for StorageMap {
    type Value = Bytes;
    type Error = Error;

    async fn fetch_keys(&self, cursor: Option<&StorageKey>, limit: usize) -> Result<Vec<StorageKey>> {
        self.keys_paged(cursor, limit).await
    }

    async fn fetch_entries(
        &self,
        cursor: Option<&StorageKey>,
        limit: usize,
    ) -> Result<Vec<(StorageKey, Bytes)>> {
        let keys = self.keys_paged(cursor, limit).await?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut values = self.query_storage(&keys).await?;

        // Keys whose value vanished between the two calls are dropped.
        Ok(keys
            .into_iter()
            .filter_map(|key| values.remove(&key).map(|value| (key, value)))
            .collect())
    }
}
