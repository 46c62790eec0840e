//! In-memory collection
//!
//! Mock provider used by tests and offline tooling. Records every call and
//! can inject failures, emulate the remote's cursor-at-end quirk, and mutate
//! itself mid-scan.

use crate::pagination::{RemoteCollection, StorageKey};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors raised by [`MemoryCollection`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("Injected failure on call {call}: {message}")]
    Injected { call: usize, message: String },

    #[error("Cursor {cursor} is the last key of the collection")]
    CursorAtEnd { cursor: StorageKey },
}

/// A recorded call against a [`MemoryCollection`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `fetch_keys(cursor, limit)`
    FetchKeys {
        cursor: Option<StorageKey>,
        limit: usize,
    },
    /// `fetch_entries(cursor, limit)`
    FetchEntries {
        cursor: Option<StorageKey>,
        limit: usize,
    },
}

impl Call {
    /// Cursor passed with this call
    pub fn cursor(&self) -> Option<&StorageKey> {
        match self {
            Call::FetchKeys { cursor, .. } | Call::FetchEntries { cursor, .. } => cursor.as_ref(),
        }
    }

    /// Check if this is a key probe
    pub fn is_fetch_keys(&self) -> bool {
        matches!(self, Self::FetchKeys { .. })
    }
}

/// Ordered key-value collection held in memory
#[derive(Debug)]
pub struct MemoryCollection<V> {
    entries: Mutex<BTreeMap<StorageKey, V>>,
    calls: Mutex<Vec<Call>>,
    faults: HashMap<usize, String>,
    removals: HashMap<usize, StorageKey>,
    strict_cursor: bool,
}

impl<V> MemoryCollection<V> {
    /// Create an empty collection
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
            faults: HashMap::new(),
            removals: HashMap::new(),
            strict_cursor: false,
        }
    }

    /// Create a collection holding `entries`
    pub fn from_entries(entries: impl IntoIterator<Item = (StorageKey, V)>) -> Self {
        let collection = Self::new();
        Self {
            entries: Mutex::new(entries.into_iter().collect()),
            ..collection
        }
    }

    /// Fail the `call`-th call (1-based, both kinds counted) with `message`
    #[must_use]
    pub fn fail_on_call(mut self, call: usize, message: impl Into<String>) -> Self {
        self.faults.insert(call, message.into());
        self
    }

    /// Remove `key` right before the `call`-th call is served
    #[must_use]
    pub fn remove_on_call(mut self, call: usize, key: StorageKey) -> Self {
        self.removals.insert(call, key);
        self
    }

    /// Reject `fetch_entries` whose cursor is the last key, like the chain node does
    #[must_use]
    pub fn strict_cursor(mut self, strict: bool) -> Self {
        self.strict_cursor = strict;
        self
    }

    /// Insert or replace an entry
    pub async fn insert(&self, key: StorageKey, value: V) -> Option<V> {
        self.entries.lock().await.insert(key, value)
    }

    /// Remove an entry
    pub async fn remove(&self, key: &StorageKey) -> Option<V> {
        self.entries.lock().await.remove(key)
    }

    /// Number of entries currently held
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Check if the collection is empty
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// All calls served so far, in order
    pub async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    /// Number of calls served so far
    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    /// Record a call and apply any scheduled mutation or fault
    async fn begin(&self, call: Call) -> Result<(), MemoryError> {
        let number = {
            let mut calls = self.calls.lock().await;
            calls.push(call);
            calls.len()
        };

        if let Some(key) = self.removals.get(&number) {
            self.entries.lock().await.remove(key);
        }

        match self.faults.get(&number) {
            Some(message) => Err(MemoryError::Injected {
                call: number,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Entries strictly after `cursor`, in key order
fn after<'a, V>(
    entries: &'a BTreeMap<StorageKey, V>,
    cursor: Option<&StorageKey>,
) -> impl Iterator<Item = (&'a StorageKey, &'a V)> {
    let lower = match cursor {
        Some(cursor) => Bound::Excluded(cursor.clone()),
        None => Bound::Unbounded,
    };
    entries.range((lower, Bound::Unbounded))
}

impl<V> Default for MemoryCollection<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FromIterator<(StorageKey, V)> for MemoryCollection<V> {
    fn from_iter<I: IntoIterator<Item = (StorageKey, V)>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

#[async_trait]
impl<V> RemoteCollection for MemoryCollection<V>
where
    V: Clone + Send + Sync,
{
    type Value = V;
    type Error = MemoryError;

    async fn fetch_keys(
        &self,
        cursor: Option<&StorageKey>,
        limit: usize,
    ) -> Result<Vec<StorageKey>, MemoryError> {
        self.begin(Call::FetchKeys {
            cursor: cursor.cloned(),
            limit,
        })
        .await?;

        let entries = self.entries.lock().await;
        Ok(after(&entries, cursor)
            .take(limit)
            .map(|(k, _)| k.clone())
            .collect())
    }

    async fn fetch_entries(
        &self,
        cursor: Option<&StorageKey>,
        limit: usize,
    ) -> Result<Vec<(StorageKey, V)>, MemoryError> {
        self.begin(Call::FetchEntries {
            cursor: cursor.cloned(),
            limit,
        })
        .await?;

        let entries = self.entries.lock().await;
        if self.strict_cursor {
            if let Some(cursor) = cursor {
                if entries.keys().next_back() == Some(cursor) {
                    return Err(MemoryError::CursorAtEnd {
                        cursor: cursor.clone(),
                    });
                }
            }
        }

        Ok(after(&entries, cursor)
            .take(limit)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
