//! Pagination types and traits
//!
//! Defines the core pagination abstractions: the opaque storage key used as
//! cursor, the page yielded per step, the per-scan state, and the capability
//! a remote collection has to provide.

use crate::types::{from_hex, to_hex};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ============================================================================
// Storage Key
// ============================================================================

/// Opaque key of a remote collection entry
///
/// Keys are compared for equality only by the paginator; their order is
/// whatever order the backing store returns them in.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StorageKey(Bytes);

impl StorageKey {
    /// Create a key from raw bytes
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Parse a `0x`-prefixed (or bare) hex key
    pub fn from_hex(s: &str) -> std::result::Result<Self, hex::FromHexError> {
        from_hex(s).map(Self::new)
    }

    /// Hex representation with `0x` prefix
    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Check whether this key starts with the given prefix
    pub fn starts_with(&self, prefix: &StorageKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Key length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the key is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[u8]> for StorageKey {
    fn from(bytes: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(bytes))
    }
}

impl From<Vec<u8>> for StorageKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

impl From<&str> for StorageKey {
    fn from(s: &str) -> Self {
        Self(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageKey({})", self.to_hex())
    }
}

impl Serialize for StorageKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for StorageKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Page
// ============================================================================

/// One bounded, non-empty batch of entries in collection order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<V> {
    entries: Vec<(StorageKey, V)>,
}

impl<V> Page<V> {
    /// Wrap fetched entries; returns `None` for an empty batch
    pub fn new(entries: Vec<(StorageKey, V)>) -> Option<Self> {
        if entries.is_empty() {
            None
        } else {
            Some(Self { entries })
        }
    }

    /// Number of entries in this page (always at least 1)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; kept for API symmetry with collections
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key of the last entry, which becomes the next cursor
    pub fn last_key(&self) -> &StorageKey {
        &self.entries[self.entries.len() - 1].0
    }

    /// Keys of this page in order
    pub fn keys(&self) -> impl Iterator<Item = &StorageKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Entries of this page in order
    pub fn entries(&self) -> &[(StorageKey, V)] {
        &self.entries
    }

    /// Consume the page into its entries
    pub fn into_entries(self) -> Vec<(StorageKey, V)> {
        self.entries
    }
}

impl<V> IntoIterator for Page<V> {
    type Item = (StorageKey, V);
    type IntoIter = std::vec::IntoIter<(StorageKey, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// ============================================================================
// Exhaustion Strategy
// ============================================================================

/// How the paginator detects that the collection is exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exhaustion {
    /// Probe with `fetch_keys` before every `fetch_entries`; stop on zero keys.
    /// Required by stores that reject an entries query whose cursor is the
    /// last key instead of answering with an empty result.
    #[default]
    ProbeKeys,
    /// One `fetch_entries` call per page; stop on the first empty result
    EmptyPage,
}

// ============================================================================
// Pagination State
// ============================================================================

/// Tracks cursor state during a single scan
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Key of the last entry of the most recently yielded page
    pub cursor: Option<StorageKey>,
    /// Pages yielded so far
    pub pages: u64,
    /// Entries yielded so far
    pub total_fetched: u64,
}

impl PaginationState {
    /// Create a new pagination state positioned at the start of the collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a yielded page and move the cursor to its last key
    pub fn advance<V>(&mut self, page: &Page<V>) {
        self.cursor = Some(page.last_key().clone());
        self.pages += 1;
        self.total_fetched += page.len() as u64;
    }
}

// ============================================================================
// Remote Collection
// ============================================================================

/// Read-only capability over an ordered remote key-value collection
///
/// Both operations return at most `limit` items strictly after `cursor` in
/// collection order, or from the start when `cursor` is `None`.
#[async_trait]
pub trait RemoteCollection: Send + Sync {
    /// Entry value type
    type Value: Send;
    /// Transport error, passed through to page consumers unchanged
    type Error: Send;

    /// Fetch up to `limit` keys after `cursor`
    async fn fetch_keys(
        &self,
        cursor: Option<&StorageKey>,
        limit: usize,
    ) -> std::result::Result<Vec<StorageKey>, Self::Error>;

    /// Fetch up to `limit` entries after `cursor`
    async fn fetch_entries(
        &self,
        cursor: Option<&StorageKey>,
        limit: usize,
    ) -> std::result::Result<Vec<(StorageKey, Self::Value)>, Self::Error>;
}
