//! # Bridge SDK
//!
//! Client-side storage access for a Bitcoin bridge chain: cursor-paginated
//! scans over on-chain storage maps (vault registry, issue and redeem
//! requests) through the node's JSON-RPC interface.
//!
//! ## Features
//!
//! - **Cursor Pagination**: lazy page streams over any ordered remote collection
//! - **Exhaustion Probing**: never asks the node for entries past the last key
//! - **JSON-RPC Transport**: retries, backoff and rate limiting
//! - **Mock Provider**: in-memory collection with call recording and fault injection
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bridge_sdk::{CursorPaginator, RpcClient, StorageKey, StorageMap};
//! use futures::TryStreamExt;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> bridge_sdk::Result<()> {
//!     let client = Arc::new(RpcClient::connect("http://127.0.0.1:9933")?);
//!     let vaults = StorageMap::new(client, "vault_registry", StorageKey::from_hex("0x…")?);
//!
//!     let paginator = CursorPaginator::new(100)?;
//!     let mut pages = Box::pin(paginator.paginate(&vaults));
//!     while let Some(page) = pages.try_next().await? {
//!         println!("{} vaults up to {}", page.len(), page.last_key());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │   CursorPaginator::paginate(collection) → Stream<Page>    │
//! └──────────────────────────────────────────────────────────┘
//!                             │ RemoteCollection
//!            ┌────────────────┴────────────────┐
//!      StorageMap                        MemoryCollection
//!  state_getKeysPaged                    BTreeMap + call log
//!  state_queryStorageAt                  fault injection
//!            │
//!        RpcClient (retry, backoff, rate limit)
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the SDK
pub mod error;

/// Common types and type aliases
pub mod types;

/// Cursor pagination over remote collections
pub mod pagination;

/// Storage map and in-memory collections
pub mod storage;

/// JSON-RPC client with retry and rate limiting
pub mod rpc;

/// YAML configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};

pub use config::SdkConfig;
pub use pagination::{paginate, CursorPaginator, Exhaustion, Page, RemoteCollection, StorageKey};
pub use rpc::{RpcClient, RpcClientConfig};
pub use storage::{MemoryCollection, StorageMap};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
