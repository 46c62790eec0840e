//! Storage module
//!
//! Concrete [`RemoteCollection`](crate::pagination::RemoteCollection)
//! implementations:
//!
//! - `StorageMap` - an on-chain storage map read over JSON-RPC
//! - `MemoryCollection` - in-memory mock provider with call recording and
//!   fault injection

mod map;
mod memory;

pub use map::StorageMap;
pub use memory::{Call, MemoryCollection, MemoryError};
