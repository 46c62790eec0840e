//! RPC module
//!
//! JSON-RPC transport to the chain node.
//!
//! # Features
//!
//! - **Automatic Retries**: transient HTTP failures are retried with backoff
//! - **Rate Limiting**: token bucket rate limiter using governor
//! - **Error Mapping**: JSON-RPC error objects surface as `Error::Rpc`

mod client;
mod rate_limit;

pub use client::{RpcClient, RpcClientConfig, RpcClientConfigBuilder};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
