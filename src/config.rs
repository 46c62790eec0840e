//! SDK configuration
//!
//! YAML configuration naming the chain node, transport settings and the
//! storage maps the SDK can scan.

use crate::error::{Error, Result};
use crate::pagination::{CursorPaginator, Exhaustion, StorageKey};
use crate::rpc::{RateLimiterConfig, RpcClientConfig};
use crate::types::BackoffType;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete SDK configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdkConfig {
    /// Chain node JSON-RPC endpoint
    pub endpoint: String,

    /// Default page size for every collection
    #[serde(default = "default_page_size")]
    pub page_size: i64,

    /// Exhaustion detection strategy
    #[serde(default)]
    pub exhaustion: Exhaustion,

    /// HTTP transport configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Named storage maps
    #[serde(default)]
    pub collections: Vec<CollectionConfig>,
}

fn default_page_size() -> i64 {
    100
}

impl SdkConfig {
    /// Configuration for `endpoint` with defaults and no collections
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            page_size: default_page_size(),
            exhaustion: Exhaustion::default(),
            http: HttpConfig::default(),
            collections: Vec::new(),
        }
    }

    /// Load and validate configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check endpoint, page sizes, collection names and prefixes
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(Error::missing_field("endpoint"));
        }
        url::Url::parse(&self.endpoint)
            .map_err(|e| Error::invalid_value("endpoint", e.to_string()))?;

        CursorPaginator::try_from_signed(self.page_size)?;

        if self.http.timeout_seconds == 0 {
            return Err(Error::invalid_value("http.timeout_seconds", "must be at least 1"));
        }

        let mut seen = HashSet::new();
        for collection in &self.collections {
            if collection.name.is_empty() {
                return Err(Error::missing_field("collections[].name"));
            }
            if !seen.insert(collection.name.as_str()) {
                return Err(Error::invalid_value(
                    "collections",
                    format!("duplicate collection name '{}'", collection.name),
                ));
            }
            collection.prefix()?;
            if let Some(page_size) = collection.page_size {
                CursorPaginator::try_from_signed(page_size)?;
            }
        }

        Ok(())
    }

    /// Look up a collection by name
    pub fn collection(&self, name: &str) -> Result<&CollectionConfig> {
        self.collections
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| Error::collection_not_found(name))
    }

    /// Page size for `name`, falling back to the default
    pub fn page_size_for(&self, name: &str) -> Result<i64> {
        Ok(self.collection(name)?.page_size.unwrap_or(self.page_size))
    }

    /// Paginator configured for `name`
    pub fn paginator_for(&self, name: &str) -> Result<CursorPaginator> {
        Ok(CursorPaginator::try_from_signed(self.page_size_for(name)?)?
            .with_exhaustion(self.exhaustion))
    }

    /// Transport settings for the RPC client
    pub fn rpc_client_config(&self) -> RpcClientConfig {
        let backoff = &self.http.retry_backoff;
        let mut builder = RpcClientConfig::builder()
            .endpoint(&self.endpoint)
            .timeout(Duration::from_secs(self.http.timeout_seconds))
            .max_retries(self.http.max_retries)
            .backoff(
                backoff.backoff_type,
                Duration::from_millis(backoff.initial_ms),
                Duration::from_millis(backoff.max_ms),
            );

        builder = match &self.http.rate_limit {
            Some(limit) => builder.rate_limit(RateLimiterConfig::new(
                limit.requests_per_second,
                limit.burst,
            )),
            None => builder.no_rate_limit(),
        };

        builder.build()
    }
}

// ============================================================================
// Collection Config
// ============================================================================

/// A named storage map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Name used on the command line (e.g. `vault_registry`)
    pub name: String,

    /// Hex-encoded hashed storage prefix shared by every key of the map
    pub prefix: String,

    /// Page size override
    #[serde(default)]
    pub page_size: Option<i64>,

    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
}

impl CollectionConfig {
    /// Decode the hex prefix
    pub fn prefix(&self) -> Result<StorageKey> {
        StorageKey::from_hex(&self.prefix).map_err(|e| {
            Error::invalid_value(format!("collections.{}.prefix", self.name), e.to_string())
        })
    }
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Retry backoff configuration
    #[serde(default)]
    pub retry_backoff: BackoffConfig,

    /// Rate limiting; `null` disables it
    #[serde(default = "default_rate_limit")]
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            retry_backoff: BackoffConfig::default(),
            rate_limit: default_rate_limit(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_rate_limit() -> Option<RateLimitConfig> {
    Some(RateLimitConfig::default())
}

/// Backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Exponential,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

fn default_initial_ms() -> u64 {
    100
}

fn default_max_ms() -> u64 {
    60000
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests per second limit
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,

    /// Burst size
    #[serde(default = "default_burst")]
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rps(),
            burst: default_burst(),
        }
    }
}

fn default_rps() -> u32 {
    10
}

fn default_burst() -> u32 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
endpoint: http://127.0.0.1:9933
page_size: 50
http:
  timeout_seconds: 5
  max_retries: 1
  retry_backoff:
    type: linear
    initial_ms: 10
    max_ms: 100
collections:
  - name: vault_registry
    prefix: "0x01aa"
  - name: issue_requests
    prefix: "0x02bb"
    page_size: 10
    description: Pending issue requests
"#;

    #[test]
    fn test_parse_sample() {
        let config = SdkConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.endpoint, "http://127.0.0.1:9933");
        assert_eq!(config.exhaustion, Exhaustion::ProbeKeys);
        assert_eq!(config.collections.len(), 2);
        assert_eq!(config.page_size_for("vault_registry").unwrap(), 50);
        assert_eq!(config.page_size_for("issue_requests").unwrap(), 10);
        assert_eq!(
            config.collection("vault_registry").unwrap().prefix().unwrap(),
            StorageKey::new(vec![0x01, 0xaa])
        );
    }

    #[test]
    fn test_new_matches_yaml_defaults() {
        let config = SdkConfig::new("http://node:9933");
        assert_eq!(config.page_size, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = SdkConfig::from_yaml("endpoint: http://node:9933\n").unwrap();
        assert_eq!(config.page_size, 100);
        assert_eq!(config.http.timeout_seconds, 30);
        assert_eq!(config.http.max_retries, 3);
        assert!(config.http.rate_limit.is_some());
        assert!(config.collections.is_empty());
    }

    #[test]
    fn test_rpc_client_config() {
        let config = SdkConfig::from_yaml(SAMPLE).unwrap();
        let rpc = config.rpc_client_config();
        assert_eq!(rpc.endpoint, "http://127.0.0.1:9933");
        assert_eq!(rpc.timeout, Duration::from_secs(5));
        assert_eq!(rpc.max_retries, 1);
        assert_eq!(rpc.backoff_type, BackoffType::Linear);
        assert_eq!(rpc.initial_backoff, Duration::from_millis(10));
        assert_eq!(rpc.rate_limit, Some(RateLimiterConfig::new(10, 10)));
    }

    #[test]
    fn test_rate_limit_disabled() {
        let config =
            SdkConfig::from_yaml("endpoint: http://node:9933\nhttp:\n  rate_limit: null\n").unwrap();
        assert!(config.rpc_client_config().rate_limit.is_none());
    }

    #[test]
    fn test_paginator_for() {
        let yaml = format!("{SAMPLE}exhaustion: empty_page\n");
        let config = SdkConfig::from_yaml(&yaml).unwrap();
        let paginator = config.paginator_for("issue_requests").unwrap();
        assert_eq!(paginator.page_size(), 10);
        assert_eq!(paginator.exhaustion(), Exhaustion::EmptyPage);
    }

    #[test]
    fn test_unknown_collection() {
        let config = SdkConfig::from_yaml(SAMPLE).unwrap();
        let err = config.collection("staked_relayers").unwrap_err();
        assert!(matches!(err, Error::CollectionNotFound { .. }));
    }

    #[test]
    fn test_rejects_invalid_page_size() {
        let err = SdkConfig::from_yaml("endpoint: http://node:9933\npage_size: 0\n").unwrap_err();
        assert!(matches!(err, Error::InvalidPageSize { page_size: 0 }));

        let yaml = "endpoint: http://node:9933\ncollections:\n  - name: a\n    prefix: \"0x01\"\n    page_size: -5\n";
        let err = SdkConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidPageSize { page_size: -5 }));
    }

    #[test]
    fn test_rejects_bad_prefix_and_duplicates() {
        let yaml = "endpoint: http://node:9933\ncollections:\n  - name: a\n    prefix: \"0xzz\"\n";
        let err = SdkConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));

        let yaml = "endpoint: http://node:9933\ncollections:\n  - name: a\n    prefix: \"0x01\"\n  - name: a\n    prefix: \"0x02\"\n";
        let err = SdkConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate collection name 'a'"));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let yaml = "endpoint: http://node:9933\nhttp:\n  timeout_seconds: 0\n";
        let err = SdkConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));
        assert!(err.to_string().contains("http.timeout_seconds"));

        let yaml = "endpoint: http://node:9933\nhttp:\n  timeout_seconds: 1\n";
        let config = SdkConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.http.timeout_seconds, 1);
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        let err = SdkConfig::from_yaml("endpoint: \"\"\n").unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { .. }));

        let err = SdkConfig::from_yaml("endpoint: not a url\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = SdkConfig::from_file(file.path()).unwrap();
        assert_eq!(config.collections[1].name, "issue_requests");

        let err = SdkConfig::from_file("/nonexistent/bridge.yaml").unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
