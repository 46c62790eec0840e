//! Common types used throughout the bridge SDK
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// Hex-encoded block hash (`0x`-prefixed) used to pin storage queries
pub type BlockHash = String;

// ============================================================================
// Backoff Type
// ============================================================================

/// Retry backoff strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Hex helpers
// ============================================================================

/// Encode bytes as `0x`-prefixed lowercase hex
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode `0x`-prefixed (or bare) hex into bytes
pub fn from_hex(s: &str) -> std::result::Result<Vec<u8>, hex::FromHexError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_helpers() {
        assert_eq!(to_hex(&[0xde, 0xad]), "0xdead");
        assert_eq!(to_hex(&[]), "0x");
        assert_eq!(from_hex("0xdead").unwrap(), vec![0xde, 0xad]);
        assert_eq!(from_hex("beef").unwrap(), vec![0xbe, 0xef]);
        assert!(from_hex("0xzz").is_err());
    }

    #[test]
    fn test_backoff_type_serde() {
        let b: BackoffType = serde_yaml::from_str("linear").unwrap();
        assert_eq!(b, BackoffType::Linear);
        assert_eq!(BackoffType::default(), BackoffType::Exponential);
    }
}
