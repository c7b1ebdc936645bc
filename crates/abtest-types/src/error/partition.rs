//! Partition specification errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while parsing a partition spec such as `"0-2,5"`.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum PartitionError {
    /// Token is neither `N` nor `N-M`
    #[error("syntax error near {token:?}")]
    Syntax {
        /// Offending token as written
        token: String,
    },

    /// Token does not start after the previous token ends, or a range runs backwards
    #[error("error near {token:?}, partitions should be monotonic increasing")]
    NotMonotonic {
        /// Offending token as written
        token: String,
    },

    /// Partition index outside `[0, max)`
    #[error("partition {value} should be less than partition count {max}")]
    OutOfRange {
        /// Offending partition index
        value: u64,
        /// Bucket count the spec was bound to
        max: u64,
    },
}

impl PartitionError {
    /// Malformed token text.
    pub const fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax { .. })
    }

    /// Well-formed token whose values violate ordering or bounds.
    pub const fn is_range(&self) -> bool {
        matches!(self, Self::NotMonotonic { .. } | Self::OutOfRange { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let syntax = PartitionError::Syntax { token: "a".to_string() };
        let range = PartitionError::OutOfRange { value: 10, max: 10 };
        let order = PartitionError::NotMonotonic { token: "3-1".to_string() };

        assert!(syntax.is_syntax());
        assert!(!syntax.is_range());
        assert!(range.is_range());
        assert!(order.is_range());
    }

    #[test]
    fn test_display_names_token() {
        let err = PartitionError::Syntax { token: "1-".to_string() };
        assert!(err.to_string().contains("\"1-\""));

        let err = PartitionError::OutOfRange { value: 12, max: 10 };
        let msg = err.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("10"));
    }
}
