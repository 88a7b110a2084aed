//! Core MVCC types: TxId, TxState and IsolationLevel.

use std::fmt;

use serde::Deserialize;

/// Transaction ID (64-bit).
///
/// TxIds are allocated sequentially starting from 1. TxId 0 is reserved as INVALID
/// and marks a row version that has not been deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxId(u64);

impl TxId {
    /// Invalid transaction ID (0).
    pub const INVALID: Self = Self(0);

    /// Create a new transaction ID.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw u64 value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Check if this is an invalid transaction ID.
    pub const fn is_invalid(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    /// Transaction is running.
    InProgress,
    /// Transaction committed; its writes are visible to later snapshots.
    Committed,
    /// Transaction aborted; its writes are never visible to anyone else.
    Aborted,
}

impl fmt::Display for TxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TxState::InProgress => "in-progress",
            TxState::Committed => "committed",
            TxState::Aborted => "aborted",
        })
    }
}

/// Isolation level of explicit transactions.
///
/// Both levels hide other sessions' uncommitted writes and always show a
/// transaction its own writes. They differ only in when the snapshot is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    /// A fresh snapshot per statement: commits by other sessions become
    /// visible to the next statement.
    #[default]
    ReadCommitted,
    /// One snapshot taken at BEGIN and reused for the whole transaction.
    Snapshot,
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IsolationLevel::ReadCommitted => "read_committed",
            IsolationLevel::Snapshot => "snapshot",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txid() {
        assert_eq!(TxId::INVALID.as_u64(), 0);
        assert!(TxId::INVALID.is_invalid());

        let txid = TxId::new(42);
        assert_eq!(txid.as_u64(), 42);
        assert!(!txid.is_invalid());

        // Test ordering
        assert!(TxId::new(1) < TxId::new(2));
    }

    #[test]
    fn test_isolation_level_default() {
        assert_eq!(IsolationLevel::default(), IsolationLevel::ReadCommitted);
        assert_eq!(IsolationLevel::Snapshot.to_string(), "snapshot");
    }
}
