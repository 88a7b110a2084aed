//! Snapshot for MVCC isolation.
//!
//! A snapshot captures the state of committed transactions at a specific point in time,
//! enabling consistent reads without locking.
//!
//! This module provides:
//! - [`Snapshot`]: Transaction visibility state at a point in time
//! - MVCC visibility rules: Determining which row versions are visible based on
//!   xmin/xmax transaction IDs and commit status

use super::manager::TransactionManager;
use super::types::TxId;

/// Snapshot for MVCC visibility determination.
///
/// Snapshot with xmin, xmax, and in-progress transaction list (the same
/// structure PostgreSQL uses). Each statement within a READ COMMITTED
/// transaction gets a fresh snapshot; a SNAPSHOT transaction keeps the one
/// taken at BEGIN.
///
/// # Transaction Visibility Ranges
///
/// - `txid < xmin`: **Past** (completed before snapshot; visible if committed)
/// - `xmin <= txid < xmax`: **Present** (check `xip` to determine if in-progress)
/// - `xmax <= txid`: **Future** (started after snapshot, always invisible)
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Lower bound
    pub xmin: TxId,
    /// Upper bound
    pub xmax: TxId,
    /// Transactions in progress at snapshot time (invisible to this snapshot).
    pub xip: Vec<TxId>,
    /// Current transaction ID (for self-visibility); INVALID outside a transaction.
    pub current_txid: TxId,
}

impl Snapshot {
    /// Check if a transaction ID falls before this snapshot and was not in
    /// progress when it was taken.
    pub fn is_txid_visible(&self, txid: TxId) -> bool {
        if txid >= self.xmax {
            // Transaction started after snapshot was taken (future)
            return false;
        }

        if txid < self.xmin {
            // All transactions before xmin had completed (past)
            return true;
        }

        // Check if transaction was in progress at snapshot time (present)
        !self.xip.contains(&txid)
    }

    /// Determine row version visibility.
    ///
    /// A row version is visible iff:
    /// - its inserting transaction (`xmin`) is the current one, or committed
    ///   before the snapshot, AND
    /// - its deleting transaction (`xmax`), if any, is neither the current
    ///   one nor committed before the snapshot.
    pub fn is_visible(&self, xmin: TxId, xmax: TxId, tx_manager: &TransactionManager) -> bool {
        self.is_inserted(xmin, tx_manager) && !self.is_deleted(xmax, tx_manager)
    }

    /// Check insert visibility (xmin side).
    fn is_inserted(&self, xmin: TxId, tx_manager: &TransactionManager) -> bool {
        // Self-visibility: row inserted by current transaction
        if !self.current_txid.is_invalid() && xmin == self.current_txid {
            return true;
        }

        self.is_txid_visible(xmin) && tx_manager.is_committed(xmin)
    }

    /// Check delete visibility (xmax side).
    fn is_deleted(&self, xmax: TxId, tx_manager: &TransactionManager) -> bool {
        // Not deleted
        if xmax.is_invalid() {
            return false;
        }

        // Self-deletion: row deleted by current transaction
        if xmax == self.current_txid {
            return true;
        }

        self.is_txid_visible(xmax) && tx_manager.is_committed(xmax)
    }
}
