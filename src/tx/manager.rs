//! Transaction manager for MVCC.
//!
//! Manages transaction lifecycle: allocation of TxIds, tracking active transactions,
//! and maintaining commit/abort state.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::trace;

use super::error::TxError;
use super::snapshot::Snapshot;
use super::types::{TxId, TxState};

/// Internal state protected by a single mutex to ensure atomicity
/// between txid allocation and active transaction tracking.
struct TxManagerState {
    /// Next transaction ID to allocate.
    next_txid: u64,
    /// Active (in-progress) transaction IDs for snapshot generation.
    active_txids: Vec<TxId>,
}

/// Transaction manager.
///
/// Responsibilities:
/// - Allocate sequential TxIds starting from 1
/// - Track active (in-progress) transactions for snapshot generation
/// - Maintain transaction commit/abort state
///
/// NOTE: Transaction state lives only in memory, like the tables themselves.
pub struct TransactionManager {
    /// Atomic state for txid allocation and active tracking.
    state: Mutex<TxManagerState>,
    /// Transaction state map (in-progress, committed, aborted).
    tx_states: Mutex<HashMap<TxId, TxState>>,
}

impl TransactionManager {
    /// Create a new transaction manager.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TxManagerState {
                next_txid: 1, // 0 is INVALID
                active_txids: Vec::new(),
            }),
            tx_states: Mutex::new(HashMap::new()),
        }
    }

    /// Begin a new transaction.
    ///
    /// Allocates a new TxId, marks it as in-progress, and adds it to the active list.
    pub fn begin(&self) -> TxId {
        // Hold both locks so a concurrent snapshot never sees the txid as
        // active without a state entry.
        let mut state = self.state.lock();
        let txid = TxId::new(state.next_txid);
        state.next_txid += 1;
        state.active_txids.push(txid);
        self.tx_states.lock().insert(txid, TxState::InProgress);
        trace!(%txid, "transaction started");
        txid
    }

    /// Commit a transaction.
    ///
    /// Marks the transaction as committed and removes it from the active list.
    pub fn commit(&self, txid: TxId) -> Result<(), TxError> {
        self.complete(txid, TxState::Committed)
    }

    /// Abort a transaction.
    ///
    /// Marks the transaction as aborted and removes it from the active list.
    /// Row versions written by the transaction stay in the heap and are
    /// filtered out by visibility checks.
    pub fn abort(&self, txid: TxId) -> Result<(), TxError> {
        self.complete(txid, TxState::Aborted)
    }

    /// Marks the transaction as `state` and removes it from the active list.
    fn complete(&self, txid: TxId, new_state: TxState) -> Result<(), TxError> {
        let mut state = self.state.lock();
        {
            let mut tx_states = self.tx_states.lock();
            match tx_states.get(&txid).copied() {
                Some(TxState::InProgress) => {
                    tx_states.insert(txid, new_state);
                }
                Some(current) => {
                    return Err(TxError::InvalidStateTransition {
                        txid,
                        current,
                        attempted: new_state,
                    });
                }
                None => return Err(TxError::TransactionNotFound(txid)),
            }
        }

        state.active_txids.retain(|&t| t != txid);
        trace!(%txid, state = %new_state, "transaction completed");

        Ok(())
    }

    /// Get the state of a transaction.
    pub fn state(&self, txid: TxId) -> Result<TxState, TxError> {
        self.tx_states
            .lock()
            .get(&txid)
            .copied()
            .ok_or(TxError::TransactionNotFound(txid))
    }

    /// Returns true if the transaction committed.
    ///
    /// Unknown ids are treated as not committed.
    pub fn is_committed(&self, txid: TxId) -> bool {
        matches!(self.state(txid), Ok(TxState::Committed))
    }

    /// Number of transactions currently in progress.
    pub fn active_count(&self) -> usize {
        self.state.lock().active_txids.len()
    }

    /// Create a snapshot for the current transaction.
    ///
    /// Captures the set of active transactions at this moment to determine
    /// which row versions are visible to this snapshot. Pass
    /// [`TxId::INVALID`] for a read outside any transaction.
    pub fn snapshot(&self, current_txid: TxId) -> Snapshot {
        let (xmax, xip) = {
            let state = self.state.lock();
            (TxId::new(state.next_txid), state.active_txids.to_vec())
        };

        // xmin = oldest active transaction, or xmax if none active
        let xmin = xip.iter().min().copied().unwrap_or(xmax);

        Snapshot {
            xmin,
            xmax,
            xip,
            current_txid,
        }
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}
