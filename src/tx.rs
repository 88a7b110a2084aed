//! Transaction management and MVCC (Multi-Version Concurrency Control) infrastructure.
//!
//! This module implements the core components for MVCC:
//! - Transaction ID allocation and lifecycle management
//! - Snapshots for consistent reads
//! - Visibility rules to determine which row versions are visible

pub mod error;
pub mod manager;
pub mod snapshot;
pub mod types;

pub use error::TxError;
pub use manager::TransactionManager;
pub use snapshot::Snapshot;
pub use types::{IsolationLevel, TxId, TxState};
