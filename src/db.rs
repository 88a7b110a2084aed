//! Server-side database state and client sessions.
//!
//! The [`Database`] type owns everything sessions share. Each client gets a
//! [`Session`] that tracks its current database, settings and open
//! transaction, and runs requests against the shared state.
//!
//! # Architecture
//!
//! ```text
//! +------------------------------------------------------------------+
//! |                         Database                                 |
//! |                                                                  |
//! |  +-----------------+  +--------------------+  +---------------+  |
//! |  | Catalog         |  | TransactionManager |  | UserDirectory |  |
//! |  | (databases,     |  | (TxId allocation,  |  | (accounts,    |  |
//! |  |  tables, heaps) |  |  commit/abort)     |  |  grants)      |  |
//! |  +-----------------+  +--------------------+  +---------------+  |
//! +------------------------------------------------------------------+
//!          ^                      ^                     ^
//!          |                      |                     |
//!     +----+----------------------+---------------------+----+
//!     |  Session (one per client)                            |
//!     |  current database, Settings, open transaction        |
//!     +------------------------------------------------------+
//! ```

mod database;
mod error;
mod session;
mod settings;

pub use database::{Database, ServerInfo};
pub use error::DatabaseError;
pub use session::{Session, SessionInfo, TransactionState, TransactionStatus};
pub use settings::{OverflowMode, Settings, SettingsError};
