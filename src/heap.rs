//! Heap storage for table rows.
//!
//! A heap is an unordered, append-only collection of row versions. Every
//! version carries the inserting (`xmin`) and deleting (`xmax`) transaction,
//! so visibility is decided per reader by its [`Snapshot`](crate::tx::Snapshot).
//!
//! - [`Table`]: a table definition plus its row versions
//! - [`RowVersion`]: one version of one row

mod error;
mod table;

pub use error::HeapError;
pub use table::{RowVersion, Table};
