//! Catalog of databases, tables and users.
//!
//! [`Catalog`] maps database names to their tables and owns the built-in
//! `system` database, whose [`SystemTable`]s are materialized on read.
//! [`UserDirectory`] holds the accounts sessions authenticate against, with
//! their [`ReadOnlyLevel`] and grants.
//!
//! ## System Tables
//!
//! | Table              | Columns                                 |
//! |--------------------|-----------------------------------------|
//! | `system.databases` | `name`, `engine`                        |
//! | `system.tables`    | `database`, `name`, `engine`, `total_rows` |
//! | `system.one`       | `dummy`                                 |
//! | `system.users`     | `name`, `readonly`                      |

mod error;
mod registry;
mod system;
mod types;
mod user;

pub use error::CatalogError;
pub use registry::{Catalog, DatabaseInfo};
pub use system::SystemTable;
pub use types::{ColumnDef, DEFAULT_DATABASE, SYSTEM_DATABASE, TableDef, TableEngine};
pub use user::{Grant, GrantScope, ReadOnlyLevel, User, UserDirectory};
