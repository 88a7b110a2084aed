//! JDBC-style driver.
//!
//! A [`DataSource`] hands out [`Connection`]s to an in-process
//! [`Database`](crate::db::Database) or to a server over TCP. Connections
//! run ad-hoc SQL through [`Statement`] and parameterized SQL through
//! [`PreparedStatement`], and drive server transactions according to their
//! commit mode.
//!
//! ```text
//!   DataSource ──get_connection──> Connection ──> Transport ─┬─> Session (local)
//!                                    │                       └─> Server  (TCP)
//!                                    ├─ Statement
//!                                    └─ PreparedStatement ──> ResultSet
//! ```
//!
//! # Commit modes
//!
//! | auto_commit | transaction_support | behavior                                   |
//! |-------------|---------------------|--------------------------------------------|
//! | true        | any                 | each request commits on its own            |
//! | false       | true                | BEGIN before the first statement, then     |
//! |             |                     | `commit`/`rollback` end the transaction    |
//! | false       | false               | statements apply immediately; `rollback`   |
//! |             |                     | only logs a warning                        |

mod connection;
mod data_source;
mod error;
mod prepared;
mod properties;
mod result_set;
mod statement;
mod transport;
mod version;

pub use connection::Connection;
pub use data_source::{DataSource, Target};
pub use error::SqlError;
pub use prepared::PreparedStatement;
pub use properties::{
    ConnectionProperties, PROP_AUTO_COMMIT, PROP_CREATE_DATABASE, PROP_DATABASE, PROP_PASSWORD,
    PROP_SERVER_TIME_ZONE, PROP_SERVER_VERSION, PROP_TRANSACTION_SUPPORT, PROP_USER,
};
pub use result_set::{ColumnIndex, ResultSet};
pub use statement::Statement;
pub use version::ServerVersion;
