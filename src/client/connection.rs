use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::catalog::{DEFAULT_DATABASE, ReadOnlyLevel};
use crate::datum::Value;
use crate::db::TransactionStatus;
use crate::error_code::ErrorCode;
use crate::executor::ExecResult;
use crate::sql::SettingAssignment;

use super::data_source::Target;
use super::error::SqlError;
use super::prepared::PreparedStatement;
use super::properties::ConnectionProperties;
use super::statement::Statement;
use super::transport::Transport;
use super::version::ServerVersion;

/// First server version accepting `implicit_transaction`.
const IMPLICIT_TRANSACTION_VERSIONS: &str = "[22.7,)";

/// Details fixed when the connection is established.
struct ConnectionInfo {
    user: String,
    schema: String,
    server_version: ServerVersion,
    server_time_zone: String,
    /// Read-only level the server enforces for the account.
    server_readonly: ReadOnlyLevel,
    transaction_support: bool,
    implicit_transaction: bool,
}

struct Inner {
    /// `None` once closed.
    transport: Option<Transport>,
    auto_commit: bool,
    read_only: bool,
}

impl Inner {
    fn transport(&mut self) -> Result<&mut Transport, SqlError> {
        self.transport.as_mut().ok_or_else(SqlError::closed)
    }

    fn in_transaction(&self) -> bool {
        self.transport
            .as_ref()
            .is_some_and(|t| t.status() != TransactionStatus::Idle)
    }
}

/// A driver connection.
///
/// A `Connection` is a cheap handle: clones share the same session, and
/// statements keep a clone. Requests on one session are serialized.
///
/// # Transactions
///
/// With `auto_commit` off and transaction support on, `BEGIN TRANSACTION`
/// is sent before the first statement after a commit or rollback. Without
/// transaction support every statement is applied immediately and
/// [`rollback`](Self::rollback) cannot undo it.
///
/// Dropping the last handle without [`close`](Self::close) ends the
/// session and the server aborts its open transaction.
#[derive(Clone)]
pub struct Connection {
    info: Arc<ConnectionInfo>,
    inner: Arc<Mutex<Inner>>,
}

impl Connection {
    /// Opens a session on `target`.
    ///
    /// A database that does not exist is not an error here; the first query
    /// that needs it fails with UNKNOWN_DATABASE. With
    /// `create_database_if_not_exist` the database is created instead.
    pub async fn connect(
        target: &Target,
        properties: ConnectionProperties,
    ) -> Result<Connection, SqlError> {
        let mut transport = match target {
            Target::Local(database) => Transport::open_local(Arc::clone(database), &properties)?,
            Target::Remote(addr) => Transport::open_remote(addr, &properties).await?,
        };

        // NOTE: with both overrides the account level is not probed and taken
        // as 0; the server is still asked for the current database when
        // none is given.
        let overridden =
            properties.server_version.is_some() && properties.server_time_zone.is_some();
        let probed = if overridden && properties.database.is_some() {
            None
        } else {
            Some(transport.server_info().await?)
        };
        let server_readonly = match &probed {
            Some(info) if !overridden => info.readonly,
            _ => ReadOnlyLevel::ReadWrite,
        };
        let version = properties
            .server_version
            .clone()
            .or_else(|| probed.as_ref().map(|info| info.version.clone()))
            .unwrap_or_default();
        let server_time_zone = properties
            .server_time_zone
            .clone()
            .or_else(|| probed.as_ref().map(|info| info.time_zone.clone()))
            .unwrap_or_default();
        let server_version = ServerVersion::parse(&version).ok_or_else(|| {
            SqlError::new(
                ErrorCode::CANNOT_PARSE_TEXT,
                format!("invalid server version '{version}'"),
            )
        })?;

        let schema = properties
            .database
            .clone()
            .or_else(|| probed.map(|info| info.database))
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        if properties.create_database_if_not_exist && properties.database.is_some() {
            let sql = format!("CREATE DATABASE IF NOT EXISTS {}", quote_identifier(&schema));
            transport.query(&sql, &[]).await?;
        }

        let transaction_support = properties.transaction_support;
        // A read-only account has no writes to wrap.
        let implicit_transaction = transaction_support
            && server_readonly == ReadOnlyLevel::ReadWrite
            && server_version.check(IMPLICIT_TRANSACTION_VERSIONS);
        info!(
            user = %properties.user,
            schema = %schema,
            server_version = %server_version,
            readonly = %server_readonly,
            transaction_support,
            "connection established"
        );

        Ok(Connection {
            info: Arc::new(ConnectionInfo {
                user: properties.user,
                schema,
                server_version,
                server_time_zone,
                server_readonly,
                transaction_support,
                implicit_transaction,
            }),
            inner: Arc::new(Mutex::new(Inner {
                transport: Some(transport),
                auto_commit: properties.auto_commit,
                read_only: server_readonly.is_read_only(),
            })),
        })
    }

    pub fn user(&self) -> &str {
        &self.info.user
    }

    /// The database statements run against.
    pub fn schema(&self) -> &str {
        &self.info.schema
    }

    pub fn server_version(&self) -> &ServerVersion {
        &self.info.server_version
    }

    pub fn server_time_zone(&self) -> &str {
        &self.info.server_time_zone
    }

    pub fn is_transaction_supported(&self) -> bool {
        self.info.transaction_support
    }

    /// True when auto-commit requests run in one server transaction each.
    pub fn is_implicit_transaction_supported(&self) -> bool {
        self.info.implicit_transaction
    }

    pub async fn auto_commit(&self) -> bool {
        self.inner.lock().await.auto_commit
    }

    pub async fn is_read_only(&self) -> bool {
        self.inner.lock().await.read_only
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.transport.is_none()
    }

    /// True while a server transaction is open on this connection.
    pub async fn in_transaction(&self) -> bool {
        self.inner.lock().await.in_transaction()
    }

    /// Runs one request and returns its result.
    pub async fn execute(&self, sql: &str) -> Result<ExecResult, SqlError> {
        let mut inner = self.inner.lock().await;
        let settings = self.query_settings(&inner);
        let begin = !inner.auto_commit && self.info.transaction_support && !inner.in_transaction();

        let transport = inner.transport()?;
        if begin {
            transport.query("BEGIN TRANSACTION", &[]).await?;
            debug!(user = %self.info.user, "transaction started");
        }
        transport.query(sql, &settings).await
    }

    /// Commits the open transaction. Does nothing when none is open.
    pub async fn commit(&self) -> Result<(), SqlError> {
        let mut inner = self.inner.lock().await;
        if !inner.in_transaction() {
            return Ok(());
        }
        inner.transport()?.query("COMMIT", &[]).await?;
        debug!(user = %self.info.user, "transaction committed");
        Ok(())
    }

    /// Rolls back the open transaction. Does nothing when none is open.
    pub async fn rollback(&self) -> Result<(), SqlError> {
        let mut inner = self.inner.lock().await;
        if !inner.in_transaction() {
            if !inner.auto_commit && !self.info.transaction_support {
                warn!(
                    user = %self.info.user,
                    "rollback without transaction support; earlier statements stay applied"
                );
            }
            return Ok(());
        }
        inner.transport()?.query("ROLLBACK", &[]).await?;
        debug!(user = %self.info.user, "transaction rolled back");
        Ok(())
    }

    /// Switches commit mode. Turning auto-commit on commits the open
    /// transaction.
    pub async fn set_auto_commit(&self, auto_commit: bool) -> Result<(), SqlError> {
        let mut inner = self.inner.lock().await;
        if auto_commit && !inner.auto_commit && inner.in_transaction() {
            inner.transport()?.query("COMMIT", &[]).await?;
            debug!(user = %self.info.user, "transaction committed on auto-commit");
        }
        inner.auto_commit = auto_commit;
        Ok(())
    }

    /// Sets the read-only flag.
    ///
    /// # Errors
    ///
    /// Returns READONLY when disabling read-only for an account the server
    /// holds at level 2. At level 1 the flag flips but the server still
    /// rejects writes.
    pub async fn set_read_only(&self, read_only: bool) -> Result<(), SqlError> {
        if !read_only && self.info.server_readonly == ReadOnlyLevel::ReadOnlyKeepSettings {
            return Err(SqlError::new(
                ErrorCode::READONLY,
                format!(
                    "{}: cannot disable read-only mode, the server enforces readonly={}",
                    self.info.user,
                    self.info.server_readonly.as_u8()
                ),
            ));
        }
        self.inner.lock().await.read_only = read_only;
        Ok(())
    }

    pub fn create_statement(&self) -> Statement {
        Statement::new(self.clone())
    }

    /// Prepares `sql`, either with `?` placeholders or as a bare
    /// `INSERT INTO t` template for batches.
    pub fn prepare_statement(&self, sql: &str) -> PreparedStatement {
        PreparedStatement::new(self.clone(), sql)
    }

    /// Commits the open transaction and ends the session. Closing twice is
    /// a no-op.
    pub async fn close(&self) -> Result<(), SqlError> {
        let mut inner = self.inner.lock().await;
        let committed = if inner.in_transaction() {
            inner.transport()?.query("COMMIT", &[]).await.map(drop)
        } else {
            Ok(())
        };
        if let Some(transport) = inner.transport.take() {
            transport.terminate().await?;
            debug!(user = %self.info.user, "connection closed");
        }
        committed
    }

    /// Settings sent with every request.
    fn query_settings(&self, inner: &Inner) -> Vec<SettingAssignment> {
        let mut settings = Vec::new();
        // NOTE: only an unrestricted account may raise its own level.
        if inner.read_only && self.info.server_readonly == ReadOnlyLevel::ReadWrite {
            settings.push(SettingAssignment {
                name: "readonly".to_string(),
                value: Value::UInt64(2),
            });
        }
        if inner.auto_commit && self.info.implicit_transaction {
            settings.push(SettingAssignment {
                name: "implicit_transaction".to_string(),
                value: Value::UInt64(1),
            });
        }
        settings
    }
}

/// Quotes an identifier with backticks.
fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ServerConfig, UserConfig};
    use crate::db::Database;

    fn target() -> Target {
        target_with(ServerConfig::default())
    }

    fn target_with(mut config: ServerConfig) -> Target {
        for (name, readonly) in [("reader", 1), ("keeper", 2)] {
            config.users.push(UserConfig {
                name: name.to_string(),
                password: None,
                readonly,
            });
        }
        Target::Local(Arc::new(Database::new(&config).unwrap()))
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("db"), "`db`");
        assert_eq!(quote_identifier("a`b"), "`a``b`");
    }

    #[tokio::test]
    async fn test_connect_probes_server() {
        let conn = Connection::connect(&target(), ConnectionProperties::default())
            .await
            .unwrap();
        assert_eq!(conn.schema(), "default");
        assert_eq!(conn.server_version().to_string(), "23.8.1.1");
        assert_eq!(conn.server_time_zone(), "UTC");
        assert!(conn.auto_commit().await);
        assert!(!conn.is_read_only().await);
        assert!(!conn.is_implicit_transaction_supported());
    }

    #[tokio::test]
    async fn test_connect_with_overrides() {
        let properties = ConnectionProperties::default()
            .with_user("keeper")
            .with_transaction_support(true)
            .with_server_version("21.8")
            .with_server_time_zone("Asia/Tokyo");
        let conn = Connection::connect(&target(), properties).await.unwrap();
        assert_eq!(conn.server_time_zone(), "Asia/Tokyo");
        assert!(conn.is_transaction_supported());
        assert!(!conn.is_implicit_transaction_supported());
        // The probe was skipped, so the level is assumed to be 0.
        assert!(!conn.is_read_only().await);

        let err = Connection::connect(
            &target(),
            ConnectionProperties::default()
                .with_server_version("latest")
                .with_server_time_zone("UTC"),
        )
        .await
        .err()
        .unwrap();
        assert_eq!(err.code(), ErrorCode::CANNOT_PARSE_TEXT);
    }

    #[tokio::test]
    async fn test_implicit_transaction_support() {
        let properties = ConnectionProperties::default().with_transaction_support(true);
        let conn = Connection::connect(&target(), properties).await.unwrap();
        assert!(conn.is_implicit_transaction_supported());

        conn.execute("CREATE TABLE t (v UInt32) ENGINE = MergeTree ORDER BY v")
            .await
            .unwrap();
        conn.execute("INSERT INTO t VALUES (1)").await.unwrap();
        assert!(!conn.in_transaction().await);
    }

    #[tokio::test]
    async fn test_schema_follows_server_default_database() {
        let target = target_with(ServerConfig {
            default_database: "analytics".to_string(),
            ..ServerConfig::default()
        });
        let conn = Connection::connect(&target, ConnectionProperties::default())
            .await
            .unwrap();
        assert_eq!(conn.schema(), "analytics");

        let properties = ConnectionProperties::default()
            .with_server_version("23.8")
            .with_server_time_zone("UTC")
            .with_create_database(true);
        let conn = Connection::connect(&target, properties).await.unwrap();
        assert_eq!(conn.schema(), "analytics");
        let mut rs = conn
            .create_statement()
            .execute_query("select count() from system.databases where name = 'default'")
            .await
            .unwrap();
        assert!(rs.next());
        assert_eq!(rs.get_u64(1).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_readonly_account_with_transaction_support() {
        let properties = ConnectionProperties::default()
            .with_user("reader")
            .with_transaction_support(true);
        let conn = Connection::connect(&target(), properties).await.unwrap();
        assert!(conn.is_read_only().await);
        assert!(!conn.is_implicit_transaction_supported());
        let mut rs = conn.create_statement().execute_query("select 1").await.unwrap();
        assert!(rs.next());
        assert_eq!(rs.get_i32(1).unwrap(), 1);

        // Overrides hide the level, so the driver sends its own settings.
        let properties = ConnectionProperties::default()
            .with_user("reader")
            .with_transaction_support(true)
            .with_server_version("23.8")
            .with_server_time_zone("UTC");
        let conn = Connection::connect(&target(), properties).await.unwrap();
        assert!(conn.is_implicit_transaction_supported());
        conn.set_read_only(true).await.unwrap();
        conn.execute("select 1").await.unwrap();
        conn.set_read_only(false).await.unwrap();
        let err = conn
            .execute("create table t (v UInt8) engine = Memory")
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::READONLY);
    }

    #[tokio::test]
    async fn test_manual_commit_begins_transaction() {
        let properties = ConnectionProperties::default()
            .with_transaction_support(true)
            .with_auto_commit(false);
        let conn = Connection::connect(&target(), properties).await.unwrap();
        assert!(!conn.in_transaction().await);
        conn.commit().await.unwrap();
        conn.rollback().await.unwrap();

        conn.execute("SELECT 1").await.unwrap();
        assert!(conn.in_transaction().await);
        conn.rollback().await.unwrap();
        assert!(!conn.in_transaction().await);

        conn.execute("SELECT 1").await.unwrap();
        conn.set_auto_commit(true).await.unwrap();
        assert!(!conn.in_transaction().await);
    }

    #[tokio::test]
    async fn test_read_only_level_two() {
        let properties = ConnectionProperties::default().with_user("keeper");
        let conn = Connection::connect(&target(), properties).await.unwrap();
        assert!(conn.is_read_only().await);
        let err = conn.set_read_only(false).await.unwrap_err();
        assert_eq!(err.error_code(), 164);
        conn.set_read_only(true).await.unwrap();
    }

    #[tokio::test]
    async fn test_close() {
        let conn = Connection::connect(&target(), ConnectionProperties::default())
            .await
            .unwrap();
        let other = conn.clone();
        conn.close().await.unwrap();
        assert!(other.is_closed().await);
        other.close().await.unwrap();

        let err = other.execute("SELECT 1").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NETWORK_ERROR);
    }
}
