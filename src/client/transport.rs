//! Request transport of a driver connection.
//!
//! A connection talks either to an in-process [`Database`] through its own
//! [`Session`], or to a [`Server`](crate::server::Server) over TCP. Both
//! answer a request with one result and the session's transaction status.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::debug;

use crate::db::{Database, Session, SessionInfo, TransactionStatus};
use crate::error_code::ErrorCode;
use crate::executor::{ExecResult, Rows};
use crate::protocol::{BackendMessage, ClientCodec, FrontendMessage};
use crate::sql::SettingAssignment;

use super::error::SqlError;
use super::properties::ConnectionProperties;

pub(crate) enum Transport {
    Local(Box<Session>),
    Remote {
        framed: Framed<TcpStream, ClientCodec>,
        /// Status carried by the last `Ready` frame.
        status: TransactionStatus,
    },
}

impl Transport {
    /// Opens an in-process session.
    pub(crate) fn open_local(
        database: Arc<Database>,
        properties: &ConnectionProperties,
    ) -> Result<Self, SqlError> {
        let session = Session::open(
            database,
            &properties.user,
            &properties.password,
            properties.database.as_deref(),
        )?;
        Ok(Transport::Local(Box::new(session)))
    }

    /// Connects to `addr` and performs the `Hello` exchange.
    pub(crate) async fn open_remote(
        addr: &str,
        properties: &ConnectionProperties,
    ) -> Result<Self, SqlError> {
        let socket = TcpStream::connect(addr).await?;
        socket.set_nodelay(true)?;
        let mut framed = Framed::new(socket, ClientCodec::default());

        framed
            .send(FrontendMessage::Hello {
                user: properties.user.clone(),
                password: properties.password.clone(),
                database: properties.database.clone().unwrap_or_default(),
                client_name: properties.client_name.clone(),
            })
            .await?;
        match next_message(&mut framed).await? {
            BackendMessage::HelloOk { session_id } => {
                debug!(addr, session_id, "connected");
                Ok(Transport::Remote {
                    framed,
                    status: TransactionStatus::Idle,
                })
            }
            BackendMessage::Exception { code, message } => {
                Err(SqlError::new(ErrorCode::new(code), message))
            }
            other => Err(SqlError::unexpected(other)),
        }
    }

    /// Transaction status after the last request.
    pub(crate) fn status(&self) -> TransactionStatus {
        match self {
            Transport::Local(session) => session.transaction_status(),
            Transport::Remote { status, .. } => *status,
        }
    }

    /// Runs one request.
    pub(crate) async fn query(
        &mut self,
        sql: &str,
        settings: &[SettingAssignment],
    ) -> Result<ExecResult, SqlError> {
        match self {
            Transport::Local(session) => Ok(session.execute(sql, settings)?),
            Transport::Remote { framed, status } => {
                framed
                    .send(FrontendMessage::Query {
                        sql: sql.to_string(),
                        settings: settings.to_vec(),
                    })
                    .await?;
                let result = match next_message(framed).await? {
                    BackendMessage::ResultSet { columns, rows } => {
                        Ok(ExecResult::Rows(Rows { columns, rows }))
                    }
                    BackendMessage::Update { rows } => Ok(ExecResult::Affected(rows)),
                    BackendMessage::Exception { code, message } => {
                        Err(SqlError::new(ErrorCode::new(code), message))
                    }
                    other => return Err(SqlError::unexpected(other)),
                };
                match next_message(framed).await? {
                    BackendMessage::Ready { status: next } => *status = next,
                    other => return Err(SqlError::unexpected(other)),
                }
                result
            }
        }
    }

    /// Asks for server and account details.
    pub(crate) async fn server_info(&mut self) -> Result<SessionInfo, SqlError> {
        match self {
            Transport::Local(session) => Ok(session.server_info()),
            Transport::Remote { framed, .. } => {
                framed.send(FrontendMessage::ServerInfo).await?;
                match next_message(framed).await? {
                    BackendMessage::ServerInfo {
                        display_name,
                        version,
                        time_zone,
                        user,
                        database,
                        readonly,
                    } => Ok(SessionInfo {
                        display_name,
                        version,
                        time_zone,
                        user,
                        database,
                        readonly,
                    }),
                    other => Err(SqlError::unexpected(other)),
                }
            }
        }
    }

    /// Ends the session. The server aborts whatever transaction is still
    /// open.
    pub(crate) async fn terminate(self) -> Result<(), SqlError> {
        match self {
            Transport::Local(session) => {
                drop(session);
                Ok(())
            }
            Transport::Remote { mut framed, .. } => {
                framed.send(FrontendMessage::Terminate).await?;
                Ok(())
            }
        }
    }
}

/// Reads the next frame; EOF is a network error.
async fn next_message(
    framed: &mut Framed<TcpStream, ClientCodec>,
) -> Result<BackendMessage, SqlError> {
    match framed.next().await {
        Some(message) => Ok(message?),
        None => Err(SqlError::new(
            ErrorCode::NETWORK_ERROR,
            "server closed the connection",
        )),
    }
}
