use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::db::Session;
use crate::error_code::ErrorCode;
use crate::executor::ExecResult;
use crate::protocol::{BackendMessage, FrontendMessage, ProtocolError, ServerCodec};
use crate::sql::SettingAssignment;

/// A single client connection in the query phase.
///
/// The connection owns its [`Session`]; when it ends, the session is
/// dropped and any open transaction is aborted.
pub struct Connection {
    framed: Framed<TcpStream, ServerCodec>,
    session: Session,
}

impl Connection {
    pub fn new(framed: Framed<TcpStream, ServerCodec>, session: Session) -> Self {
        Self { framed, session }
    }

    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<(), ProtocolError> {
        loop {
            tokio::select! {
                res = self.handle_message() => {
                    if res? {
                        return Ok(());
                    }
                }
                _ = shutdown.cancelled() => {
                    debug!(session_id = self.session.id(), "connection shut down");
                    return Ok(());
                }
            }
        }
    }

    /// Handle a single message from the client.
    /// Returns true if the connection should terminate.
    async fn handle_message(&mut self) -> Result<bool, ProtocolError> {
        let message = match self.framed.next().await {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => return Err(e),
            None => return Ok(true), // EOF - client disconnected
        };

        match message {
            FrontendMessage::Query { sql, settings } => {
                self.handle_query(&sql, &settings).await?;
            }
            FrontendMessage::ServerInfo => {
                let info = self.session.server_info();
                self.framed
                    .send(BackendMessage::ServerInfo {
                        display_name: info.display_name,
                        version: info.version,
                        time_zone: info.time_zone,
                        user: info.user,
                        database: info.database,
                        readonly: info.readonly,
                    })
                    .await?;
            }
            FrontendMessage::Ping => self.framed.send(BackendMessage::Pong).await?,
            FrontendMessage::Hello { .. } => {
                self.framed
                    .send(BackendMessage::Exception {
                        code: ErrorCode::UNKNOWN_PACKET_FROM_CLIENT.as_i32(),
                        message: "session already open".to_string(),
                    })
                    .await?;
            }
            FrontendMessage::Terminate => return Ok(true),
        }
        Ok(false)
    }

    /// Runs a request and answers with its result followed by `Ready`.
    async fn handle_query(
        &mut self,
        sql: &str,
        settings: &[SettingAssignment],
    ) -> Result<(), ProtocolError> {
        let response = match self.session.execute(sql, settings) {
            Ok(ExecResult::Rows(rows)) => BackendMessage::ResultSet {
                columns: rows.columns,
                rows: rows.rows,
            },
            Ok(ExecResult::Affected(rows)) => BackendMessage::Update { rows },
            Err(e) => BackendMessage::Exception {
                code: e.code().as_i32(),
                message: e.to_string(),
            },
        };
        self.framed.feed(response).await?;
        self.framed
            .send(BackendMessage::Ready {
                status: self.session.transaction_status(),
            })
            .await
    }
}
