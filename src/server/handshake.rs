use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::debug;

use crate::db::{Database, Session};
use crate::error_code::ErrorCode;
use crate::protocol::{BackendMessage, FrontendMessage, ProtocolError, ServerCodec};

pub enum HandshakeResult {
    /// Session opened, transitioning to the query phase.
    Success {
        framed: Framed<TcpStream, ServerCodec>,
        session: Session,
    },
    /// The client was sent an `Exception` (or disconnected) and the
    /// connection should close.
    Rejected,
}

/// A single client handshake.
///
/// The first frame must be `Hello`. Authentication failures are reported
/// with an `Exception` frame carrying AUTHENTICATION_FAILED.
pub struct Handshake {
    framed: Framed<TcpStream, ServerCodec>,
    database: Arc<Database>,
}

impl Handshake {
    pub fn new(framed: Framed<TcpStream, ServerCodec>, database: Arc<Database>) -> Self {
        Self { framed, database }
    }

    pub async fn run(mut self) -> Result<HandshakeResult, ProtocolError> {
        let message = match self.framed.next().await {
            Some(message) => message?,
            None => return Ok(HandshakeResult::Rejected),
        };

        let FrontendMessage::Hello {
            user,
            password,
            database,
            client_name,
        } = message
        else {
            self.reject(ErrorCode::UNKNOWN_PACKET_FROM_CLIENT, "expected Hello")
                .await?;
            return Ok(HandshakeResult::Rejected);
        };

        debug!(user = %user, database = %database, client = %client_name, "hello");
        match Session::open(
            Arc::clone(&self.database),
            &user,
            &password,
            Some(database.as_str()),
        ) {
            Ok(session) => {
                self.framed
                    .send(BackendMessage::HelloOk {
                        session_id: session.id(),
                    })
                    .await?;
                Ok(HandshakeResult::Success {
                    framed: self.framed,
                    session,
                })
            }
            Err(e) => {
                self.reject(e.code(), &e.to_string()).await?;
                Ok(HandshakeResult::Rejected)
            }
        }
    }

    async fn reject(&mut self, code: ErrorCode, message: &str) -> Result<(), ProtocolError> {
        debug!(%code, message, "handshake rejected");
        self.framed
            .send(BackendMessage::Exception {
                code: code.as_i32(),
                message: message.to_string(),
            })
            .await
    }
}
