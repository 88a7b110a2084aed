use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_MAX_FRAME_SIZE;
use crate::db::Database;
use crate::protocol::ServerCodec;
use crate::server::connection::Connection;
use crate::server::handshake::{Handshake, HandshakeResult};

/// TCP server speaking the framed protocol.
pub struct Server {
    listener: TcpListener,
    database: Arc<Database>,
    max_frame_size: usize,
}

impl Server {
    /// Creates a new server with a given listener and database.
    pub fn new(listener: TcpListener, database: Arc<Database>) -> Self {
        Self {
            listener,
            database,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Starts accepting connections and serving clients until an accept
    /// error occurs.
    pub async fn serve(self) -> io::Result<()> {
        self.serve_until(CancellationToken::new()).await
    }

    /// Serves clients until `shutdown` is cancelled. Open connections are
    /// closed as well, aborting their transactions.
    pub async fn serve_until(self, shutdown: CancellationToken) -> io::Result<()> {
        info!(addr = %self.listener.local_addr()?, "server listening");
        loop {
            let (socket, peer_addr) = tokio::select! {
                res = self.listener.accept() => res?,
                _ = shutdown.cancelled() => break,
            };
            if let Err(e) = socket.set_nodelay(true) {
                debug!(%peer_addr, error = %e, "failed to set TCP_NODELAY");
            }
            debug!(%peer_addr, "accepted connection");

            let database = Arc::clone(&self.database);
            let shutdown = shutdown.child_token();
            let framed = Framed::new(socket, ServerCodec::new(self.max_frame_size));

            tokio::spawn(async move {
                let (framed, session) = match Handshake::new(framed, database).run().await {
                    Ok(HandshakeResult::Success { framed, session }) => (framed, session),
                    Ok(HandshakeResult::Rejected) => {
                        debug!(%peer_addr, "connection closed");
                        return;
                    }
                    Err(e) => {
                        warn!(%peer_addr, error = %e, "handshake error");
                        return;
                    }
                };

                let session_id = session.id();
                let mut connection = Connection::new(framed, session);
                if let Err(e) = connection.run(shutdown).await {
                    warn!(session_id, error = %e, "connection error");
                }
                debug!(session_id, %peer_addr, "connection closed");
            });
        }
        info!("server stopped");
        Ok(())
    }
}
