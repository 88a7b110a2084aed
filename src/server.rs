//! TCP server for driver connections.
//!
//! ## Architecture
//!
//! ```text
//! +--------+
//! | Server |  <- Accepts TCP connections
//! +--------+
//!      |
//!      v
//! +-----------+     +------------+
//! | Handshake | --> | Connection |  <- Query loop over one Session
//! +-----------+     +------------+
//! ```
//!
//! ## Terminology
//!
//! - **Server**: TCP listener that spawns connections
//! - **Handshake**: `Hello` exchange that authenticates and opens a session
//! - **Connection**: Per-client loop answering requests until `Terminate`,
//!   EOF or shutdown

pub mod connection;
pub mod handshake;
pub mod listener;

pub use listener::Server;
