//! Framed wire protocol between the driver and the server.
//!
//! ## Architecture
//!
//! ```text
//! +----------+                           +----------+
//! |  Client  |  --- FrontendMessage -->  |  Server  |
//! | (driver) |  <-- BackendMessage  ---  |          |
//! +----------+                           +----------+
//!           ClientCodec           ServerCodec
//! ```
//!
//! ## Exchange
//!
//! - The first frame is `Hello`; the server answers `HelloOk` or
//!   `Exception` and closes.
//! - Each `Query` is answered by one `ResultSet`, `Update` or `Exception`
//!   frame followed by `Ready` carrying the transaction status.
//! - `ServerInfo` and `Ping` are answered by `ServerInfo` and `Pong`.
//! - `Terminate` or EOF ends the session.

pub mod backend;
pub mod codec;
pub mod error;
pub mod frontend;

pub use backend::BackendMessage;
pub use codec::{ClientCodec, ServerCodec};
pub use error::ProtocolError;
pub use frontend::FrontendMessage;
