use std::string::FromUtf8Error;

use thiserror::Error;

use crate::error_code::ErrorCode;

/// Protocol framing and decoding errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame of {size} bytes exceeds the maximum of {max} bytes")]
    FrameTooLarge { size: usize, max: usize },

    #[error("unknown message type: 0x{0:02x}")]
    UnknownMessageType(u8),

    #[error("invalid message: {0}")]
    InvalidMessage(&'static str),

    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),

    #[error("unknown value tag: {0}")]
    UnknownValueTag(u8),

    #[error("unknown type tag: {0}")]
    UnknownTypeTag(u8),
}

impl ProtocolError {
    /// Numeric error code reported to the peer.
    pub fn code(&self) -> ErrorCode {
        match self {
            ProtocolError::Io(_) => ErrorCode::NETWORK_ERROR,
            _ => ErrorCode::UNKNOWN_PACKET_FROM_CLIENT,
        }
    }
}
