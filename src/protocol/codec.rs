//! Frame layout and primitive encodings.
//!
//! Every frame is `tag: u8`, `len: u32` (payload length, big-endian),
//! followed by `len` payload bytes. Strings are a `u32` byte length plus
//! UTF-8; values carry a one-byte tag ahead of their payload.

use bytes::{Buf, BufMut, BytesMut};

use crate::config::DEFAULT_MAX_FRAME_SIZE;
use crate::datum::{Type, Value};
use crate::protocol::ProtocolError;

/// Size of the frame header (tag + length).
pub const HEADER_LEN: usize = 5;

const VALUE_NULL: u8 = 0;
const VALUE_UINT64: u8 = 1;
const VALUE_INT64: u8 = 2;
const VALUE_FLOAT64: u8 = 3;
const VALUE_STRING: u8 = 4;
const VALUE_BOOL: u8 = 5;

/// Ensures that the buffer has at least `n` bytes remaining.
macro_rules! ensure_remaining {
    ($buf:expr, $n:expr) => {
        if $buf.remaining() < $n {
            return Err(ProtocolError::InvalidMessage("truncated payload"));
        }
    };
}

pub fn get_u8(src: &mut BytesMut) -> Result<u8, ProtocolError> {
    ensure_remaining!(src, 1);
    Ok(src.get_u8())
}

pub fn get_u32(src: &mut BytesMut) -> Result<u32, ProtocolError> {
    ensure_remaining!(src, 4);
    Ok(src.get_u32())
}

pub fn get_i32(src: &mut BytesMut) -> Result<i32, ProtocolError> {
    ensure_remaining!(src, 4);
    Ok(src.get_i32())
}

pub fn get_u64(src: &mut BytesMut) -> Result<u64, ProtocolError> {
    ensure_remaining!(src, 8);
    Ok(src.get_u64())
}

/// Reads a length-prefixed UTF-8 string.
pub fn get_string(src: &mut BytesMut) -> Result<String, ProtocolError> {
    let len = get_u32(src)? as usize;
    ensure_remaining!(src, len);
    let bytes = src.split_to(len);
    Ok(String::from_utf8(bytes.to_vec())?)
}

pub fn put_string(dst: &mut BytesMut, s: &str) {
    dst.put_u32(s.len() as u32);
    dst.put_slice(s.as_bytes());
}

/// Reads a count prefix, rejecting counts the payload cannot possibly hold.
pub fn get_count(src: &mut BytesMut, min_item_len: usize) -> Result<usize, ProtocolError> {
    let count = get_u32(src)? as usize;
    if count.saturating_mul(min_item_len) > src.remaining() {
        return Err(ProtocolError::InvalidMessage("count exceeds payload"));
    }
    Ok(count)
}

pub fn get_type(src: &mut BytesMut) -> Result<Type, ProtocolError> {
    let tag = get_u8(src)?;
    Type::from_tag(tag).ok_or(ProtocolError::UnknownTypeTag(tag))
}

pub fn get_value(src: &mut BytesMut) -> Result<Value, ProtocolError> {
    match get_u8(src)? {
        VALUE_NULL => Ok(Value::Null),
        VALUE_UINT64 => Ok(Value::UInt64(get_u64(src)?)),
        VALUE_INT64 => Ok(Value::Int64(get_u64(src)? as i64)),
        VALUE_FLOAT64 => Ok(Value::Float64(f64::from_bits(get_u64(src)?))),
        VALUE_STRING => Ok(Value::String(get_string(src)?)),
        VALUE_BOOL => Ok(Value::Bool(get_u8(src)? != 0)),
        tag => Err(ProtocolError::UnknownValueTag(tag)),
    }
}

pub fn put_value(dst: &mut BytesMut, value: &Value) {
    match value {
        Value::Null => dst.put_u8(VALUE_NULL),
        Value::UInt64(v) => {
            dst.put_u8(VALUE_UINT64);
            dst.put_u64(*v);
        }
        Value::Int64(v) => {
            dst.put_u8(VALUE_INT64);
            dst.put_i64(*v);
        }
        Value::Float64(v) => {
            dst.put_u8(VALUE_FLOAT64);
            dst.put_u64(v.to_bits());
        }
        Value::String(s) => {
            dst.put_u8(VALUE_STRING);
            put_string(dst, s);
        }
        Value::Bool(b) => {
            dst.put_u8(VALUE_BOOL);
            dst.put_u8(u8::from(*b));
        }
    }
}

/// Splits one complete frame off the front of `src`.
///
/// Returns `Ok(None)` until the whole frame has arrived.
pub(crate) fn split_frame(
    src: &mut BytesMut,
    max_frame_size: usize,
) -> Result<Option<(u8, BytesMut)>, ProtocolError> {
    if src.len() < HEADER_LEN {
        return Ok(None);
    }

    // Peek at the length (don't consume yet)
    let len = u32::from_be_bytes([src[1], src[2], src[3], src[4]]) as usize;
    if len > max_frame_size {
        return Err(ProtocolError::FrameTooLarge {
            size: len,
            max: max_frame_size,
        });
    }

    if src.len() < HEADER_LEN + len {
        src.reserve(HEADER_LEN + len - src.len());
        return Ok(None);
    }

    let tag = src.get_u8();
    src.advance(4);
    Ok(Some((tag, src.split_to(len))))
}

/// Appends a frame with the given tag and payload to `dst`.
pub(crate) fn put_frame(
    dst: &mut BytesMut,
    tag: u8,
    payload: &[u8],
    max_frame_size: usize,
) -> Result<(), ProtocolError> {
    if payload.len() > max_frame_size {
        return Err(ProtocolError::FrameTooLarge {
            size: payload.len(),
            max: max_frame_size,
        });
    }
    dst.reserve(HEADER_LEN + payload.len());
    dst.put_u8(tag);
    dst.put_u32(payload.len() as u32);
    dst.put_slice(payload);
    Ok(())
}

/// Fails if a decoded payload has bytes left over.
pub(crate) fn ensure_consumed(payload: &BytesMut) -> Result<(), ProtocolError> {
    if payload.is_empty() {
        Ok(())
    } else {
        Err(ProtocolError::InvalidMessage("trailing bytes after message"))
    }
}

/// Server side codec: decodes [`FrontendMessage`](super::FrontendMessage)s
/// and encodes [`BackendMessage`](super::BackendMessage)s.
pub struct ServerCodec {
    pub(crate) max_frame_size: usize,
}

impl ServerCodec {
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }
}

impl Default for ServerCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

/// Client side codec: decodes [`BackendMessage`](super::BackendMessage)s
/// and encodes [`FrontendMessage`](super::FrontendMessage)s.
pub struct ClientCodec {
    pub(crate) max_frame_size: usize,
}

impl ClientCodec {
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }
}

impl Default for ClientCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}
