use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::catalog::ReadOnlyLevel;
use crate::db::TransactionStatus;
use crate::executor::ColumnDesc;
use crate::datum::Value;
use crate::protocol::codec::{
    ClientCodec, ServerCodec, ensure_consumed, get_count, get_i32, get_string, get_type, get_u8,
    get_u64, get_value, put_frame, put_string, put_value, split_frame,
};
use crate::protocol::error::ProtocolError;

/// Messages sent by the backend (server) to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendMessage {
    /// 'h' - Session opened
    HelloOk { session_id: u64 },
    /// 'i' - Server and account details
    ServerInfo {
        display_name: String,
        version: String,
        time_zone: String,
        user: String,
        database: String,
        readonly: ReadOnlyLevel,
    },
    /// 'R' - Result of a query
    ResultSet {
        columns: Vec<ColumnDesc>,
        rows: Vec<Vec<Value>>,
    },
    /// 'U' - Number of rows written
    Update { rows: u64 },
    /// 'E' - Error response
    Exception { code: i32, message: String },
    /// 'Z' - Ready for the next request
    Ready { status: TransactionStatus },
    /// 'p' - Answer to Ping
    Pong,
}

impl BackendMessage {
    fn tag(&self) -> u8 {
        match self {
            BackendMessage::HelloOk { .. } => b'h',
            BackendMessage::ServerInfo { .. } => b'i',
            BackendMessage::ResultSet { .. } => b'R',
            BackendMessage::Update { .. } => b'U',
            BackendMessage::Exception { .. } => b'E',
            BackendMessage::Ready { .. } => b'Z',
            BackendMessage::Pong => b'p',
        }
    }

    fn encode_payload(&self, dst: &mut BytesMut) {
        match self {
            BackendMessage::HelloOk { session_id } => dst.put_u64(*session_id),
            BackendMessage::ServerInfo {
                display_name,
                version,
                time_zone,
                user,
                database,
                readonly,
            } => {
                put_string(dst, display_name);
                put_string(dst, version);
                put_string(dst, time_zone);
                put_string(dst, user);
                put_string(dst, database);
                dst.put_u8(readonly.as_u8());
            }
            BackendMessage::ResultSet { columns, rows } => {
                dst.put_u32(columns.len() as u32);
                for column in columns {
                    put_string(dst, &column.name);
                    dst.put_u8(column.ty.tag());
                }
                dst.put_u32(rows.len() as u32);
                for row in rows {
                    for value in row {
                        put_value(dst, value);
                    }
                }
            }
            BackendMessage::Update { rows } => dst.put_u64(*rows),
            BackendMessage::Exception { code, message } => {
                dst.put_i32(*code);
                put_string(dst, message);
            }
            BackendMessage::Ready { status } => dst.put_u8(status_byte(*status)),
            BackendMessage::Pong => {}
        }
    }

    /// Decodes a message from its tag and payload.
    fn decode(tag: u8, payload: &mut BytesMut) -> Result<Self, ProtocolError> {
        let msg = match tag {
            b'h' => BackendMessage::HelloOk {
                session_id: get_u64(payload)?,
            },
            b'i' => BackendMessage::ServerInfo {
                display_name: get_string(payload)?,
                version: get_string(payload)?,
                time_zone: get_string(payload)?,
                user: get_string(payload)?,
                database: get_string(payload)?,
                readonly: ReadOnlyLevel::from_u64(get_u8(payload)? as u64)
                    .ok_or(ProtocolError::InvalidMessage("invalid readonly level"))?,
            },
            b'R' => {
                // name length + type tag
                let column_count = get_count(payload, 5)?;
                let mut columns = Vec::with_capacity(column_count);
                for _ in 0..column_count {
                    let name = get_string(payload)?;
                    columns.push(ColumnDesc::new(name, get_type(payload)?));
                }
                // one value tag per column
                let row_count = get_count(payload, column_count)?;
                let mut rows = Vec::with_capacity(row_count);
                for _ in 0..row_count {
                    let row = (0..column_count)
                        .map(|_| get_value(payload))
                        .collect::<Result<Vec<_>, _>>()?;
                    rows.push(row);
                }
                BackendMessage::ResultSet { columns, rows }
            }
            b'U' => BackendMessage::Update {
                rows: get_u64(payload)?,
            },
            b'E' => BackendMessage::Exception {
                code: get_i32(payload)?,
                message: get_string(payload)?,
            },
            b'Z' => BackendMessage::Ready {
                status: match get_u8(payload)? {
                    b'I' => TransactionStatus::Idle,
                    b'T' => TransactionStatus::InTransaction,
                    b'E' => TransactionStatus::Failed,
                    _ => return Err(ProtocolError::InvalidMessage("invalid transaction status")),
                },
            },
            b'p' => BackendMessage::Pong,
            _ => return Err(ProtocolError::UnknownMessageType(tag)),
        };
        ensure_consumed(payload)?;
        Ok(msg)
    }
}

fn status_byte(status: TransactionStatus) -> u8 {
    match status {
        TransactionStatus::Idle => b'I',
        TransactionStatus::InTransaction => b'T',
        TransactionStatus::Failed => b'E',
    }
}

impl Encoder<BackendMessage> for ServerCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: BackendMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut payload = BytesMut::new();
        msg.encode_payload(&mut payload);
        put_frame(dst, msg.tag(), &payload, self.max_frame_size)
    }
}

impl Decoder for ClientCodec {
    type Item = BackendMessage;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match split_frame(src, self.max_frame_size)? {
            Some((tag, mut payload)) => BackendMessage::decode(tag, &mut payload).map(Some),
            None => Ok(None),
        }
    }
}
