use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::protocol::codec::{
    ClientCodec, ServerCodec, ensure_consumed, get_count, get_string, get_value, put_frame,
    put_string, put_value, split_frame,
};
use crate::protocol::error::ProtocolError;
use crate::sql::SettingAssignment;

/// Messages sent by the frontend (client) to the server.
#[derive(Debug, Clone, PartialEq)]
pub enum FrontendMessage {
    /// 'H' - Opens a session; must be the first frame.
    Hello {
        user: String,
        password: String,
        /// Empty selects the server's default database.
        database: String,
        client_name: String,
    },
    /// 'I' - Requests server and account details.
    ServerInfo,
    /// 'Q' - Runs a request with per-query settings.
    Query {
        sql: String,
        settings: Vec<SettingAssignment>,
    },
    /// 'P' - Liveness check.
    Ping,
    /// 'X' - Termination
    Terminate,
}

impl FrontendMessage {
    fn tag(&self) -> u8 {
        match self {
            FrontendMessage::Hello { .. } => b'H',
            FrontendMessage::ServerInfo => b'I',
            FrontendMessage::Query { .. } => b'Q',
            FrontendMessage::Ping => b'P',
            FrontendMessage::Terminate => b'X',
        }
    }

    fn encode_payload(&self, dst: &mut BytesMut) {
        match self {
            FrontendMessage::Hello {
                user,
                password,
                database,
                client_name,
            } => {
                put_string(dst, user);
                put_string(dst, password);
                put_string(dst, database);
                put_string(dst, client_name);
            }
            FrontendMessage::Query { sql, settings } => {
                put_string(dst, sql);
                dst.put_u32(settings.len() as u32);
                for setting in settings {
                    put_string(dst, &setting.name);
                    put_value(dst, &setting.value);
                }
            }
            FrontendMessage::ServerInfo | FrontendMessage::Ping | FrontendMessage::Terminate => {}
        }
    }

    /// Decodes a message from its tag and payload.
    fn decode(tag: u8, payload: &mut BytesMut) -> Result<Self, ProtocolError> {
        let msg = match tag {
            b'H' => FrontendMessage::Hello {
                user: get_string(payload)?,
                password: get_string(payload)?,
                database: get_string(payload)?,
                client_name: get_string(payload)?,
            },
            b'I' => FrontendMessage::ServerInfo,
            b'Q' => {
                let sql = get_string(payload)?;
                // name length + value tag
                let count = get_count(payload, 5)?;
                let mut settings = Vec::with_capacity(count);
                for _ in 0..count {
                    settings.push(SettingAssignment {
                        name: get_string(payload)?,
                        value: get_value(payload)?,
                    });
                }
                FrontendMessage::Query { sql, settings }
            }
            b'P' => FrontendMessage::Ping,
            b'X' => FrontendMessage::Terminate,
            _ => return Err(ProtocolError::UnknownMessageType(tag)),
        };
        ensure_consumed(payload)?;
        Ok(msg)
    }
}

impl Decoder for ServerCodec {
    type Item = FrontendMessage;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match split_frame(src, self.max_frame_size)? {
            Some((tag, mut payload)) => FrontendMessage::decode(tag, &mut payload).map(Some),
            None => Ok(None),
        }
    }
}

impl Encoder<FrontendMessage> for ClientCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: FrontendMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut payload = BytesMut::new();
        msg.encode_payload(&mut payload);
        put_frame(dst, msg.tag(), &payload, self.max_frame_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::Value;

    fn transfer(msg: FrontendMessage) -> FrontendMessage {
        let mut buf = BytesMut::new();
        ClientCodec::default().encode(msg, &mut buf).unwrap();
        let decoded = ServerCodec::default().decode(&mut buf).unwrap().unwrap();
        assert!(buf.is_empty());
        decoded
    }

    #[test]
    fn test_hello() {
        let hello = FrontendMessage::Hello {
            user: "dba".to_string(),
            password: "dba".to_string(),
            database: String::new(),
            client_name: "test".to_string(),
        };
        assert_eq!(transfer(hello.clone()), hello);
    }

    #[test]
    fn test_query_with_settings() {
        let query = FrontendMessage::Query {
            sql: "insert into t values (1)".to_string(),
            settings: vec![SettingAssignment {
                name: "readonly".to_string(),
                value: Value::UInt64(2),
            }],
        };
        assert_eq!(transfer(query.clone()), query);
    }

    #[test]
    fn test_read_eof() {
        let mut buf = BytesMut::new();
        assert!(ServerCodec::default().decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_read_unknown_message_type() {
        let mut buf = BytesMut::new();
        buf.put_u8(b'Z');
        buf.put_u32(0);
        assert!(matches!(
            ServerCodec::default().decode(&mut buf),
            Err(ProtocolError::UnknownMessageType(b'Z'))
        ));
    }

    #[test]
    fn test_read_trailing_bytes() {
        let mut buf = BytesMut::new();
        buf.put_u8(b'P');
        buf.put_u32(1);
        buf.put_u8(0);
        assert!(matches!(
            ServerCodec::default().decode(&mut buf),
            Err(ProtocolError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_frame_limit_on_encode() {
        let query = FrontendMessage::Query {
            sql: "select 1".repeat(10),
            settings: Vec::new(),
        };
        let mut buf = BytesMut::new();
        assert!(matches!(
            ClientCodec::new(16).encode(query, &mut buf),
            Err(ProtocolError::FrameTooLarge { .. })
        ));
    }
}
