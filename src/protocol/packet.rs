//! Socket.IO packet codec.
//!
//! The controller speaks Socket.IO v5 on top of Engine.IO v4. Over a
//! WebSocket transport every text frame carries exactly one Engine.IO
//! packet; `message` packets (type `4`) wrap one Socket.IO packet.
//!
//! # Frames Handled
//!
//! | Frame | Meaning | Direction |
//! |-------|---------|-----------|
//! | `0{...}` | Engine.IO open (handshake data) | Server → Client |
//! | `1` | Engine.IO close | Both |
//! | `2` / `3` | Ping / Pong | Server → Client / Client → Server |
//! | `40` / `40{...}` | Namespace connect / connect ack | Both |
//! | `41` | Namespace disconnect | Both |
//! | `42["name", payload]` | Event | Server → Client |
//! | `44{...}` | Connect error | Server → Client |

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// Packet
// ============================================================================

/// A decoded Engine.IO / Socket.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Engine.IO handshake data (`sid`, `pingInterval`, ...).
    Open(Value),
    /// Engine.IO transport close.
    Close,
    /// Heartbeat request from the server.
    Ping,
    /// Heartbeat reply.
    Pong,
    /// Namespace connect (client) or connect acknowledgement (server).
    Connect(Option<Value>),
    /// Namespace disconnect.
    Disconnect,
    /// Event with its first argument (JSON null when absent).
    Event {
        /// Event name.
        name: String,
        /// First event argument.
        payload: Value,
    },
    /// Namespace connection refused.
    ConnectError(Value),
    /// Engine.IO no-op, upgrade probes, acks and binary placeholders.
    Ignored,
}

impl Packet {
    /// Decodes a single WebSocket text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] for empty frames, unknown packet types,
    /// or malformed event arrays.
    pub fn decode(frame: &str) -> Result<Self> {
        let mut chars = frame.chars();
        let engine_type = chars
            .next()
            .ok_or_else(|| Error::protocol("empty frame"))?;
        let rest = chars.as_str();

        match engine_type {
            '0' => Ok(Self::Open(parse_json(rest)?)),
            '1' => Ok(Self::Close),
            '2' => Ok(Self::Ping),
            '3' => Ok(Self::Pong),
            '4' => Self::decode_message(rest),
            '5' | '6' => Ok(Self::Ignored),
            other => Err(Error::protocol(format!(
                "unknown Engine.IO packet type '{other}'"
            ))),
        }
    }

    /// Encodes a client-originated packet.
    ///
    /// Only the packets a client sends have a wire form here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] for server-only packets.
    pub fn encode(&self) -> Result<String> {
        match self {
            Self::Close => Ok("1".to_string()),
            Self::Pong => Ok("3".to_string()),
            Self::Connect(None) => Ok("40".to_string()),
            Self::Connect(Some(auth)) => Ok(format!("40{}", serde_json::to_string(auth)?)),
            Self::Disconnect => Ok("41".to_string()),
            other => Err(Error::protocol(format!(
                "packet {other:?} is not sent by clients"
            ))),
        }
    }

    /// Decodes the Socket.IO packet inside an Engine.IO message.
    fn decode_message(body: &str) -> Result<Self> {
        let mut chars = body.chars();
        let socket_type = chars
            .next()
            .ok_or_else(|| Error::protocol("empty Socket.IO packet"))?;
        let data = strip_namespace(chars.as_str());

        match socket_type {
            '0' => {
                if data.is_empty() {
                    Ok(Self::Connect(None))
                } else {
                    Ok(Self::Connect(Some(parse_json(data)?)))
                }
            }
            '1' => Ok(Self::Disconnect),
            '2' => Self::decode_event(data),
            '4' => Ok(Self::ConnectError(if data.is_empty() {
                Value::Null
            } else {
                parse_json(data)?
            })),
            // ACK, BINARY_EVENT, BINARY_ACK
            '3' | '5' | '6' => Ok(Self::Ignored),
            other => Err(Error::protocol(format!(
                "unknown Socket.IO packet type '{other}'"
            ))),
        }
    }

    /// Decodes `["name", arg, ...]`, skipping an optional ack id prefix.
    fn decode_event(data: &str) -> Result<Self> {
        let array = data.trim_start_matches(|c: char| c.is_ascii_digit());
        let mut args = match parse_json(array)? {
            Value::Array(args) => args.into_iter(),
            other => {
                return Err(Error::protocol(format!(
                    "event payload is not an array: {other}"
                )));
            }
        };

        let name = match args.next() {
            Some(Value::String(name)) => name,
            _ => return Err(Error::protocol("event without a name")),
        };
        let payload = args.next().unwrap_or(Value::Null);

        Ok(Self::Event { name, payload })
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Removes a `/namespace,` prefix, if present.
fn strip_namespace(data: &str) -> &str {
    if data.starts_with('/') {
        match data.find(',') {
            Some(idx) => &data[idx + 1..],
            None => "",
        }
    } else {
        data
    }
}

fn parse_json(text: &str) -> Result<Value> {
    serde_json::from_str(text)
        .map_err(|e| Error::protocol(format!("invalid packet data: {e}")))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_decode_open() {
        let packet = Packet::decode(r#"0{"sid":"abc","pingInterval":25000}"#).unwrap();
        assert_eq!(
            packet,
            Packet::Open(json!({"sid": "abc", "pingInterval": 25000}))
        );
    }

    #[test]
    fn test_decode_heartbeat() {
        assert_eq!(Packet::decode("2").unwrap(), Packet::Ping);
        assert_eq!(Packet::decode("3").unwrap(), Packet::Pong);
    }

    #[test]
    fn test_decode_connect_ack() {
        let packet = Packet::decode(r#"40{"sid":"xyz"}"#).unwrap();
        assert_eq!(packet, Packet::Connect(Some(json!({"sid": "xyz"}))));
        assert_eq!(Packet::decode("40").unwrap(), Packet::Connect(None));
    }

    #[test]
    fn test_decode_event_with_payload() {
        let packet = Packet::decode(r#"42["pump",{"rpm":2200}]"#).unwrap();
        assert_eq!(
            packet,
            Packet::Event {
                name: "pump".into(),
                payload: json!({"rpm": 2200}),
            }
        );
    }

    #[test]
    fn test_decode_event_without_payload() {
        let packet = Packet::decode(r#"42["controller"]"#).unwrap();
        assert_eq!(
            packet,
            Packet::Event {
                name: "controller".into(),
                payload: Value::Null,
            }
        );
    }

    #[test]
    fn test_decode_event_with_namespace_and_ack_id() {
        let packet = Packet::decode(r#"42/admin,7["temps",{"air":71}]"#).unwrap();
        assert_eq!(
            packet,
            Packet::Event {
                name: "temps".into(),
                payload: json!({"air": 71}),
            }
        );
    }

    #[test]
    fn test_decode_connect_error() {
        let packet = Packet::decode(r#"44{"message":"Not authorized"}"#).unwrap();
        assert_eq!(
            packet,
            Packet::ConnectError(json!({"message": "Not authorized"}))
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(Packet::decode("").is_err());
        assert!(Packet::decode("9").is_err());
        assert!(Packet::decode("42{}").is_err());
        assert!(Packet::decode("42[1,2]").is_err());
    }

    #[test]
    fn test_encode_client_packets() {
        assert_eq!(Packet::Connect(None).encode().unwrap(), "40");
        assert_eq!(Packet::Pong.encode().unwrap(), "3");
        assert_eq!(Packet::Disconnect.encode().unwrap(), "41");
        assert!(Packet::Ping.encode().is_err());
    }

    proptest! {
        #[test]
        fn prop_event_name_survives_decoding(name in "[a-zA-Z]{1,16}", rpm in 0u32..5000) {
            let frame = format!("42{}", json!([name.clone(), {"rpm": rpm}]));
            let packet = Packet::decode(&frame).unwrap();
            prop_assert_eq!(packet, Packet::Event { name, payload: json!({"rpm": rpm}) });
        }
    }
}
