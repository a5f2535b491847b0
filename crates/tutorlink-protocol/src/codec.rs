//! Wire frame codec and type registry.
//!
//! Frame layout:
//!
//! ```text
//! ┌──────────────────┬──────────────────┬──────────────────┐
//! │ type_code u16 BE │ body_len  u32 BE │ body (JSON)      │
//! └──────────────────┴──────────────────┴──────────────────┘
//! ```
//!
//! The body is the serde_json encoding of the variant's payload struct
//! (`{}` for empty payloads). The registry in [`decode_body`] maps each
//! type code to its one decoder, so a decoded [`Message`] always carries
//! the payload its code declares. An unrecognized code is an error, not
//! a silent skip — the session layer treats it as a protocol violation.

use crate::types::{
    codes, Close, GameEnd, GameReply, GameStart, GameTransmit, Hello,
    HelloReply, Message, Registration, RegistrationAccept, WorkSheetAnswer,
    WorkSheetEnd, WorkSheetStart,
};
use crate::ProtocolError;

/// Size of the frame header: type code plus body length.
pub const HEADER_LEN: usize = 6;

/// Upper bound on a frame body. Nothing the protocol defines comes
/// close; a larger length in a header is treated as a corrupt frame.
pub const MAX_BODY_LEN: u32 = 1 << 20;

/// Encodes a message into a complete wire frame.
pub fn encode(msg: &Message) -> Result<Vec<u8>, ProtocolError> {
    let body = encode_body(msg)?;
    let mut frame = Vec::with_capacity(HEADER_LEN + body.len());
    frame.extend_from_slice(&msg.type_code().to_be_bytes());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Encodes just the body of a message (the JSON payload).
pub fn encode_body(msg: &Message) -> Result<Vec<u8>, ProtocolError> {
    let body = match msg {
        Message::Close(p) => serde_json::to_vec(p),
        Message::Hello(p) => serde_json::to_vec(p),
        Message::HelloReply(p) => serde_json::to_vec(p),
        Message::Registration(p) => serde_json::to_vec(p),
        Message::RegistrationAccept(p) => serde_json::to_vec(p),
        Message::WorkSheetStart(p) => serde_json::to_vec(p),
        Message::WorkSheetEnd(p) => serde_json::to_vec(p),
        Message::WorkSheetAnswer(p) => serde_json::to_vec(p),
        Message::GameEnd(p) => serde_json::to_vec(p),
        Message::GameStart(p) => serde_json::to_vec(p),
        Message::GameTransmit(p) => serde_json::to_vec(p),
        Message::GameReply(p) => serde_json::to_vec(p),
    };
    body.map_err(ProtocolError::Encode)
}

/// The type registry: decodes a frame body according to its type code.
///
/// # Errors
/// [`ProtocolError::UnknownType`] for a code outside the closed set;
/// [`ProtocolError::Decode`] for a body that does not match the code's
/// payload shape.
pub fn decode_body(code: u16, body: &[u8]) -> Result<Message, ProtocolError> {
    fn parse<T: serde::de::DeserializeOwned>(
        body: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(body).map_err(ProtocolError::Decode)
    }

    Ok(match code {
        codes::CLOSE => Message::Close(parse::<Close>(body)?),
        codes::HELLO => Message::Hello(parse::<Hello>(body)?),
        codes::HELLO_REPLY => Message::HelloReply(parse::<HelloReply>(body)?),
        codes::REGISTRATION => {
            Message::Registration(parse::<Registration>(body)?)
        }
        codes::REGISTRATION_ACCEPT => {
            Message::RegistrationAccept(parse::<RegistrationAccept>(body)?)
        }
        codes::WORKSHEET_START => {
            Message::WorkSheetStart(parse::<WorkSheetStart>(body)?)
        }
        codes::WORKSHEET_END => {
            Message::WorkSheetEnd(parse::<WorkSheetEnd>(body)?)
        }
        codes::WORKSHEET_ANSWER => {
            Message::WorkSheetAnswer(parse::<WorkSheetAnswer>(body)?)
        }
        codes::GAME_END => Message::GameEnd(parse::<GameEnd>(body)?),
        codes::GAME_START => Message::GameStart(parse::<GameStart>(body)?),
        codes::GAME_TRANSMIT => {
            Message::GameTransmit(parse::<GameTransmit>(body)?)
        }
        codes::GAME_REPLY => Message::GameReply(parse::<GameReply>(body)?),
        other => return Err(ProtocolError::UnknownType(other)),
    })
}

/// Decodes one complete frame from a byte slice.
///
/// The transport reads the header and body incrementally from the
/// socket; this entry point exists for tests and tools that hold a
/// whole frame in memory.
pub fn decode_frame(frame: &[u8]) -> Result<Message, ProtocolError> {
    if frame.len() < HEADER_LEN {
        return Err(ProtocolError::Truncated {
            expected: HEADER_LEN,
            got: frame.len(),
        });
    }
    let code = u16::from_be_bytes([frame[0], frame[1]]);
    let len =
        u32::from_be_bytes([frame[2], frame[3], frame[4], frame[5]]);
    if len > MAX_BODY_LEN {
        return Err(ProtocolError::Oversized(len));
    }
    let body = &frame[HEADER_LEN..];
    if body.len() != len as usize {
        return Err(ProtocolError::Truncated {
            expected: HEADER_LEN + len as usize,
            got: frame.len(),
        });
    }
    decode_body(code, body)
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CloseCode, GameId, GamePayload, ReplyPayload};

    #[test]
    fn test_frame_header_layout() {
        let msg = Message::Hello(Hello { version: 0x0001_0001 });
        let frame = encode(&msg).unwrap();

        // Type code 0x0101, big endian.
        assert_eq!(&frame[0..2], &[0x01, 0x01]);
        // Body length matches the remainder.
        let len =
            u32::from_be_bytes([frame[2], frame[3], frame[4], frame[5]]);
        assert_eq!(len as usize, frame.len() - HEADER_LEN);
    }

    #[test]
    fn test_empty_payload_encodes_as_empty_object() {
        let frame = encode(&Message::GameEnd(GameEnd {})).unwrap();
        assert_eq!(&frame[HEADER_LEN..], b"{}");
    }

    #[test]
    fn test_round_trip_every_variant() {
        let all = vec![
            Message::close(CloseCode::PasswordWrong),
            Message::Hello(Hello { version: 7 }),
            Message::HelloReply(HelloReply {
                password_required: true,
            }),
            Message::Registration(Registration {
                password: "hunter2".into(),
            }),
            Message::RegistrationAccept(RegistrationAccept {}),
            Message::WorkSheetStart(WorkSheetStart {
                sheet: "fractions".into(),
            }),
            Message::WorkSheetEnd(WorkSheetEnd {}),
            Message::WorkSheetAnswer(WorkSheetAnswer {
                data: "b".into(),
            }),
            Message::GameEnd(GameEnd {}),
            Message::GameStart(GameStart {
                game_id: GameId::FAST_READ,
            }),
            Message::GameTransmit(GameTransmit {
                game_id: GameId::FAST_READ,
                payload: GamePayload::FastRead {
                    token: "cat".into(),
                    millis: 1500,
                },
            }),
            Message::GameReply(GameReply {
                game_id: GameId::FAST_READ,
                payload: ReplyPayload::FastRead,
            }),
        ];
        for msg in all {
            let frame = encode(&msg).unwrap();
            let decoded = decode_frame(&frame).unwrap();
            assert_eq!(msg, decoded, "{msg} did not round-trip");
        }
    }

    #[test]
    fn test_unknown_type_code_is_rejected() {
        let mut frame = vec![0x04, 0x00]; // family 0x04 does not exist
        frame.extend_from_slice(&2u32.to_be_bytes());
        frame.extend_from_slice(b"{}");
        match decode_frame(&frame) {
            Err(ProtocolError::UnknownType(0x0400)) => {}
            other => panic!("expected UnknownType, got {other:?}"),
        }
    }

    #[test]
    fn test_body_not_matching_code_is_rejected() {
        // A Hello body under the GameStart code.
        let body = serde_json::to_vec(&Hello { version: 1 }).unwrap();
        let result = decode_body(codes::GAME_START, &body);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_truncated_frame_is_rejected() {
        let frame = encode(&Message::Hello(Hello { version: 1 })).unwrap();
        let result = decode_frame(&frame[..frame.len() - 1]);
        assert!(matches!(result, Err(ProtocolError::Truncated { .. })));

        let result = decode_frame(&frame[..3]);
        assert!(matches!(result, Err(ProtocolError::Truncated { .. })));
    }

    #[test]
    fn test_oversized_length_is_rejected() {
        let mut frame = vec![0x01, 0x00];
        frame.extend_from_slice(&(MAX_BODY_LEN + 1).to_be_bytes());
        frame.extend_from_slice(b"{}");
        assert!(matches!(
            decode_frame(&frame),
            Err(ProtocolError::Oversized(_))
        ));
    }

    #[test]
    fn test_decode_upholds_code_content_invariant() {
        // Whatever the registry returns, its own code equals the input code.
        let frame = encode(&Message::GameStart(GameStart {
            game_id: GameId(5),
        }))
        .unwrap();
        let decoded = decode_frame(&frame).unwrap();
        assert_eq!(decoded.type_code(), codes::GAME_START);
    }
}
