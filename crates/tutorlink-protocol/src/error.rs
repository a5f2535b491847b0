//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization of a message body failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// A frame body did not match the payload shape its type code
    /// declares. The sender is violating the protocol.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// A type code outside the closed variant set.
    #[error("unknown message type code {0:#06x}")]
    UnknownType(u16),

    /// A frame shorter than its header claims.
    #[error("truncated frame: expected {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },

    /// A frame header claiming an implausible body length.
    #[error("frame body of {0} bytes exceeds the protocol maximum")]
    Oversized(u32),
}
