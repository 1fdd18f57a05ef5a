//! Protocol-level errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("buffer too short: need {needed} more bytes, have {remaining}")]
    BufferTooShort { needed: usize, remaining: usize },

    #[error("unknown packet id: 0x{0:02X}")]
    UnknownPacketId(u8),

    #[error("unexpected packet id: expected 0x{expected:02X}, got 0x{got:02X}")]
    UnexpectedPacketId { expected: u8, got: u8 },

    #[error("protocol version mismatch: expected {expected}, got {got}")]
    ProtocolVersionMismatch { expected: u8, got: u8 },

    #[error("too many block changes in one packet: {0} (max 256)")]
    TooManyBlockChanges(usize),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
