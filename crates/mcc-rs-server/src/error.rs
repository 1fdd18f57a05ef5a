use mcc_rs_proto::error::ProtoError;
use mcc_rs_world::WorldError;
use thiserror::Error;

/// Errors raised by the server context and session tasks. None of them is
/// fatal to the process; the worst outcome is one closed connection.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Level {0} already exists")]
    LevelExists(String),

    #[error("Level {0} not found")]
    LevelNotFound(String),

    #[error("Level {0} is the main level")]
    MainLevel(String),

    #[error("Server is full")]
    ServerFull,

    #[error("{0} is already logged in")]
    DuplicatePlayer(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Still loading the previous level")]
    TransferInProgress,

    #[error("{0} is still loading a level")]
    StillLoading(String),

    #[error("Handshake timed out")]
    HandshakeTimeout,

    #[error("Connection closed")]
    ConnectionClosed,

    #[error(transparent)]
    Proto(#[from] ProtoError),

    #[error(transparent)]
    World(#[from] WorldError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
