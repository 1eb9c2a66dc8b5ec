use std::io;

use crate::chunk::ChunkDecodeError;
use crate::command_messages::error::CommandError;
use crate::handshake::HandshakeError;
use crate::messages::errors::MessageError;
use crate::protocol_control_messages::ProtocolControlMessageError;
use crate::user_control_messages::errors::EventMessagesError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("io: {0}")]
    Io(#[from] io::Error),
    #[error("handshake: {0}")]
    Handshake(#[from] HandshakeError),
    #[error("chunk decode: {0}")]
    ChunkDecode(#[from] ChunkDecodeError),
    #[error("message: {0}")]
    Message(#[from] MessageError),
    #[error("command: {0}")]
    Command(#[from] CommandError),
    #[error("protocol control message: {0}")]
    ProtocolControlMessage(#[from] ProtocolControlMessageError),
    #[error("event message: {0}")]
    EventMessage(#[from] EventMessagesError),
    #[error("unknown stream id: {0}")]
    UnknownStreamID(u32),
    #[error("publisher disconnected")]
    PublisherDisconnected,
    #[error("timeout: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),
    #[error("received publish command before connect command")]
    PublishBeforeConnect,
    #[error("no app name")]
    NoAppName,
    #[error("no stream name")]
    NoStreamName,
    #[error("publish request denied")]
    PublishRequestDenied,
    #[error("connect request denied")]
    ConnectRequestDenied,
    #[error("play not supported")]
    PlayNotSupported,
    #[error("publisher dropped")]
    PublisherDropped,
    #[error("invalid chunk size: {0}")]
    InvalidChunkSize(usize),
}

impl SessionError {
    /// Whether this error simply reflects the client going away, as opposed to a real
    /// protocol violation or I/O failure worth surfacing to the caller.
    pub fn is_client_closed(&self) -> bool {
        match self {
            Self::Io(err) => matches!(
                err.kind(),
                io::ErrorKind::UnexpectedEof | io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_is_client_closed() {
        let err = SessionError::from(io::Error::from(io::ErrorKind::UnexpectedEof));
        assert!(err.is_client_closed());

        let err = SessionError::NoStreamName;
        assert!(!err.is_client_closed());
    }
}
