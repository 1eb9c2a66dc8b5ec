use std::io;

use crate::chunk::ChunkEncodeError;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolControlMessageError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("chunk encode error: {0}")]
    ChunkEncode(#[from] ChunkEncodeError),
}
