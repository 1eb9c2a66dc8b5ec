#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("digest error: {0}")]
    Digest(#[from] DigestError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("not enough data")]
    NotEnoughData,
    #[error("digest length not correct")]
    DigestLengthNotCorrect,
    #[error("cannot generate digest")]
    CannotGenerate,
    #[error("unknown schema")]
    UnknownSchema,
}
