#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("amf0: {0}")]
    Amf0(#[from] rtmp_amf0::Amf0Error),
    #[error("amf3: {0}")]
    Amf3(#[from] rtmp_amf0::amf3::Amf3Error),
    #[error("amf3-encoded command is missing the amf3-switch marker")]
    MissingAmf3Switch,
    #[error("no app name of type string in connect command")]
    NoAppName,
    #[error("invalid publish command publishing type: {0}")]
    InvalidPublishingType(String),
    #[error("invalid command result level: {0}")]
    InvalidCommandResultLevel(String),
    #[error("invalid onStatus info object")]
    InvalidOnStatusInfoObject,
    #[error("the rtmp client is not implemented yet")]
    NoClientImplementation,
    #[error("chunk encode: {0}")]
    ChunkEncode(#[from] crate::chunk::ChunkEncodeError),
}
