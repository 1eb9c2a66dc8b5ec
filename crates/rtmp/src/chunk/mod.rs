mod decoder;
mod define;
mod encoder;
mod errors;

pub use self::decoder::ChunkDecoder;
pub use self::define::{
    AUDIO_CHUNK_STREAM_ID, CHUNK_SIZE, COMMAND_CHUNK_STREAM_ID, Chunk, DATA_CHUNK_STREAM_ID, VIDEO_CHUNK_STREAM_ID,
};
pub use self::encoder::ChunkEncoder;
pub use self::errors::{ChunkDecodeError, ChunkEncodeError};
