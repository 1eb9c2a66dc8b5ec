use bytes::Bytes;

use crate::messages::MessageType;

/// Initial chunk size both peers must assume until a `SetChunkSize` message says otherwise.
///
/// Defined by the legacy RTMP spec, 5.4.1.
pub const INIT_CHUNK_SIZE: usize = 128;

/// Chunk size this implementation asks the peer to use once the connection is established.
pub const CHUNK_SIZE: usize = 4096;

/// Largest chunk size we're willing to honor in a `SetChunkSize` message from a peer.
pub const MAX_CHUNK_SIZE: usize = 4096 * 16;

/// Chunk stream ID used for command messages (AMF0/AMF3), protocol control messages
/// and user control messages.
pub const COMMAND_CHUNK_STREAM_ID: u32 = 3;

/// Chunk stream ID used for audio messages.
pub const AUDIO_CHUNK_STREAM_ID: u32 = 4;

/// Chunk stream ID used for video messages.
pub const VIDEO_CHUNK_STREAM_ID: u32 = 5;

/// Chunk stream ID used for AMF0/AMF3 data (metadata) messages.
pub const DATA_CHUNK_STREAM_ID: u32 = 6;

/// The 4 possible chunk header formats.
///
/// Defined by the legacy RTMP spec, 5.3.1.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkType {
    /// Full header: timestamp, message length, message type id and message stream id.
    Type0 = 0,
    /// Same as [`ChunkType::Type0`] but without the message stream id.
    Type1 = 1,
    /// Timestamp delta only.
    Type2 = 2,
    /// No header fields at all, everything is inherited from the previous chunk.
    Type3 = 3,
}

/// The basic header of a chunk.
///
/// Only carries the chunk stream id, the chunk type is encoded alongside it on the wire
/// but is not retained here since it has no meaning once the message has been reassembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkBasicHeader {
    /// The chunk stream id this chunk belongs to.
    pub chunk_stream_id: u32,
}

/// The message header of a chunk, once fully reassembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkMessageHeader {
    /// The (possibly delta-accumulated) timestamp of the message.
    pub timestamp: u32,
    /// The length of the message payload.
    pub msg_length: u32,
    /// The type of the message.
    pub msg_type_id: MessageType,
    /// The stream id the message belongs to.
    pub msg_stream_id: u32,
}

impl ChunkMessageHeader {
    /// Whether this chunk's timestamp overflows the 3-byte field and needs an
    /// extended timestamp field.
    pub fn is_extended_timestamp(&self) -> bool {
        self.timestamp >= 0xFFFFFF
    }
}

/// A single, fully reassembled chunk (i.e. an RTMP message with its chunk stream id attached).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The basic header.
    pub basic_header: ChunkBasicHeader,
    /// The message header.
    pub message_header: ChunkMessageHeader,
    /// The message payload.
    pub payload: Bytes,
}

impl Chunk {
    /// Creates a new chunk.
    pub fn new(chunk_stream_id: u32, timestamp: u32, msg_type_id: MessageType, msg_stream_id: u32, payload: Bytes) -> Self {
        Self {
            basic_header: ChunkBasicHeader { chunk_stream_id },
            message_header: ChunkMessageHeader {
                timestamp,
                msg_length: payload.len() as u32,
                msg_type_id,
                msg_stream_id,
            },
            payload,
        }
    }
}
