use std::cmp::min;
use std::collections::HashMap;
use std::io::Cursor;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use bytes::BytesMut;

use super::define::{Chunk, ChunkBasicHeader, ChunkMessageHeader, ChunkType, INIT_CHUNK_SIZE, MAX_CHUNK_SIZE};
use super::errors::ChunkDecodeError;
use crate::messages::MessageType;

// Limits for malicious or broken peers. We should never hit these in normal operation.
const MAX_PARTIAL_CHUNK_SIZE: usize = 10 * 1024 * 1024; // 10MB
const MAX_PREVIOUS_CHUNK_HEADERS: usize = 100;
const MAX_PARTIAL_CHUNK_COUNT: usize = 4;

/// Reassembles chunks read off the wire into complete RTMP [`Chunk`]s.
pub struct ChunkDecoder {
    /// Chunk stream id -> the last complete message header seen on that chunk stream.
    ///
    /// Needed because chunk types 1-3 only carry a partial header and inherit the rest
    /// from the previous chunk on the same chunk stream.
    previous_chunk_headers: HashMap<u32, ChunkMessageHeader>,

    /// (chunk stream id, message stream id) -> bytes accumulated so far for a message
    /// that is split across more than one chunk.
    partial_chunks: HashMap<(u32, u32), BytesMut>,

    /// Chunk size the peer told us (via `SetChunkSize`) it will use.
    max_chunk_size: usize,
}

impl Default for ChunkDecoder {
    fn default() -> Self {
        Self {
            previous_chunk_headers: HashMap::new(),
            partial_chunks: HashMap::new(),
            max_chunk_size: INIT_CHUNK_SIZE,
        }
    }
}

impl ChunkDecoder {
    /// Updates the chunk size the peer is allowed to use.
    ///
    /// Returns `false` (and leaves the chunk size untouched) if `chunk_size` is out of range.
    pub fn update_max_chunk_size(&mut self, chunk_size: usize) -> bool {
        if !(INIT_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&chunk_size) {
            false
        } else {
            self.max_chunk_size = chunk_size;
            true
        }
    }

    /// Reads a single complete chunk out of `buf`, consuming the bytes it used.
    ///
    /// Returns `Ok(None)` if `buf` doesn't yet contain a full chunk; the caller should
    /// wait for more data and call again. Bytes belonging to a chunk that hasn't fully
    /// arrived are left untouched in `buf`.
    pub fn read_chunk(&mut self, buf: &mut BytesMut) -> Result<Option<Chunk>, ChunkDecodeError> {
        loop {
            let mut cursor = Cursor::new(&buf[..]);

            let basic_header = match Self::read_basic_header(&mut cursor) {
                Ok(header) => header,
                Err(None) => return Ok(None),
                Err(Some(err)) => return Err(err),
            };

            let message_header = match self.read_message_header(&basic_header, &mut cursor) {
                Ok(header) => header,
                Err(None) => return Ok(None),
                Err(Some(err)) => return Err(err),
            };

            let key = (basic_header.chunk_stream_id, message_header.msg_stream_id);

            let already_read = self.partial_chunks.get(&key).map(|data| data.len()).unwrap_or(0);
            let remaining = message_header.msg_length as usize - already_read;
            let need_read_length = min(remaining, self.max_chunk_size);

            let payload_start = cursor.position() as usize;
            let payload_end = payload_start + need_read_length;

            if buf.len() < payload_end {
                // Not enough data buffered for the payload yet.
                return Ok(None);
            }

            let payload = buf.split_to(payload_end).split_off(payload_start).freeze();

            let count = if self.previous_chunk_headers.contains_key(&basic_header.chunk_stream_id) {
                self.previous_chunk_headers.len()
            } else {
                self.previous_chunk_headers.len() + 1
            };

            if count > MAX_PREVIOUS_CHUNK_HEADERS {
                return Err(ChunkDecodeError::TooManyPreviousChunkHeaders);
            }

            self.previous_chunk_headers.insert(basic_header.chunk_stream_id, message_header);

            if payload.len() == message_header.msg_length as usize {
                return Ok(Some(Chunk {
                    basic_header,
                    message_header,
                    payload,
                }));
            }

            let partial_chunk = match self.partial_chunks.get_mut(&key) {
                Some(partial_chunk) => partial_chunk,
                None => {
                    if self.partial_chunks.len() >= MAX_PARTIAL_CHUNK_COUNT {
                        return Err(ChunkDecodeError::TooManyPartialChunks);
                    }

                    self.partial_chunks.insert(key, BytesMut::new());
                    self.partial_chunks.get_mut(&key).expect("just inserted")
                }
            };

            let length = {
                if partial_chunk.len() + payload.len() > MAX_PARTIAL_CHUNK_SIZE {
                    return Err(ChunkDecodeError::PartialChunkTooLarge(partial_chunk.len() + payload.len()));
                }

                partial_chunk.extend_from_slice(&payload[..]);
                partial_chunk.len()
            };

            if length == message_header.msg_length as usize {
                return Ok(Some(Chunk {
                    basic_header,
                    message_header,
                    payload: self.partial_chunks.remove(&key).unwrap().freeze(),
                }));
            }

            // We have a full chunk's worth of header but not yet the whole message.
            // Loop again: there may be enough data buffered for the next chunk already.
        }
    }

    /// Reads the basic chunk header (fmt + chunk stream id).
    ///
    /// `Err(None)` means we don't have enough data yet, not a real decode error.
    fn read_basic_header(cursor: &mut Cursor<&[u8]>) -> Result<ChunkBasicHeaderWithType, Option<ChunkDecodeError>> {
        let byte = cursor.read_u8().map_err(|_| None)?;
        let fmt = (byte >> 6) & 0b0000_0011;
        let fmt = ChunkType::try_from(fmt).map_err(|_| ChunkDecodeError::InvalidChunkType(fmt))?;

        let chunk_stream_id = match (byte & 0b0011_1111) as u32 {
            0 => 64 + cursor.read_u8().map_err(|_| None)? as u32,
            1 => {
                let first = cursor.read_u8().map_err(|_| None)? as u32;
                let second = cursor.read_u8().map_err(|_| None)? as u32;
                64 + first + second * 256
            }
            csid => csid,
        };

        Ok(ChunkBasicHeaderWithType {
            basic_header: ChunkBasicHeader { chunk_stream_id },
            fmt,
        })
    }

    /// Reads the message header, filling in fields inherited from the previous chunk
    /// on this chunk stream where the wire format doesn't repeat them.
    fn read_message_header(
        &self,
        basic: &ChunkBasicHeaderWithType,
        cursor: &mut Cursor<&[u8]>,
    ) -> Result<ChunkMessageHeader, Option<ChunkDecodeError>> {
        let chunk_stream_id = basic.basic_header.chunk_stream_id;

        match basic.fmt {
            ChunkType::Type0 => {
                let timestamp = cursor.read_u24::<BigEndian>().map_err(|_| None)?;
                let msg_length = cursor.read_u24::<BigEndian>().map_err(|_| None)?;
                if msg_length as usize > MAX_PARTIAL_CHUNK_SIZE {
                    return Err(Some(ChunkDecodeError::PartialChunkTooLarge(msg_length as usize)));
                }

                let msg_type_id = cursor.read_u8().map_err(|_| None)?;
                let msg_stream_id = cursor.read_u32::<LittleEndian>().map_err(|_| None)?;

                let timestamp = if timestamp == 0xFFFFFF {
                    cursor.read_u32::<BigEndian>().map_err(|_| None)?
                } else {
                    timestamp
                };

                Ok(ChunkMessageHeader {
                    timestamp,
                    msg_length,
                    msg_type_id: MessageType(msg_type_id),
                    msg_stream_id,
                })
            }
            ChunkType::Type1 => {
                let timestamp_delta = cursor.read_u24::<BigEndian>().map_err(|_| None)?;
                let msg_length = cursor.read_u24::<BigEndian>().map_err(|_| None)?;
                if msg_length as usize > MAX_PARTIAL_CHUNK_SIZE {
                    return Err(Some(ChunkDecodeError::PartialChunkTooLarge(msg_length as usize)));
                }

                let msg_type_id = cursor.read_u8().map_err(|_| None)?;

                let timestamp_delta = if timestamp_delta == 0xFFFFFF {
                    cursor.read_u32::<BigEndian>().map_err(|_| None)?
                } else {
                    timestamp_delta
                };

                let previous = self
                    .previous_chunk_headers
                    .get(&chunk_stream_id)
                    .ok_or(ChunkDecodeError::MissingPreviousChunkHeader(chunk_stream_id))?;

                let timestamp = previous.timestamp.checked_add(timestamp_delta).ok_or_else(|| {
                    ChunkDecodeError::TimestampOverflow(previous.timestamp, timestamp_delta)
                })?;

                Ok(ChunkMessageHeader {
                    timestamp,
                    msg_length,
                    msg_type_id: MessageType(msg_type_id),
                    msg_stream_id: previous.msg_stream_id,
                })
            }
            ChunkType::Type2 => {
                let timestamp_delta = cursor.read_u24::<BigEndian>().map_err(|_| None)?;

                let timestamp_delta = if timestamp_delta == 0xFFFFFF {
                    cursor.read_u32::<BigEndian>().map_err(|_| None)?
                } else {
                    timestamp_delta
                };

                let previous = self
                    .previous_chunk_headers
                    .get(&chunk_stream_id)
                    .ok_or(ChunkDecodeError::MissingPreviousChunkHeader(chunk_stream_id))?;

                let timestamp = previous.timestamp.checked_add(timestamp_delta).ok_or_else(|| {
                    ChunkDecodeError::TimestampOverflow(previous.timestamp, timestamp_delta)
                })?;

                Ok(ChunkMessageHeader {
                    timestamp,
                    msg_length: previous.msg_length,
                    msg_type_id: previous.msg_type_id,
                    msg_stream_id: previous.msg_stream_id,
                })
            }
            ChunkType::Type3 => {
                let previous = *self
                    .previous_chunk_headers
                    .get(&chunk_stream_id)
                    .ok_or(ChunkDecodeError::MissingPreviousChunkHeader(chunk_stream_id))?;

                if previous.is_extended_timestamp() {
                    // The extended timestamp is repeated (and ignored) on type 3 chunks too.
                    cursor.read_u32::<BigEndian>().map_err(|_| None)?;
                }

                Ok(previous)
            }
        }
    }
}

struct ChunkBasicHeaderWithType {
    basic_header: ChunkBasicHeader,
    fmt: ChunkType,
}

impl TryFrom<u8> for ChunkType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ChunkType::Type0),
            1 => Ok(ChunkType::Type1),
            2 => Ok(ChunkType::Type2),
            3 => Ok(ChunkType::Type3),
            _ => Err(()),
        }
    }
}
