//! Writing user control messages.

use std::io;

use byteorder::{BigEndian, WriteBytesExt};

use super::errors::EventMessagesError;
use super::{EventMessagePingResponse, EventMessageStreamBegin, EventMessageStreamEOF, EventType};
use crate::chunk::{Chunk, ChunkEncoder, COMMAND_CHUNK_STREAM_ID};
use crate::messages::MessageType;

impl EventMessageStreamBegin {
    /// Writes the [`EventMessageStreamBegin`] event to the given writer.
    pub fn write(&self, encoder: &ChunkEncoder, io: &mut impl io::Write) -> Result<(), EventMessagesError> {
        let mut data = Vec::new();

        data.write_u16::<BigEndian>(EventType::StreamBegin.0)
            .expect("writing to a Vec never fails");
        data.write_u32::<BigEndian>(self.stream_id).expect("writing to a Vec never fails");

        encoder.write_chunk(
            io,
            Chunk::new(COMMAND_CHUNK_STREAM_ID, 0, MessageType::UserControlEvent, 0, data.into()),
        )?;

        Ok(())
    }
}

impl EventMessageStreamEOF {
    /// Writes the [`EventMessageStreamEOF`] event to the given writer.
    pub fn write(&self, encoder: &ChunkEncoder, io: &mut impl io::Write) -> Result<(), EventMessagesError> {
        let mut data = Vec::new();

        data.write_u16::<BigEndian>(EventType::StreamEOF.0)
            .expect("writing to a Vec never fails");
        data.write_u32::<BigEndian>(self.stream_id).expect("writing to a Vec never fails");

        encoder.write_chunk(
            io,
            Chunk::new(COMMAND_CHUNK_STREAM_ID, 0, MessageType::UserControlEvent, 0, data.into()),
        )?;

        Ok(())
    }
}

impl EventMessagePingResponse {
    /// Writes the [`EventMessagePingResponse`] event to the given writer.
    pub fn write(&self, encoder: &ChunkEncoder, io: &mut impl io::Write) -> Result<(), EventMessagesError> {
        let mut data = Vec::new();

        data.write_u16::<BigEndian>(EventType::PingResponse.0)
            .expect("writing to a Vec never fails");
        data.write_u32::<BigEndian>(self.timestamp).expect("writing to a Vec never fails");

        encoder.write_chunk(
            io,
            Chunk::new(COMMAND_CHUNK_STREAM_ID, 0, MessageType::UserControlEvent, 0, data.into()),
        )?;

        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use bytes::{BufMut, Bytes, BytesMut};

    use super::*;
    use crate::chunk::ChunkDecoder;

    #[test]
    fn test_write_stream_begin() {
        let mut buf = BytesMut::new();
        let encoder = ChunkEncoder::default();

        EventMessageStreamBegin { stream_id: 1 }
            .write(&encoder, &mut (&mut buf).writer())
            .unwrap();

        let mut decoder = ChunkDecoder::default();

        let chunk = decoder.read_chunk(&mut buf).expect("read chunk").expect("chunk");
        assert_eq!(chunk.basic_header.chunk_stream_id, 0x03);
        assert_eq!(chunk.message_header.msg_type_id, MessageType::UserControlEvent);
        assert_eq!(chunk.message_header.msg_stream_id, 0);
        assert_eq!(chunk.payload, Bytes::from(vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x01]));
    }
}
