//! Writing [`Command`].

use std::fmt::Display;
use std::io;

use bytes::{BufMut, Bytes, BytesMut};
use rtmp_amf0::amf3::{Amf3Encoder, Amf3Value};
use rtmp_amf0::decoder::Amf0Decoder;
use rtmp_amf0::encoder::Amf0Encoder;
use rtmp_amf0::{Amf0Marker, Amf0Value};

use super::error::CommandError;
use super::{Command, CommandResultLevel, CommandType};
use crate::chunk::{Chunk, ChunkEncoder, COMMAND_CHUNK_STREAM_ID};
use crate::messages::MessageType;

impl AsRef<str> for CommandResultLevel {
    fn as_ref(&self) -> &str {
        match self {
            CommandResultLevel::Warning => "warning",
            CommandResultLevel::Status => "status",
            CommandResultLevel::Error => "error",
            CommandResultLevel::Unknown(s) => s,
        }
    }
}

impl Display for CommandResultLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandResultLevel::Warning => write!(f, "warning"),
            CommandResultLevel::Status => write!(f, "status"),
            CommandResultLevel::Error => write!(f, "error"),
            CommandResultLevel::Unknown(s) => write!(f, "{s}"),
        }
    }
}

impl Command<'_> {
    fn write_amf0_chunk(io: &mut impl io::Write, encoder: &ChunkEncoder, payload: Bytes) -> Result<(), CommandError> {
        encoder.write_chunk(
            io,
            Chunk::new(COMMAND_CHUNK_STREAM_ID, 0, MessageType::CommandAMF0, 0, payload),
        )?;

        Ok(())
    }

    /// Writes a [`Command`] to the given writer.
    ///
    /// Skips unknown commands.
    pub fn write(self, io: &mut impl io::Write, encoder: &ChunkEncoder) -> Result<(), CommandError> {
        let mut buf = BytesMut::new();
        let mut buf_writer = (&mut buf).writer();

        match self.command_type {
            CommandType::NetConnection(command) => {
                command.write(&mut buf_writer, self.transaction_id)?;
            }
            CommandType::NetStream(_) => {
                return Err(CommandError::NoClientImplementation);
            }
            CommandType::OnStatus(command) => {
                command.write(&mut buf_writer, self.transaction_id)?;
            }
            // don't write unknown commands
            CommandType::Unknown(_) => {}
        }

        Self::write_amf0_chunk(io, encoder, buf.freeze())?;

        Ok(())
    }

    /// Writes a [`Command`] to the given writer, encoded as a `CommandAMF3` message.
    ///
    /// Reuses the AMF0 writers for each [`CommandType`] and re-encodes everything but the
    /// command name as AMF3, matching how [`super::reader::Command::read_amf3`] decodes the
    /// wire format in the other direction: command name stays a plain AMF0 string, then an
    /// AMF3-switch marker (`0x11`), then the transaction id and remaining values in AMF3.
    ///
    /// Skips unknown commands.
    pub fn write_amf3(self, io: &mut impl io::Write, encoder: &ChunkEncoder) -> Result<(), CommandError> {
        let mut amf0_buf = BytesMut::new();
        let mut buf_writer = (&mut amf0_buf).writer();

        match self.command_type {
            CommandType::NetConnection(command) => {
                command.write(&mut buf_writer, self.transaction_id)?;
            }
            CommandType::NetStream(_) => {
                return Err(CommandError::NoClientImplementation);
            }
            CommandType::OnStatus(command) => {
                command.write(&mut buf_writer, self.transaction_id)?;
            }
            CommandType::Unknown(_) => return Ok(()),
        }

        let mut decoder = Amf0Decoder::new(amf0_buf.freeze());
        let command_name = decoder.decode_string()?;
        let rest = decoder.decode_all()?;

        let mut header = Vec::new();
        {
            let mut encoder0 = Amf0Encoder::new(&mut header);
            encoder0.encode_string(command_name.as_str())?;
        }
        header.push(Amf0Marker::AVMPlusObject as u8);

        let mut payload = BytesMut::from(header.as_slice());
        let mut amf3_encoder = Amf3Encoder::new(&mut payload);
        for value in &rest {
            amf3_encoder.encode_value(&amf0_value_to_amf3(value))?;
        }

        encoder.write_chunk(
            io,
            Chunk::new(COMMAND_CHUNK_STREAM_ID, 0, MessageType::CommandAMF3, 0, payload.freeze()),
        )?;

        Ok(())
    }
}

/// Converts an AMF0 value to the closest AMF3 equivalent, for re-encoding an AMF0-written
/// command reply as `CommandAMF3`.
fn amf0_value_to_amf3(value: &Amf0Value<'_>) -> Amf3Value {
    match value {
        Amf0Value::Number(n) => Amf3Value::Double(*n),
        Amf0Value::Boolean(b) => Amf3Value::Boolean(*b),
        Amf0Value::String(s) => Amf3Value::String(s.as_str().to_string()),
        Amf0Value::Null => Amf3Value::Null,
        Amf0Value::Object(entries) => Amf3Value::Object {
            class_name: None,
            sealed_count: 0,
            members: entries.iter().map(|(k, v)| (k.as_str().to_string(), amf0_value_to_amf3(v))).collect(),
        },
        Amf0Value::Array(values) => Amf3Value::Array {
            associative: Default::default(),
            dense: values.iter().map(amf0_value_to_amf3).collect(),
        },
    }
}
