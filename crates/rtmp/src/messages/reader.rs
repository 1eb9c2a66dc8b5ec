//! Reading [`MessageData`].

use super::{MessageData, MessageType};
use crate::chunk::Chunk;
use crate::command_messages::Command;
use crate::messages::errors::MessageError;
use crate::protocol_control_messages::{
    ProtocolControlMessageError, ProtocolControlMessageSetChunkSize, ProtocolControlMessageWindowAcknowledgementSize,
};

impl MessageData<'_> {
    /// Parses [`MessageData`] from the given chunk.
    ///
    /// Returns `Ok(None)` for message types that don't carry any data we act on.
    pub fn parse(chunk: &Chunk) -> Result<Option<Self>, MessageError> {
        match chunk.message_header.msg_type_id {
            MessageType::SetChunkSize => {
                let data = ProtocolControlMessageSetChunkSize::read(&chunk.payload).map_err(ProtocolControlMessageError::from)?;
                Ok(Some(Self::SetChunkSize(data)))
            }
            MessageType::WindowAcknowledgementSize => {
                let data =
                    ProtocolControlMessageWindowAcknowledgementSize::read(&chunk.payload).map_err(ProtocolControlMessageError::from)?;
                Ok(Some(Self::SetAcknowledgementWindowSize(data)))
            }
            MessageType::Audio => Ok(Some(Self::AudioData {
                data: chunk.payload.clone(),
            })),
            MessageType::Video => Ok(Some(Self::VideoData {
                data: chunk.payload.clone(),
            })),
            MessageType::DataAMF0 => Ok(Some(Self::DataAmf0 {
                data: chunk.payload.clone(),
            })),
            MessageType::CommandAMF0 => Ok(Some(Self::Amf0Command(Command::read(chunk.payload.clone())?))),
            MessageType::CommandAMF3 => Ok(Some(Self::Amf3Command(Command::read_amf3(chunk.payload.clone())?))),
            MessageType::UserControlEvent => Ok(Some(Self::UserControl(
                crate::user_control_messages::EventMessage::read(&chunk.payload)?,
            ))),
            // Aggregate is disaggregated directly from the chunk by the caller, since its
            // inner tags each carry their own timestamp independent of the outer message.
            // Abort, Acknowledgement, SetPeerBandwidth and the AMF3 shared object variant
            // are not acted on by this implementation.
            msg_type_id => Ok(Some(Self::Other {
                msg_type_id,
                data: chunk.payload.clone(),
            })),
        }
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use bytes::Bytes;
    use rtmp_amf0::encoder::Amf0Encoder;
    use rtmp_amf0::{Amf0Object, Amf0Value};

    use super::*;
    use crate::command_messages::CommandType;
    use crate::command_messages::netconnection::NetConnectionCommand;

    #[test]
    fn test_parse_command() {
        let mut buf = Vec::new();
        let mut encoder = Amf0Encoder::new(&mut buf);

        encoder.encode_string("connect").unwrap();
        encoder.encode_number(1.0).unwrap();
        let object: Amf0Object = [("app".into(), Amf0Value::String("testapp".into()))].into_iter().collect();
        encoder.encode_object(&object).unwrap();

        let amf_data = Bytes::from(buf);

        let chunk = Chunk::new(0, 0, MessageType::CommandAMF0, 0, amf_data);

        let message = MessageData::parse(&chunk).expect("no errors").expect("some message");
        match message {
            MessageData::Amf0Command(command) => {
                let Command {
                    transaction_id,
                    command_type,
                } = command;
                assert_eq!(transaction_id, 1.0);

                let CommandType::NetConnection(NetConnectionCommand::Connect(connect)) = command_type else {
                    panic!("wrong command");
                };

                assert_eq!(connect.app, "testapp");
            }
            _ => unreachable!("wrong message type"),
        }
    }

    #[test]
    fn test_parse_audio_packet() {
        let chunk = Chunk::new(0, 0, MessageType::Audio, 0, vec![0x00, 0x00, 0x00, 0x00].into());

        let message = MessageData::parse(&chunk).expect("no errors").expect("some message");
        match message {
            MessageData::AudioData { data } => {
                assert_eq!(data, vec![0x00, 0x00, 0x00, 0x00]);
            }
            _ => unreachable!("wrong message type"),
        }
    }

    #[test]
    fn test_parse_video_packet() {
        let chunk = Chunk::new(0, 0, MessageType::Video, 0, vec![0x00, 0x00, 0x00, 0x00].into());

        let message = MessageData::parse(&chunk).expect("no errors").expect("some message");
        match message {
            MessageData::VideoData { data } => {
                assert_eq!(data, vec![0x00, 0x00, 0x00, 0x00]);
            }
            _ => unreachable!("wrong message type"),
        }
    }

    #[test]
    fn test_parse_set_chunk_size() {
        let chunk = Chunk::new(0, 0, MessageType::SetChunkSize, 0, vec![0x00, 0xFF, 0xFF, 0xFF].into());

        let message = MessageData::parse(&chunk).expect("no errors").expect("some message");
        match message {
            MessageData::SetChunkSize(ProtocolControlMessageSetChunkSize { chunk_size }) => {
                assert_eq!(chunk_size, 0x00FFFFFF);
            }
            _ => unreachable!("wrong message type"),
        }
    }

    #[test]
    fn test_parse_window_acknowledgement_size() {
        let chunk = Chunk::new(
            0,
            0,
            MessageType::WindowAcknowledgementSize,
            0,
            vec![0x00, 0xFF, 0xFF, 0xFF].into(),
        );

        let message = MessageData::parse(&chunk).expect("no errors").expect("some message");
        match message {
            MessageData::SetAcknowledgementWindowSize(ProtocolControlMessageWindowAcknowledgementSize {
                acknowledgement_window_size,
            }) => {
                assert_eq!(acknowledgement_window_size, 0x00FFFFFF);
            }
            _ => unreachable!("wrong message type"),
        }
    }

    #[test]
    fn test_parse_metadata() {
        let mut buf = Vec::new();

        let mut encoder = Amf0Encoder::new(&mut buf);
        encoder.encode_string("onMetaData").unwrap();
        let object: Amf0Object = [("duration".into(), Amf0Value::Number(0.0))].into_iter().collect();
        encoder.encode_object(&object).unwrap();

        let amf_data = Bytes::from(buf);
        let chunk = Chunk::new(0, 0, MessageType::DataAMF0, 0, amf_data.clone());

        let message = MessageData::parse(&chunk).expect("no errors").expect("some message");
        match message {
            MessageData::DataAmf0 { data } => {
                assert_eq!(data, amf_data);
            }
            _ => unreachable!("wrong message type"),
        }
    }

    #[test]
    fn test_unsupported_message_type_is_passed_through() {
        let chunk = Chunk::new(0, 0, MessageType(42), 0, vec![0x00, 0x00, 0x00, 0x00].into());

        assert!(matches!(
            MessageData::parse(&chunk).expect("no errors"),
            Some(MessageData::Other { msg_type_id: MessageType(42), .. })
        ));
    }
}
