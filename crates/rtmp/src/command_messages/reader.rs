//! Reading [`Command`].

use std::convert::Infallible;
use std::str::FromStr;

use bytes::Bytes;
use rtmp_amf0::{Amf0Marker, Amf0Value};
use rtmp_amf0::amf3::{Amf3Decoder, Amf3Value};
use rtmp_amf0::decoder::Amf0Decoder;
use rtmp_amf0::encoder::Amf0Encoder;
use rtmp_bytes_util::StringCow;

use super::error::CommandError;
use super::netconnection::NetConnectionCommand;
use super::netstream::NetStreamCommand;
use super::{Command, CommandResultLevel, CommandType, UnknownCommand};

impl Command<'_> {
    /// Reads a [`Command`] from the given payload.
    pub fn read(payload: Bytes) -> Result<Self, CommandError> {
        let mut decoder = Amf0Decoder::new(payload);

        let command_name = decoder.decode_string()?;
        let transaction_id = decoder.decode_number()?;

        let command_type = CommandType::read(command_name, &mut decoder)?;

        Ok(Self {
            transaction_id,
            command_type,
        })
    }

    /// Reads a [`Command`] from an AMF3-encoded (`CommandAMF3`) payload.
    ///
    /// Only the command name stays plain AMF0; an AMF3-switch marker (`0x11`) follows it,
    /// and everything after that marker — transaction id, command object, arguments — is
    /// AMF3-encoded with its own reference tables scoped to this one message. Those AMF3
    /// values are translated to their AMF0 equivalents and fed through the same per-command
    /// parsing [`CommandType::read`] uses for the AMF0 path, so `connect`, `publish`, `play`
    /// and friends are recognized identically regardless of which wire encoding carried them.
    pub fn read_amf3(payload: Bytes) -> Result<Self, CommandError> {
        let mut decoder = Amf0Decoder::new(payload);

        let command_name = decoder.decode_string()?;

        if decoder.peek_marker()? != Amf0Marker::AVMPlusObject {
            return Err(CommandError::MissingAmf3Switch);
        }

        let mut amf3_decoder = Amf3Decoder::new(decoder.take_remaining());

        let transaction_id = match amf3_value_to_amf0(&amf3_decoder.decode_value()?) {
            Amf0Value::Number(n) => n,
            _ => return Err(CommandError::MissingAmf3Switch),
        };
        let values = amf3_decoder.decode_all()?;

        let mut amf0_payload = Vec::new();
        let mut amf0_encoder = Amf0Encoder::new(&mut amf0_payload);
        for value in &values {
            amf0_encoder.encode_value(&amf3_value_to_amf0(value))?;
        }

        let mut decoder = Amf0Decoder::new(Bytes::from(amf0_payload));
        let command_type = CommandType::read(command_name, &mut decoder)?;

        Ok(Self {
            transaction_id,
            command_type,
        })
    }
}

/// Converts an AMF3 value to the closest AMF0 equivalent so AMF3-encoded command arguments
/// can be parsed by the same code that parses AMF0 ones.
fn amf3_value_to_amf0(value: &Amf3Value) -> Amf0Value<'static> {
    match value {
        Amf3Value::Undefined | Amf3Value::Null => Amf0Value::Null,
        Amf3Value::Boolean(b) => Amf0Value::Boolean(*b),
        Amf3Value::Integer(i) => Amf0Value::Number(*i as f64),
        Amf3Value::Double(d) => Amf0Value::Number(*d),
        Amf3Value::Date(d) => Amf0Value::Number(*d),
        Amf3Value::String(s) | Amf3Value::Xml(s) => Amf0Value::String(s.clone().into()),
        Amf3Value::ByteArray(_) => Amf0Value::Null,
        Amf3Value::Array { associative, dense } => {
            let mut entries: Vec<(StringCow<'static>, Amf0Value<'static>)> = associative
                .iter()
                .map(|(k, v)| (k.clone().into(), amf3_value_to_amf0(v)))
                .collect();
            entries.extend(
                dense
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string().into(), amf3_value_to_amf0(v))),
            );
            Amf0Value::Object(entries.into())
        }
        Amf3Value::Object { members, .. } => {
            let entries: Vec<(StringCow<'static>, Amf0Value<'static>)> =
                members.iter().map(|(k, v)| (k.clone().into(), amf3_value_to_amf0(v))).collect();
            Amf0Value::Object(entries.into())
        }
    }
}

impl<'a> CommandType<'a> {
    fn read(command_name: StringCow<'a>, decoder: &mut Amf0Decoder<Bytes>) -> Result<Self, CommandError> {
        if let Some(command) = NetConnectionCommand::read(command_name.as_str(), decoder)? {
            return Ok(Self::NetConnection(command));
        }

        if let Some(command) = NetStreamCommand::read(command_name.as_str(), decoder)? {
            return Ok(Self::NetStream(command));
        }

        let values = decoder.decode_all()?;
        Ok(Self::Unknown(UnknownCommand { command_name, values }))
    }
}

impl FromStr for CommandResultLevel {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warning" => Ok(Self::Warning),
            "status" => Ok(Self::Status),
            "error" => Ok(Self::Error),
            _ => Ok(Self::Unknown(s.to_string())),
        }
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use bytes::Bytes;
    use rtmp_amf0::encoder::Amf0Encoder;

    use super::{Command, CommandResultLevel};
    use crate::command_messages::CommandType;
    use crate::command_messages::netconnection::NetConnectionCommand;

    #[test]
    fn test_command_result_level() {
        assert_eq!("warning".parse::<CommandResultLevel>().unwrap(), CommandResultLevel::Warning);
        assert_eq!("status".parse::<CommandResultLevel>().unwrap(), CommandResultLevel::Status);
        assert_eq!("error".parse::<CommandResultLevel>().unwrap(), CommandResultLevel::Error);
        assert_eq!(
            "unknown".parse::<CommandResultLevel>().unwrap(),
            CommandResultLevel::Unknown("unknown".to_string())
        );
    }

    #[test]
    fn read_amf3_decodes_command_name_as_amf0_and_rest_as_amf3() {
        // command name stays plain AMF0, then the amf3-switch marker, then an AMF3 double
        // transaction id. "createStream" doesn't look at any further arguments.
        let mut buf = Vec::new();
        let mut encoder = Amf0Encoder::new(&mut buf);
        encoder.encode_string("createStream").unwrap();
        buf.push(0x11); // Amf0Marker::AVMPlusObject
        buf.push(0x05); // amf3 double marker
        buf.extend_from_slice(&4.0f64.to_be_bytes());

        let command = Command::read_amf3(Bytes::from(buf)).expect("read_amf3");

        assert_eq!(command.transaction_id, 4.0);
        assert!(matches!(
            command.command_type,
            CommandType::NetConnection(NetConnectionCommand::CreateStream)
        ));
    }

    #[test]
    fn read_amf3_without_switch_marker_is_an_error() {
        let mut buf = Vec::new();
        let mut encoder = Amf0Encoder::new(&mut buf);
        encoder.encode_string("createStream").unwrap();
        encoder.encode_number(4.0).unwrap();

        let err = Command::read_amf3(Bytes::from(buf)).unwrap_err();
        assert!(matches!(err, crate::command_messages::error::CommandError::MissingAmf3Switch));
    }
}
