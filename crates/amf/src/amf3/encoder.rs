//! AMF3 encoder.

use bytes::BufMut;

use super::error::Amf3Error;
use super::value::Amf3Value;

const MARKER_UNDEFINED: u8 = 0x00;
const MARKER_NULL: u8 = 0x01;
const MARKER_FALSE: u8 = 0x02;
const MARKER_TRUE: u8 = 0x03;
const MARKER_INTEGER: u8 = 0x04;
const MARKER_DOUBLE: u8 = 0x05;
const MARKER_STRING: u8 = 0x06;
const MARKER_DATE: u8 = 0x08;
const MARKER_ARRAY: u8 = 0x09;
const MARKER_OBJECT: u8 = 0x0a;
const MARKER_XML: u8 = 0x0b;
const MARKER_BYTE_ARRAY: u8 = 0x0c;

const U29_MAX: u32 = (1 << 29) - 1;
const I29_MIN: i32 = -(1 << 28);
const I29_MAX: i32 = (1 << 28) - 1;

/// AMF3 encoder.
///
/// This encoder does not emit reference markers for repeated strings or
/// complex values: every value is written inline. Decoders are required by
/// the spec to accept this (references are an optional size optimization).
pub struct Amf3Encoder<W> {
    writer: W,
}

impl<W> Amf3Encoder<W>
where
    W: BufMut,
{
    /// Creates a new encoder writing into `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Encodes a single value.
    pub fn encode_value(&mut self, value: &Amf3Value) -> Result<(), Amf3Error> {
        match value {
            Amf3Value::Undefined => self.put_marker(MARKER_UNDEFINED),
            Amf3Value::Null => self.put_marker(MARKER_NULL),
            Amf3Value::Boolean(false) => self.put_marker(MARKER_FALSE),
            Amf3Value::Boolean(true) => self.put_marker(MARKER_TRUE),
            Amf3Value::Integer(v) => self.encode_integer(*v)?,
            Amf3Value::Double(v) => {
                self.put_marker(MARKER_DOUBLE);
                self.writer.put_f64(*v);
            }
            Amf3Value::String(v) => {
                self.put_marker(MARKER_STRING);
                self.encode_string_raw(v)?;
            }
            Amf3Value::Xml(v) => {
                self.put_marker(MARKER_XML);
                self.encode_u29((v.len() as u32) << 1 | 1)?;
                self.writer.put_slice(v.as_bytes());
            }
            Amf3Value::Date(v) => {
                self.put_marker(MARKER_DATE);
                self.encode_u29(1)?;
                self.writer.put_f64(*v);
            }
            Amf3Value::ByteArray(v) => {
                self.put_marker(MARKER_BYTE_ARRAY);
                self.encode_u29((v.len() as u32) << 1 | 1)?;
                self.writer.put_slice(v);
            }
            Amf3Value::Array { associative, dense } => {
                self.put_marker(MARKER_ARRAY);
                self.encode_u29((dense.len() as u32) << 1 | 1)?;
                for (key, value) in associative {
                    self.encode_string_raw(key)?;
                    self.encode_value(value)?;
                }
                self.encode_string_raw("")?;
                for value in dense {
                    self.encode_value(value)?;
                }
            }
            Amf3Value::Object {
                class_name,
                sealed_count,
                members,
            } => self.encode_object(class_name.as_deref(), *sealed_count, members)?,
        }

        Ok(())
    }

    fn put_marker(&mut self, marker: u8) {
        self.writer.put_u8(marker);
    }

    fn encode_integer(&mut self, value: i32) -> Result<(), Amf3Error> {
        if !(I29_MIN..=I29_MAX).contains(&value) {
            return Err(Amf3Error::OutOfRangeInteger);
        }

        self.put_marker(MARKER_INTEGER);
        let u29 = (value as u32) & 0x1fff_ffff;
        self.encode_u29(u29)
    }

    fn encode_string_raw(&mut self, value: &str) -> Result<(), Amf3Error> {
        self.encode_u29((value.len() as u32) << 1 | 1)?;
        self.writer.put_slice(value.as_bytes());
        Ok(())
    }

    fn encode_object(
        &mut self,
        class_name: Option<&str>,
        sealed_count: usize,
        members: &[(String, Amf3Value)],
    ) -> Result<(), Amf3Error> {
        let dynamic = sealed_count < members.len();
        let header = ((sealed_count as u32) << 4) | if dynamic { 0b1011 } else { 0b0011 };

        self.put_marker(MARKER_OBJECT);
        self.encode_u29(header)?;
        self.encode_string_raw(class_name.unwrap_or(""))?;

        let (sealed, dynamic_members) = members.split_at(sealed_count);
        for (key, _) in sealed {
            self.encode_string_raw(key)?;
        }
        for (_, value) in sealed {
            self.encode_value(value)?;
        }

        for (key, value) in dynamic_members {
            self.encode_string_raw(key)?;
            self.encode_value(value)?;
        }
        if dynamic {
            self.encode_string_raw("")?;
        }

        Ok(())
    }

    /// Encodes a U29 variable-length unsigned integer (section 1.3.1).
    fn encode_u29(&mut self, value: u32) -> Result<(), Amf3Error> {
        if value > U29_MAX {
            return Err(Amf3Error::OutOfRangeInteger);
        }

        if value <= 0x7f {
            self.writer.put_u8(value as u8);
        } else if value <= 0x3fff {
            self.writer.put_u8(((value >> 7) & 0x7f) as u8 | 0x80);
            self.writer.put_u8((value & 0x7f) as u8);
        } else if value <= 0x1f_ffff {
            self.writer.put_u8(((value >> 14) & 0x7f) as u8 | 0x80);
            self.writer.put_u8(((value >> 7) & 0x7f) as u8 | 0x80);
            self.writer.put_u8((value & 0x7f) as u8);
        } else {
            self.writer.put_u8(((value >> 22) & 0x7f) as u8 | 0x80);
            self.writer.put_u8(((value >> 15) & 0x7f) as u8 | 0x80);
            self.writer.put_u8(((value >> 8) & 0x7f) as u8 | 0x80);
            self.writer.put_u8((value & 0xff) as u8);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;
    use crate::amf3::decoder::Amf3Decoder;

    #[test]
    fn round_trip_integer() {
        let mut buf = BytesMut::new();
        let mut encoder = Amf3Encoder::new(&mut buf);
        encoder.encode_value(&Amf3Value::Integer(-2137)).unwrap();

        let mut decoder = Amf3Decoder::new(buf.freeze());
        assert_eq!(decoder.decode_value().unwrap(), Amf3Value::Integer(-2137));
    }

    #[test]
    fn round_trip_string_and_double() {
        let mut buf = BytesMut::new();
        let mut encoder = Amf3Encoder::new(&mut buf);
        encoder.encode_value(&Amf3Value::string("onStatus")).unwrap();
        encoder.encode_value(&Amf3Value::Double(1.0)).unwrap();

        let mut decoder = Amf3Decoder::new(buf.freeze());
        assert_eq!(decoder.decode_value().unwrap(), Amf3Value::string("onStatus"));
        assert_eq!(decoder.decode_value().unwrap(), Amf3Value::Double(1.0));
    }

    #[test]
    fn integer_out_of_range_is_rejected() {
        let mut buf = BytesMut::new();
        let mut encoder = Amf3Encoder::new(&mut buf);
        let err = encoder.encode_value(&Amf3Value::Integer(1 << 28)).unwrap_err();
        assert!(matches!(err, Amf3Error::OutOfRangeInteger));
    }
}
