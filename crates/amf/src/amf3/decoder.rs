//! AMF3 decoder.

use std::collections::BTreeMap;

use bytes::Buf;

use super::error::Amf3Error;
use super::value::Amf3Value;

const MARKER_UNDEFINED: u8 = 0x00;
const MARKER_NULL: u8 = 0x01;
const MARKER_FALSE: u8 = 0x02;
const MARKER_TRUE: u8 = 0x03;
const MARKER_INTEGER: u8 = 0x04;
const MARKER_DOUBLE: u8 = 0x05;
const MARKER_STRING: u8 = 0x06;
const MARKER_XML_DOC: u8 = 0x07;
const MARKER_DATE: u8 = 0x08;
const MARKER_ARRAY: u8 = 0x09;
const MARKER_OBJECT: u8 = 0x0a;
const MARKER_XML: u8 = 0x0b;
const MARKER_BYTE_ARRAY: u8 = 0x0c;

#[derive(Clone)]
struct ObjectTrait {
    class_name: Option<String>,
    dynamic: bool,
    field_names: Vec<String>,
}

/// AMF3 decoder.
///
/// Tracks the string, object and trait reference tables an AMF3 stream
/// builds up as it is read, per section 1.3.2 of the spec.
pub struct Amf3Decoder<B> {
    buf: B,
    strings: Vec<String>,
    objects: Vec<Amf3Value>,
    traits: Vec<ObjectTrait>,
}

impl<B> Amf3Decoder<B>
where
    B: Buf,
{
    /// Creates a new decoder over the given buffer.
    pub fn new(buf: B) -> Self {
        Self {
            buf,
            strings: Vec::new(),
            objects: Vec::new(),
            traits: Vec::new(),
        }
    }

    /// Returns whether there is more data left to decode.
    pub fn has_remaining(&self) -> bool {
        self.buf.has_remaining()
    }

    /// Decodes every value remaining in the buffer.
    pub fn decode_all(&mut self) -> Result<Vec<Amf3Value>, Amf3Error> {
        let mut values = Vec::new();
        while self.buf.has_remaining() {
            values.push(self.decode_value()?);
        }
        Ok(values)
    }

    /// Decodes a single AMF3 value from the buffer.
    pub fn decode_value(&mut self) -> Result<Amf3Value, Amf3Error> {
        if !self.buf.has_remaining() {
            return Err(Amf3Error::Io(std::io::ErrorKind::UnexpectedEof.into()));
        }

        match self.buf.get_u8() {
            MARKER_UNDEFINED => Ok(Amf3Value::Undefined),
            MARKER_NULL => Ok(Amf3Value::Null),
            MARKER_FALSE => Ok(Amf3Value::Boolean(false)),
            MARKER_TRUE => Ok(Amf3Value::Boolean(true)),
            MARKER_INTEGER => Ok(Amf3Value::Integer(self.decode_i29()?)),
            MARKER_DOUBLE => Ok(Amf3Value::Double(self.buf.get_f64())),
            MARKER_STRING => Ok(Amf3Value::String(self.decode_string_raw()?)),
            MARKER_XML_DOC | MARKER_XML => self.decode_xml(),
            MARKER_DATE => self.decode_date(),
            MARKER_ARRAY => self.decode_array(),
            MARKER_OBJECT => self.decode_object(),
            MARKER_BYTE_ARRAY => self.decode_byte_array(),
            marker => Err(Amf3Error::UnknownMarker(marker)),
        }
    }

    /// Decodes a U29 variable-length unsigned integer (section 1.3.1).
    fn decode_u29(&mut self) -> Result<u32, Amf3Error> {
        let mut result: u32 = 0;

        for i in 0..4 {
            if !self.buf.has_remaining() {
                return Err(Amf3Error::Io(std::io::ErrorKind::UnexpectedEof.into()));
            }

            let byte = self.buf.get_u8();

            if i == 3 {
                result = (result << 8) | byte as u32;
                break;
            }

            result = (result << 7) | (byte & 0x7f) as u32;

            if byte & 0x80 == 0 {
                break;
            }
        }

        Ok(result)
    }

    fn decode_i29(&mut self) -> Result<i32, Amf3Error> {
        let u29 = self.decode_u29()?;
        if u29 & (1 << 28) != 0 {
            Ok((u29 as i32) - (1 << 29))
        } else {
            Ok(u29 as i32)
        }
    }

    /// Decodes a reference-or-value header shared by strings, objects and traits.
    ///
    /// Returns `Ok(Err(index))` for a reference, `Ok(Ok(inline_value))` for an inline value.
    fn decode_u29_ref(&mut self) -> Result<Result<u32, usize>, Amf3Error> {
        let u29 = self.decode_u29()?;
        if u29 & 1 == 0 {
            Ok(Err((u29 >> 1) as usize))
        } else {
            Ok(Ok(u29 >> 1))
        }
    }

    fn decode_string_raw(&mut self) -> Result<String, Amf3Error> {
        let len = match self.decode_u29_ref()? {
            Err(idx) => {
                return self.strings.get(idx).cloned().ok_or(Amf3Error::OutOfBoundsReference);
            }
            Ok(len) => len as usize,
        };

        if len == 0 {
            return Ok(String::new());
        }

        if self.buf.remaining() < len {
            return Err(Amf3Error::Io(std::io::ErrorKind::UnexpectedEof.into()));
        }

        let bytes = self.buf.copy_to_bytes(len);
        let string = String::from_utf8(bytes.to_vec()).map_err(|_| Amf3Error::InvalidUtf8)?;
        self.strings.push(string.clone());
        Ok(string)
    }

    fn decode_xml(&mut self) -> Result<Amf3Value, Amf3Error> {
        let (value, is_reference) = self.decode_complex_header()?;
        if is_reference {
            return Ok(value);
        }

        let len = match value {
            Amf3Value::Integer(len) => len as usize,
            _ => unreachable!(),
        };

        if self.buf.remaining() < len {
            return Err(Amf3Error::Io(std::io::ErrorKind::UnexpectedEof.into()));
        }

        let bytes = self.buf.copy_to_bytes(len);
        let xml = String::from_utf8(bytes.to_vec()).map_err(|_| Amf3Error::InvalidUtf8)?;
        let value = Amf3Value::Xml(xml);
        self.objects.push(value.clone());
        Ok(value)
    }

    fn decode_date(&mut self) -> Result<Amf3Value, Amf3Error> {
        let (value, is_reference) = self.decode_complex_header()?;
        if is_reference {
            return Ok(value);
        }

        let millis = self.buf.get_f64();
        let value = Amf3Value::Date(millis);
        self.objects.push(value.clone());
        Ok(value)
    }

    fn decode_byte_array(&mut self) -> Result<Amf3Value, Amf3Error> {
        let (value, is_reference) = self.decode_complex_header()?;
        if is_reference {
            return Ok(value);
        }

        let len = match value {
            Amf3Value::Integer(len) => len as usize,
            _ => unreachable!(),
        };

        if self.buf.remaining() < len {
            return Err(Amf3Error::Io(std::io::ErrorKind::UnexpectedEof.into()));
        }

        let bytes = self.buf.copy_to_bytes(len);
        let value = Amf3Value::ByteArray(bytes);
        self.objects.push(value.clone());
        Ok(value)
    }

    fn decode_array(&mut self) -> Result<Amf3Value, Amf3Error> {
        let (value, is_reference) = self.decode_complex_header()?;
        if is_reference {
            return Ok(value);
        }

        let dense_count = match value {
            Amf3Value::Integer(count) => count as usize,
            _ => unreachable!(),
        };

        let mut associative = BTreeMap::new();
        loop {
            let key = self.decode_string_raw()?;
            if key.is_empty() {
                break;
            }
            let value = self.decode_value()?;
            associative.insert(key, value);
        }

        let mut dense = Vec::with_capacity(dense_count);
        for _ in 0..dense_count {
            dense.push(self.decode_value()?);
        }

        let value = Amf3Value::Array { associative, dense };
        self.objects.push(value.clone());
        Ok(value)
    }

    fn decode_object_trait(&mut self, header: u32) -> Result<ObjectTrait, Amf3Error> {
        if header & 1 == 0 {
            let idx = (header >> 1) as usize;
            return self.traits.get(idx).cloned().ok_or(Amf3Error::OutOfBoundsReference);
        }

        if header & 0b11 == 0b11 {
            return Err(Amf3Error::ExternalizableTrait);
        }

        let dynamic = header & 0b1000 != 0;
        let sealed_count = (header >> 4) as usize;

        let class_name = self.decode_string_raw()?;
        let class_name = if class_name.is_empty() { None } else { Some(class_name) };

        let mut field_names = Vec::with_capacity(sealed_count);
        for _ in 0..sealed_count {
            field_names.push(self.decode_string_raw()?);
        }

        let object_trait = ObjectTrait {
            class_name,
            dynamic,
            field_names,
        };
        self.traits.push(object_trait.clone());
        Ok(object_trait)
    }

    fn decode_object(&mut self) -> Result<Amf3Value, Amf3Error> {
        let u29 = self.decode_u29()?;
        if u29 & 1 == 0 {
            let idx = (u29 >> 1) as usize;
            return self.objects.get(idx).cloned().ok_or(Amf3Error::OutOfBoundsReference);
        }

        let object_trait = self.decode_object_trait(u29 >> 1)?;
        let sealed_count = object_trait.field_names.len();

        let mut members = Vec::with_capacity(sealed_count);
        for key in object_trait.field_names {
            let value = self.decode_value()?;
            members.push((key, value));
        }

        if object_trait.dynamic {
            loop {
                let key = self.decode_string_raw()?;
                if key.is_empty() {
                    break;
                }
                let value = self.decode_value()?;
                members.push((key, value));
            }
        }

        let value = Amf3Value::Object {
            class_name: object_trait.class_name,
            sealed_count,
            members,
        };
        self.objects.push(value.clone());
        Ok(value)
    }

    /// Reads a reference-or-length U29 header used by arrays, dates, xml and byte arrays.
    ///
    /// Returns `(value, true)` when `value` is a resolved reference, or
    /// `(Amf3Value::Integer(len), false)` carrying the inline length otherwise.
    fn decode_complex_header(&mut self) -> Result<(Amf3Value, bool), Amf3Error> {
        let u29 = self.decode_u29()?;
        if u29 & 1 == 0 {
            let idx = (u29 >> 1) as usize;
            let value = self.objects.get(idx).cloned().ok_or(Amf3Error::OutOfBoundsReference)?;
            Ok((value, true))
        } else {
            Ok((Amf3Value::Integer((u29 >> 1) as i32), false))
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[test]
    fn decode_i29_positive() {
        let mut decoder = Amf3Decoder::new(Bytes::from_static(&[0b0110_1001]));
        assert_eq!(decoder.decode_i29().unwrap(), 105);

        let mut decoder = Amf3Decoder::new(Bytes::from_static(&[0b1001_0000, 0b0101_1001]));
        assert_eq!(decoder.decode_i29().unwrap(), 2137);
    }

    #[test]
    fn decode_i29_negative() {
        let mut decoder = Amf3Decoder::new(Bytes::from_static(&[0b1111_1111, 0b1111_1111, 0b1111_0111, 0b1010_0111]));
        assert_eq!(decoder.decode_i29().unwrap(), -2137);
    }

    #[test]
    fn decode_string() {
        let mut bytes = vec![MARKER_STRING];
        bytes.push(0b0000_1011); // (5 << 1) | 1
        bytes.extend_from_slice(b"hello");

        let mut decoder = Amf3Decoder::new(Bytes::from(bytes));
        assert_eq!(decoder.decode_value().unwrap(), Amf3Value::String("hello".to_string()));
    }

    #[test]
    fn decode_string_reference() {
        let mut bytes = vec![MARKER_STRING, 0b0000_1011];
        bytes.extend_from_slice(b"hello");
        bytes.push(MARKER_STRING);
        bytes.push(0); // reference index 0

        let mut decoder = Amf3Decoder::new(Bytes::from(bytes));
        assert_eq!(decoder.decode_value().unwrap(), Amf3Value::String("hello".to_string()));
        assert_eq!(decoder.decode_value().unwrap(), Amf3Value::String("hello".to_string()));
    }

    #[test]
    fn decode_command_name_and_transaction_id() {
        // "onStatus" string followed by a double transaction id, as seen in a CommandAMF3 payload.
        let mut bytes = vec![MARKER_STRING, ((8 << 1) | 1) as u8];
        bytes.extend_from_slice(b"onStatus");
        bytes.push(MARKER_DOUBLE);
        bytes.extend_from_slice(&0f64.to_be_bytes());

        let mut decoder = Amf3Decoder::new(Bytes::from(bytes));
        let values = decoder.decode_all().unwrap();
        assert_eq!(values, vec![Amf3Value::String("onStatus".to_string()), Amf3Value::Double(0.0)]);
    }
}
