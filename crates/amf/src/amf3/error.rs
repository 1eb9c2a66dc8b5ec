//! AMF3 error type.

use std::fmt::Display;
use std::io;

/// AMF3 error.
#[derive(thiserror::Error, Debug)]
pub enum Amf3Error {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// Marker byte does not correspond to a known AMF3 type.
    #[error("unknown marker: {0}")]
    UnknownMarker(u8),
    /// A string, trait, or object reference pointed outside its table.
    #[error("out of bounds reference")]
    OutOfBoundsReference,
    /// Externalizable objects are not supported.
    #[error("externalizable traits are not supported")]
    ExternalizableTrait,
    /// UTF-8 decoding of a string value failed.
    #[error("invalid utf-8 string")]
    InvalidUtf8,
    /// An integer did not fit in the 29-bit range AMF3 uses.
    #[error("integer out of range for a U29")]
    OutOfRangeInteger,
    /// Custom error message.
    #[error("{0}")]
    Custom(String),
}

impl serde::ser::Error for Amf3Error {
    fn custom<T: Display>(msg: T) -> Self {
        Amf3Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Amf3Error {
    fn custom<T: Display>(msg: T) -> Self {
        Amf3Error::Custom(msg.to_string())
    }
}
