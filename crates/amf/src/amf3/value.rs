//! AMF3 value types.
//!
//! Defined by the AMF3 specification, section 3.

use std::collections::BTreeMap;

use bytes::Bytes;

/// Represents any AMF3 value.
#[derive(Debug, Clone, PartialEq)]
pub enum Amf3Value {
    /// undefined-marker
    Undefined,
    /// null-marker
    Null,
    /// false-marker / true-marker
    Boolean(bool),
    /// integer-marker. Always in the range of a 29 bit signed integer.
    Integer(i32),
    /// double-marker
    Double(f64),
    /// string-marker
    String(String),
    /// xml-marker / xml-doc-marker
    Xml(String),
    /// date-marker. Milliseconds since the epoch.
    Date(f64),
    /// array-marker
    Array {
        /// Non-integer-indexed members.
        associative: BTreeMap<String, Amf3Value>,
        /// Dense, integer-indexed members.
        dense: Vec<Amf3Value>,
    },
    /// object-marker
    Object {
        /// Fully qualified class name, `None` for anonymous objects.
        class_name: Option<String>,
        /// How many of `members` are sealed (fixed) trait members, rather
        /// than dynamic members.
        sealed_count: usize,
        /// Sealed members followed by dynamic members, in encounter order.
        members: Vec<(String, Amf3Value)>,
    },
    /// bytearray-marker
    ByteArray(Bytes),
}

impl Amf3Value {
    /// Convenience constructor for [`Amf3Value::String`].
    pub fn string(value: impl Into<String>) -> Self {
        Amf3Value::String(value.into())
    }
}
