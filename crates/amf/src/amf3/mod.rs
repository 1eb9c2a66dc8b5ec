//! A minimal AMF3 encoder and decoder.
//!
//! AMF3 is used by RTMP command and data messages that carry the
//! `CommandAMF3`/`DataAMF3` message type ids. Compared to AMF0 it adds a
//! variable-length `U29` integer encoding and reference tables for strings,
//! traits and complex objects.
//!
//! # Limitations
//!
//! - Vector and Dictionary types (AMF3 spec, 3.14-3.17) are not implemented;
//!   RTMP does not use them in command or data messages.
//! - The encoder never emits reference markers, only inline values. Decoders
//!   are required to accept this.

mod decoder;
mod encoder;
mod error;
mod value;

pub use decoder::Amf3Decoder;
pub use encoder::Amf3Encoder;
pub use error::Amf3Error;
pub use value::Amf3Value;
