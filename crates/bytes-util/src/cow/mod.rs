//! Copy-on-write helpers for bytes and strings.

pub mod bytes;
pub mod string;

pub use self::bytes::BytesCow;
pub use self::string::StringCow;
