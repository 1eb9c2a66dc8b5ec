//! Small utilities for working with [`bytes`] buffers and cheaply-cloned strings.
#![deny(unsafe_code)]
#![deny(unreachable_pub)]

pub mod cow;
mod cursor_ext;
pub mod zero_copy;

pub use cow::{BytesCow, StringCow};
pub use cursor_ext::BytesCursorExt;
