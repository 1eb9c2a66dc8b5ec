//! Extension trait for [`Cursor`](std::io::Cursor) over [`Bytes`].

use std::io::Cursor;

use bytes::Bytes;

/// Extra operations on a [`Cursor`] wrapping a [`Bytes`] buffer.
pub trait BytesCursorExt {
    /// Splits off and returns everything from the current position to the end,
    /// advancing the cursor to the end.
    fn extract_remaining(&mut self) -> Bytes;
}

impl BytesCursorExt for Cursor<Bytes> {
    fn extract_remaining(&mut self) -> Bytes {
        let pos = self.position() as usize;
        let remaining = self.get_ref().slice(pos..);
        self.set_position(self.get_ref().len() as u64);
        remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_remaining_advances_cursor_to_end() {
        let mut cursor = Cursor::new(Bytes::from_static(b"hello world"));
        cursor.set_position(6);

        let rest = cursor.extract_remaining();

        assert_eq!(rest, Bytes::from_static(b"world"));
        assert_eq!(cursor.position(), 11);
        assert_eq!(cursor.extract_remaining(), Bytes::new());
    }
}
