//! Cursor-based reader over a byte slice.
//!
//! [`Parser`] wraps the bounds-checked helpers from [`crate::file::io`] with a position, which
//! keeps sequential header decoding (COR20 header, table stream header) free of manual offset
//! bookkeeping.
//!
//! ```rust,ignore
//! use publicizer::file::parser::Parser;
//!
//! let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
//! let mut parser = Parser::new(&data);
//! assert_eq!(parser.read_le::<u32>()?, 0x0403_0201);
//! parser.seek(6)?;
//! assert_eq!(parser.read_le::<u16>()?, 0x0807);
//! # Ok::<(), publicizer::Error>(())
//! ```

use crate::{
    file::io::{read_le_at, read_le_at_dyn, CilIO},
    Result,
};

/// A binary data parser with an internal position cursor.
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`Parser`] from a byte slice.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Move the current position to the specified index.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if position is beyond the data length.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos >= self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position = pos;
        Ok(())
    }

    /// Move the position forward by the specified number of bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing by step would exceed the data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        match self.position.checked_add(step) {
            Some(next) if next <= self.data.len() => {
                self.position = next;
                Ok(())
            }
            _ => Err(out_of_bounds_error!()),
        }
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Read a value of type `T` in little-endian format and advance past it.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if there are not enough bytes remaining.
    pub fn read_le<T: CilIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read a 2- or 4-byte index and advance past it.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if there are not enough bytes remaining.
    pub fn read_index(&mut self, is_large: bool) -> Result<u32> {
        read_le_at_dyn(self.data, &mut self.position, is_large)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_reads() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let mut parser = Parser::new(&data);

        assert_eq!(parser.read_le::<u16>().unwrap(), 0x0201);
        assert_eq!(parser.read_le::<u8>().unwrap(), 0x03);
        assert_eq!(parser.pos(), 3);
        assert_eq!(parser.read_index(false).unwrap(), 0x0504);
        assert_eq!(parser.read_index(false).unwrap(), 0x0706);
        assert!(parser.read_le::<u16>().is_err());
    }

    #[test]
    fn navigation() {
        let data = [0x00; 4];
        let mut parser = Parser::new(&data);

        assert!(parser.seek(4).is_err());
        parser.seek(3).unwrap();
        assert_eq!(parser.pos(), 3);
        parser.advance_by(1).unwrap();
        assert!(parser.advance_by(1).is_err());
        assert!(parser.advance_by(usize::MAX).is_err());
        assert_eq!(parser.len(), 4);
        assert!(!parser.is_empty());
    }
}
