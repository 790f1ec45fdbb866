//! String Heap (`#Strings`) for .NET metadata.
//!
//! Identifiers (type, namespace, method and field names) are stored as null-terminated UTF-8
//! strings; tables refer to them by byte offset.
//!
//! # Reference
//! - [ECMA-335 II.24.2.3](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use std::{borrow::Cow, ffi::CStr};

use crate::{Error::OutOfBounds, Result};

/// A view over the `#Strings` heap.
pub struct Strings<'a> {
    data: &'a [u8],
}

impl<'a> Strings<'a> {
    /// Wraps the heap bytes; the first byte must be the empty string.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the heap is empty or does not start with `0`.
    pub fn from(data: &'a [u8]) -> Result<Strings<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Provided #Strings heap is invalid"));
        }

        Ok(Strings { data })
    }

    /// Returns the string starting at `index`.
    ///
    /// Invalid UTF-8, as found in obfuscated assemblies, is replaced with `U+FFFD`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `index` lies outside the heap, and
    /// [`crate::Error::Malformed`] for unterminated strings.
    pub fn get(&self, index: usize) -> Result<Cow<'a, str>> {
        if index >= self.data.len() {
            return Err(OutOfBounds);
        }

        match CStr::from_bytes_until_nul(&self.data[index..]) {
            Ok(result) => Ok(result.to_string_lossy()),
            Err(_) => Err(malformed_error!("Unterminated string at index - {}", index)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        let data = b"\0<Module>\0Player\0Game.Internal\0";
        let heap = Strings::from(data).unwrap();

        assert_eq!(heap.get(0).unwrap(), "");
        assert_eq!(heap.get(1).unwrap(), "<Module>");
        assert_eq!(heap.get(10).unwrap(), "Player");
        assert_eq!(heap.get(17).unwrap(), "Game.Internal");
        // suffix sharing is allowed
        assert_eq!(heap.get(22).unwrap(), "Internal");
    }

    #[test]
    fn invalid() {
        assert!(Strings::from(b"").is_err());
        assert!(Strings::from(b"x\0").is_err());

        let heap = Strings::from(b"\0abc").unwrap();
        assert!(matches!(heap.get(4), Err(OutOfBounds)));
        assert!(heap.get(1).is_err());
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let heap = Strings::from(b"\0\xFF\xFEName\0").unwrap();
        assert_eq!(heap.get(1).unwrap(), "\u{FFFD}\u{FFFD}Name");
        assert_eq!(heap.get(3).unwrap(), "Name");
    }
}
