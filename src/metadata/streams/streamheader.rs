//! Stream headers of the metadata root directory.
//!
//! # Reference
//! - [ECMA-335 II.24.2.2](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{file::io::read_le, Error::OutOfBounds, Result};

/// Stream names accepted in a metadata root.
///
/// `#-` is the uncompressed table stream, `#JTD` marks minimal-delta metadata and `#Pdb` is
/// used by portable PDB metadata embedded next to the tables.
const VALID_NAMES: [&str; 8] = [
    "#~", "#-", "#Strings", "#US", "#Blob", "#GUID", "#JTD", "#Pdb",
];

/// Longest stream name allowed, excluding the terminator.
const MAX_NAME_LENGTH: usize = 32;

/// One entry of the stream directory.
pub struct StreamHeader {
    /// Offset of the stream, relative to the metadata root
    pub offset: u32,
    /// Size of the stream in bytes
    pub size: u32,
    /// Stream name, e.g. `#Strings`
    pub name: String,
}

impl StreamHeader {
    /// Parses a stream header from the start of `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the header is truncated, and
    /// [`crate::Error::Malformed`] for unterminated or unknown stream names.
    pub fn from(data: &[u8]) -> Result<StreamHeader> {
        if data.len() < 9 {
            return Err(OutOfBounds);
        }

        let name_area = &data[8..data.len().min(8 + MAX_NAME_LENGTH + 1)];
        let Some(name_length) = name_area.iter().position(|byte| *byte == 0) else {
            return Err(malformed_error!("Unterminated stream header name"));
        };

        let name = String::from_utf8_lossy(&name_area[..name_length]).into_owned();
        if !VALID_NAMES.contains(&name.as_str()) {
            return Err(malformed_error!("Invalid stream header name - {}", name));
        }

        Ok(StreamHeader {
            offset: read_le::<u32>(data)?,
            size: read_le::<u32>(&data[4..])?,
            name,
        })
    }

    /// Size of this header in the directory: 8 bytes plus the name padded to 4 bytes.
    #[must_use]
    pub fn header_size(&self) -> usize {
        8 + (((self.name.len() + 1) + 3) & !3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let header_bytes = [
            0x6C, 0x00, 0x00, 0x00,
            0xA4, 0x45, 0x00, 0x00,
            0x23, 0x7E, 0x00,
        ];

        let header = StreamHeader::from(&header_bytes).unwrap();

        assert_eq!(header.offset, 0x6C);
        assert_eq!(header.size, 0x45A4);
        assert_eq!(header.name, "#~");
        assert_eq!(header.header_size(), 12);
    }

    #[test]
    fn uncompressed_tables() {
        let header = StreamHeader::from(&[0, 0, 0, 0, 0, 0, 0, 0, b'#', b'-', 0]).unwrap();
        assert_eq!(header.name, "#-");
    }

    #[test]
    fn name_padding() {
        let mut data = vec![0_u8; 8];
        data.extend_from_slice(b"#Strings\0\0\0\0");
        assert_eq!(StreamHeader::from(&data).unwrap().header_size(), 20);

        let mut data = vec![0_u8; 8];
        data.extend_from_slice(b"#US\0");
        assert_eq!(StreamHeader::from(&data).unwrap().header_size(), 12);
    }

    #[test]
    fn crafted_invalid() {
        #[rustfmt::skip]
        let unknown = [
            0x6C, 0x00, 0x00, 0x00,
            0xA4, 0x45, 0x00, 0x00,
            0x24, 0x7E, 0x00,
        ];
        assert!(StreamHeader::from(&unknown).is_err());

        let unterminated = [0, 0, 0, 0, 0, 0, 0, 0, b'#', b'U', b'S'];
        assert!(StreamHeader::from(&unterminated).is_err());

        assert!(matches!(StreamHeader::from(&[0; 8]), Err(OutOfBounds)));
    }
}
