//! CLR 2.0 (Cor20) header parsing for .NET assemblies.
//!
//! The Cor20 header is the entry point from the PE image into the managed world: the CLR
//! runtime header data directory points at it, and it in turn points at the metadata root.
//! Only the fields needed to locate and sanity-check the metadata are kept.
//!
//! # Reference
//! - [ECMA-335 II.25.3.3](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{file::parser::Parser, Error::OutOfBounds, Result};

/// Size of the Cor20 header in bytes; also the only valid value of `cb`.
pub const COR20_HEADER_SIZE: usize = 72;

/// `COMIMAGE_FLAGS_*` bits defined by ECMA-335 and the .NET runtime.
const VALID_FLAGS: u32 = 0x0003_001F;

/// The CLI header of a .NET image.
pub struct Cor20Header {
    /// Size of the header in bytes, always 72
    pub cb: u32,
    /// Minimum major runtime version required
    pub major_runtime_version: u16,
    /// Minor portion of the runtime version
    pub minor_runtime_version: u16,
    /// RVA of the metadata root
    pub meta_data_rva: u32,
    /// Size of the metadata in bytes
    pub meta_data_size: u32,
    /// `COMIMAGE_FLAGS_*` runtime flags
    pub flags: u32,
    /// Token of the entry point method or file, `0` for libraries
    pub entry_point_token: u32,
}

impl Cor20Header {
    /// Parses the Cor20 header from the start of `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than 72 bytes are available, and
    /// [`crate::Error::Malformed`] if a field holds a value no conforming image uses.
    pub fn read(data: &[u8]) -> Result<Cor20Header> {
        if data.len() < COR20_HEADER_SIZE {
            return Err(OutOfBounds);
        }

        let mut parser = Parser::new(data);

        let cb = parser.read_le::<u32>()?;
        if cb as usize != COR20_HEADER_SIZE {
            return Err(malformed_error!(
                "Invalid CLR header size: expected 72, got {}",
                cb
            ));
        }

        let major_runtime_version = parser.read_le::<u16>()?;
        let minor_runtime_version = parser.read_le::<u16>()?;
        if major_runtime_version == 0 || major_runtime_version > 10 {
            return Err(malformed_error!(
                "Invalid major runtime version: {}",
                major_runtime_version
            ));
        }

        let meta_data_rva = parser.read_le::<u32>()?;
        if meta_data_rva == 0 {
            return Err(malformed_error!("Metadata RVA cannot be zero"));
        }

        let meta_data_size = parser.read_le::<u32>()?;
        if meta_data_size == 0 {
            return Err(malformed_error!("Metadata size cannot be zero"));
        } else if meta_data_size > 0x1000_0000 {
            return Err(malformed_error!(
                "Metadata size {} exceeds reasonable limit (256MB)",
                meta_data_size
            ));
        }

        let flags = parser.read_le::<u32>()?;
        if flags & !VALID_FLAGS != 0 {
            return Err(malformed_error!(
                "Invalid CLR flags: 0x{:08X} contains undefined bits",
                flags
            ));
        }

        let entry_point_token = parser.read_le::<u32>()?;

        Ok(Cor20Header {
            cb,
            major_runtime_version,
            minor_runtime_version,
            meta_data_rva,
            meta_data_size,
            flags,
            entry_point_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rustfmt::skip]
    const HEADER: [u8; 72] = [
        0x48, 0x00, 0x00, 0x00, // cb = 72
        0x02, 0x00,             // major_runtime_version = 2
        0x05, 0x00,             // minor_runtime_version = 5
        0x48, 0x20, 0x00, 0x00, // meta_data_rva = 0x2048
        0x00, 0x03, 0x00, 0x00, // meta_data_size = 0x300
        0x01, 0x00, 0x00, 0x00, // flags = ILONLY
        0x00, 0x00, 0x00, 0x00, // entry_point_token
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // resources
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // strong name
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // code manager
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // vtable fixups
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // export address table jumps
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // managed native header
    ];

    #[test]
    fn crafted() {
        let header = Cor20Header::read(&HEADER).unwrap();

        assert_eq!(header.cb, 72);
        assert_eq!(header.major_runtime_version, 2);
        assert_eq!(header.minor_runtime_version, 5);
        assert_eq!(header.meta_data_rva, 0x2048);
        assert_eq!(header.meta_data_size, 0x300);
        assert_eq!(header.flags, 1);
        assert_eq!(header.entry_point_token, 0);
    }

    #[test]
    fn strong_name_signed_with_32bit_preferred() {
        let mut data = HEADER;
        data[16..20].copy_from_slice(&0x0002_0009_u32.to_le_bytes());
        assert_eq!(Cor20Header::read(&data).unwrap().flags, 0x0002_0009);
    }

    #[test]
    fn truncated() {
        assert!(matches!(
            Cor20Header::read(&HEADER[..71]),
            Err(OutOfBounds)
        ));
    }

    #[test]
    fn invalid_values() {
        let mut bad_cb = HEADER;
        bad_cb[0] = 0x40;
        assert!(Cor20Header::read(&bad_cb).is_err());

        let mut bad_runtime = HEADER;
        bad_runtime[4] = 0;
        assert!(Cor20Header::read(&bad_runtime).is_err());

        let mut no_metadata = HEADER;
        no_metadata[8..12].copy_from_slice(&[0, 0, 0, 0]);
        assert!(Cor20Header::read(&no_metadata).is_err());

        let mut empty_metadata = HEADER;
        empty_metadata[12..16].copy_from_slice(&[0, 0, 0, 0]);
        assert!(Cor20Header::read(&empty_metadata).is_err());

        let mut bad_flags = HEADER;
        bad_flags[19] = 0x80;
        assert!(Cor20Header::read(&bad_flags).is_err());
    }
}
