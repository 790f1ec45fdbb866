//! PE file abstraction for .NET images.
//!
//! This module owns the raw bytes of an input image and the handful of PE facts the rest of
//! the crate needs: the section table for RVA translation, the location of the CLR runtime
//! header, and the location of the optional header checksum. The PE headers themselves are
//! decoded by `goblin`; everything below the CLR header is handled by [`crate::metadata`].
//!
//! # Key Components
//!
//! - [`crate::file::File`] - Owned PE image with .NET-specific accessors
//! - [`crate::file::parser::Parser`] - Cursor-based reader used by the header decoders
//! - [`crate::file::io`] - Bounds-checked little-endian primitives
//!
//! # Examples
//!
//! ```rust,no_run
//! use publicizer::File;
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("Assembly-CSharp.dll"))?;
//! let (clr_rva, clr_size) = file.clr();
//! let clr_offset = file.rva_to_offset(clr_rva as usize)?;
//! println!("CLR header at 0x{clr_offset:x} ({clr_size} bytes)");
//! # Ok::<(), publicizer::Error>(())
//! ```

pub mod io;
pub mod parser;

use std::path::Path;

use goblin::pe::{section_table::SectionTable, PE};

use crate::{
    Error::{Empty, GoblinErr, NotSupported, OutOfBounds},
    Result,
};

/// Offset of the `CheckSum` field from the start of the optional header; identical for PE32 and
/// PE32+.
const CHECKSUM_FIELD_OFFSET: usize = 64;

/// Size of the `PE\0\0` signature plus the COFF file header.
const PE_SIGNATURE_AND_COFF_SIZE: usize = 4 + 20;

/// An owned PE image containing a .NET assembly.
///
/// Unlike a read-only analysis view, the image is kept as a plain `Vec<u8>` so that the writer
/// can clone and patch it without going through a separate backend.
pub struct File {
    data: Vec<u8>,
    sections: Vec<SectionTable>,
    clr_rva: u32,
    clr_size: u32,
    checksum_offset: usize,
    checksum: u32,
    is_pe32_plus: bool,
}

impl File {
    /// Loads a PE image from disk.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file can not be read, and any of the format
    /// errors described in [`File::from_mem`].
    pub fn from_file(file: &Path) -> Result<File> {
        let data = std::fs::read(file)?;

        Self::from_mem(data)
    }

    /// Loads a PE image from an in-memory buffer.
    ///
    /// # Errors
    /// - [`crate::Error::Empty`] if `data` is empty
    /// - [`crate::Error::GoblinErr`] if the PE headers can not be parsed
    /// - [`crate::Error::Malformed`] if there is no optional header
    /// - [`crate::Error::NotSupported`] if the image carries no CLR runtime header
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        if data.is_empty() {
            return Err(Empty);
        }

        let (sections, clr_rva, clr_size, checksum_offset, checksum, is_pe32_plus) = {
            let pe = PE::parse(&data).map_err(GoblinErr)?;
            let Some(optional_header) = pe.header.optional_header else {
                return Err(malformed_error!("File does not have an OptionalHeader"));
            };

            let Some((clr_rva, clr_size)) = optional_header
                .data_directories
                .get_clr_runtime_header()
                .map(|dir| (dir.virtual_address, dir.size))
            else {
                return Err(NotSupported);
            };

            if clr_rva == 0 || clr_size == 0 {
                return Err(NotSupported);
            }

            let checksum_offset = (pe.header.dos_header.pe_pointer as usize)
                .checked_add(PE_SIGNATURE_AND_COFF_SIZE + CHECKSUM_FIELD_OFFSET)
                .ok_or(OutOfBounds)?;

            (
                pe.sections.clone(),
                clr_rva,
                clr_size,
                checksum_offset,
                optional_header.windows_fields.check_sum,
                pe.is_64,
            )
        };

        if checksum_offset + 4 > data.len() {
            return Err(OutOfBounds);
        }

        Ok(File {
            data,
            sections,
            clr_rva,
            clr_size,
            checksum_offset,
            checksum,
            is_pe32_plus,
        })
    }

    /// Returns the total size of the image in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the image holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the raw image bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns a bounds-checked slice of the image.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range exceeds the image.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(end) = offset.checked_add(len) else {
            return Err(OutOfBounds);
        };

        self.data.get(offset..end).ok_or(OutOfBounds)
    }

    /// Returns the RVA and size of the CLR runtime header.
    #[must_use]
    pub fn clr(&self) -> (u32, u32) {
        (self.clr_rva, self.clr_size)
    }

    /// Returns `true` for PE32+ (64-bit) images.
    #[must_use]
    pub fn is_pe32_plus(&self) -> bool {
        self.is_pe32_plus
    }

    /// Returns the checksum stored in the optional header.
    #[must_use]
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// Returns the file offset of the optional header checksum field.
    #[must_use]
    pub fn checksum_offset(&self) -> usize {
        self.checksum_offset
    }

    /// Translates a relative virtual address into a file offset.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if no section maps `rva` to file data.
    pub fn rva_to_offset(&self, rva: usize) -> Result<usize> {
        let rva_u32 =
            u32::try_from(rva).map_err(|_| malformed_error!("RVA too large - {}", rva))?;

        for section in &self.sections {
            let span = if section.virtual_size == 0 {
                section.size_of_raw_data
            } else {
                section.virtual_size
            };

            let Some(section_max) = section.virtual_address.checked_add(span) else {
                return Err(malformed_error!(
                    "Section malformed, causing integer overflow - {} + {}",
                    section.virtual_address,
                    span
                ));
            };

            if section.virtual_address <= rva_u32 && rva_u32 < section_max {
                let delta = rva_u32 - section.virtual_address;
                if delta >= section.size_of_raw_data {
                    return Err(malformed_error!(
                        "RVA 0x{:x} points into uninitialized section data",
                        rva
                    ));
                }

                return Ok(section.pointer_to_raw_data as usize + delta as usize);
            }
        }

        Err(malformed_error!(
            "RVA could not be converted to offset - 0x{:x}",
            rva
        ))
    }
}

/// Calculates the Windows PE checksum of `data`.
///
/// Sums all 16-bit little-endian words with the 4-byte checksum field at `checksum_offset`
/// excluded, folds the carries into the low 16 bits and adds the file length.
#[must_use]
pub fn pe_checksum(data: &[u8], checksum_offset: usize) -> u32 {
    let mut sum: u64 = 0;

    let mut i = 0;
    while i + 1 < data.len() {
        if i >= checksum_offset && i < checksum_offset + 4 {
            i += 2;
            continue;
        }

        sum += u64::from(u16::from_le_bytes([data[i], data[i + 1]]));
        i += 2;
    }

    if i < data.len() && (i < checksum_offset || i >= checksum_offset + 4) {
        sum += u64::from(data[i]);
    }

    while sum > 0xFFFF {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    // sum is folded to 16 bits; images are far below 4GB
    #[allow(clippy::cast_possible_truncation)]
    let checksum = (sum as u32).wrapping_add(data.len() as u32);

    checksum
}
