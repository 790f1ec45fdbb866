//! Header of the `#~` / `#-` table stream.
//!
//! The header is followed by one row count per present table and, when the extra-data heap
//! flag is set, by a 4-byte word before the first row. [`TablesHeader`] resolves where each
//! table's rows start within the stream.
//!
//! # Reference
//! - [ECMA-335 II.24.2.6](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{
    file::io::{read_le, read_le_at},
    metadata::tables::{TableId, TableInfo},
    Error::OutOfBounds,
    Result,
};

/// Heap size flag: a 4-byte extra-data word follows the row counts.
pub const HEAP_EXTRA_DATA: u8 = 0x40;

/// Parsed header of the table stream.
pub struct TablesHeader {
    /// Major version of the table schema, 1 or 2
    pub major_version: u8,
    /// Minor version of the table schema
    pub minor_version: u8,
    /// Heap size flags
    pub heap_sizes: u8,
    /// Bit vector of present tables
    pub valid: u64,
    /// Bit vector of sorted tables
    pub sorted: u64,
    /// Row counts and index widths
    pub info: TableInfo,
    /// Offset of the first table row, relative to the start of the stream
    pub tables_offset: usize,
}

impl TablesHeader {
    /// Parses the table stream header from `data`, the complete stream contents.
    ///
    /// Checks that every table with a known schema fits inside the stream.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the header or the tables are truncated, and
    /// [`crate::Error::Malformed`] if no tables are present.
    pub fn from(data: &[u8]) -> Result<TablesHeader> {
        if data.len() < 24 {
            return Err(OutOfBounds);
        }

        let major_version = read_le::<u8>(&data[4..])?;
        let minor_version = read_le::<u8>(&data[5..])?;
        let heap_sizes = read_le::<u8>(&data[6..])?;

        let mut offset = 8;
        let valid = read_le_at::<u64>(data, &mut offset)?;
        let sorted = read_le_at::<u64>(data, &mut offset)?;
        if valid == 0 {
            return Err(malformed_error!("No valid rows in any of the tables"));
        }

        let info = TableInfo::new(data, valid, heap_sizes)?;

        let mut tables_offset = 24 + valid.count_ones() as usize * 4;
        if heap_sizes & HEAP_EXTRA_DATA != 0 {
            tables_offset += 4;
        }

        let end = tables_offset
            .checked_add(info.known_tables_size()?)
            .ok_or(OutOfBounds)?;
        if end > data.len() {
            return Err(OutOfBounds);
        }

        Ok(TablesHeader {
            major_version,
            minor_version,
            heap_sizes,
            valid,
            sorted,
            info,
            tables_offset,
        })
    }

    /// Returns `true` if `table` is flagged present and has at least one row.
    #[must_use]
    pub fn has_table(&self, table: TableId) -> bool {
        self.valid & (1_u64 << (table as u8)) != 0 && self.info.rows(table) > 0
    }

    /// Returns the number of rows of `table`.
    #[must_use]
    pub fn row_count(&self, table: TableId) -> u32 {
        self.info.rows(table)
    }

    /// Returns the number of tables flagged present.
    #[must_use]
    pub fn table_count(&self) -> u32 {
        self.valid.count_ones()
    }

    /// Returns the offset of `row` (1-based) of `table`, relative to the start of the stream.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `row` is `0` or past the end of the table.
    pub fn row_offset(&self, table: TableId, row: u32) -> Result<usize> {
        if row == 0 || row > self.info.rows(table) {
            return Err(OutOfBounds);
        }

        let table_start = self.tables_offset + self.info.table_offset(table)?;
        Ok(table_start + (row as usize - 1) * self.info.row_size(table))
    }
}
