use strum::{EnumCount, IntoEnumIterator};

use crate::{
    file::io::read_le_at,
    metadata::tables::{CodedIndexType, Column, TableId},
    Error::OutOfBounds,
    Result,
};

/// Heap size flag: `#Strings` indexes are 4 bytes wide.
pub const HEAP_LARGE_STRINGS: u8 = 0x01;
/// Heap size flag: `#GUID` indexes are 4 bytes wide.
pub const HEAP_LARGE_GUID: u8 = 0x02;
/// Heap size flag: `#Blob` indexes are 4 bytes wide.
pub const HEAP_LARGE_BLOB: u8 = 0x04;

/// Row count and index width of a single table.
#[derive(Clone, Copy, Default, PartialEq, Debug)]
pub struct TableRowInfo {
    /// Number of rows in the table
    pub rows: u32,
    /// Number of bits needed to store the largest row index
    pub bits: u8,
    /// Whether simple indexes into this table are 4 bytes wide
    pub is_large: bool,
}

impl TableRowInfo {
    #[must_use]
    pub fn new(rows: u32) -> Self {
        let bits = if rows == 0 {
            1
        } else {
            // 32 - leading_zeros is at most 32
            (32 - rows.leading_zeros()) as u8
        };

        Self {
            rows,
            bits,
            is_large: rows > u32::from(u16::MAX),
        }
    }
}

/// Row counts and index widths of all tables in a table stream.
#[derive(Clone, Default, Debug)]
pub struct TableInfo {
    rows: Vec<TableRowInfo>,
    coded_indexes: Vec<u8>,
    is_large_index_str: bool,
    is_large_index_guid: bool,
    is_large_index_blob: bool,
}

impl TableInfo {
    /// Reads the row counts that follow the fixed 24-byte table stream header.
    ///
    /// One `u32` is stored for every bit set in `valid`, including tables this crate has no
    /// schema for.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the row counts are truncated.
    pub fn new(data: &[u8], valid: u64, heap_sizes: u8) -> Result<Self> {
        let mut rows = vec![TableRowInfo::default(); TableId::COUNT];
        let mut offset = 24;

        for bit in 0..64_usize {
            if valid & (1 << bit) == 0 {
                continue;
            }

            let row_count = read_le_at::<u32>(data, &mut offset)?;
            if let Some(info) = rows.get_mut(bit) {
                *info = TableRowInfo::new(row_count);
            }
        }

        Ok(Self::with_rows(rows, heap_sizes))
    }

    /// Builds the info from explicit row counts; absent tables have zero rows.
    #[must_use]
    pub fn from_counts(counts: &[(TableId, u32)], heap_sizes: u8) -> Self {
        let mut rows = vec![TableRowInfo::default(); TableId::COUNT];
        for (id, count) in counts {
            rows[*id as usize] = TableRowInfo::new(*count);
        }

        Self::with_rows(rows, heap_sizes)
    }

    fn with_rows(rows: Vec<TableRowInfo>, heap_sizes: u8) -> Self {
        let mut info = TableInfo {
            rows,
            coded_indexes: vec![0; CodedIndexType::COUNT],
            is_large_index_str: heap_sizes & HEAP_LARGE_STRINGS != 0,
            is_large_index_guid: heap_sizes & HEAP_LARGE_GUID != 0,
            is_large_index_blob: heap_sizes & HEAP_LARGE_BLOB != 0,
        };

        info.calculate_coded_index_bits();
        info
    }

    #[must_use]
    pub fn rows(&self, table: TableId) -> u32 {
        self.rows[table as usize].rows
    }

    #[must_use]
    pub fn is_large(&self, table: TableId) -> bool {
        self.rows[table as usize].is_large
    }

    #[must_use]
    pub fn str_bytes(&self) -> u8 {
        if self.is_large_index_str {
            4
        } else {
            2
        }
    }

    #[must_use]
    pub fn guid_bytes(&self) -> u8 {
        if self.is_large_index_guid {
            4
        } else {
            2
        }
    }

    #[must_use]
    pub fn blob_bytes(&self) -> u8 {
        if self.is_large_index_blob {
            4
        } else {
            2
        }
    }

    #[must_use]
    pub fn table_index_bytes(&self, table: TableId) -> u8 {
        if self.rows[table as usize].bits > 16 {
            4
        } else {
            2
        }
    }

    #[must_use]
    pub fn coded_index_bytes(&self, coded_index_type: CodedIndexType) -> u8 {
        if self.coded_indexes[coded_index_type as usize] > 16 {
            4
        } else {
            2
        }
    }

    /// Returns the size in bytes of one column under the current index widths.
    #[must_use]
    pub fn column_size(&self, column: Column) -> u8 {
        match column {
            Column::Fixed(size) => size,
            Column::Str => self.str_bytes(),
            Column::Guid => self.guid_bytes(),
            Column::Blob => self.blob_bytes(),
            Column::Table(target) => self.table_index_bytes(target),
            Column::Coded(kind) => self.coded_index_bytes(kind),
        }
    }

    /// Returns the size in bytes of one row of `table`.
    #[must_use]
    pub fn row_size(&self, table: TableId) -> usize {
        table
            .columns()
            .iter()
            .map(|column| usize::from(self.column_size(*column)))
            .sum()
    }

    /// Returns the byte offset of `column` within a row of `table`.
    #[must_use]
    pub fn column_offset(&self, table: TableId, column: usize) -> usize {
        table
            .columns()
            .iter()
            .take(column)
            .map(|column| usize::from(self.column_size(*column)))
            .sum()
    }

    /// Returns the offset of `table` relative to the first table row, and the offset just past
    /// the last known table.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the sizes overflow `usize`.
    pub fn table_offset(&self, table: TableId) -> Result<usize> {
        let mut offset = 0_usize;
        for id in TableId::iter().take_while(|id| *id < table) {
            let size = self
                .row_size(id)
                .checked_mul(self.rows(id) as usize)
                .ok_or(OutOfBounds)?;
            offset = offset.checked_add(size).ok_or(OutOfBounds)?;
        }

        Ok(offset)
    }

    /// Returns the total size of all tables this crate has a schema for.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the sizes overflow `usize`.
    pub fn known_tables_size(&self) -> Result<usize> {
        let last = TableId::GenericParamConstraint;
        let tail = self
            .row_size(last)
            .checked_mul(self.rows(last) as usize)
            .ok_or(OutOfBounds)?;

        self.table_offset(last)?
            .checked_add(tail)
            .ok_or(OutOfBounds)
    }

    fn calculate_coded_index_bits(&mut self) {
        for coded_index in CodedIndexType::iter() {
            let max_bits = coded_index
                .tables()
                .iter()
                .map(|table| self.rows[*table as usize].bits)
                .max()
                .unwrap_or(1);

            self.coded_indexes[coded_index as usize] = max_bits + coded_index.tag_bits();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_indexes() {
        let info = TableInfo::from_counts(
            &[
                (TableId::Module, 1),
                (TableId::TypeDef, 10),
                (TableId::Field, 20),
                (TableId::MethodDef, 30),
            ],
            0,
        );

        assert_eq!(info.row_size(TableId::Module), 10);
        assert_eq!(info.row_size(TableId::TypeDef), 14);
        assert_eq!(info.row_size(TableId::Field), 6);
        assert_eq!(info.row_size(TableId::MethodDef), 14);
        assert_eq!(info.row_size(TableId::NestedClass), 4);
        assert_eq!(info.column_offset(TableId::MethodDef, 2), 6);
        assert_eq!(info.column_offset(TableId::TypeDef, 4), 10);
    }

    #[test]
    fn large_heaps() {
        let info = TableInfo::from_counts(
            &[(TableId::TypeDef, 1)],
            HEAP_LARGE_STRINGS | HEAP_LARGE_GUID | HEAP_LARGE_BLOB,
        );

        assert_eq!(info.row_size(TableId::Module), 2 + 4 + 4 * 3);
        assert_eq!(info.row_size(TableId::TypeDef), 4 + 4 + 4 + 2 + 2 + 2);
        assert_eq!(info.row_size(TableId::Field), 2 + 4 + 4);
    }

    #[test]
    fn large_table_indexes() {
        let info = TableInfo::from_counts(
            &[(TableId::TypeDef, 0x1_0000), (TableId::Field, 0x1_0000)],
            0,
        );

        assert!(info.is_large(TableId::TypeDef));
        // extends: TypeDefOrRef has 2 tag bits, 17 + 2 > 16
        assert_eq!(info.coded_index_bytes(CodedIndexType::TypeDefOrRef), 4);
        assert_eq!(info.row_size(TableId::TypeDef), 4 + 2 + 2 + 4 + 4 + 2);
        assert_eq!(info.row_size(TableId::NestedClass), 8);
        assert_eq!(info.row_size(TableId::FieldPtr), 4);
    }

    #[test]
    fn coded_index_threshold() {
        // HasCustomAttribute uses 5 tag bits: 2^11 rows still fit in 16 bits only below 2048
        let fits = TableInfo::from_counts(&[(TableId::MethodDef, 2047)], 0);
        assert_eq!(fits.coded_index_bytes(CodedIndexType::HasCustomAttribute), 2);

        let spills = TableInfo::from_counts(&[(TableId::MethodDef, 2048)], 0);
        assert_eq!(spills.coded_index_bytes(CodedIndexType::HasCustomAttribute), 4);
        assert_eq!(spills.row_size(TableId::CustomAttribute), 4 + 2 + 2);
    }

    #[test]
    fn offsets_accumulate() {
        let info = TableInfo::from_counts(
            &[
                (TableId::Module, 1),
                (TableId::TypeRef, 3),
                (TableId::TypeDef, 2),
            ],
            0,
        );

        assert_eq!(info.table_offset(TableId::Module).unwrap(), 0);
        assert_eq!(info.table_offset(TableId::TypeRef).unwrap(), 10);
        assert_eq!(info.table_offset(TableId::TypeDef).unwrap(), 10 + 3 * 6);
        assert_eq!(
            info.table_offset(TableId::Field).unwrap(),
            10 + 3 * 6 + 2 * 14
        );
        assert_eq!(info.known_tables_size().unwrap(), 10 + 3 * 6 + 2 * 14);
    }

    #[test]
    fn unknown_tables_consume_row_counts() {
        let mut data = vec![0_u8; 24];
        let valid = (1_u64 << 0x00) | (1_u64 << 0x02) | (1_u64 << 0x30);
        for count in [1_u32, 5, 9] {
            data.extend_from_slice(&count.to_le_bytes());
        }

        let info = TableInfo::new(&data, valid, 0).unwrap();
        assert_eq!(info.rows(TableId::Module), 1);
        assert_eq!(info.rows(TableId::TypeDef), 5);

        assert!(TableInfo::new(&data[..30], valid, 0).is_err());
    }
}
