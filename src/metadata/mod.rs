//! ECMA-335 metadata structures needed to rewrite accessibility.
//!
//! This module decodes the path from the CLR runtime header down to the individual table rows:
//! the Cor20 header, the metadata root with its stream directory, the table stream header with
//! its row counts, and the `#Strings` heap. It deliberately stops at what the publicizer needs
//! to locate `TypeDef`, `MethodDef`, `Field` and `NestedClass` rows; signatures, IL and the
//! other heaps stay opaque bytes that the writer copies verbatim.
//!
//! # Key Components
//!
//! - [`cor20header`] - The CLI header
//! - [`root`] - Metadata root and stream directory
//! - [`streams`] - Stream headers, the `#Strings` heap and the table stream header
//! - [`tables`] - Table ids, coded indexes and row size computation
//! - [`token`] - Metadata tokens
//! - [`accessibility`] - Type visibility and member access levels
//!
//! # Examples
//!
//! ```rust,no_run
//! use publicizer::metadata::tables::{TableId, TableInfo};
//!
//! let info = TableInfo::from_counts(&[(TableId::TypeDef, 120), (TableId::Field, 900)], 0);
//! println!("TypeDef rows are {} bytes", info.row_size(TableId::TypeDef));
//! ```

/// Type visibility and member access levels
pub mod accessibility;
/// Implementation of the Header of CIL
pub mod cor20header;
/// Implementation of the root metadata structure
pub mod root;
/// Implementation of the metadata streams used by the publicizer
pub mod streams;
/// Table ids and row layouts
pub mod tables;
/// Commonly used metadata token type
pub mod token;
