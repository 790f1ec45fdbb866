//! Metadata stream access.
//!
//! Streams are located through the [`crate::metadata::root::Root`] directory. The publicizer
//! reads the table stream (`#~`, or `#-` for unoptimized metadata) and the `#Strings` heap; the
//! remaining streams are only validated as directory entries.
//!
//! # Reference
//! - [ECMA-335 II.24.2](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

mod streamheader;
mod strings;
mod tablesheader;

pub use streamheader::StreamHeader;
pub use strings::Strings;
pub use tablesheader::TablesHeader;
