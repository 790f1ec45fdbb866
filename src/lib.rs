// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![warn(missing_docs)]
#![deny(unsafe_code)]

//! # publicizer
//!
//! Produces "publicized" reference copies of .NET assemblies: every type, method and field
//! declared in an ECMA-335 module is made public, so that tooling compiled against the copy can
//! reach members that are `private`, `internal` or `protected` in the original.
//!
//! The rewrite happens in place. Accessibility lives in fixed-width flag columns of the
//! `TypeDef`, `MethodDef` and `Field` tables, so the metadata layout, IL bodies, resources and
//! all other bytes of the image stay exactly as they were. Only the access bits change; every
//! other attribute bit (`sealed`, `static`, `specialname`, ...) is preserved.
//!
//! ## Features
//!
//! - **Self-contained PE and metadata parsing** - goblin for the PE container, an own reader
//!   for the metadata root, streams and tables (compressed `#~` and uncompressed `#-`)
//! - **Nested type tree** - nesting is resolved into an arena-backed tree with strict checks
//!   for cycles, self-nesting and duplicate parents
//! - **Batch processing** - many inputs, optionally on the rayon thread pool, with per-file
//!   failure isolation and atomic output writes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use publicizer::prelude::*;
//! use std::path::Path;
//!
//! let mut module = Module::from_path(Path::new("Assembly-CSharp.dll"))?;
//! let types = flatten_all(&module);
//! let stats = publicize(&mut module, &types);
//! module.to_file(Path::new("Assembly-CSharp_publicized.dll"))?;
//! println!("Changed {stats}");
//! # Ok::<(), publicizer::Error>(())
//! ```
//!
//! ### Batch processing
//!
//! ```rust,no_run
//! use publicizer::{process_batch, BatchOptions};
//! use std::path::PathBuf;
//!
//! let inputs = vec![PathBuf::from("Assembly-CSharp.dll")];
//! let report = process_batch(&inputs, &BatchOptions::new("publicized").with_parallel(true));
//! println!("{} written, {} failed", report.success_count(), report.failure_count());
//! std::process::exit(report.exit_code());
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`], with [`Error`] describing what went wrong.
//! The batch driver never returns an error: each input gets its own [`Outcome`].

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and functions.
///
/// # Example
///
/// ```rust,no_run
/// use publicizer::prelude::*;
///
/// let module = Module::from_path(std::path::Path::new("Assembly-CSharp.dll"))?;
/// println!("{} types", flatten_all(&module).len());
/// # Ok::<(), publicizer::Error>(())
/// ```
pub mod prelude;

/// PE container access based on goblin, and low-level byte readers.
///
/// - [`File`] - An owned PE image with its CLR runtime header located
/// - [`file::parser::Parser`] - Cursor over a byte slice
/// - [`file::io`] - Little-endian readers and writers
pub mod file;

/// Definitions and parsing of ECMA-335 metadata structures.
///
/// - [`metadata::cor20header`] - The CLR runtime header
/// - [`metadata::root`] - Metadata root and stream directory
/// - [`metadata::streams`] - `#Strings` heap and the tables stream header
/// - [`metadata::tables`] - Table identifiers, column schemas and row sizes
/// - [`metadata::accessibility`] - Type visibility and member access
/// - [`metadata::token`] - Metadata tokens
pub mod metadata;

/// The loaded type tree of a module, and its serialization.
pub mod module;

/// Depth-first flattening of the nested type tree.
pub mod walker;

/// The accessibility widening pass.
pub mod publicize;

/// Processing of many input files with per-file failure isolation.
pub mod batch;

/// `publicizer` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `publicizer` Error type
///
/// # Examples
///
/// ```rust,no_run
/// use publicizer::{Error, Module};
///
/// match Module::from_path(std::path::Path::new("native.dll")) {
///     Ok(_) => println!("Loaded successfully"),
///     Err(Error::NotSupported) => println!("Not a .NET image"),
///     Err(Error::Malformed { message, .. }) => println!("Malformed: {}", message),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
pub use error::Error;

/// A PE image carrying a CLR runtime header.
pub use file::{parser::Parser, File};

/// The loaded module and its type tree.
pub use module::{FieldDef, MemberDef, MethodDef, Module, TypeDef, TypeIndex};

/// Accessibility widening.
pub use publicize::{publicize, PublicizeStats};

/// Batch processing.
pub use batch::{
    output_path, process_batch, process_file, BatchOptions, BatchReport, FailurePolicy,
    FailureReason, FileOutcome, Outcome,
};
