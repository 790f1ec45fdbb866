//! # publicizer Prelude
//!
//! The most commonly used types and functions, for glob imports.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all publicizer operations
pub use crate::Error;

/// The result type used throughout publicizer
pub use crate::Result;

// ================================================================================================
// Loading and Saving
// ================================================================================================

/// Low-level file parsing utilities
pub use crate::{File, Parser};

/// The loaded type tree
pub use crate::module::{FieldDef, MemberDef, MethodDef, Module, TypeDef, TypeIndex};

/// Metadata token type
pub use crate::metadata::token::Token;

/// Accessibility values
pub use crate::metadata::accessibility::{MemberAccess, TypeVisibility};

// ================================================================================================
// Rewriting
// ================================================================================================

/// Tree flattening
pub use crate::walker::{flatten, flatten_all};

/// The widening pass
pub use crate::publicize::{count_non_public, publicize, PublicizeStats};

/// Batch processing
pub use crate::batch::{
    output_path, process_batch, BatchOptions, BatchReport, FailurePolicy, FailureReason,
    FileOutcome, Outcome,
};
