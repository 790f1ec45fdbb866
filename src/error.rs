use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Errors fall into three groups, which the batch driver uses to classify a failed input:
///
/// ## Input errors
/// - [`Error::FileError`] - The file is missing, a directory, or unreadable due to permissions
///
/// ## Format errors
/// - [`Error::Malformed`] - Corrupted or invalid file structure
/// - [`Error::OutOfBounds`] - Attempted to read beyond the end of a structure
/// - [`Error::NotSupported`] - Not a .NET image, or a layout this crate can not rewrite
/// - [`Error::Empty`] - Empty input provided
/// - [`Error::GoblinErr`] - PE parsing errors from the goblin crate
/// - [`Error::InvalidAccess`] - Reserved member access value
///
/// ## Output errors
/// Writing reuses [`Error::FileError`]; the stage in which the error surfaced decides how the
/// batch driver reports it.
///
/// # Examples
///
/// ```rust,no_run
/// use publicizer::{Error, Module};
/// use std::path::Path;
///
/// match Module::from_path(Path::new("Assembly-CSharp.dll")) {
///     Ok(module) => println!("{} types", module.type_count()),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed file: {} ({}:{})", message, file, line);
///     }
///     Err(e) if e.is_io() => eprintln!("Could not read input: {}", e),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The file is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// This file type is not supported.
    ///
    /// Returned for valid PE files that carry no CLR runtime header, and for metadata layouts
    /// that can not be rewritten in place.
    #[error("This file type is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Error from the goblin crate during PE parsing.
    #[error("{0}")]
    GoblinErr(#[from] goblin::error::Error),

    /// A method or field carries the reserved member access value.
    ///
    /// ECMA-335 defines the values `0..=6` for the `MemberAccessMask`; `7` is never emitted by
    /// a conforming compiler.
    #[error("Invalid member access value - {0}")]
    InvalidAccess(u8),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}

impl Error {
    /// Returns `true` if this error originates from the filesystem rather than from the content
    /// of the processed bytes.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Error::FileError(_))
    }
}
