//! Configuration of a batch run.

use std::path::{Path, PathBuf};

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "publicized";

/// Default suffix inserted before the file extension of each output.
pub const DEFAULT_SUFFIX: &str = "_publicized";

/// How per-file failures affect the overall result of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Failures are reported, the batch still counts as successful
    #[default]
    Tolerate,
    /// Any failed input makes the batch unsuccessful
    Strict,
}

/// Options for [`crate::process_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Directory that receives the rewritten files; created if missing
    pub output_dir: PathBuf,
    /// Suffix inserted between file stem and extension
    pub suffix: String,
    /// Process inputs on the rayon thread pool
    pub parallel: bool,
    /// Re-parse every serialized image before it is written
    pub verify_output: bool,
    /// Whether failed inputs fail the batch
    pub failure_policy: FailurePolicy,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            suffix: DEFAULT_SUFFIX.to_string(),
            parallel: false,
            verify_output: false,
            failure_policy: FailurePolicy::Tolerate,
        }
    }
}

impl BatchOptions {
    /// Default options writing into `output_dir`.
    #[must_use]
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Parallel, verified processing where any failure fails the batch.
    #[must_use]
    pub fn strict(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            parallel: true,
            verify_output: true,
            failure_policy: FailurePolicy::Strict,
            ..Self::default()
        }
    }

    /// Sets the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl AsRef<Path>) -> Self {
        self.output_dir = output_dir.as_ref().to_path_buf();
        self
    }

    /// Sets the file name suffix.
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Enables or disables parallel processing.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Enables or disables re-parsing of each output.
    #[must_use]
    pub fn with_verify_output(mut self, verify_output: bool) -> Self {
        self.verify_output = verify_output;
        self
    }

    /// Sets the [`FailurePolicy`].
    #[must_use]
    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        let default = BatchOptions::default();
        assert_eq!(default.output_dir, PathBuf::from("publicized"));
        assert_eq!(default.suffix, "_publicized");
        assert!(!default.parallel);
        assert!(!default.verify_output);
        assert_eq!(default.failure_policy, FailurePolicy::Tolerate);

        let strict = BatchOptions::strict("out");
        assert_eq!(strict.output_dir, PathBuf::from("out"));
        assert_eq!(strict.suffix, "_publicized");
        assert!(strict.parallel);
        assert!(strict.verify_output);
        assert_eq!(strict.failure_policy, FailurePolicy::Strict);
    }

    #[test]
    fn builders() {
        let options = BatchOptions::new("a")
            .with_output_dir("b")
            .with_suffix(".pub")
            .with_parallel(true)
            .with_verify_output(true)
            .with_failure_policy(FailurePolicy::Strict);

        assert_eq!(options.output_dir, PathBuf::from("b"));
        assert_eq!(options.suffix, ".pub");
        assert!(options.parallel);
        assert!(options.verify_output);
        assert_eq!(options.failure_policy, FailurePolicy::Strict);
    }
}
