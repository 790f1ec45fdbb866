//! Per-input results of a batch run.

use std::path::PathBuf;

use strum::Display;

use crate::{batch::FailurePolicy, publicize::PublicizeStats};

/// Why an input could not be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum FailureReason {
    /// The input is missing or can not be read
    #[strum(to_string = "unreadable")]
    Unreadable,
    /// The input is not a .NET image this crate can rewrite
    #[strum(to_string = "format")]
    Format,
    /// The output could not be serialized or written
    #[strum(to_string = "write")]
    Write,
    /// No output file name can be derived from the input path
    #[strum(to_string = "invalid path")]
    InvalidPath,
}

/// The result of processing one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The rewritten image was written to `output`
    Success {
        /// Path of the written image
        output: PathBuf,
        /// Entities that were not public in the input
        stats: PublicizeStats,
    },
    /// Processing stopped; no output was written for this input
    Failure {
        /// Stage classification of the failure
        reason: FailureReason,
        /// Rendered error
        message: String,
    },
}

/// An input path together with its [`Outcome`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    /// The input path as given to the batch
    pub input: PathBuf,
    /// What happened to it
    pub result: Outcome,
}

impl FileOutcome {
    pub(crate) fn failure(input: PathBuf, reason: FailureReason, message: String) -> Self {
        FileOutcome {
            input,
            result: Outcome::Failure { reason, message },
        }
    }

    /// Returns `true` if an output was written.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.result, Outcome::Success { .. })
    }
}

/// Outcomes of a batch, in input order.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// One entry per input
    pub outcomes: Vec<FileOutcome>,
    pub(crate) policy: FailurePolicy,
}

impl BatchReport {
    /// Number of inputs written successfully.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.is_success()).count()
    }

    /// Number of inputs that failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }

    /// Iterates over the failed inputs.
    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_success())
    }

    /// Sum of the change counts of all successful inputs.
    #[must_use]
    pub fn total_stats(&self) -> PublicizeStats {
        let mut total = PublicizeStats::default();
        for outcome in &self.outcomes {
            if let Outcome::Success { stats, .. } = &outcome.result {
                total += *stats;
            }
        }
        total
    }

    /// Whether the batch succeeded under its [`FailurePolicy`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self.policy {
            FailurePolicy::Tolerate => true,
            FailurePolicy::Strict => self.failure_count() == 0,
        }
    }

    /// Process exit status for the batch: `0` on success, `1` otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.is_success())
    }
}
