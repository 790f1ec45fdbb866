//! Batch processing of many input files.
//!
//! Each input runs through its own `read → flatten → publicize → write` pipeline. A failure at
//! any stage ends processing of that input only; the batch always visits every input and
//! reports one [`FileOutcome`] per input, in input order, whether it runs sequentially or on
//! the rayon thread pool.
//!
//! # Examples
//!
//! ```rust,no_run
//! use publicizer::{process_batch, BatchOptions, Outcome};
//! use std::path::PathBuf;
//!
//! let inputs = vec![PathBuf::from("Assembly-CSharp.dll"), PathBuf::from("UnityEngine.dll")];
//! let report = process_batch(&inputs, &BatchOptions::new("publicized"));
//! for outcome in &report.outcomes {
//!     match &outcome.result {
//!         Outcome::Success { output, stats } => println!("{} ({stats})", output.display()),
//!         Outcome::Failure { reason, message } => eprintln!("{reason}: {message}"),
//!     }
//! }
//! ```

mod options;
mod outcome;

pub use options::{BatchOptions, FailurePolicy, DEFAULT_OUTPUT_DIR, DEFAULT_SUFFIX};
pub use outcome::{BatchReport, FailureReason, FileOutcome, Outcome};

use std::{
    collections::{hash_map::Entry, HashMap},
    ffi::OsString,
    fmt,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::{
    module::{write_atomic, Module},
    publicize::{count_non_public, publicize},
    walker::flatten_all,
    Error, Result,
};

/// Progress of one input through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Unprocessed,
    Read,
    Flattened,
    Rewritten,
    Written,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Unprocessed => "unprocessed",
            Stage::Read => "read",
            Stage::Flattened => "flattened",
            Stage::Rewritten => "rewritten",
            Stage::Written => "written",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Derives the output path for `input`: `<output_dir>/<stem><suffix>.<extension>`.
///
/// Inputs without an extension get the suffix appended to the file name.
///
/// # Errors
/// Returns [`crate::Error::Error`] if `input` has no file name.
pub fn output_path(input: &Path, output_dir: &Path, suffix: &str) -> Result<PathBuf> {
    let Some(stem) = input.file_stem() else {
        return Err(Error::Error(format!(
            "Input path has no file name - {}",
            input.display()
        )));
    };

    let mut name = OsString::from(stem);
    name.push(suffix);
    if let Some(extension) = input.extension() {
        name.push(".");
        name.push(extension);
    }

    Ok(output_dir.join(name))
}

/// Publicizes every input and writes the results into `options.output_dir`.
///
/// The output directory is created if missing. Failures never abort the batch; they are
/// recorded in the returned report.
pub fn process_batch(inputs: &[PathBuf], options: &BatchOptions) -> BatchReport {
    let outcomes = if let Err(error) = std::fs::create_dir_all(&options.output_dir) {
        warn!(
            "Can not create output directory {}: {}",
            options.output_dir.display(),
            error
        );
        inputs
            .iter()
            .map(|input| {
                FileOutcome::failure(
                    input.clone(),
                    FailureReason::Write,
                    format!(
                        "Can not create output directory {}: {}",
                        options.output_dir.display(),
                        error
                    ),
                )
            })
            .collect()
    } else {
        let conflicts = output_conflicts(inputs, options);
        let run = |(input, conflict): (&PathBuf, &Option<String>)| match conflict {
            Some(message) => {
                trace_stage(input, Stage::Failed);
                warn!("Skipping {}: {}", input.display(), message);
                FileOutcome::failure(input.clone(), FailureReason::InvalidPath, message.clone())
            }
            None => process_file(input, options),
        };

        if options.parallel {
            inputs.par_iter().zip(conflicts.par_iter()).map(run).collect()
        } else {
            inputs.iter().zip(conflicts.iter()).map(run).collect()
        }
    };

    let report = BatchReport {
        outcomes,
        policy: options.failure_policy,
    };

    info!(
        "Processed {} files: {} written, {} failed ({})",
        report.outcomes.len(),
        report.success_count(),
        report.failure_count(),
        report.total_stats()
    );

    report
}

/// Finds inputs whose output path was already claimed by an earlier input.
///
/// Returns one entry per input; `Some` holds the failure message for a later duplicate.
/// Inputs without a derivable output path are left to the pipeline.
fn output_conflicts(inputs: &[PathBuf], options: &BatchOptions) -> Vec<Option<String>> {
    let mut claimed: HashMap<PathBuf, &Path> = HashMap::with_capacity(inputs.len());

    inputs
        .iter()
        .map(|input| {
            let output = output_path(input, &options.output_dir, &options.suffix).ok()?;
            match claimed.entry(output) {
                Entry::Occupied(entry) => Some(format!(
                    "Output {} is already written for {}",
                    entry.key().display(),
                    entry.get().display()
                )),
                Entry::Vacant(entry) => {
                    entry.insert(input);
                    None
                }
            }
        })
        .collect()
}

/// Runs the full pipeline for a single input.
pub fn process_file(input: &Path, options: &BatchOptions) -> FileOutcome {
    match run_pipeline(input, options) {
        Ok((output, stats)) => {
            info!("{} -> {} ({})", input.display(), output.display(), stats);
            FileOutcome {
                input: input.to_path_buf(),
                result: Outcome::Success { output, stats },
            }
        }
        Err((reason, error)) => {
            trace_stage(input, Stage::Failed);
            warn!("Skipping {} ({}): {}", input.display(), reason, error);
            FileOutcome::failure(input.to_path_buf(), reason, error.to_string())
        }
    }
}

type StageResult<T> = std::result::Result<T, (FailureReason, Error)>;

fn run_pipeline(
    input: &Path,
    options: &BatchOptions,
) -> StageResult<(PathBuf, crate::PublicizeStats)> {
    trace_stage(input, Stage::Unprocessed);
    let mut module = Module::from_path(input).map_err(|error| {
        let reason = if error.is_io() {
            FailureReason::Unreadable
        } else {
            FailureReason::Format
        };
        (reason, error)
    })?;
    trace_stage(input, Stage::Read);

    let types = flatten_all(&module);
    trace_stage(input, Stage::Flattened);

    let stats = publicize(&mut module, &types);
    trace_stage(input, Stage::Rewritten);

    let output = output_path(input, &options.output_dir, &options.suffix)
        .map_err(|error| (FailureReason::InvalidPath, error))?;

    let data = module
        .to_bytes()
        .map_err(|error| (FailureReason::Write, error))?;
    if options.verify_output {
        verify(&data).map_err(|error| (FailureReason::Write, error))?;
    }

    write_atomic(&output, &data).map_err(|error| (FailureReason::Write, error))?;
    trace_stage(input, Stage::Written);

    Ok((output, stats))
}

/// Re-parses a serialized image and checks that nothing non-public is left.
fn verify(data: &[u8]) -> Result<()> {
    let reparsed = Module::from_mem(data.to_vec())?;
    let remaining = count_non_public(&reparsed, &flatten_all(&reparsed));
    if !remaining.is_empty() {
        return Err(Error::Error(format!(
            "Verification failed, still not public: {remaining}"
        )));
    }

    Ok(())
}

fn trace_stage(input: &Path, stage: Stage) {
    debug!("{}: {}", input.display(), stage);
}
