use std::path::{Path, PathBuf};

use publicizer::{process_batch, BatchOptions, BatchReport, FailurePolicy, Outcome};
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::{collect_dlls, file_display_name},
    output::{print_output, Align, TabWriter},
};

pub struct PublicizeArgs<'a> {
    pub files: &'a [PathBuf],
    pub input_dir: &'a Path,
    pub output: &'a Path,
    pub suffix: &'a str,
    pub parallel: bool,
    pub verify: bool,
    pub strict: bool,
}

#[derive(Debug, Serialize)]
struct FileEntry {
    input: String,
    status: &'static str,
    output: Option<String>,
    types: usize,
    methods: usize,
    fields: usize,
    reason: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct PublicizeOutput {
    files: Vec<FileEntry>,
    succeeded: usize,
    failed: usize,
    exit_code: i32,
}

/// Runs the batch and returns the process exit code.
pub fn run(args: &PublicizeArgs, opts: &GlobalOptions) -> anyhow::Result<i32> {
    let inputs = if args.files.is_empty() {
        collect_dlls(args.input_dir)?
    } else {
        args.files.to_vec()
    };

    if inputs.is_empty() {
        log::warn!("No .dll files found in {}", args.input_dir.display());
    }

    let options = BatchOptions::new(args.output)
        .with_suffix(args.suffix)
        .with_parallel(args.parallel)
        .with_verify_output(args.verify)
        .with_failure_policy(if args.strict {
            FailurePolicy::Strict
        } else {
            FailurePolicy::Tolerate
        });

    let report = process_batch(&inputs, &options);
    let output = build_output(&report);

    print_output(&output, opts, |out| {
        let mut tw = TabWriter::new(&[
            ("File", Align::Left),
            ("Status", Align::Left),
            ("Types", Align::Right),
            ("Methods", Align::Right),
            ("Fields", Align::Right),
            ("Detail", Align::Left),
        ]);
        for e in &out.files {
            let detail = match (&e.output, &e.error) {
                (Some(path), _) => path.clone(),
                (None, Some(error)) => error.clone(),
                (None, None) => String::new(),
            };
            tw.row(vec![
                e.input.clone(),
                e.status.to_string(),
                e.types.to_string(),
                e.methods.to_string(),
                e.fields.to_string(),
                detail,
            ]);
        }
        tw.print();
        println!(
            "\n{} file(s) publicized, {} failed.",
            out.succeeded, out.failed
        );
    })?;

    Ok(report.exit_code())
}

fn build_output(report: &BatchReport) -> PublicizeOutput {
    let files = report
        .outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Outcome::Success { output, stats } => FileEntry {
                input: file_display_name(&outcome.input),
                status: "ok",
                output: Some(output.display().to_string()),
                types: stats.types,
                methods: stats.methods,
                fields: stats.fields,
                reason: None,
                error: None,
            },
            Outcome::Failure { reason, message } => FileEntry {
                input: file_display_name(&outcome.input),
                status: "failed",
                output: None,
                types: 0,
                methods: 0,
                fields: 0,
                reason: Some(reason.to_string()),
                error: Some(message.clone()),
            },
        })
        .collect();

    PublicizeOutput {
        files,
        succeeded: report.success_count(),
        failed: report.failure_count(),
        exit_code: report.exit_code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global() -> GlobalOptions {
        GlobalOptions {
            json: true,
            verbose: false,
        }
    }

    #[test]
    fn strict_failure_sets_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("Broken.dll");
        std::fs::write(&input, b"not a PE image").unwrap();
        let files = vec![input];
        let output = dir.path().join("out");

        let mut args = PublicizeArgs {
            files: &files,
            input_dir: dir.path(),
            output: &output,
            suffix: "_publicized",
            parallel: false,
            verify: false,
            strict: false,
        };
        assert_eq!(run(&args, &global()).unwrap(), 0);

        args.strict = true;
        assert_eq!(run(&args, &global()).unwrap(), 1);
    }

    #[test]
    fn empty_input_dir() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");
        let args = PublicizeArgs {
            files: &[],
            input_dir: dir.path(),
            output: &output,
            suffix: "_publicized",
            parallel: true,
            verify: true,
            strict: true,
        };
        assert_eq!(run(&args, &global()).unwrap(), 0);
    }
}
