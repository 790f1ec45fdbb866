use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// publicizer - make every type, method and field of .NET assemblies public
#[derive(Debug, Parser)]
#[command(name = "publicizer", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write publicized copies of .NET assemblies.
    Publicize {
        /// Assemblies to process. Without files, every `.dll` in --input-dir is used.
        #[arg(value_name = "FILES")]
        files: Vec<PathBuf>,

        /// Directory searched for `.dll` files when no FILES are given.
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        input_dir: PathBuf,

        /// Directory that receives the publicized copies.
        #[arg(short, long, value_name = "DIR", default_value = publicizer::batch::DEFAULT_OUTPUT_DIR)]
        output: PathBuf,

        /// Suffix inserted before the file extension of each output.
        #[arg(long, default_value = publicizer::batch::DEFAULT_SUFFIX)]
        suffix: String,

        /// Process files in parallel.
        #[arg(long)]
        parallel: bool,

        /// Re-parse every output before writing it.
        #[arg(long)]
        verify: bool,

        /// Exit with status 1 if any file fails.
        #[arg(long)]
        strict: bool,

        /// Wait for Enter before exiting.
        #[arg(long)]
        pause: bool,
    },

    /// List type definitions with their accessibility.
    Types {
        /// Path to the .NET assembly file.
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Filter by namespace.
        #[arg(long)]
        namespace: Option<String>,

        /// Show only types that are not public, or declare non-public members.
        #[arg(long)]
        non_public_only: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publicize_defaults() {
        let cli = Cli::try_parse_from(["publicizer", "publicize"]).unwrap();
        match cli.command {
            Command::Publicize {
                files,
                input_dir,
                output,
                suffix,
                parallel,
                strict,
                ..
            } => {
                assert!(files.is_empty());
                assert_eq!(input_dir, PathBuf::from("."));
                assert_eq!(output, PathBuf::from("publicized"));
                assert_eq!(suffix, "_publicized");
                assert!(!parallel);
                assert!(!strict);
            }
            Command::Types { .. } => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "publicizer",
            "types",
            "Game.dll",
            "--non-public-only",
            "--json",
        ])
        .unwrap();
        assert!(cli.global.json);
        assert!(matches!(
            cli.command,
            Command::Types {
                non_public_only: true,
                ..
            }
        ));
    }

    #[test]
    fn types_requires_file() {
        assert!(Cli::try_parse_from(["publicizer", "types"]).is_err());
    }
}
