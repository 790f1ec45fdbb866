mod app;
mod commands;
mod output;

#[cfg(test)]
#[path = "../../src/test/image.rs"]
mod image;

use clap::Parser;

use crate::app::{Cli, Command};

fn main() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    })?;

    let cli = Cli::parse();

    // publicizer info+ on stderr unless --json; --verbose enables debug; RUST_LOG overrides
    if !cli.global.json {
        let level = if cli.global.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::new()
            .filter_module("publicizer", level)
            .parse_default_env()
            .target(env_logger::Target::Stderr)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false)
            .init();
    }

    match &cli.command {
        Command::Publicize {
            files,
            input_dir,
            output,
            suffix,
            parallel,
            verify,
            strict,
            pause,
        } => {
            let code = commands::publicize::run(
                &commands::publicize::PublicizeArgs {
                    files,
                    input_dir,
                    output,
                    suffix,
                    parallel: *parallel,
                    verify: *verify,
                    strict: *strict,
                },
                &cli.global,
            )?;

            if *pause {
                commands::common::wait_for_enter()?;
            }
            std::process::exit(code);
        }
        Command::Types {
            path,
            namespace,
            non_public_only,
        } => commands::types::run(path, namespace.as_deref(), *non_public_only, &cli.global),
    }
}
