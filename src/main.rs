mod cli;
mod commands;
mod config;
mod paths;
mod progress;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::{Options, Overrides, Settings};
use std::io;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub options: Options,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::error(&format!("{e:#}"));
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Command::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "patchctl", &mut io::stdout());
        return Ok(());
    }

    let settings = Settings::load_or_default(cli.config.as_deref())?;
    let options = Options::resolve(
        settings,
        Overrides {
            catalog: cli.catalog,
            work_dir: cli.work_dir,
            engine: cli.engine,
            environment: cli.environment,
        },
    )?;

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        options,
    };

    match cli.command {
        Command::Apply => commands::apply::run(&ctx),
        Command::ApplyOptional { ids } => commands::apply::run_optional(&ctx, &ids),
        Command::Revert { ids, all } => commands::revert::run(&ctx, &ids, all),
        Command::Status => commands::status::run(&ctx),
        Command::Analyze {
            id,
            optional,
            filter,
        } => commands::analyze::run(&ctx, &id, optional, &filter),
        Command::Check { ids } => commands::check::run(&ctx, &ids),
        Command::Completions { .. } => Ok(()),
    }
}

/// Process exit status for a failed run.
///
/// Patch conflicts pass the engine's exit code through; everything else
/// exits with 1.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<patchkit::Error>()
        .filter(|e| e.is_apply_failure())
        .map_or(1, patchkit::Error::exit_code)
        .try_into()
        .ok()
        .filter(|code| *code != 0)
        .unwrap_or(1)
}
