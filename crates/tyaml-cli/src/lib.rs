//! # tyaml-cli: Parameter Validation Command Line
//!
//! Argument parsing and subcommand handlers for the `tyaml` binary. The
//! binary itself only sets up logging and calls [`run`], which keeps every
//! path testable with in-memory output streams.
//!
//! ## Subcommands
//!
//! - `validate`: check a parameter file against a parameter definition
//! - `dump`: decode a document and re-emit it as canonical YAML or JSON
//! - `help`: print usage, for the tool or for one subcommand
//!
//! ## Exit Codes
//!
//! `0` on success and valid input. `1` for a missing or unknown command,
//! a bad flag, a missing required option, failed validation, or any error.
//! Errors are printed as `Error: <message>` on the error stream.

use std::ffi::OsString;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};

use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand};

pub mod dump;
pub mod files;
pub mod validate;

use dump::{run_dump, DumpArgs};
use validate::{run_validate, ValidateArgs};

/// Validates YAML or JSON parameters against parameter definitions.
#[derive(Parser, Debug)]
#[command(name = "tyaml", version, about, disable_help_subcommand = true)]
pub struct Cli {
    /// Print a trace of every parameter and echo the input data.
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// The `tyaml` subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a parameter file against a parameter definition.
    Validate(ValidateArgs),

    /// Decode a document and write it in canonical form.
    Dump(DumpArgs),

    /// Print help for the tool or for a command.
    Help(HelpArgs),

    #[command(external_subcommand)]
    Unknown(Vec<OsString>),
}

/// Arguments for the `help` subcommand.
#[derive(Args, Debug)]
pub struct HelpArgs {
    /// Command to describe.
    pub name: Option<String>,
}

/// Parse `args` (program name first), run the selected command, and
/// return the process exit code. Program output goes to `out`; errors and
/// usage problems go to `err`.
pub fn run<I, T>(args: I, out: &mut dyn Write, err: &mut dyn Write) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    let _ = write!(out, "{e}");
                    0
                }
                _ => {
                    let _ = write!(err, "{e}");
                    1
                }
            };
        }
    };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| dispatch(&cli, &mut *out, &mut *err)));
    match outcome {
        Ok(Ok(code)) => code,
        Ok(Err(e)) => {
            tracing::debug!(error = %format!("{e:#}"), "command failed");
            let _ = writeln!(err, "Error: {e:#}");
            1
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "command panicked".to_string());
            tracing::error!(%message, "command panicked");
            let _ = writeln!(err, "Error: {message}");
            1
        }
    }
}

fn dispatch(cli: &Cli, out: &mut dyn Write, err: &mut dyn Write) -> anyhow::Result<u8> {
    match &cli.command {
        None => {
            writeln!(err, "missing required command")?;
            Ok(1)
        }
        Some(Commands::Validate(args)) => run_validate(args, cli.verbose, out, err),
        Some(Commands::Dump(args)) => run_dump(args, out, err),
        Some(Commands::Help(args)) => run_help(args, out, err),
        Some(Commands::Unknown(words)) => {
            let name = words
                .first()
                .map(|w| w.to_string_lossy().into_owned())
                .unwrap_or_default();
            writeln!(err, "unknown command: {name}")?;
            Ok(1)
        }
    }
}

fn run_help(args: &HelpArgs, out: &mut dyn Write, err: &mut dyn Write) -> anyhow::Result<u8> {
    let mut command = Cli::command();
    command.build();
    let help = match &args.name {
        None => command.render_help(),
        Some(name) => match command.find_subcommand_mut(name) {
            Some(sub) => sub.render_help(),
            None => {
                writeln!(err, "unknown command: {name}")?;
                return Ok(1);
            }
        },
    };
    write!(out, "{help}")?;
    Ok(0)
}
