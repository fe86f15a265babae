//! # tyaml CLI entry point
//!
//! Sets up logging and hands the arguments to [`tyaml_cli::run`].

use std::ffi::OsString;
use std::io;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args: Vec<OsString> = std::env::args_os().collect();
    let verbose = args.iter().skip(1).any(|a| a == "--verbose");

    // RUST_LOG wins over the flag.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "info" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let stdout = io::stdout();
    let stderr = io::stderr();
    let code = tyaml_cli::run(args, &mut stdout.lock(), &mut stderr.lock());
    ExitCode::from(code)
}
