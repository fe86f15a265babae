//! # Dump Subcommand
//!
//! Decodes a document and writes it back in canonical form, either as
//! block-style YAML (tags preserved) or as pretty-printed JSON.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use crate::files;

/// Output format for `dump`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Canonical block-style YAML.
    #[default]
    Yaml,
    /// Pretty-printed JSON. Binary becomes base64, timestamps RFC 3339.
    Json,
}

/// Arguments for the `dump` subcommand.
#[derive(Args, Debug)]
pub struct DumpArgs {
    /// YAML or JSON document to decode.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Yaml)]
    pub format: Format,
}

/// Run `dump`. Returns the exit code.
pub fn run_dump(args: &DumpArgs, out: &mut dyn Write, err: &mut dyn Write) -> Result<u8> {
    let Some(input) = &args.input else {
        writeln!(err, "missing required option: -input")?;
        return Ok(1);
    };
    let value = files::decode_file(input)
        .with_context(|| format!("failed to decode {}", input.display()))?;
    let text = match args.format {
        Format::Yaml => {
            let registry = tyaml_schema::registry();
            tyaml_core::Encoder::new(&registry).encode(&value)?
        }
        Format::Json => {
            let mut text = serde_json::to_string_pretty(&value)?;
            text.push('\n');
            text
        }
    };
    out.write_all(text.as_bytes())?;
    tracing::info!(input = %input.display(), format = ?args.format, "dumped document");
    Ok(0)
}
