//! # Validate Subcommand
//!
//! Validates a parameter file against a parameter definition.
//!
//! The parameter file (`--input`) must be `.yaml` or `.json` and contain a
//! mapping. The definition (`--spec`) is either a `.yaml`/`.json` mapping
//! from parameter name to definition, or a `.tdl` file holding a struct type
//! in type syntax such as `{host: string[1], port?: 1..999}`.
//!
//! Exit code 0 when the parameters are valid, 1 otherwise. Brief mode
//! prints one line per failure; `--verbose` prints a trace of every key.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use tyaml_core::{Mapping, Value};
use tyaml_schema::{StructMap, Type};

use crate::files;

/// Arguments for the `validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// YAML or JSON file containing the parameters to validate.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// YAML, JSON, or .tdl file with the parameter definitions.
    #[arg(long)]
    pub spec: Option<PathBuf>,
}

/// Run `validate`. Returns the exit code.
pub fn run_validate(
    args: &ValidateArgs,
    verbose: bool,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<u8> {
    let Some(input) = &args.input else {
        writeln!(err, "missing required option: -input")?;
        return Ok(1);
    };
    let Some(spec) = &args.spec else {
        writeln!(err, "missing required option: -spec")?;
        return Ok(1);
    };

    let params = load_parameters(input, verbose, out)?;
    let definition = load_struct_type(spec)?;
    let value = Value::Mapping(params);

    let valid = if verbose {
        let mut trace = String::new();
        let valid = definition.validate_verbose(&value, &mut trace);
        out.write_all(trace.as_bytes())?;
        valid
    } else {
        let errors = definition.validate(&value);
        for message in &errors {
            writeln!(out, "{message}")?;
        }
        errors.is_empty()
    };

    tracing::info!(
        input = %input.display(),
        spec = %spec.display(),
        valid,
        "validated parameters"
    );
    Ok(if valid { 0 } else { 1 })
}

/// Load the parameter mapping from a `.yaml` or `.json` file. In verbose
/// mode the decoded data is echoed to `out`.
pub fn load_parameters(path: &Path, verbose: bool, out: &mut dyn Write) -> Result<Mapping> {
    if !matches!(files::extension(path), Some("yaml" | "json")) {
        bail!(
            "invalid file name '{}', expected file name to end with .yaml or .json",
            path.display()
        );
    }
    let value = files::decode_file(path)?;
    let Value::Mapping(params) = value else {
        bail!("expecting data to be a map");
    };
    if verbose {
        let registry = tyaml_schema::registry();
        let text = tyaml_core::Encoder::new(&registry)
            .encode(&params)
            .context("failed to render input data")?;
        writeln!(out, "Got input yaml with:")?;
        for line in text.lines() {
            writeln!(out, "  {line}")?;
        }
    }
    Ok(params)
}

/// Load a struct type from a `.yaml`, `.json`, or `.tdl` file.
pub fn load_struct_type(path: &Path) -> Result<StructMap> {
    match files::extension(path) {
        Some("yaml" | "json") => {
            let Value::Mapping(definition) = files::decode_file(path)? else {
                bail!("expecting data to be a map");
            };
            Ok(StructMap::from_mapping(&definition)?)
        }
        Some("tdl") => {
            let data = files::read_file(path)?;
            let text = String::from_utf8(data)
                .with_context(|| format!("file '{}' is not valid UTF-8", path.display()))?;
            match tyaml_schema::parse(&text)? {
                Type::Struct(definition) => Ok(definition),
                _ => bail!("file '{}' does not contain a struct definition", path.display()),
            }
        }
        _ => bail!(
            "invalid file name '{}', expected file name to end with .yaml, .json, or .tdl",
            path.display()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn load_parameters_rejects_other_extensions() {
        let err = load_parameters(Path::new("service.pson"), false, &mut Vec::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid file name 'service.pson', expected file name to end with .yaml or .json"
        );
    }

    #[test]
    fn load_parameters_echoes_in_verbose_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_file(&dir, "p.yaml", "host: example.com\nport: 22\n");
        let mut out = Vec::new();
        let params = load_parameters(&path, true, &mut out).unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Got input yaml with:\n  host: example.com\n  port: 22\n"
        );
    }

    #[test]
    fn load_parameters_requires_a_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_file(&dir, "p.json", "[1, 2]");
        let err = load_parameters(&path, false, &mut Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "expecting data to be a map");
    }

    #[test]
    fn load_struct_type_from_tdl() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_file(&dir, "s.tdl", "{host: string[1], port?: 1..999}\n");
        let st = load_struct_type(&path).unwrap();
        assert_eq!(st.to_string(), "{host: string[1], port?: 1..999}");

        let path = temp_file(&dir, "t.tdl", "[]string");
        let err = load_struct_type(&path).unwrap_err();
        assert!(err.to_string().ends_with("does not contain a struct definition"));
    }

    #[test]
    fn load_struct_type_rejects_other_extensions() {
        let err = load_struct_type(Path::new("servicespec.go")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid file name 'servicespec.go', expected file name to end with .yaml, .json, or .tdl"
        );
    }
}
