//! # File Loading
//!
//! Whole-file reads shared by the subcommands. Read failures become
//! [`tyaml_core::Error::File`] so a missing file is reported as
//! `open <path>: no such file or directory`.

use std::path::Path;

use tyaml_core::{Decoder, Value};

/// Read the whole of `path`.
pub fn read_file(path: &Path) -> tyaml_core::Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| tyaml_core::Error::file(path.display().to_string(), &e))
}

/// Read `path` and decode it with the parameter-type registry, so that
/// `!puppet.com,2019:dgo/type` scalars become parameter types.
pub fn decode_file(path: &Path) -> anyhow::Result<Value> {
    let data = read_file(path)?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "read document");
    let registry = tyaml_schema::registry();
    let value = Decoder::new(&registry).decode(&data)?;
    Ok(value)
}

/// The extension of `path`, if it is valid UTF-8.
pub fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reports_not_found() {
        let err = read_file(Path::new("no/such/dir/server.yaml")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "open no/such/dir/server.yaml: no such file or directory"
        );
    }

    #[test]
    fn extension_of_paths() {
        assert_eq!(extension(Path::new("a/service.yaml")), Some("yaml"));
        assert_eq!(extension(Path::new("servicespec.tdl")), Some("tdl"));
        assert_eq!(extension(Path::new("Makefile")), None);
    }
}
