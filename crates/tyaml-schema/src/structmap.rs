//! # Struct Maps
//!
//! A [`StructMap`] describes a parameter map: the known keys, the type each
//! key's value must have, and which keys are required. It is built either
//! from type syntax (`{host: string[1], port?: 1..999}`) or from a decoded
//! parameter definition document:
//!
//! ```yaml
//! host:
//!   type: string[1]
//!   name: sample/service_host
//!   required: true
//! port: 1..999
//! ```
//!
//! An entry is a type string, a type descriptor, or a mapping with a `type`
//! and an optional `required` flag (default `false`). Any other keys of the
//! mapping are kept as annotations.
//!
//! ## Validation
//!
//! [`StructMap::validate`] returns one message per problem, in entry order
//! followed by unknown keys in input order. [`StructMap::validate_verbose`]
//! writes a trace with a line per key and reports overall success.

use std::fmt;

use tyaml_core::{Mapping, Value};

use crate::error::SchemaError;
use crate::syntax;
use crate::types::Type;

/// One key of a [`StructMap`].
#[derive(Debug, Clone, PartialEq)]
pub struct StructEntry {
    /// The parameter name.
    pub key: String,
    /// Type of the parameter value.
    pub ty: Type,
    /// Whether the parameter must be present.
    pub required: bool,
    /// Extra definition keys such as `name`.
    pub annotations: Mapping,
}

impl StructEntry {
    /// An entry without annotations.
    pub fn new(key: impl Into<String>, ty: Type, required: bool) -> Self {
        Self {
            key: key.into(),
            ty,
            required,
            annotations: Mapping::new(),
        }
    }
}

/// A mapping type with named entries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructMap {
    entries: Vec<StructEntry>,
    additional: bool,
}

impl StructMap {
    /// A struct map with the given entries. When `additional` is set, keys
    /// without an entry are accepted.
    pub fn new(entries: Vec<StructEntry>, additional: bool) -> Self {
        Self { entries, additional }
    }

    /// Build a struct map from a parameter definition mapping.
    pub fn from_mapping(definition: &Mapping) -> Result<Self, SchemaError> {
        let mut entries = Vec::with_capacity(definition.len());
        for (key, spec) in definition.iter() {
            let Some(key) = key.as_str() else {
                return Err(SchemaError::Definition(format!(
                    "parameter name must be a string, got {key}"
                )));
            };
            entries.push(entry_from_definition(key, spec)?);
        }
        tracing::debug!(entries = entries.len(), "built struct map from definition");
        Ok(Self::new(entries, false))
    }

    /// The entries, in definition order.
    pub fn entries(&self) -> &[StructEntry] {
        &self.entries
    }

    /// The entry for `key`.
    pub fn get(&self, key: &str) -> Option<&StructEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Whether keys without an entry are accepted.
    pub fn allows_additional(&self) -> bool {
        self.additional
    }

    /// Whether `value` is a mapping that satisfies every entry.
    pub fn is_instance(&self, value: &Value) -> bool {
        value.as_mapping().is_some() && self.validate(value).is_empty()
    }

    /// Check `value` and return a message per failure. An empty result
    /// means the value is valid.
    pub fn validate(&self, value: &Value) -> Vec<String> {
        let Some(input) = value.as_mapping() else {
            return vec![format!("expected a map, got {value}")];
        };
        let mut errors = Vec::new();
        for entry in &self.entries {
            match input.get_str(&entry.key) {
                None if entry.required => {
                    errors.push(format!("missing required parameter '{}'", entry.key));
                }
                Some(v) if !entry.ty.is_instance(v) => errors.push(format!(
                    "parameter '{}' is not an instance of type {}",
                    entry.key, entry.ty
                )),
                _ => {}
            }
        }
        for key in self.unknown_keys(input) {
            errors.push(format!("unknown parameter '{key}'"));
        }
        errors
    }

    /// Check `value`, writing a trace of every key to `out`. Returns `true`
    /// when the value is valid.
    pub fn validate_verbose(&self, value: &Value, out: &mut String) -> bool {
        let Some(input) = value.as_mapping() else {
            out.push_str(&format!("expected a map, got {value}\n"));
            return false;
        };
        let mut ok = true;
        for entry in &self.entries {
            out.push_str(&format!("Validating '{}' against definition {}\n", entry.key, entry.ty));
            match input.get_str(&entry.key) {
                None if entry.required => {
                    ok = false;
                    failed(out, &entry.key, "required key not found in input");
                }
                Some(v) if !entry.ty.is_instance(v) => {
                    ok = false;
                    failed(
                        out,
                        &entry.key,
                        &format!("expected a value of type {}, got {v}", entry.ty),
                    );
                }
                _ => {
                    out.push_str(&format!("  '{}' OK!\n", entry.key));
                }
            }
        }
        for key in self.unknown_keys(input) {
            ok = false;
            out.push_str(&format!("Validating '{key}'\n"));
            failed(out, &key, "key is not found in definition");
        }
        ok
    }

    fn unknown_keys(&self, input: &Mapping) -> Vec<String> {
        if self.additional {
            return Vec::new();
        }
        input
            .keys()
            .filter(|k| k.as_str().map_or(true, |k| self.get(k).is_none()))
            .map(|k| match k.as_str() {
                Some(s) => s.to_string(),
                None => k.to_string(),
            })
            .collect()
    }
}

fn failed(out: &mut String, key: &str, reason: &str) {
    out.push_str(&format!("  '{key}' FAILED!\n"));
    out.push_str(&format!("  Reason: {reason}\n"));
}

fn entry_from_definition(key: &str, spec: &Value) -> Result<StructEntry, SchemaError> {
    match spec {
        Value::Mapping(definition) => {
            let mut entry = StructEntry::new(key, Type::Any, false);
            let mut has_type = false;
            for (name, value) in definition.iter() {
                match name.as_str() {
                    Some("type") => {
                        entry.ty = type_of(key, value)?;
                        has_type = true;
                    }
                    Some("required") => {
                        entry.required = value.as_bool().ok_or_else(|| {
                            SchemaError::Definition(format!(
                                "parameter '{key}': required must be a boolean, got {value}"
                            ))
                        })?;
                    }
                    _ => {
                        entry.annotations.insert(name.clone(), value.clone());
                    }
                }
            }
            if !has_type {
                return Err(SchemaError::Definition(format!(
                    "parameter '{key}' has no type"
                )));
            }
            Ok(entry)
        }
        other => Ok(StructEntry::new(key, type_of(key, other)?, false)),
    }
}

fn type_of(key: &str, value: &Value) -> Result<Type, SchemaError> {
    match value {
        Value::String(text) => syntax::parse(text),
        Value::Type(descriptor) => descriptor
            .downcast_ref::<Type>()
            .cloned()
            .ok_or_else(|| {
                SchemaError::Definition(format!(
                    "parameter '{key}': type {descriptor} is not a parameter type"
                ))
            }),
        other => Err(SchemaError::Definition(format!(
            "parameter '{key}': expected a type, got {other}"
        ))),
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl fmt::Display for StructMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if is_identifier(&entry.key) {
                f.write_str(&entry.key)?;
            } else {
                crate::types::write_exact(f, &Value::from(entry.key.as_str()))?;
            }
            if !entry.required {
                f.write_str("?")?;
            }
            write!(f, ": {}", entry.ty)?;
        }
        if self.additional {
            if !self.entries.is_empty() {
                f.write_str(", ")?;
            }
            f.write_str("...")?;
        }
        f.write_str("}")
    }
}
