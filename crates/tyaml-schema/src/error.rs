//! Error types for parameter descriptors.

use thiserror::Error;

/// Failure to build a type from syntax or from a parameter definition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The type syntax is malformed.
    #[error("{message}")]
    Syntax {
        /// What went wrong.
        message: String,
        /// Character offset into the source text.
        offset: usize,
    },

    /// A parameter definition cannot be turned into a struct entry.
    #[error("{0}")]
    Definition(String),
}

impl SchemaError {
    pub(crate) fn syntax(message: impl Into<String>, offset: usize) -> Self {
        Self::Syntax {
            message: message.into(),
            offset,
        }
    }
}

impl From<SchemaError> for tyaml_core::Error {
    fn from(err: SchemaError) -> Self {
        tyaml_core::Error::Decode(err.to_string())
    }
}
