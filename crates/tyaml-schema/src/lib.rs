//! # tyaml-schema: Parameter Descriptors
//!
//! A deliberately narrow type language for describing parameter maps, and
//! the two operations the command line needs from it:
//!
//! - **Struct type from a mapping** ([`StructMap::from_mapping`]): a decoded
//!   parameter definition document becomes a [`StructMap`].
//! - **Validation** ([`StructMap::validate`], [`StructMap::validate_verbose`]):
//!   a decoded parameter map is checked against it.
//!
//! Types also have a textual syntax ([`parse`]). [`TypeSyntax`] plugs that
//! parser into a [`TagRegistry`] so `!puppet.com,2019:dgo/type` scalars
//! decode to [`Type`] handles:
//!
//! ```
//! let registry = tyaml_schema::registry();
//! let value = tyaml_core::Decoder::new(&registry)
//!     .decode(b"port: !puppet.com,2019:dgo/type 1..999\n")
//!     .unwrap();
//! let definition = value.as_mapping().unwrap();
//! let params = tyaml_schema::StructMap::from_mapping(definition).unwrap();
//! assert!(params.validate(&tyaml_core::decode(b"port: 22\n").unwrap()).is_empty());
//! ```
//!
//! ## Crate Policy
//!
//! - Depends only on `tyaml-core` internally; the codec never depends on
//!   this crate.
//! - Not a general type system: no named types, no subtyping.

#![deny(missing_docs)]

pub mod error;
pub mod structmap;
pub mod syntax;
pub mod types;

pub use error::SchemaError;
pub use structmap::{StructEntry, StructMap};
pub use syntax::{parse, TypeSyntax};
pub use types::Type;

use tyaml_core::TagRegistry;

/// The core tag registry with [`TypeSyntax`] attached.
pub fn registry() -> TagRegistry {
    TagRegistry::core().with_type_parser(TypeSyntax)
}
