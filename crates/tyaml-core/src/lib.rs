//! # tyaml-core: Tagged YAML Codec
//!
//! Converts between a dynamic value model and YAML documents, keeping a
//! fixed set of tagged extension kinds intact across a round trip.
//!
//! ## Layers
//!
//! 1. **Reader / Writer** (`reader`, `writer`): YAML text to and from an
//!    index-based [`NodeTree`]. The node tree is purely syntactic: it keeps
//!    tags, anchors and scalar styles, and knows nothing about values.
//!
//! 2. **Tag Registry** (`tag`): tag identifiers mapped to decode and
//!    encode functions for scalars. The built-in handlers cover the core
//!    schema plus `!!binary`, `!!timestamp` and the type descriptor tag
//!    `!puppet.com,2019:dgo/type`. Unknown tags fall through to plain
//!    scalar inference.
//!
//! 3. **Decoder** (`decode`): node tree to [`Value`], with per-call cycle
//!    detection on aliases.
//!
//! 4. **Encoder** (`encode`, `host`): [`Value`] or any host type
//!    implementing [`Encode`] to a node tree, then text. Host hooks run
//!    behind a fault boundary that turns errors and panics into
//!    [`Error::Encode`].
//!
//! ## Usage
//!
//! ```
//! let value = tyaml_core::decode(b"b: !!binary AQQD\n").unwrap();
//! assert_eq!(value.get("b"), Some(&tyaml_core::Value::Binary(vec![1, 4, 3])));
//! assert_eq!(tyaml_core::encode(&value).unwrap(), "b: !!binary AQQD\n");
//! ```
//!
//! ## Crate Policy
//!
//! - No `unsafe` code.
//! - No `.unwrap()` outside tests.
//! - Trees are owned by the call that builds them; the only shared state is
//!   the immutable default registry.

#![deny(missing_docs)]

pub mod decode;
mod dispatch;
pub mod encode;
pub mod error;
pub mod host;
pub mod node;
pub mod options;
pub mod reader;
pub mod resolve;
pub mod tag;
pub mod temporal;
pub mod value;
pub mod writer;

// Re-export primary types for ergonomic imports.
pub use decode::Decoder;
pub use encode::Encoder;
pub use error::{Error, MarshalError, ParseError, Result};
pub use host::{Encode, Field, FieldEnumerable, Marshaled, Marshaler};
pub use node::{Mark, Node, NodeId, NodeKind, NodeTree, Style};
pub use options::{DecodeOptions, DuplicateKeyPolicy, EncodeOptions};
pub use tag::{default_registry, TagHandler, TagRegistry, TypeParser, TYPE_TAG};
pub use value::{Mapping, TypeDescriptor, TypeHandle, Value, ValueKind};

/// Decode the first document of `text` with the default registry.
///
/// Type descriptor scalars need a registry with a [`TypeParser`]; use a
/// [`Decoder`] for those.
pub fn decode(text: &[u8]) -> Result<Value> {
    Decoder::new(default_registry()).decode(text)
}

/// Encode `subject` as a block-style document with the default registry.
pub fn encode<T: Encode + ?Sized>(subject: &T) -> Result<String> {
    Encoder::new(default_registry()).encode(&subject)
}
