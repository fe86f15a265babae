//! # Tag Registry
//!
//! Maps tag identifiers to a decode function (scalar text to [`Value`]) and
//! an encode function ([`Value`] to scalar text). The registry drives both
//! directions of the codec:
//!
//! - **Decode:** a scalar whose tag is registered is handed to that tag's
//!   decode function. An absent or unrecognized tag falls through to plain
//!   scalar inference (for plain scalars) or a string (for quoted and block
//!   scalars).
//! - **Encode:** binary, timestamp and type values are rendered with the
//!   encode function of the handler registered for their [`ValueKind`].
//!
//! ## Type Descriptors
//!
//! The codec does not know any type system. Decoding a
//! `!puppet.com,2019:dgo/type` scalar requires a [`TypeParser`] attached
//! with [`TagRegistry::with_type_parser`]; without one the scalar is a
//! decode error.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use base64::engine::general_purpose::STANDARD;
use base64::{DecodeError, Engine as _};

use crate::error::{Error, Result};
use crate::node::Style;
use crate::resolve;
use crate::temporal::{format_timestamp, parse_timestamp};
use crate::value::{TypeDescriptor, Value, ValueKind};

/// Tag of core-schema strings.
pub const STR_TAG: &str = "!!str";
/// Tag of core-schema integers.
pub const INT_TAG: &str = "!!int";
/// Tag of core-schema floats.
pub const FLOAT_TAG: &str = "!!float";
/// Tag of core-schema booleans.
pub const BOOL_TAG: &str = "!!bool";
/// Tag of core-schema nulls.
pub const NULL_TAG: &str = "!!null";
/// Tag of base64-encoded binary data.
pub const BINARY_TAG: &str = "!!binary";
/// Tag of timestamps.
pub const TIMESTAMP_TAG: &str = "!!timestamp";
/// Tag of type descriptors.
pub const TYPE_TAG: &str = "!puppet.com,2019:dgo/type";

const CORE_TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// Parses the canonical string form of a type into a [`TypeDescriptor`].
pub trait TypeParser: Send + Sync {
    /// Parse `text` as a type.
    fn parse_type(&self, text: &str) -> Result<TypeDescriptor>;
}

/// Decode function: scalar text to value.
pub type DecodeFn = fn(&str, &TagRegistry) -> Result<Value>;

/// Encode function: value to scalar text. Returns `None` when the value is
/// not of the handler's kind.
pub type EncodeFn = fn(&Value) -> Option<String>;

/// Decode and encode behavior for one tag.
#[derive(Clone)]
pub struct TagHandler {
    /// Short-form tag, e.g. `!!binary`.
    pub tag: String,
    /// Kind of value this tag produces.
    pub kind: ValueKind,
    /// Scalar text to value.
    pub decode: DecodeFn,
    /// Value to scalar text. Only handlers with an encode function are used
    /// when encoding values of their kind.
    pub encode: Option<EncodeFn>,
}

impl fmt::Debug for TagHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagHandler")
            .field("tag", &self.tag)
            .field("kind", &self.kind)
            .field("encodes", &self.encode.is_some())
            .finish()
    }
}

/// Registry of tag handlers.
#[derive(Clone, Default)]
pub struct TagRegistry {
    handlers: Vec<TagHandler>,
    by_tag: HashMap<String, usize>,
    by_kind: HashMap<ValueKind, usize>,
    type_parser: Option<Arc<dyn TypeParser>>,
}

impl fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagRegistry")
            .field("handlers", &self.handlers)
            .field("type_parser", &self.type_parser.is_some())
            .finish()
    }
}

impl TagRegistry {
    /// A registry with no handlers. Every scalar is resolved implicitly.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in handlers: core scalars, binary, timestamp and type.
    pub fn core() -> Self {
        let mut registry = Self::empty();
        registry.register(TagHandler {
            tag: STR_TAG.into(),
            kind: ValueKind::String,
            decode: decode_str,
            encode: None,
        });
        registry.register(TagHandler {
            tag: INT_TAG.into(),
            kind: ValueKind::Int,
            decode: decode_int,
            encode: None,
        });
        registry.register(TagHandler {
            tag: FLOAT_TAG.into(),
            kind: ValueKind::Float,
            decode: decode_float,
            encode: None,
        });
        registry.register(TagHandler {
            tag: BOOL_TAG.into(),
            kind: ValueKind::Bool,
            decode: decode_bool,
            encode: None,
        });
        registry.register(TagHandler {
            tag: NULL_TAG.into(),
            kind: ValueKind::Null,
            decode: decode_null,
            encode: None,
        });
        registry.register(TagHandler {
            tag: BINARY_TAG.into(),
            kind: ValueKind::Binary,
            decode: decode_binary,
            encode: Some(encode_binary),
        });
        registry.register(TagHandler {
            tag: TIMESTAMP_TAG.into(),
            kind: ValueKind::Timestamp,
            decode: decode_timestamp,
            encode: Some(encode_timestamp),
        });
        registry.register(TagHandler {
            tag: TYPE_TAG.into(),
            kind: ValueKind::Type,
            decode: decode_type,
            encode: Some(encode_type),
        });
        registry
    }

    /// Attach the parser used for type descriptor scalars.
    pub fn with_type_parser(mut self, parser: impl TypeParser + 'static) -> Self {
        self.type_parser = Some(Arc::new(parser));
        self
    }

    /// Register a handler. A later registration for the same tag replaces
    /// the earlier one.
    pub fn register(&mut self, handler: TagHandler) {
        let tag = handler.tag.clone();
        let kind = handler.kind;
        let encodes = handler.encode.is_some();
        let index = match self.by_tag.get(&tag) {
            Some(&index) => {
                self.handlers[index] = handler;
                index
            }
            None => {
                self.handlers.push(handler);
                self.handlers.len() - 1
            }
        };
        self.by_tag.insert(tag, index);
        if encodes {
            self.by_kind.insert(kind, index);
        }
    }

    /// Find the handler for a tag, in short (`!!binary`) or long
    /// (`tag:yaml.org,2002:binary`) form.
    pub fn lookup(&self, tag: &str) -> Option<&TagHandler> {
        let index = match tag.strip_prefix(CORE_TAG_PREFIX) {
            Some(name) => self.by_tag.get(&format!("!!{name}")),
            None => self.by_tag.get(tag),
        };
        index.map(|&i| &self.handlers[i])
    }

    /// Find the handler that encodes values of `kind`.
    pub fn encoder_for(&self, kind: ValueKind) -> Option<&TagHandler> {
        self.by_kind.get(&kind).map(|&i| &self.handlers[i])
    }

    /// The attached type parser, if any.
    pub fn type_parser(&self) -> Option<&dyn TypeParser> {
        self.type_parser.as_deref()
    }

    /// Decode a scalar from its tag, text and style.
    pub fn decode_scalar(&self, tag: Option<&str>, text: &str, style: Style) -> Result<Value> {
        if let Some(tag) = tag {
            if let Some(handler) = self.lookup(tag) {
                return (handler.decode)(text, self);
            }
            if tag == "!" {
                return Ok(Value::String(text.to_string()));
            }
        }
        if style.is_plain() {
            Ok(resolve::resolve_plain(text))
        } else {
            Ok(Value::String(text.to_string()))
        }
    }
}

/// The shared core registry, created on first use.
///
/// It has no type parser; type descriptor scalars decode through a registry
/// built with [`TagRegistry::with_type_parser`].
pub fn default_registry() -> &'static TagRegistry {
    static REGISTRY: OnceLock<TagRegistry> = OnceLock::new();
    REGISTRY.get_or_init(TagRegistry::core)
}

// ---------------------------------------------------------------------------
// Built-in handlers
// ---------------------------------------------------------------------------

fn cannot_decode(tag: &str, text: &str) -> Error {
    Error::Decode(format!("cannot decode {tag} `{text}`"))
}

fn decode_str(text: &str, _: &TagRegistry) -> Result<Value> {
    Ok(Value::String(text.to_string()))
}

fn decode_int(text: &str, _: &TagRegistry) -> Result<Value> {
    resolve::parse_int(text.trim())
        .map(Value::Int)
        .ok_or_else(|| cannot_decode(INT_TAG, text))
}

fn decode_float(text: &str, _: &TagRegistry) -> Result<Value> {
    let text_trimmed = text.trim();
    resolve::parse_float(text_trimmed)
        .or_else(|| resolve::parse_int(text_trimmed).map(|i| i as f64))
        .map(Value::Float)
        .ok_or_else(|| cannot_decode(FLOAT_TAG, text))
}

fn decode_bool(text: &str, _: &TagRegistry) -> Result<Value> {
    resolve::parse_bool(text.trim())
        .map(Value::Bool)
        .ok_or_else(|| cannot_decode(BOOL_TAG, text))
}

fn decode_null(text: &str, _: &TagRegistry) -> Result<Value> {
    if resolve::is_null(text.trim()) {
        Ok(Value::Null)
    } else {
        Err(cannot_decode(NULL_TAG, text))
    }
}

fn decode_binary(text: &str, _: &TagRegistry) -> Result<Value> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(compact.as_bytes()).map(Value::Binary).map_err(|err| {
        let offset = match err {
            DecodeError::InvalidByte(offset, _) | DecodeError::InvalidLastSymbol(offset, _) => offset,
            _ => compact.len(),
        };
        Error::Decode(format!("illegal base64 data at input byte {offset}"))
    })
}

fn encode_binary(value: &Value) -> Option<String> {
    match value {
        Value::Binary(bytes) => Some(STANDARD.encode(bytes)),
        _ => None,
    }
}

fn decode_timestamp(text: &str, _: &TagRegistry) -> Result<Value> {
    parse_timestamp(text)
        .map(Value::Timestamp)
        .ok_or_else(|| cannot_decode(TIMESTAMP_TAG, text))
}

fn encode_timestamp(value: &Value) -> Option<String> {
    match value {
        Value::Timestamp(ts) => Some(format_timestamp(ts)),
        _ => None,
    }
}

fn decode_type(text: &str, registry: &TagRegistry) -> Result<Value> {
    let parser = registry
        .type_parser()
        .ok_or_else(|| Error::Decode(format!("no type parser registered for {TYPE_TAG}")))?;
    parser
        .parse_type(text.trim())
        .map(Value::Type)
        .map_err(|err| Error::Decode(err.to_string()))
}

fn encode_type(value: &Value) -> Option<String> {
    match value {
        Value::Type(t) => Some(t.canonical()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::TypeHandle;
    use std::any::Any;

    #[derive(Debug)]
    struct Word(String);

    impl fmt::Display for Word {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl TypeHandle for Word {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct WordParser;

    impl TypeParser for WordParser {
        fn parse_type(&self, text: &str) -> Result<TypeDescriptor> {
            if text.chars().all(|c| c.is_ascii_alphabetic()) {
                Ok(TypeDescriptor::new(Word(text.to_string())))
            } else {
                Err(Error::Decode(format!("not a word: {text}")))
            }
        }
    }

    #[test]
    fn test_binary_decode() {
        let v = default_registry()
            .decode_scalar(Some(BINARY_TAG), "AQQD", Style::Plain)
            .unwrap();
        assert_eq!(v, Value::Binary(vec![1, 4, 3]));
    }

    #[test]
    fn test_binary_decode_ignores_whitespace() {
        let v = default_registry()
            .decode_scalar(Some(BINARY_TAG), "AQ\n  QD\n", Style::Literal)
            .unwrap();
        assert_eq!(v, Value::Binary(vec![1, 4, 3]));
    }

    #[test]
    fn test_binary_decode_reports_offset() {
        let err = default_registry()
            .decode_scalar(Some(BINARY_TAG), "AQQ~", Style::Plain)
            .unwrap_err();
        assert_eq!(err, Error::Decode("illegal base64 data at input byte 3".into()));
    }

    #[test]
    fn test_long_form_tag_lookup() {
        let handler = default_registry().lookup("tag:yaml.org,2002:binary").unwrap();
        assert_eq!(handler.tag, BINARY_TAG);
    }

    #[test]
    fn test_core_tags_force_resolution() {
        let reg = default_registry();
        assert_eq!(reg.decode_scalar(Some(STR_TAG), "23", Style::Plain).unwrap(), Value::from("23"));
        assert_eq!(reg.decode_scalar(Some(INT_TAG), "23", Style::DoubleQuoted).unwrap(), Value::Int(23));
        assert_eq!(reg.decode_scalar(Some(FLOAT_TAG), "23", Style::Plain).unwrap(), Value::Float(23.0));
        assert_eq!(reg.decode_scalar(Some(BOOL_TAG), "True", Style::Plain).unwrap(), Value::Bool(true));
        assert_eq!(reg.decode_scalar(Some(NULL_TAG), "~", Style::Plain).unwrap(), Value::Null);
        let err = reg.decode_scalar(Some(INT_TAG), "x", Style::Plain).unwrap_err();
        assert_eq!(err.to_string(), "cannot decode !!int `x`");
    }

    #[test]
    fn test_unknown_tag_falls_through() {
        let reg = default_registry();
        assert_eq!(reg.decode_scalar(Some("!thing"), "a", Style::Plain).unwrap(), Value::from("a"));
        assert_eq!(reg.decode_scalar(Some("!thing"), "12", Style::Plain).unwrap(), Value::Int(12));
        assert_eq!(reg.decode_scalar(Some("!"), "12", Style::Plain).unwrap(), Value::from("12"));
        assert_eq!(reg.decode_scalar(None, "12", Style::SingleQuoted).unwrap(), Value::from("12"));
    }

    #[test]
    fn test_timestamp_decode_and_failure() {
        let reg = default_registry();
        let v = reg
            .decode_scalar(Some(TIMESTAMP_TAG), "2019-10-06T07:15:00-07:00", Style::Plain)
            .unwrap();
        assert!(matches!(v, Value::Timestamp(_)));
        let err = reg
            .decode_scalar(Some(TIMESTAMP_TAG), "2019-13-06T07:15:00-07:00", Style::Plain)
            .unwrap_err();
        assert!(err.to_string().contains("cannot decode"));
    }

    #[test]
    fn test_type_without_parser_fails() {
        let err = default_registry()
            .decode_scalar(Some(TYPE_TAG), "int", Style::Plain)
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_type_with_parser() {
        let reg = TagRegistry::core().with_type_parser(WordParser);
        let v = reg.decode_scalar(Some(TYPE_TAG), "string", Style::Plain).unwrap();
        match &v {
            Value::Type(t) => assert_eq!(t.canonical(), "string"),
            other => panic!("unexpected {other:?}"),
        }
        let text = (reg.encoder_for(ValueKind::Type).unwrap().encode.unwrap())(&v);
        assert_eq!(text.as_deref(), Some("string"));
        let err = reg.decode_scalar(Some(TYPE_TAG), "1..", Style::Plain).unwrap_err();
        assert_eq!(err.to_string(), "not a word: 1..");
    }

    #[test]
    fn test_register_replaces() {
        fn shout(text: &str, _: &TagRegistry) -> Result<Value> {
            Ok(Value::String(text.to_uppercase()))
        }
        let mut reg = TagRegistry::core();
        reg.register(TagHandler {
            tag: STR_TAG.into(),
            kind: ValueKind::String,
            decode: shout,
            encode: None,
        });
        assert_eq!(reg.decode_scalar(Some(STR_TAG), "a", Style::Plain).unwrap(), Value::from("A"));
    }

    #[test]
    fn test_encoders_by_kind() {
        let reg = default_registry();
        assert_eq!(reg.encoder_for(ValueKind::Binary).unwrap().tag, BINARY_TAG);
        assert_eq!(reg.encoder_for(ValueKind::Timestamp).unwrap().tag, TIMESTAMP_TAG);
        assert!(reg.encoder_for(ValueKind::String).is_none());
    }
}
