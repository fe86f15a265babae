//! # Encoder
//!
//! Converts a host value into document text in two steps: build a
//! [`NodeTree`], then serialize it with the block-style writer.
//!
//! ## Dispatch Order
//!
//! Each value being emitted is matched once, in this order:
//!
//! 1. [`Marshaler`](crate::Marshaler) hook, run through the fault boundary.
//!    The returned value is encoded in place of the host value; a returned
//!    node tree is grafted as-is.
//! 2. Node literal, grafted as-is.
//! 3. Built-in [`Value`]. Binary, timestamp and type values are rendered by
//!    the [`TagRegistry`] handler for their kind.
//! 4. Host sequence.
//! 5. Field-enumerable aggregate, emitted as a mapping in field order.
//! 6. Anything else is [`Error::UnsupportedType`].

use crate::dispatch;
use crate::error::{Error, Result};
use crate::host::{is_empty_value, Encode, Marshaled};
use crate::node::{Node, NodeId, NodeTree};
use crate::options::EncodeOptions;
use crate::resolve::format_float;
use crate::tag::TagRegistry;
use crate::value::Value;
use crate::writer;

/// Encodes host values with a given tag registry and options.
#[derive(Debug, Clone, Copy)]
pub struct Encoder<'r> {
    registry: &'r TagRegistry,
    options: EncodeOptions,
}

impl<'r> Encoder<'r> {
    /// An encoder with default options.
    pub fn new(registry: &'r TagRegistry) -> Self {
        Self {
            registry,
            options: EncodeOptions::default(),
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: EncodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Encode `subject` as a block-style document.
    pub fn encode(&self, subject: &dyn Encode) -> Result<String> {
        tracing::debug!(type_name = subject.type_name(), "encoding document");
        let tree = self.to_node_tree(subject)?;
        let text = writer::write(&tree, self.options.indent)?;
        tracing::debug!(bytes = text.len(), nodes = tree.len(), "encoded document");
        Ok(text)
    }

    /// Build the node tree for `subject` without serializing it.
    pub fn to_node_tree(&self, subject: &dyn Encode) -> Result<NodeTree> {
        let mut tree = NodeTree::new();
        let root = self.encode_into(subject, &mut tree, 0)?;
        tree.set_root(root);
        Ok(tree)
    }

    fn encode_into(&self, subject: &dyn Encode, tree: &mut NodeTree, depth: usize) -> Result<NodeId> {
        if depth > self.options.max_depth {
            return Err(Error::Encode(format!(
                "exceeded max depth of {}",
                self.options.max_depth
            )));
        }

        if let Some(hook) = subject.as_marshaler() {
            return match dispatch::invoke(hook, subject.type_name())? {
                Marshaled::Value(value) => self.encode_value(&value, tree, depth),
                Marshaled::Node(node) => Ok(graft(tree, &node)),
            };
        }
        if let Some(node) = subject.as_node() {
            return Ok(graft(tree, node));
        }
        if let Some(value) = subject.to_value() {
            return self.encode_value(&value, tree, depth);
        }
        if let Some(elements) = subject.elements() {
            let children = elements
                .into_iter()
                .map(|element| self.encode_into(element, tree, depth + 1))
                .collect::<Result<Vec<_>>>()?;
            return Ok(tree.push(Node::sequence(children)));
        }
        if let Some(aggregate) = subject.as_fields() {
            let mut pairs = Vec::new();
            for field in aggregate.fields() {
                if field.is_omit_empty() && is_empty_value(field.value()) {
                    continue;
                }
                let key = tree.push(string_node(field.name()));
                let value = self.encode_into(field.value(), tree, depth + 1)?;
                pairs.push((key, value));
            }
            return Ok(tree.push(Node::mapping(pairs)));
        }
        Err(Error::UnsupportedType(format!(
            "unable to marshal into value of type {}",
            subject.type_name()
        )))
    }

    fn encode_value(&self, value: &Value, tree: &mut NodeTree, depth: usize) -> Result<NodeId> {
        if depth > self.options.max_depth {
            return Err(Error::Encode(format!(
                "exceeded max depth of {}",
                self.options.max_depth
            )));
        }
        let node = match value {
            Value::Null => Node::scalar("null"),
            Value::Bool(b) => Node::scalar(b.to_string()),
            Value::Int(i) => Node::scalar(i.to_string()),
            Value::Float(f) => Node::scalar(format_float(*f)),
            Value::String(s) => string_node(s),
            Value::Binary(_) | Value::Timestamp(_) | Value::Type(_) => self.tagged(value)?,
            Value::Sequence(items) => {
                let children = items
                    .iter()
                    .map(|item| self.encode_value(item, tree, depth + 1))
                    .collect::<Result<Vec<_>>>()?;
                Node::sequence(children)
            }
            Value::Mapping(mapping) => {
                let mut pairs = Vec::with_capacity(mapping.len());
                for (k, v) in mapping.iter() {
                    let key = self.encode_value(k, tree, depth + 1)?;
                    let value = self.encode_value(v, tree, depth + 1)?;
                    pairs.push((key, value));
                }
                Node::mapping(pairs)
            }
        };
        Ok(tree.push(node))
    }

    fn tagged(&self, value: &Value) -> Result<Node> {
        let kind = value.kind();
        let handler = self.registry.encoder_for(kind);
        match handler.and_then(|h| h.encode.map(|encode| (h, encode))) {
            Some((handler, encode)) => match encode(value) {
                Some(text) => Ok(Node::scalar(text).with_tag(handler.tag.clone())),
                None => Err(Error::Encode(format!(
                    "tag {} cannot encode a {kind} value",
                    handler.tag
                ))),
            },
            None => Err(Error::UnsupportedType(format!(
                "unable to marshal into value of type {kind}"
            ))),
        }
    }
}

fn string_node(text: &str) -> Node {
    Node::scalar(text).with_style(writer::string_style(text))
}

fn graft(tree: &mut NodeTree, other: &NodeTree) -> NodeId {
    match tree.graft(other) {
        Some(root) => root,
        None => tree.push(Node::scalar("null")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MarshalError;
    use crate::host::{Field, FieldEnumerable, Marshaler};
    use crate::tag::default_registry;
    use crate::value::Mapping;

    fn encode(subject: &dyn Encode) -> Result<String> {
        Encoder::new(default_registry()).encode(subject)
    }

    #[test]
    fn test_nested_mapping_layout() {
        let mut m = Mapping::new();
        m.insert("a", 1i64);
        m.insert("b", "two");
        m.insert(
            "c",
            vec![
                Value::from("hello"),
                Value::Bool(true),
                Value::Int(1),
                Value::Float(3.14),
                Value::Null,
            ],
        );
        let text = encode(&Value::Mapping(m)).unwrap();
        assert_eq!(text, "a: 1\nb: two\nc:\n  - hello\n  - true\n  - 1\n  - 3.14\n  - null\n");
    }

    #[test]
    fn test_scalar_documents() {
        assert_eq!(encode(&Value::Null).unwrap(), "null\n");
        assert_eq!(encode(&"true").unwrap(), "\"true\"\n");
        assert_eq!(encode(&2.0f64).unwrap(), "2.0\n");
        assert_eq!(encode(&Value::Binary(vec![1, 4, 3])).unwrap(), "!!binary AQQD\n");
    }

    #[test]
    fn test_indent_option() {
        let value = Value::Mapping([("k", Value::Sequence(vec![Value::Int(1)]))].into_iter().collect());
        let encoder = Encoder::new(default_registry()).with_options(EncodeOptions {
            indent: 4,
            ..EncodeOptions::default()
        });
        assert_eq!(encoder.encode(&value).unwrap(), "k:\n    - 1\n");
    }

    struct ForcedInt;

    impl Marshaler for ForcedInt {
        fn marshal_yaml(&self) -> std::result::Result<Marshaled, MarshalError> {
            let mut tree = NodeTree::new();
            let id = tree.push(Node::scalar("23").with_tag("!!str"));
            tree.set_root(id);
            Ok(Marshaled::Node(tree))
        }
    }

    impl Encode for ForcedInt {
        fn as_marshaler(&self) -> Option<&dyn Marshaler> {
            Some(self)
        }
    }

    #[test]
    fn test_marshaler_node_controls_style() {
        assert_eq!(encode(&ForcedInt).unwrap(), "\"23\"\n");
    }

    struct Failing;

    impl Marshaler for Failing {
        fn marshal_yaml(&self) -> std::result::Result<Marshaled, MarshalError> {
            Err("errFailing".into())
        }
    }

    impl Encode for Failing {
        fn as_marshaler(&self) -> Option<&dyn Marshaler> {
            Some(self)
        }
    }

    #[test]
    fn test_marshaler_error_inside_sequence() {
        let items: Vec<Box<dyn Encode>> = vec![Box::new(1i64), Box::new(Failing)];
        assert_eq!(encode(&items), Err(Error::Encode("errFailing".into())));
    }

    struct Pair {
        a: String,
        b: i64,
        c: Option<String>,
    }

    impl FieldEnumerable for Pair {
        fn fields(&self) -> Vec<Field<'_>> {
            vec![
                Field::new("a", &self.a),
                Field::new("b", &self.b),
                Field::new("c", &self.c).omit_empty(),
            ]
        }
    }

    impl Encode for Pair {
        fn as_fields(&self) -> Option<&dyn FieldEnumerable> {
            Some(self)
        }
    }

    #[test]
    fn test_field_enumerable() {
        let pair = Pair {
            a: "Alpha".into(),
            b: 32,
            c: None,
        };
        assert_eq!(encode(&pair).unwrap(), "a: Alpha\nb: 32\n");
        let pair = Pair {
            c: Some("x".into()),
            ..pair
        };
        assert_eq!(encode(&pair).unwrap(), "a: Alpha\nb: 32\nc: x\n");
    }

    struct Opaque;
    impl Encode for Opaque {}

    #[test]
    fn test_unsupported_type() {
        let err = encode(&Opaque).unwrap_err();
        match err {
            Error::UnsupportedType(message) => {
                assert!(message.starts_with("unable to marshal into value of type"));
                assert!(message.ends_with("Opaque"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_tagged_kind_without_handler() {
        let registry = TagRegistry::empty();
        let err = Encoder::new(&registry)
            .encode(&Value::Binary(vec![1]))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(_)));
    }

    #[test]
    fn test_depth_limit() {
        let mut value = Value::Int(1);
        for _ in 0..10 {
            value = Value::Sequence(vec![value]);
        }
        let encoder = Encoder::new(default_registry()).with_options(EncodeOptions {
            max_depth: 4,
            ..EncodeOptions::default()
        });
        assert!(matches!(encoder.encode(&value), Err(Error::Encode(_))));
    }
}
