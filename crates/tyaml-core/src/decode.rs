//! # Decoder
//!
//! Converts document text into a [`Value`]:
//!
//! 1. The reader builds a [`NodeTree`]. Syntax errors surface as
//!    [`Error::Parse`] with the line and column.
//! 2. Each node is converted recursively. Scalars go through the
//!    [`TagRegistry`]; mappings apply the [`DuplicateKeyPolicy`]; aliases are
//!    resolved through a per-call visiting set.
//!
//! ## Cycle Detection
//!
//! An alias whose target is still being decoded (it is an ancestor of the
//! alias) would expand forever. The visiting set is a bitset indexed by
//! [`NodeId`], so the check is per node identity and costs one slot per
//! node. Such an alias fails with [`Error::Cycle`].
//!
//! ## Alias Expansion
//!
//! Every alias copies its target's subtree, so nested aliases grow the
//! output geometrically. The walk counts decoded nodes against
//! [`DecodeOptions::expansion_budget`] and fails with [`Error::Decode`]
//! ("document contains excessive aliasing") once it is spent.

use crate::error::{Error, ParseError, Result};
use crate::node::{NodeId, NodeKind, NodeTree};
use crate::options::{DecodeOptions, DuplicateKeyPolicy};
use crate::reader;
use crate::tag::TagRegistry;
use crate::value::{Mapping, Value};

/// Decodes documents with a given tag registry and options.
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'r> {
    registry: &'r TagRegistry,
    options: DecodeOptions,
}

impl<'r> Decoder<'r> {
    /// A decoder with default options.
    pub fn new(registry: &'r TagRegistry) -> Self {
        Self {
            registry,
            options: DecodeOptions::default(),
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Decode the first document of `text`. An empty document is
    /// [`Value::Null`].
    pub fn decode(&self, text: &[u8]) -> Result<Value> {
        let text = std::str::from_utf8(text).map_err(|err| {
            let prefix = &text[..err.valid_up_to()];
            let line = prefix.iter().filter(|&&b| b == b'\n').count() + 1;
            let column = prefix.iter().rev().take_while(|&&b| b != b'\n').count() + 1;
            Error::Parse(ParseError::new("invalid UTF-8 in input", line, column))
        })?;
        tracing::debug!(bytes = text.len(), "decoding document");
        let tree = reader::parse(text, self.options.max_depth)?;
        self.decode_tree(&tree)
    }

    /// Convert an already-parsed tree.
    pub fn decode_tree(&self, tree: &NodeTree) -> Result<Value> {
        let Some(root) = tree.root() else {
            return Ok(Value::Null);
        };
        let mut walk = Walk {
            tree,
            visiting: vec![false; tree.len()],
            depth: 0,
            decoded: 0,
            budget: self.options.expansion_budget(tree.len()),
        };
        self.decode_node(&mut walk, root)
    }

    fn decode_node(&self, walk: &mut Walk<'_>, id: NodeId) -> Result<Value> {
        let tree = walk.tree;
        let node = tree
            .get(id)
            .ok_or_else(|| Error::Decode(format!("node {} is not part of the tree", id.index())))?;

        walk.decoded += 1;
        if walk.decoded > walk.budget {
            return Err(Error::Decode("document contains excessive aliasing".into()));
        }
        walk.depth += 1;
        if walk.depth > self.options.max_depth {
            return Err(Error::Decode(format!(
                "exceeded max depth of {}",
                self.options.max_depth
            )));
        }
        walk.visiting[id.index()] = true;

        let value = match &node.kind {
            NodeKind::Scalar(text) => {
                self.registry
                    .decode_scalar(node.tag.as_deref(), text, node.style)
            }
            NodeKind::Sequence(children) => children
                .iter()
                .map(|&child| self.decode_node(walk, child))
                .collect::<Result<Vec<_>>>()
                .map(Value::Sequence),
            NodeKind::Mapping(pairs) => self.decode_mapping(walk, pairs).map(Value::Mapping),
            NodeKind::Alias(target) => {
                let visiting = walk.visiting.get(target.index()).copied().unwrap_or(false);
                if visiting {
                    let anchor = tree.get(*target).and_then(|n| n.anchor.as_deref());
                    Err(Error::Cycle(match anchor {
                        Some(anchor) => format!("anchor '{anchor}' value contains itself"),
                        None => "value contains itself".to_string(),
                    }))
                } else {
                    self.decode_node(walk, *target)
                }
            }
        };

        walk.visiting[id.index()] = false;
        walk.depth -= 1;
        value
    }

    fn decode_mapping(&self, walk: &mut Walk<'_>, pairs: &[(NodeId, NodeId)]) -> Result<Mapping> {
        let mut mapping = Mapping::new();
        for &(k, v) in pairs {
            let key = self.decode_node(walk, k)?;
            let value = self.decode_node(walk, v)?;
            if self.options.duplicate_keys == DuplicateKeyPolicy::Reject && mapping.contains_key(&key) {
                return Err(Error::Decode(format!("mapping key {key} already defined")));
            }
            mapping.insert(key, value);
        }
        Ok(mapping)
    }
}

/// Per-call state of a tree walk.
struct Walk<'t> {
    tree: &'t NodeTree,
    visiting: Vec<bool>,
    depth: usize,
    /// Nodes decoded so far, alias targets counted once per expansion.
    decoded: usize,
    budget: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::tag::default_registry;

    fn decode(text: &str) -> Result<Value> {
        Decoder::new(default_registry()).decode(text.as_bytes())
    }

    fn map(entries: Vec<(&str, Value)>) -> Value {
        Value::Mapping(entries.into_iter().collect())
    }

    #[test]
    fn test_decode_scalars_and_collections() {
        let v = decode("a: 1\nb: two\nc: [hello, true, 1, 3.14, null]\n").unwrap();
        let expected = map(vec![
            ("a", Value::Int(1)),
            ("b", Value::from("two")),
            (
                "c",
                Value::Sequence(vec![
                    Value::from("hello"),
                    Value::Bool(true),
                    Value::Int(1),
                    Value::Float(3.14),
                    Value::Null,
                ]),
            ),
        ]);
        assert_eq!(v, expected);
    }

    #[test]
    fn test_empty_document_is_null() {
        assert_eq!(decode("").unwrap(), Value::Null);
        assert_eq!(decode("---\n").unwrap(), Value::Null);
    }

    #[test]
    fn test_quoted_scalars_stay_strings() {
        let v = decode("a: \"1\"\nb: 'true'\nc: |\n  null\n").unwrap();
        assert_eq!(v.get("a"), Some(&Value::from("1")));
        assert_eq!(v.get("b"), Some(&Value::from("true")));
        assert_eq!(v.get("c"), Some(&Value::from("null\n")));
    }

    #[test]
    fn test_binary() {
        let v = decode("b: !!binary AQQD\n").unwrap();
        assert_eq!(v, map(vec![("b", Value::Binary(vec![1, 4, 3]))]));
        let err = decode("b: !!binary AQQ~\n").unwrap_err();
        assert!(matches!(&err, Error::Decode(m) if m.contains("illegal base64 data")));
    }

    #[test]
    fn test_timestamp() {
        let v = decode("t: !!timestamp 2019-10-06T07:15:00-07:00\n").unwrap();
        let expected = chrono::DateTime::parse_from_rfc3339("2019-10-06T07:15:00-07:00").unwrap();
        assert_eq!(v.get("t"), Some(&Value::Timestamp(expected)));
        let err = decode("t: !!timestamp 2019-13-06T07:15:00-07:00\n").unwrap_err();
        assert!(err.to_string().contains("cannot decode"));
    }

    #[test]
    fn test_explicit_collection_key() {
        let v = decode("? [1, 2]\n: pair\n? - a\n  - b\n: list\n").unwrap();
        let Value::Mapping(m) = v else {
            panic!("expected a mapping");
        };
        assert_eq!(m.len(), 2);
        let pair = Value::Sequence(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(m.get(&pair), Some(&Value::from("pair")));
        let list = Value::Sequence(vec![Value::from("a"), Value::from("b")]);
        assert_eq!(m.get(&list), Some(&Value::from("list")));
    }

    #[test]
    fn test_explicit_key_without_value() {
        let v = decode("? a\nb: 1\n").unwrap();
        assert_eq!(v, map(vec![("a", Value::Null), ("b", Value::Int(1))]));
    }

    #[test]
    fn test_nan_round_trips_equal() {
        let v = decode("x: .nan\n").unwrap();
        assert_eq!(v, map(vec![("x", Value::Float(f64::NAN))]));
    }

    #[test]
    fn test_plain_timestamp_is_a_string() {
        let v = decode("t: 2019-10-06\n").unwrap();
        assert_eq!(v.get("t"), Some(&Value::from("2019-10-06")));
    }

    #[test]
    fn test_syntax_error() {
        let err = decode(": :\n").unwrap_err();
        match err {
            Error::Parse(p) => {
                assert!(p.message.contains("did not find expected key"));
                assert_eq!(p.line, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_invalid_utf8() {
        let err = Decoder::new(default_registry())
            .decode(b"a: 1\nb: \xff\n")
            .unwrap_err();
        match err {
            Error::Parse(p) => {
                assert_eq!(p.message, "invalid UTF-8 in input");
                assert_eq!((p.line, p.column), (2, 4));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_self_referencing_anchor() {
        let err = decode("a: &x [1, *x]\n").unwrap_err();
        assert_eq!(err, Error::Cycle("anchor 'x' value contains itself".into()));
        assert!(err.to_string().contains("value contains itself"));
    }

    #[test]
    fn test_alias_to_self_node() {
        let mut tree = NodeTree::new();
        let id = tree.push(Node::scalar(""));
        tree.replace(id, Node::alias(id));
        tree.set_root(id);
        let err = Decoder::new(default_registry()).decode_tree(&tree).unwrap_err();
        assert_eq!(err, Error::Cycle("value contains itself".into()));
    }

    #[test]
    fn test_shared_alias_is_not_a_cycle() {
        let v = decode("base: &b {x: 1}\none: *b\ntwo: [*b, *b]\n").unwrap();
        let base = map(vec![("x", Value::Int(1))]);
        assert_eq!(v.get("one"), Some(&base));
        assert_eq!(v.get("two"), Some(&Value::Sequence(vec![base.clone(), base])));
    }

    /// Ten aliases per level, seven levels deep.
    fn nested_aliases(levels: usize) -> String {
        let mut text = "a0: &a0 [x, x, x, x, x, x, x, x, x, x]\n".to_string();
        for level in 1..=levels {
            let prev = format!("*a{}", level - 1);
            let items = vec![prev.as_str(); 10].join(", ");
            text.push_str(&format!("a{level}: &a{level} [{items}]\n"));
        }
        text
    }

    #[test]
    fn test_excessive_aliasing_rejected() {
        let err = decode(&nested_aliases(7)).unwrap_err();
        assert_eq!(err, Error::Decode("document contains excessive aliasing".into()));
    }

    #[test]
    fn test_moderate_aliasing_allowed() {
        let v = decode(&nested_aliases(2)).unwrap();
        let Some(Value::Sequence(level2)) = v.get("a2") else {
            panic!("expected a sequence");
        };
        assert_eq!(level2.len(), 10);
        assert_eq!(level2[9], v.get("a1").cloned().unwrap());
    }

    #[test]
    fn test_expansion_budget_with_tight_ratio() {
        let options = DecodeOptions {
            alias_expansion_ratio: 1,
            ..DecodeOptions::default()
        };
        let decoder = Decoder::new(default_registry()).with_options(options);
        assert!(decoder.decode(b"a: [1, 2, 3]\nb: {c: d}\n").is_ok());
        assert!(decoder.decode(b"a: &x [1, 2, 3]\nb: *x\n").is_err());
        assert_eq!(options.expansion_budget(10), 10);
        assert_eq!(DecodeOptions::default().expansion_budget(20_000), 1_000_000);
        assert_eq!(DecodeOptions::default().expansion_budget(2_000_000), 2_000_000);
    }

    #[test]
    fn test_duplicate_keys_last_wins_in_place() {
        let v = decode("a: 1\nb: 2\na: 3\n").unwrap();
        assert_eq!(v, map(vec![("a", Value::Int(3)), ("b", Value::Int(2))]));
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let options = DecodeOptions {
            duplicate_keys: DuplicateKeyPolicy::Reject,
            ..DecodeOptions::default()
        };
        let err = Decoder::new(default_registry())
            .with_options(options)
            .decode(b"a: 1\na: 3\n")
            .unwrap_err();
        assert_eq!(err, Error::Decode("mapping key \"a\" already defined".into()));
    }

    #[test]
    fn test_depth_limit() {
        let options = DecodeOptions {
            max_depth: 8,
            ..DecodeOptions::default()
        };
        let text = "a:\n".to_string() + &"- ".repeat(3) + "x\n";
        let decoder = Decoder::new(default_registry()).with_options(options);
        assert!(decoder.decode(text.as_bytes()).is_ok());
        let deep = "[".repeat(20) + &"]".repeat(20);
        assert!(decoder.decode(deep.as_bytes()).is_err());
    }

    #[test]
    fn test_unknown_tag_resolves_plain() {
        let v = decode("!thing a\n").unwrap();
        assert_eq!(v, Value::from("a"));
    }
}
