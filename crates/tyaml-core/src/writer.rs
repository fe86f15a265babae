//! # YAML Writer
//!
//! Serializes a [`NodeTree`] to block-style text:
//!
//! - nested collections indent by a configurable number of spaces, and
//!   sequences are indented under their parent key
//! - mappings and sequences inside sequences use the compact `- key: v`
//!   and `- - x` forms
//! - empty collections render as `[]` and `{}`; collection keys render in
//!   flow style
//! - a core tag that matches the implicit resolution of its text is omitted
//! - the output always ends with a newline
//!
//! Scalars are written plain when that reads back as the same text with
//! the same resolution, and double-quoted otherwise.

use crate::error::{Error, Result};
use crate::node::{Node, NodeId, NodeKind, NodeTree, Style};
use crate::resolve::plain_kind;
use crate::value::ValueKind;

/// Serialize `tree` with `indent` spaces per nesting level.
pub fn write(tree: &NodeTree, indent: usize) -> Result<String> {
    let mut writer = YamlWriter {
        tree,
        indent: indent.max(1),
        out: String::new(),
    };
    writer.write_document()?;
    Ok(writer.out)
}

/// The style the encoder gives a string: plain when it is plain-safe and
/// resolves back to a string, double-quoted otherwise.
pub fn string_style(text: &str) -> Style {
    if is_plain_safe(text, false) && plain_kind(text) == ValueKind::String {
        Style::Plain
    } else {
        Style::DoubleQuoted
    }
}

/// Whether `text` can be written as a plain scalar and read back unchanged.
pub fn is_plain_safe(text: &str, flow: bool) -> bool {
    let chars: Vec<char> = text.chars().collect();
    let (Some(&first), Some(&last)) = (chars.first(), chars.last()) else {
        return false;
    };
    if first.is_whitespace() || last.is_whitespace() {
        return false;
    }
    if matches!(
        first,
        '#' | ',' | '[' | ']' | '{' | '}' | '&' | '*' | '!' | '|' | '>' | '\'' | '"' | '%' | '@' | '`'
    ) {
        return false;
    }
    if matches!(first, '-' | '?' | ':') && chars.get(1).map_or(true, |c| c.is_whitespace()) {
        return false;
    }
    if text.starts_with("---") || text.starts_with("...") || is_yaml11_bool(text) {
        return false;
    }
    for (i, &c) in chars.iter().enumerate() {
        if c.is_control() || matches!(c, '\u{feff}' | '\u{2028}' | '\u{2029}') {
            return false;
        }
        let next = chars.get(i + 1).copied();
        if c == ':' && next.map_or(true, |n| n == ' ' || (flow && matches!(n, ',' | '[' | ']' | '{' | '}'))) {
            return false;
        }
        if c == '#' && i > 0 && chars[i - 1] == ' ' {
            return false;
        }
        if flow && matches!(c, ',' | '[' | ']' | '{' | '}') {
            return false;
        }
    }
    true
}

/// Words that YAML 1.1 readers take as booleans. They stay strings here,
/// so they are quoted for those readers.
fn is_yaml11_bool(text: &str) -> bool {
    ["y", "n", "yes", "no", "on", "off"]
        .iter()
        .any(|word| text.eq_ignore_ascii_case(word))
}

/// Render `text` as a double-quoted scalar.
pub fn double_quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0b}' => out.push_str("\\v"),
            '\u{0c}' => out.push_str("\\f"),
            '\u{1b}' => out.push_str("\\e"),
            '\u{85}' => out.push_str("\\N"),
            '\u{a0}' => out.push_str("\\_"),
            '\u{2028}' => out.push_str("\\L"),
            '\u{2029}' => out.push_str("\\P"),
            c if c.is_control() || c == '\u{feff}' => {
                out.push_str(&format!("\\u{:04X}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn single_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn render_tag(tag: &str) -> String {
    if tag.starts_with('!') {
        tag.to_string()
    } else {
        format!("!<{tag}>")
    }
}

fn core_kind(tag: &str) -> Option<ValueKind> {
    match tag {
        "!!str" => Some(ValueKind::String),
        "!!int" => Some(ValueKind::Int),
        "!!float" => Some(ValueKind::Float),
        "!!bool" => Some(ValueKind::Bool),
        "!!null" => Some(ValueKind::Null),
        _ => None,
    }
}

fn is_block_collection(node: &Node) -> bool {
    match &node.kind {
        NodeKind::Sequence(items) => !items.is_empty(),
        NodeKind::Mapping(pairs) => !pairs.is_empty(),
        _ => false,
    }
}

struct YamlWriter<'t> {
    tree: &'t NodeTree,
    indent: usize,
    out: String,
}

impl<'t> YamlWriter<'t> {
    fn node(&self, id: NodeId) -> Result<&'t Node> {
        self.tree
            .get(id)
            .ok_or_else(|| Error::Encode(format!("node {} is not part of the tree", id.index())))
    }

    fn pad(&mut self, level: usize) {
        for _ in 0..level {
            self.out.push(' ');
        }
    }

    fn write_document(&mut self) -> Result<()> {
        let Some(root) = self.tree.root() else {
            self.out.push_str("null\n");
            return Ok(());
        };
        let node = self.node(root)?;
        if is_block_collection(node) {
            if let Some(props) = collection_properties(node) {
                self.out.push_str(&props);
                self.out.push('\n');
            }
            self.write_collection(node, 0, false)
        } else {
            let text = self.inline(root, false)?;
            self.out.push_str(&text);
            self.out.push('\n');
            Ok(())
        }
    }

    fn write_collection(&mut self, node: &'t Node, level: usize, first_inline: bool) -> Result<()> {
        match &node.kind {
            NodeKind::Mapping(pairs) => self.write_mapping(pairs, level, first_inline),
            NodeKind::Sequence(items) => self.write_sequence(items, level, first_inline),
            _ => Ok(()),
        }
    }

    fn write_mapping(&mut self, pairs: &[(NodeId, NodeId)], level: usize, first_inline: bool) -> Result<()> {
        for (i, &(key, value)) in pairs.iter().enumerate() {
            if i > 0 || !first_inline {
                self.pad(level);
            }
            let key_text = self.inline(key, false)?;
            self.out.push_str(&key_text);
            self.out.push(':');

            let node = self.node(value)?;
            if is_block_collection(node) {
                if let Some(props) = collection_properties(node) {
                    self.out.push(' ');
                    self.out.push_str(&props);
                }
                self.out.push('\n');
                self.write_collection(node, level + self.indent, false)?;
            } else {
                let text = self.inline(value, false)?;
                if !text.is_empty() {
                    self.out.push(' ');
                    self.out.push_str(&text);
                }
                self.out.push('\n');
            }
        }
        Ok(())
    }

    fn write_sequence(&mut self, items: &[NodeId], level: usize, first_inline: bool) -> Result<()> {
        for (i, &item) in items.iter().enumerate() {
            if i > 0 || !first_inline {
                self.pad(level);
            }
            self.out.push('-');
            let node = self.node(item)?;
            if is_block_collection(node) {
                self.out.push(' ');
                match collection_properties(node) {
                    Some(props) => {
                        self.out.push_str(&props);
                        self.out.push('\n');
                        self.write_collection(node, level + 2, false)?;
                    }
                    None => self.write_collection(node, level + 2, true)?,
                }
            } else {
                let text = self.inline(item, false)?;
                if !text.is_empty() {
                    self.out.push(' ');
                    self.out.push_str(&text);
                }
                self.out.push('\n');
            }
        }
        Ok(())
    }

    /// Render a node on a single line: scalars, aliases, and flow
    /// collections.
    fn inline(&self, id: NodeId, flow: bool) -> Result<String> {
        let node = self.node(id)?;
        match &node.kind {
            NodeKind::Alias(target) => match &self.node(*target)?.anchor {
                Some(anchor) => Ok(format!("*{anchor}")),
                None => Err(Error::Encode(format!(
                    "alias target {} has no anchor",
                    target.index()
                ))),
            },
            NodeKind::Scalar(text) => Ok(render_scalar(node, text, flow)),
            NodeKind::Sequence(items) => {
                let parts = items
                    .iter()
                    .map(|&item| self.inline(item, true))
                    .collect::<Result<Vec<_>>>()?;
                Ok(with_properties(node, format!("[{}]", parts.join(", "))))
            }
            NodeKind::Mapping(pairs) => {
                let parts = pairs
                    .iter()
                    .map(|&(k, v)| Ok(format!("{}: {}", self.inline(k, true)?, self.inline(v, true)?)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(with_properties(node, format!("{{{}}}", parts.join(", "))))
            }
        }
    }
}

/// `&anchor !tag` of a collection, without core collection tags.
fn collection_properties(node: &Node) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(anchor) = &node.anchor {
        parts.push(format!("&{anchor}"));
    }
    if let Some(tag) = node.tag.as_deref().filter(|t| *t != "!!map" && *t != "!!seq") {
        parts.push(render_tag(tag));
    }
    (!parts.is_empty()).then(|| parts.join(" "))
}

fn with_properties(node: &Node, body: String) -> String {
    match collection_properties(node) {
        Some(props) => format!("{props} {body}"),
        None => body,
    }
}

fn render_scalar(node: &Node, text: &str, flow: bool) -> String {
    let plain_ok = is_plain_safe(text, flow);
    let (tag, style) = match node.tag.as_deref() {
        None => match node.style {
            Style::Plain if plain_ok || text.is_empty() => (None, Style::Plain),
            Style::SingleQuoted if !text.chars().any(char::is_control) => (None, Style::SingleQuoted),
            _ => (None, Style::DoubleQuoted),
        },
        Some(tag) => match core_kind(tag) {
            Some(ValueKind::String) if plain_ok && plain_kind(text) == ValueKind::String => {
                (None, Style::Plain)
            }
            Some(ValueKind::String) => (None, Style::DoubleQuoted),
            Some(ValueKind::Null) if text.is_empty() => (None, Style::Plain),
            Some(kind) if plain_ok && plain_kind(text) == kind => (None, Style::Plain),
            _ if plain_ok => (Some(tag), Style::Plain),
            _ => (Some(tag), Style::DoubleQuoted),
        },
    };

    let mut out = String::new();
    if let Some(anchor) = &node.anchor {
        out.push('&');
        out.push_str(anchor);
        out.push(' ');
    }
    if let Some(tag) = tag {
        out.push_str(&render_tag(tag));
        out.push(' ');
    }
    match style {
        Style::Plain => out.push_str(text),
        Style::SingleQuoted => out.push_str(&single_quote(text)),
        _ => out.push_str(&double_quote(text)),
    }
    let trimmed = out.trim_end_matches(' ').len();
    out.truncate(trimmed);
    out
}
