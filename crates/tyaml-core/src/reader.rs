//! # YAML Reader
//!
//! Parses document text into a [`NodeTree`]. The reader is a hand-written
//! recursive descent over the characters of the input with a single cursor
//! (`x`); line and column are derived from the cursor on demand.
//!
//! Only the first document of a stream is read. Anchors are registered
//! before the children of their node are read, so an alias inside a
//! collection may refer to the collection itself. The decoder rejects such
//! cycles; the reader only records them.
//!
//! ## Supported Surface
//!
//! - block mappings and sequences, including `- key: v` and `- - x`, and
//!   sequences at the indentation of their parent key
//! - flow sequences and mappings spanning lines (JSON is accepted)
//! - plain, single-quoted and double-quoted scalars with line folding
//! - literal (`|`) and folded (`>`) block scalars with chomping and
//!   indentation indicators
//! - anchors, aliases, tags (`!local`, `!!core`, `!<verbatim>`), comments,
//!   `%` directives (skipped), `---` and `...` markers
//!
//! Explicit `?` keys are read in block and flow context; their keys may be
//! collections.

use std::collections::HashMap;

use crate::error::ParseError;
use crate::node::{Mark, Node, NodeId, NodeKind, NodeTree, Style};

type ReadResult<T> = Result<T, ParseError>;

const CORE_TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// Parse the first document of `text`. Nesting deeper than `max_depth`
/// collections is rejected.
pub fn parse(text: &str, max_depth: usize) -> ReadResult<NodeTree> {
    YamlReader::new(text, max_depth).read_stream()
}

/// Where a block node appears. Decides whether same-line block collections
/// are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Document,
    MappingValue,
    SequenceEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chomp {
    Strip,
    Clip,
    Keep,
}

/// Node properties: `&anchor` and `!tag`, in either order.
#[derive(Debug, Default)]
struct Properties {
    tag: Option<String>,
    anchor: Option<String>,
    mark: Option<Mark>,
}

impl Properties {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.anchor.is_none()
    }
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_break(c: char) -> bool {
    c == '\n' || c == '\r'
}

fn is_flow_indicator(c: char) -> bool {
    matches!(c, ',' | '[' | ']' | '{' | '}')
}

fn blank_or_end(c: Option<char>) -> bool {
    c.map_or(true, |c| is_blank(c) || is_break(c))
}

struct YamlReader {
    data: Vec<char>,
    line_starts: Vec<usize>,
    x: usize,
    tree: NodeTree,
    anchors: HashMap<String, NodeId>,
    depth: usize,
    max_depth: usize,
}

impl YamlReader {
    fn new(text: &str, max_depth: usize) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let data: Vec<char> = text.chars().collect();
        let mut line_starts = vec![0];
        line_starts.extend(
            data.iter()
                .enumerate()
                .filter(|&(_, &c)| c == '\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            data,
            line_starts,
            x: 0,
            tree: NodeTree::new(),
            anchors: HashMap::new(),
            depth: 0,
            max_depth,
        }
    }

    // -----------------------------------------------------------------------
    // Cursor
    // -----------------------------------------------------------------------

    fn peek(&self) -> Option<char> {
        self.data.get(self.x).copied()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.data.get(self.x + n).copied()
    }

    fn bump(&mut self) {
        if self.x < self.data.len() {
            self.x += 1;
        }
    }

    fn line_start(&self) -> usize {
        match self.line_starts.binary_search(&self.x) {
            Ok(line) => self.line_starts[line],
            Err(next) => self.line_starts[next - 1],
        }
    }

    /// 0-based column of the cursor.
    fn column(&self) -> usize {
        self.x - self.line_start()
    }

    fn mark(&self) -> Mark {
        let line = match self.line_starts.binary_search(&self.x) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        Mark {
            line: line + 1,
            column: self.x - self.line_starts[line] + 1,
        }
    }

    fn error(&self, message: &str) -> ParseError {
        self.error_at(self.mark(), message)
    }

    fn error_at(&self, mark: Mark, message: &str) -> ParseError {
        ParseError::new(message, mark.line, mark.column)
    }

    /// Whether only blanks precede the cursor on its line.
    fn at_indentation(&self) -> bool {
        self.data[self.line_start()..self.x].iter().all(|&c| is_blank(c))
    }

    fn at_line_end(&self) -> bool {
        match self.peek() {
            None => true,
            Some(c) => is_break(c) || c == '#',
        }
    }

    fn at_document_marker(&self) -> bool {
        if self.column() != 0 {
            return false;
        }
        let marker = |c: char| (0..3).all(|i| self.peek_at(i) == Some(c));
        (marker('-') || marker('.')) && blank_or_end(self.peek_at(3))
    }

    fn at_document_boundary(&self) -> bool {
        self.peek().is_none() || self.at_document_marker()
    }

    fn at_sequence_entry(&self) -> bool {
        self.peek() == Some('-') && blank_or_end(self.peek_at(1))
    }

    fn at_explicit_key(&self) -> bool {
        self.peek() == Some('?') && blank_or_end(self.peek_at(1))
    }

    fn skip_blanks(&mut self) {
        while self.peek().is_some_and(is_blank) {
            self.x += 1;
        }
    }

    fn skip_comment(&mut self) {
        if self.peek() == Some('#') {
            while self.peek().is_some_and(|c| !is_break(c)) {
                self.x += 1;
            }
        }
    }

    fn skip_break(&mut self) -> bool {
        match self.peek() {
            Some('\r') => {
                self.x += 1;
                if self.peek() == Some('\n') {
                    self.x += 1;
                }
                true
            }
            Some('\n') => {
                self.x += 1;
                true
            }
            _ => false,
        }
    }

    /// Advance past blanks, comments and line breaks to the next content.
    fn skip_to_content(&mut self) {
        loop {
            self.skip_blanks();
            self.skip_comment();
            if !self.skip_break() {
                return;
            }
        }
    }

    /// The rest of the line after a node must be blank or a comment, unless
    /// the node already consumed whole lines.
    fn end_of_entry(&mut self, message: &str) -> ReadResult<()> {
        self.skip_blanks();
        self.skip_comment();
        match self.peek() {
            None => Ok(()),
            Some(c) if is_break(c) => Ok(()),
            Some(_) if self.at_indentation() => Ok(()),
            Some(_) => Err(self.error(message)),
        }
    }

    fn enter(&mut self) -> ReadResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.error(&format!("exceeded max depth of {}", self.max_depth)));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Node construction
    // -----------------------------------------------------------------------

    /// Push a placeholder for a node and register its anchor.
    fn reserve(&mut self, props: &Properties, mark: Mark, style: Style) -> NodeId {
        let mut node = Node::scalar("").with_style(style);
        node.tag = props.tag.clone();
        node.anchor = props.anchor.clone();
        node.mark = props.mark.unwrap_or(mark);
        let id = self.tree.push(node);
        if let Some(anchor) = &props.anchor {
            self.anchors.insert(anchor.clone(), id);
        }
        id
    }

    fn complete(&mut self, id: NodeId, kind: NodeKind) {
        if let Some(node) = self.tree.get_mut(id) {
            node.kind = kind;
        }
    }

    fn push_scalar(&mut self, props: &Properties, text: String, style: Style, mark: Mark) -> NodeId {
        let id = self.reserve(props, mark, style);
        self.complete(id, NodeKind::Scalar(text));
        id
    }

    fn empty_node(&mut self, props: &Properties) -> NodeId {
        let mark = self.mark();
        self.push_scalar(props, String::new(), Style::Plain, mark)
    }

    // -----------------------------------------------------------------------
    // Stream and block structure
    // -----------------------------------------------------------------------

    fn read_stream(mut self) -> ReadResult<NodeTree> {
        loop {
            self.skip_to_content();
            if self.peek() == Some('%') && self.column() == 0 {
                while self.peek().is_some_and(|c| !is_break(c)) {
                    self.x += 1;
                }
                continue;
            }
            break;
        }
        let explicit = self.at_document_marker() && self.peek() == Some('-');
        if explicit {
            self.x += 3;
        }
        self.skip_blanks();
        let root = if !explicit && self.at_document_boundary() {
            None
        } else {
            Some(self.read_block_node(-1, Context::Document)?)
        };
        if let Some(root) = root {
            self.tree.set_root(root);
        }
        self.end_of_entry("did not find expected <document start>")?;
        self.skip_to_content();
        if !self.at_document_boundary() {
            return Err(self.error("did not find expected <document start>"));
        }
        Ok(self.tree)
    }

    fn read_block_node(&mut self, parent: isize, ctx: Context) -> ReadResult<NodeId> {
        self.enter()?;
        let node = self.read_block_node_inner(parent, ctx);
        self.depth -= 1;
        node
    }

    fn read_block_node_inner(&mut self, parent: isize, ctx: Context) -> ReadResult<NodeId> {
        self.skip_blanks();
        if !self.at_line_end() {
            if self.at_sequence_entry() {
                if ctx == Context::MappingValue {
                    return Err(self.error("block sequence entries are not allowed in this context"));
                }
                let indent = self.column() as isize;
                return self.read_block_sequence(indent, Properties::default());
            }
            if self.at_explicit_key() || self.scan_implicit_key() {
                if ctx == Context::MappingValue {
                    return Err(self.error("mapping values are not allowed in this context"));
                }
                let indent = self.column() as isize;
                return self.read_block_mapping(indent, Properties::default());
            }
        }

        let props = self.read_properties()?;
        self.skip_blanks();
        if self.at_line_end() {
            let save = self.x;
            self.skip_to_content();
            if !self.at_document_boundary() {
                let indent = self.column() as isize;
                if indent > parent {
                    if self.at_sequence_entry() {
                        return self.read_block_sequence(indent, props);
                    }
                    if self.at_explicit_key() || self.scan_implicit_key() {
                        return self.read_block_mapping(indent, props);
                    }
                    return self.read_inline_node(parent, props);
                }
                if indent == parent && ctx == Context::MappingValue && self.at_sequence_entry() {
                    return self.read_block_sequence(indent, props);
                }
            }
            self.x = save;
            return Ok(self.empty_node(&props));
        }

        if self.at_sequence_entry() {
            return Err(self.error("block sequence entries are not allowed in this context"));
        }
        if self.at_explicit_key() || self.scan_implicit_key() {
            return Err(self.error("mapping values are not allowed in this context"));
        }
        self.read_inline_node(parent, props)
    }

    fn read_block_mapping(&mut self, indent: isize, props: Properties) -> ReadResult<NodeId> {
        let mark = self.mark();
        let id = self.reserve(&props, mark, Style::Block);
        let mut pairs = Vec::new();
        loop {
            if self.at_explicit_key() {
                pairs.push(self.read_explicit_entry(indent)?);
            } else {
                if self.peek() == Some(':') && blank_or_end(self.peek_at(1)) {
                    return Err(self.error("did not find expected key"));
                }
                let key = self.read_key()?;
                self.skip_blanks();
                if self.peek() != Some(':') {
                    return Err(self.error("could not find expected ':'"));
                }
                self.bump();
                let value = self.read_block_node(indent, Context::MappingValue)?;
                pairs.push((key, value));
            }

            self.end_of_entry("did not find expected key")?;
            self.skip_to_content();
            if self.at_document_boundary() {
                break;
            }
            let column = self.column() as isize;
            if column < indent {
                break;
            }
            if column > indent {
                let message = if self.scan_implicit_key() {
                    "mapping values are not allowed in this context"
                } else {
                    "did not find expected key"
                };
                return Err(self.error(message));
            }
            if self.at_sequence_entry() {
                return Err(self.error("did not find expected key"));
            }
        }
        self.complete(id, NodeKind::Mapping(pairs));
        Ok(id)
    }

    /// A `? key` entry with an optional `: value` line at the same
    /// indentation. Both sides may be block collections.
    fn read_explicit_entry(&mut self, indent: isize) -> ReadResult<(NodeId, NodeId)> {
        self.bump();
        let key = self.read_block_node(indent, Context::SequenceEntry)?;
        self.end_of_entry("could not find expected ':'")?;
        self.skip_to_content();
        let at_value = !self.at_document_boundary()
            && self.column() as isize == indent
            && self.peek() == Some(':')
            && blank_or_end(self.peek_at(1));
        let value = if at_value {
            self.bump();
            self.read_block_node(indent, Context::SequenceEntry)?
        } else {
            self.empty_node(&Properties::default())
        };
        Ok((key, value))
    }

    fn read_block_sequence(&mut self, indent: isize, props: Properties) -> ReadResult<NodeId> {
        let mark = self.mark();
        let id = self.reserve(&props, mark, Style::Block);
        let mut items = Vec::new();
        loop {
            self.bump();
            let item = self.read_block_node(indent, Context::SequenceEntry)?;
            items.push(item);

            self.end_of_entry("did not find expected '-' indicator")?;
            self.skip_to_content();
            if self.at_document_boundary() {
                break;
            }
            let column = self.column() as isize;
            if column < indent {
                break;
            }
            if column > indent {
                return Err(self.error("did not find expected '-' indicator"));
            }
            if !self.at_sequence_entry() {
                break;
            }
        }
        self.complete(id, NodeKind::Sequence(items));
        Ok(id)
    }

    /// A block mapping key: properties plus a single-line node.
    fn read_key(&mut self) -> ReadResult<NodeId> {
        let props = self.read_properties()?;
        let mark = self.mark();
        match self.peek() {
            Some('*') => self.read_alias(&props),
            Some('[') => self.read_flow_sequence(props),
            Some('{') => self.read_flow_mapping(props),
            Some('"') => {
                let text = self.read_double_quoted()?;
                Ok(self.push_scalar(&props, text, Style::DoubleQuoted, mark))
            }
            Some('\'') => {
                let text = self.read_single_quoted()?;
                Ok(self.push_scalar(&props, text, Style::SingleQuoted, mark))
            }
            _ => {
                let text = self.read_plain_line(false);
                Ok(self.push_scalar(&props, text, Style::Plain, mark))
            }
        }
    }

    /// A node whose content starts on the current line and is not a block
    /// collection.
    fn read_inline_node(&mut self, parent: isize, props: Properties) -> ReadResult<NodeId> {
        let mark = self.mark();
        match self.peek() {
            Some('*') => self.read_alias(&props),
            Some('[') => self.read_flow_sequence(props),
            Some('{') => self.read_flow_mapping(props),
            Some('"') => {
                let text = self.read_double_quoted()?;
                Ok(self.push_scalar(&props, text, Style::DoubleQuoted, mark))
            }
            Some('\'') => {
                let text = self.read_single_quoted()?;
                Ok(self.push_scalar(&props, text, Style::SingleQuoted, mark))
            }
            Some('|' | '>') => self.read_block_scalar(parent, props),
            Some(']' | '}' | ',' | '@' | '`' | '%') => {
                Err(self.error("found character that cannot start any token"))
            }
            _ => {
                let text = self.read_plain_block(parent);
                Ok(self.push_scalar(&props, text, Style::Plain, mark))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Lookahead
    // -----------------------------------------------------------------------

    /// Whether the current line holds an implicit `key:` at the cursor.
    /// The cursor is left where it was.
    fn scan_implicit_key(&mut self) -> bool {
        let save = self.x;
        let found = self.scan_key_on_line();
        self.x = save;
        found
    }

    fn scan_key_on_line(&mut self) -> bool {
        while matches!(self.peek(), Some('&' | '!')) {
            while self.peek().is_some_and(|c| !is_blank(c) && !is_break(c)) {
                self.x += 1;
            }
            self.skip_blanks();
        }
        match self.peek() {
            None | Some('#') => false,
            Some(c) if is_break(c) => false,
            Some(':') => blank_or_end(self.peek_at(1)),
            Some(q @ ('"' | '\'')) => self.skip_quoted_on_line(q) && self.value_indicator_follows(true),
            Some('[' | '{') => self.skip_flow_on_line() && self.value_indicator_follows(false),
            Some('*') => {
                while self.peek().is_some_and(|c| !is_blank(c) && !is_break(c) && c != ':') {
                    self.x += 1;
                }
                self.value_indicator_follows(false)
            }
            Some('-' | '?') if blank_or_end(self.peek_at(1)) => false,
            Some('|' | '>') => false,
            Some(_) => loop {
                match self.peek() {
                    None => return false,
                    Some(c) if is_break(c) => return false,
                    Some(':') if blank_or_end(self.peek_at(1)) => return true,
                    Some(c) if is_blank(c) && self.peek_at(1) == Some('#') => return false,
                    Some(_) => self.x += 1,
                }
            },
        }
    }

    fn value_indicator_follows(&mut self, adjacent: bool) -> bool {
        self.skip_blanks();
        self.peek() == Some(':') && (adjacent || blank_or_end(self.peek_at(1)))
    }

    fn skip_quoted_on_line(&mut self, quote: char) -> bool {
        self.x += 1;
        loop {
            match self.peek() {
                None => return false,
                Some(c) if is_break(c) => return false,
                Some('\\') if quote == '"' => {
                    self.x += 1;
                    match self.peek() {
                        None => return false,
                        Some(c) if is_break(c) => return false,
                        Some(_) => self.x += 1,
                    }
                }
                Some(c) if c == quote => {
                    if quote == '\'' && self.peek_at(1) == Some('\'') {
                        self.x += 2;
                        continue;
                    }
                    self.x += 1;
                    return true;
                }
                Some(_) => self.x += 1,
            }
        }
    }

    fn skip_flow_on_line(&mut self) -> bool {
        let mut depth = 0usize;
        loop {
            match self.peek() {
                None => return false,
                Some(c) if is_break(c) => return false,
                Some('[' | '{') => {
                    depth += 1;
                    self.x += 1;
                }
                Some(']' | '}') => {
                    depth = depth.saturating_sub(1);
                    self.x += 1;
                    if depth == 0 {
                        return true;
                    }
                }
                Some(q @ ('"' | '\'')) => {
                    if !self.skip_quoted_on_line(q) {
                        return false;
                    }
                }
                Some(_) => self.x += 1,
            }
        }
    }

    // -----------------------------------------------------------------------
    // Properties and aliases
    // -----------------------------------------------------------------------

    fn read_properties(&mut self) -> ReadResult<Properties> {
        let mut props = Properties::default();
        loop {
            match self.peek() {
                Some('&') => {
                    if props.anchor.is_some() {
                        return Err(self.error("found duplicate anchor"));
                    }
                    props.mark.get_or_insert(self.mark());
                    self.bump();
                    let name = self.read_anchor_name();
                    if name.is_empty() {
                        return Err(self.error("did not find expected alphabetic or numeric character"));
                    }
                    props.anchor = Some(name);
                }
                Some('!') => {
                    if props.tag.is_some() {
                        return Err(self.error("found duplicate tag"));
                    }
                    props.mark.get_or_insert(self.mark());
                    props.tag = Some(self.read_tag()?);
                }
                _ => return Ok(props),
            }
            self.skip_blanks();
        }
    }

    fn read_anchor_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if is_blank(c) || is_break(c) || is_flow_indicator(c) {
                break;
            }
            name.push(c);
            self.x += 1;
        }
        name
    }

    fn read_tag(&mut self) -> ReadResult<String> {
        self.bump();
        if self.peek() == Some('<') {
            self.bump();
            let mut uri = String::new();
            loop {
                match self.peek() {
                    Some('>') => {
                        self.bump();
                        break;
                    }
                    Some(c) if !is_blank(c) && !is_break(c) => {
                        uri.push(c);
                        self.x += 1;
                    }
                    _ => return Err(self.error("did not find the expected '>'")),
                }
            }
            return Ok(match uri.strip_prefix(CORE_TAG_PREFIX) {
                Some(name) => format!("!!{name}"),
                None => uri,
            });
        }
        let mut tag = String::from("!");
        while let Some(c) = self.peek() {
            if is_blank(c) || is_break(c) || matches!(c, '[' | ']' | '{' | '}') {
                break;
            }
            tag.push(c);
            self.x += 1;
        }
        Ok(tag)
    }

    fn read_alias(&mut self, props: &Properties) -> ReadResult<NodeId> {
        let mark = self.mark();
        if !props.is_empty() {
            return Err(self.error("alias node cannot have properties"));
        }
        self.bump();
        let name = self.read_anchor_name();
        if name.is_empty() {
            return Err(self.error("did not find expected alphabetic or numeric character"));
        }
        let target = match self.anchors.get(&name) {
            Some(&target) => target,
            None => return Err(self.error_at(mark, &format!("found undefined alias '{name}'"))),
        };
        let mut node = Node::alias(target);
        node.mark = mark;
        Ok(self.tree.push(node))
    }

    // -----------------------------------------------------------------------
    // Flow collections
    // -----------------------------------------------------------------------

    fn read_flow_sequence(&mut self, props: Properties) -> ReadResult<NodeId> {
        self.enter()?;
        let node = self.read_flow_sequence_inner(props);
        self.depth -= 1;
        node
    }

    fn read_flow_sequence_inner(&mut self, props: Properties) -> ReadResult<NodeId> {
        let mark = self.mark();
        let id = self.reserve(&props, mark, Style::Flow);
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_to_content();
            match self.peek() {
                Some(']') => {
                    self.bump();
                    break;
                }
                None => return Err(self.error("did not find expected ',' or ']'")),
                _ => {}
            }
            items.push(self.read_flow_sequence_entry()?);
            self.skip_to_content();
            match self.peek() {
                Some(',') => self.bump(),
                Some(']') => {
                    self.bump();
                    break;
                }
                _ => return Err(self.error("did not find expected ',' or ']'")),
            }
        }
        self.complete(id, NodeKind::Sequence(items));
        Ok(id)
    }

    /// A flow sequence entry, which may be a single-pair mapping `k: v`.
    fn read_flow_sequence_entry(&mut self) -> ReadResult<NodeId> {
        let mark = self.mark();
        let explicit = self.skip_explicit_key_indicator();
        let json_key = matches!(self.peek(), Some('"' | '\'' | '[' | '{'));
        let key = self.read_flow_key(']', explicit)?;
        self.skip_blanks();
        let value = if self.at_flow_value_indicator(json_key) {
            self.bump();
            self.read_flow_value()?
        } else if explicit {
            self.empty_node(&Properties::default())
        } else {
            return Ok(key);
        };
        let pair = self.reserve(&Properties::default(), mark, Style::Flow);
        self.complete(pair, NodeKind::Mapping(vec![(key, value)]));
        Ok(pair)
    }

    fn read_flow_mapping(&mut self, props: Properties) -> ReadResult<NodeId> {
        self.enter()?;
        let node = self.read_flow_mapping_inner(props);
        self.depth -= 1;
        node
    }

    fn read_flow_mapping_inner(&mut self, props: Properties) -> ReadResult<NodeId> {
        let mark = self.mark();
        let id = self.reserve(&props, mark, Style::Flow);
        self.bump();
        let mut pairs = Vec::new();
        loop {
            self.skip_to_content();
            match self.peek() {
                Some('}') => {
                    self.bump();
                    break;
                }
                None => return Err(self.error("did not find expected ',' or '}'")),
                _ => {}
            }
            let explicit = self.skip_explicit_key_indicator();
            let json_key = matches!(self.peek(), Some('"' | '\'' | '[' | '{'));
            let key = self.read_flow_key('}', explicit)?;
            self.skip_to_content();
            let value = if self.at_flow_value_indicator(json_key) {
                self.bump();
                self.read_flow_value()?
            } else {
                self.empty_node(&Properties::default())
            };
            pairs.push((key, value));
            self.skip_to_content();
            match self.peek() {
                Some(',') => self.bump(),
                Some('}') => {
                    self.bump();
                    break;
                }
                _ => return Err(self.error("did not find expected ',' or '}'")),
            }
        }
        self.complete(id, NodeKind::Mapping(pairs));
        Ok(id)
    }

    /// Skip a `?` explicit key indicator inside a flow collection. Returns
    /// whether one was present.
    fn skip_explicit_key_indicator(&mut self) -> bool {
        if !self.at_explicit_key() {
            return false;
        }
        self.bump();
        self.skip_to_content();
        true
    }

    /// A flow key, empty when the entry starts with `:`, or when an explicit
    /// `?` entry ends at once.
    fn read_flow_key(&mut self, close: char, explicit: bool) -> ReadResult<NodeId> {
        let empty = self.at_flow_value_indicator(false)
            || (explicit && matches!(self.peek(), Some(c) if c == ',' || c == close));
        if empty {
            Ok(self.empty_node(&Properties::default()))
        } else {
            self.read_flow_node()
        }
    }

    fn at_flow_value_indicator(&self, adjacent: bool) -> bool {
        self.peek() == Some(':')
            && (adjacent
                || blank_or_end(self.peek_at(1))
                || self.peek_at(1).is_some_and(is_flow_indicator))
    }

    fn read_flow_value(&mut self) -> ReadResult<NodeId> {
        self.skip_to_content();
        match self.peek() {
            None | Some(',' | ']' | '}') => Ok(self.empty_node(&Properties::default())),
            _ => self.read_flow_node(),
        }
    }

    fn read_flow_node(&mut self) -> ReadResult<NodeId> {
        let props = self.read_properties()?;
        self.skip_to_content();
        let mark = self.mark();
        match self.peek() {
            None => Err(self.error("did not find expected node content")),
            Some('*') => self.read_alias(&props),
            Some('[') => self.read_flow_sequence(props),
            Some('{') => self.read_flow_mapping(props),
            Some('"') => {
                let text = self.read_double_quoted()?;
                Ok(self.push_scalar(&props, text, Style::DoubleQuoted, mark))
            }
            Some('\'') => {
                let text = self.read_single_quoted()?;
                Ok(self.push_scalar(&props, text, Style::SingleQuoted, mark))
            }
            Some(',' | ']' | '}') if !props.is_empty() => Ok(self.empty_node(&props)),
            Some(_) => {
                let text = self.read_plain_flow();
                if text.is_empty() {
                    return Err(self.error("did not find expected node content"));
                }
                Ok(self.push_scalar(&props, text, Style::Plain, mark))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Scalars
    // -----------------------------------------------------------------------

    /// One line of a plain scalar, without trailing blanks. The cursor stops
    /// at the line break, the `: ` indicator, a comment, or (in flow
    /// context) a flow indicator.
    fn read_plain_line(&mut self, flow: bool) -> String {
        let start = self.x;
        let mut end = self.x;
        while let Some(c) = self.peek() {
            if is_break(c) {
                break;
            }
            if c == ':' {
                let next = self.peek_at(1);
                if blank_or_end(next) || (flow && next.is_some_and(is_flow_indicator)) {
                    break;
                }
            }
            if flow && is_flow_indicator(c) {
                break;
            }
            self.x += 1;
            if is_blank(c) {
                if self.peek() == Some('#') {
                    break;
                }
            } else {
                end = self.x;
            }
        }
        self.x = end;
        self.data[start..end].iter().collect()
    }

    /// Append folded line breaks: one break becomes a space, `n` breaks
    /// become `n - 1` newlines.
    fn fold_breaks(&mut self, breaks: usize, text: &mut String) {
        if breaks == 1 {
            text.push(' ');
        } else {
            for _ in 1..breaks {
                text.push('\n');
            }
        }
    }

    /// Consume line breaks and the leading blanks of the lines after them.
    fn consume_breaks(&mut self) -> usize {
        let mut breaks = 0;
        while self.skip_break() {
            breaks += 1;
            self.skip_blanks();
        }
        breaks
    }

    fn read_plain_block(&mut self, parent: isize) -> String {
        let mut text = self.read_plain_line(false);
        loop {
            let save = self.x;
            self.skip_blanks();
            if !self.peek().is_some_and(is_break) {
                self.x = save;
                break;
            }
            let breaks = self.consume_breaks();
            let stop = self.peek().is_none()
                || (self.column() as isize) <= parent
                || self.peek() == Some('#')
                || self.at_document_marker()
                || self.scan_implicit_key();
            if stop {
                self.x = save;
                break;
            }
            self.fold_breaks(breaks, &mut text);
            let line = self.read_plain_line(false);
            text.push_str(&line);
        }
        text
    }

    fn read_plain_flow(&mut self) -> String {
        let mut text = self.read_plain_line(true);
        loop {
            let save = self.x;
            self.skip_blanks();
            if !self.peek().is_some_and(is_break) {
                self.x = save;
                break;
            }
            let breaks = self.consume_breaks();
            let stop = match self.peek() {
                None | Some('#') => true,
                Some(c) => is_flow_indicator(c) || self.at_flow_value_indicator(false),
            };
            if stop {
                self.x = save;
                break;
            }
            self.fold_breaks(breaks, &mut text);
            let line = self.read_plain_line(true);
            text.push_str(&line);
        }
        text
    }

    fn read_double_quoted(&mut self) -> ReadResult<String> {
        let start = self.mark();
        self.bump();
        let mut text = String::new();
        let mut blanks = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(self.error_at(start, "found unexpected end of stream while scanning a quoted scalar"));
            };
            match c {
                '"' => {
                    self.bump();
                    text.push_str(&blanks);
                    return Ok(text);
                }
                '\\' => {
                    text.push_str(&blanks);
                    blanks.clear();
                    self.bump();
                    match self.peek() {
                        Some(b) if is_break(b) => {
                            self.skip_break();
                            self.skip_blanks();
                        }
                        Some(e) => {
                            self.bump();
                            let decoded = self.read_escape(e)?;
                            text.push(decoded);
                        }
                        None => {
                            return Err(self.error_at(start, "found unexpected end of stream while scanning a quoted scalar"));
                        }
                    }
                }
                c if is_blank(c) => {
                    blanks.push(c);
                    self.bump();
                }
                c if is_break(c) => {
                    blanks.clear();
                    let breaks = self.consume_breaks();
                    self.fold_breaks(breaks, &mut text);
                }
                c => {
                    text.push_str(&blanks);
                    blanks.clear();
                    text.push(c);
                    self.bump();
                }
            }
        }
    }

    fn read_escape(&mut self, escape: char) -> ReadResult<char> {
        Ok(match escape {
            '0' => '\0',
            'a' => '\u{07}',
            'b' => '\u{08}',
            't' | '\t' => '\t',
            'n' => '\n',
            'v' => '\u{0b}',
            'f' => '\u{0c}',
            'r' => '\r',
            'e' => '\u{1b}',
            ' ' => ' ',
            '"' => '"',
            '/' => '/',
            '\\' => '\\',
            'N' => '\u{85}',
            '_' => '\u{a0}',
            'L' => '\u{2028}',
            'P' => '\u{2029}',
            'x' => self.read_hex_escape(2)?,
            'u' => self.read_hex_escape(4)?,
            'U' => self.read_hex_escape(8)?,
            _ => return Err(self.error("found unknown escape character while parsing a quoted scalar")),
        })
    }

    fn read_hex_escape(&mut self, digits: usize) -> ReadResult<char> {
        let mut code: u32 = 0;
        for _ in 0..digits {
            let digit = match self.peek().and_then(|c| c.to_digit(16)) {
                Some(d) => d,
                None => return Err(self.error("did not find expected hexdecimal number")),
            };
            code = code * 16 + digit;
            self.bump();
        }
        char::from_u32(code).ok_or_else(|| self.error("found invalid Unicode character escape code"))
    }

    fn read_single_quoted(&mut self) -> ReadResult<String> {
        let start = self.mark();
        self.bump();
        let mut text = String::new();
        let mut blanks = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(self.error_at(start, "found unexpected end of stream while scanning a quoted scalar"));
            };
            match c {
                '\'' if self.peek_at(1) == Some('\'') => {
                    text.push_str(&blanks);
                    blanks.clear();
                    text.push('\'');
                    self.x += 2;
                }
                '\'' => {
                    self.bump();
                    text.push_str(&blanks);
                    return Ok(text);
                }
                c if is_blank(c) => {
                    blanks.push(c);
                    self.bump();
                }
                c if is_break(c) => {
                    blanks.clear();
                    let breaks = self.consume_breaks();
                    self.fold_breaks(breaks, &mut text);
                }
                c => {
                    text.push_str(&blanks);
                    blanks.clear();
                    text.push(c);
                    self.bump();
                }
            }
        }
    }

    fn read_block_scalar(&mut self, parent: isize, props: Properties) -> ReadResult<NodeId> {
        let mark = self.mark();
        let literal = self.peek() == Some('|');
        self.bump();

        let mut chomp = Chomp::Clip;
        let mut increment: Option<usize> = None;
        for _ in 0..2 {
            match self.peek() {
                Some('+') if chomp == Chomp::Clip => chomp = Chomp::Keep,
                Some('-') if chomp == Chomp::Clip => chomp = Chomp::Strip,
                Some(c @ '1'..='9') if increment.is_none() => {
                    increment = c.to_digit(10).map(|d| d as usize);
                }
                _ => break,
            }
            self.bump();
        }
        self.skip_blanks();
        self.skip_comment();
        if !blank_or_end(self.peek()) {
            return Err(self.error("did not find expected comment or line break"));
        }
        self.skip_break();

        // A document-level scalar may start its content at column 0.
        let min_indent = (parent + 1).max(0) as usize;
        let mut indent = increment.map(|inc| if parent >= 0 { parent as usize + inc } else { inc });
        let mut lines: Vec<String> = Vec::new();
        while self.peek().is_some() && !self.at_document_marker() {
            let line_start = self.x;
            let mut spaces = 0;
            while self.peek_at(spaces) == Some(' ') {
                spaces += 1;
            }
            if blank_or_end(self.peek_at(spaces)) && !self.peek_at(spaces).is_some_and(is_blank) {
                self.x += spaces;
                self.skip_break();
                lines.push(String::new());
                continue;
            }
            let content_indent = match indent {
                Some(n) => n,
                None if spaces >= min_indent => {
                    indent = Some(spaces);
                    spaces
                }
                None => {
                    self.x = line_start;
                    break;
                }
            };
            if spaces < content_indent {
                self.x = line_start;
                break;
            }
            self.x += content_indent;
            let mut line = String::new();
            while let Some(c) = self.peek() {
                if is_break(c) {
                    break;
                }
                line.push(c);
                self.x += 1;
            }
            self.skip_break();
            lines.push(line);
        }

        let trailing = lines.iter().rev().take_while(|l| l.is_empty()).count();
        let body = &lines[..lines.len() - trailing];
        let mut text = if literal { body.join("\n") } else { fold_block_lines(body) };
        if !body.is_empty() {
            match chomp {
                Chomp::Strip => {}
                Chomp::Clip => text.push('\n'),
                Chomp::Keep => text.push_str(&"\n".repeat(trailing + 1)),
            }
        } else if chomp == Chomp::Keep {
            text.push_str(&"\n".repeat(trailing));
        }
        let style = if literal { Style::Literal } else { Style::Folded };
        Ok(self.push_scalar(&props, text, style, mark))
    }
}

/// Fold the lines of a `>` block scalar. Adjacent lines join with a space;
/// empty lines and more-indented lines keep their breaks.
fn fold_block_lines(lines: &[String]) -> String {
    let mut out = String::new();
    let mut previous_more: Option<bool> = None;
    let mut empties = 0;
    for line in lines {
        if line.is_empty() {
            empties += 1;
            continue;
        }
        let more = line.starts_with([' ', '\t']);
        match previous_more {
            None => out.push_str(&"\n".repeat(empties)),
            Some(false) if !more && empties == 0 => out.push(' '),
            Some(false) if !more => out.push_str(&"\n".repeat(empties)),
            Some(_) => out.push_str(&"\n".repeat(empties + 1)),
        }
        out.push_str(line);
        previous_more = Some(more);
        empties = 0;
    }
    out
}
