//! # Node Tree
//!
//! The syntactic representation of a document, independent of the value
//! model. Nodes live in an index-based arena ([`NodeTree`]) and refer to each
//! other by [`NodeId`], so alias edges (including ones that point back at an
//! ancestor) need no shared ownership.
//!
//! Tags are stored in short form: `!!binary` for the core namespace,
//! `!local` for local tags, and the bare URI for any other verbatim tag.

/// Index of a node inside its [`NodeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Presentation style of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    /// Unquoted scalar. Untagged plain scalars go through implicit resolution.
    #[default]
    Plain,
    /// `'single quoted'` scalar.
    SingleQuoted,
    /// `"double quoted"` scalar.
    DoubleQuoted,
    /// `|` block scalar.
    Literal,
    /// `>` block scalar.
    Folded,
    /// Indentation-based collection.
    Block,
    /// Bracketed collection.
    Flow,
}

impl Style {
    /// Whether a scalar with this style is resolved implicitly when untagged.
    pub fn is_plain(self) -> bool {
        self == Style::Plain
    }
}

/// 1-based source position of a parsed node. Zero for constructed nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mark {
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
}

/// The shape of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A scalar with its text content.
    Scalar(String),
    /// An ordered list of children.
    Sequence(Vec<NodeId>),
    /// Ordered key/value pairs.
    Mapping(Vec<(NodeId, NodeId)>),
    /// A reference to an anchored node.
    Alias(NodeId),
}

/// One node of a [`NodeTree`].
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Shape and content.
    pub kind: NodeKind,
    /// Explicit tag, in short form.
    pub tag: Option<String>,
    /// Anchor name, without the `&`.
    pub anchor: Option<String>,
    /// Presentation style.
    pub style: Style,
    /// Source position.
    pub mark: Mark,
}

impl Node {
    fn with_kind(kind: NodeKind, style: Style) -> Self {
        Self {
            kind,
            tag: None,
            anchor: None,
            style,
            mark: Mark::default(),
        }
    }

    /// A plain scalar.
    pub fn scalar(text: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Scalar(text.into()), Style::Plain)
    }

    /// A block sequence.
    pub fn sequence(children: Vec<NodeId>) -> Self {
        Self::with_kind(NodeKind::Sequence(children), Style::Block)
    }

    /// A block mapping.
    pub fn mapping(pairs: Vec<(NodeId, NodeId)>) -> Self {
        Self::with_kind(NodeKind::Mapping(pairs), Style::Block)
    }

    /// An alias to `target`.
    pub fn alias(target: NodeId) -> Self {
        Self::with_kind(NodeKind::Alias(target), Style::Plain)
    }

    /// Set the tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Set the anchor.
    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    /// Set the style.
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// The scalar text, if this is a scalar.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Scalar(text) => Some(text),
            _ => None,
        }
    }
}

/// An arena of nodes with an optional root.
///
/// A tree without a root is an empty document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl NodeTree {
    /// An empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// A tree holding a single root scalar.
    pub fn from_scalar(text: impl Into<String>) -> Self {
        let mut tree = Self::new();
        let id = tree.push(Node::scalar(text));
        tree.set_root(id);
        tree
    }

    /// Append a node and return its id.
    pub fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Replace the node at `id`. Returns `false` when `id` is out of range.
    pub fn replace(&mut self, id: NodeId, node: Node) -> bool {
        match self.nodes.get_mut(id.0) {
            Some(slot) => {
                *slot = node;
                true
            }
            None => false,
        }
    }

    /// Borrow a node.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Mutably borrow a node.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// The root node id.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Set the root node.
    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Copy every node of `other` into this arena and return the id its
    /// root now has here. Child and alias references are remapped.
    pub fn graft(&mut self, other: &NodeTree) -> Option<NodeId> {
        let offset = self.nodes.len();
        let shift = |id: NodeId| NodeId(id.0 + offset);
        for node in &other.nodes {
            let kind = match &node.kind {
                NodeKind::Scalar(text) => NodeKind::Scalar(text.clone()),
                NodeKind::Sequence(children) => {
                    NodeKind::Sequence(children.iter().copied().map(shift).collect())
                }
                NodeKind::Mapping(pairs) => NodeKind::Mapping(
                    pairs.iter().map(|&(k, v)| (shift(k), shift(v))).collect(),
                ),
                NodeKind::Alias(target) => NodeKind::Alias(shift(*target)),
            };
            self.nodes.push(Node {
                kind,
                ..node.clone()
            });
        }
        other.root.map(shift)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_get() {
        let mut tree = NodeTree::new();
        let a = tree.push(Node::scalar("a"));
        let b = tree.push(Node::scalar("b").with_tag("!!str"));
        let seq = tree.push(Node::sequence(vec![a, b]));
        tree.set_root(seq);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.root(), Some(seq));
        assert_eq!(tree.get(b).and_then(|n| n.tag.as_deref()), Some("!!str"));
        assert_eq!(tree.get(a).and_then(Node::text), Some("a"));
    }

    #[test]
    fn self_alias_via_replace() {
        let mut tree = NodeTree::new();
        let id = tree.push(Node::scalar(""));
        assert!(tree.replace(id, Node::alias(id)));
        assert_eq!(tree.get(id).map(|n| &n.kind), Some(&NodeKind::Alias(id)));
        assert!(!tree.replace(NodeId(7), Node::scalar("x")));
    }

    #[test]
    fn graft_remaps_references() {
        let mut inner = NodeTree::new();
        let k = inner.push(Node::scalar("k").with_anchor("x"));
        let v = inner.push(Node::alias(k));
        let m = inner.push(Node::mapping(vec![(k, v)]));
        inner.set_root(m);

        let mut outer = NodeTree::new();
        outer.push(Node::scalar("padding"));
        let root = outer.graft(&inner).unwrap();
        assert_eq!(root.index(), 3);
        match &outer.get(root).unwrap().kind {
            NodeKind::Mapping(pairs) => {
                assert_eq!(pairs[0].0.index(), 1);
                assert_eq!(outer.get(pairs[0].1).unwrap().kind, NodeKind::Alias(NodeId(1)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn graft_of_empty_tree_has_no_root() {
        let mut outer = NodeTree::from_scalar("x");
        assert_eq!(outer.graft(&NodeTree::new()), None);
        assert_eq!(outer.len(), 1);
    }
}
