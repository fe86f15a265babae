//! # Codec Options
//!
//! In-code configuration for [`Decoder`](crate::Decoder) and
//! [`Encoder`](crate::Encoder). Both have `Default` implementations that
//! match the behavior of the crate-level `decode` and `encode` functions.

/// What to do when a mapping repeats a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateKeyPolicy {
    /// The later value replaces the earlier one, keeping the position of
    /// the first appearance.
    #[default]
    LastWins,
    /// A repeated key is a decode error.
    Reject,
}

/// Decoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Handling of repeated mapping keys.
    pub duplicate_keys: DuplicateKeyPolicy,
    /// Maximum collection nesting depth.
    pub max_depth: usize,
    /// Aliases may expand a document to at most this many times its own
    /// node count.
    pub alias_expansion_ratio: usize,
    /// Absolute cap on the nodes an alias-expanded document may decode to.
    /// Documents without aliases are never held to it.
    pub max_alias_expansion: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            duplicate_keys: DuplicateKeyPolicy::LastWins,
            max_depth: 256,
            alias_expansion_ratio: 100,
            max_alias_expansion: 1_000_000,
        }
    }
}

impl DecodeOptions {
    /// How many nodes a tree of `nodes` nodes may decode to once aliases
    /// are expanded. Never less than `nodes`, so a tree without aliases
    /// always fits.
    pub fn expansion_budget(&self, nodes: usize) -> usize {
        nodes
            .saturating_mul(self.alias_expansion_ratio)
            .min(self.max_alias_expansion)
            .max(nodes)
    }
}

/// Encoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Spaces per nesting level in block output.
    pub indent: usize,
    /// Maximum nesting depth of host values.
    pub max_depth: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            max_depth: 256,
        }
    }
}
