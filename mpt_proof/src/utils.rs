//! Various types and logic that don't fit well into any other module.

use std::fmt::{self, Display};

use crate::nibbles::Nibble;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
/// Simplified trie node type to make logging cleaner.
pub enum TrieNodeType {
    /// Branch node.
    Branch,

    /// Extension node.
    Extension,

    /// Leaf node.
    Leaf,
}

impl Display for TrieNodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TrieNodeType::Branch => "Branch",
            TrieNodeType::Extension => "Extension",
            TrieNodeType::Leaf => "Leaf",
        };

        write!(f, "{}", s)
    }
}

/// One step of a verified proof: the node that was visited and the part of
/// the key it consumed.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum PathSegment {
    /// Branch node along with the nibble of the child taken.
    Branch(Nibble),

    /// Branch node whose value slot held the result.
    BranchValue,

    /// Extension node along with its key piece.
    Extension(Vec<Nibble>),

    /// Leaf node along with its key piece.
    Leaf(Vec<Nibble>),
}

impl PathSegment {
    /// Get the node type of the [`PathSegment`].
    pub const fn node_type(&self) -> TrieNodeType {
        match self {
            PathSegment::Branch(_) | PathSegment::BranchValue => TrieNodeType::Branch,
            PathSegment::Extension(_) => TrieNodeType::Extension,
            PathSegment::Leaf(_) => TrieNodeType::Leaf,
        }
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Branch(nib) => write!(f, "Branch({:x})", nib),
            PathSegment::BranchValue => write!(f, "Branch(value)"),
            PathSegment::Extension(nibs) => write!(f, "Extension({})", hex_nibbles(nibs)),
            PathSegment::Leaf(nibs) => write!(f, "Leaf({})", hex_nibbles(nibs)),
        }
    }
}

/// The sequence of nodes a proof walked through, root first.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct ProofPath(pub Vec<PathSegment>);

impl ProofPath {
    pub(crate) fn append(&mut self, seg: PathSegment) {
        self.0.push(seg);
    }

    /// Number of nodes visited, embedded nodes included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no node was visited.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for ProofPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let num_elems = self.0.len();

        // For everything but the last elem.
        for seg in self.0.iter().take(num_elems.saturating_sub(1)) {
            write!(f, "{} --> ", seg)?;
        }

        // Avoid the extra `-->` for the last elem.
        if let Some(seg) = self.0.last() {
            write!(f, "{}", seg)?;
        }

        Ok(())
    }
}

fn hex_nibbles(nibbles: &[Nibble]) -> String {
    nibbles.iter().map(|n| format!("{:x}", n)).collect()
}
