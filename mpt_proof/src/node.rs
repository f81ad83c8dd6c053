//! Classification of raw trie nodes and of the references between them.
//!
//! A node is an RLP list. Seventeen children make a branch (sixteen child
//! references followed by a value slot). Two children make either an
//! extension or a leaf, told apart by the leaf flag in the hex-prefix encoded
//! partial key. Any other shape is rejected when the node is decoded, so the
//! trie walk only ever deals with a [`TrieNode`].

use std::fmt::{self, Display};

use enum_as_inner::EnumAsInner;
use ethereum_types::H256;

use crate::{
    error::{InvalidProofReason, ProofResult},
    nibbles::HexPrefix,
    rlp_item::RlpItem,
    utils::TrieNodeType,
};

const BRANCH_CHILDREN: usize = 17;
const SHORT_NODE_CHILDREN: usize = 2;

/// Nodes whose encoding is shorter than this are embedded in their parent
/// instead of being referenced by hash.
pub const EMBEDDED_NODE_LIMIT: usize = 32;

/// A decoded trie node. All items borrow from the raw node bytes.
#[derive(Clone, Copy, Debug, EnumAsInner, Eq, PartialEq)]
pub enum TrieNode<'a> {
    /// Sixteen nibble-indexed child references and a value slot.
    Branch {
        /// Child references, indexed by nibble.
        children: [RlpItem<'a>; 16],
        /// The value stored at the path ending here (usually empty).
        value: RlpItem<'a>,
    },

    /// A shared partial key followed by a reference to the next node.
    Extension {
        /// Partial key.
        path: HexPrefix<'a>,
        /// Reference to the next node.
        child: RlpItem<'a>,
    },

    /// The end of a key path and its value.
    Leaf {
        /// Remaining partial key.
        path: HexPrefix<'a>,
        /// The stored value.
        value: RlpItem<'a>,
    },
}

impl<'a> TrieNode<'a> {
    /// Decodes and classifies one RLP-encoded node.
    pub fn decode(raw: &'a [u8]) -> ProofResult<Self> {
        let node = RlpItem::from_slice(raw)?;
        if !node.is_list() {
            return Err(InvalidProofReason::NodeNotList.into());
        }

        let mut items = Vec::with_capacity(BRANCH_CHILDREN);
        let mut count = 0;
        for item in node.iter()? {
            let item = item?;
            count += 1;
            if items.len() < BRANCH_CHILDREN {
                items.push(item);
            }
        }

        match count {
            BRANCH_CHILDREN => {
                let value = items[16];
                let children = <[RlpItem<'a>; 16]>::try_from(&items[..16])
                    .map_err(|_| InvalidProofReason::UnexpectedChildCount(count))?;

                Ok(Self::Branch { children, value })
            }
            SHORT_NODE_CHILDREN => {
                let path = HexPrefix::decode(items[0].to_bytes()?.as_slice())?;
                let next = items[1];

                Ok(match path.is_leaf() {
                    false => Self::Extension { path, child: next },
                    true => Self::Leaf { path, value: next },
                })
            }
            _ => Err(InvalidProofReason::UnexpectedChildCount(count).into()),
        }
    }

    /// The kind of node, for logging.
    pub const fn node_type(&self) -> TrieNodeType {
        match self {
            TrieNode::Branch { .. } => TrieNodeType::Branch,
            TrieNode::Extension { .. } => TrieNodeType::Extension,
            TrieNode::Leaf { .. } => TrieNodeType::Leaf,
        }
    }
}

/// How a parent commits to the next node on the path.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NodeRef<'a> {
    /// The keccak hash of the child's encoding.
    Hash(H256),

    /// The child's full encoding, embedded in the parent because it is
    /// shorter than [`EMBEDDED_NODE_LIMIT`] bytes.
    Embedded(&'a [u8]),
}

impl<'a> NodeRef<'a> {
    /// Interprets a child slot of a branch or extension.
    ///
    /// A 32-byte string is a hash. A short list is an embedded node. Anything
    /// else (including the empty string of a missing child) is rejected.
    pub fn from_item(item: RlpItem<'a>) -> ProofResult<Self> {
        let raw = item.raw();

        match item.is_list() {
            true if raw.len() < EMBEDDED_NODE_LIMIT => Ok(Self::Embedded(raw.as_slice())),
            true => Err(InvalidProofReason::InvalidChildReference(raw.len()).into()),
            false => match item.payload().len() {
                32 => Ok(Self::Hash(H256::from_slice(item.payload().as_slice()))),
                len => Err(InvalidProofReason::InvalidChildReference(len).into()),
            },
        }
    }

    /// Returns `true` if `raw` is the node this reference commits to.
    pub fn matches(&self, raw: &[u8]) -> bool {
        match self {
            NodeRef::Hash(h) => keccak_hash::keccak(raw) == *h,
            NodeRef::Embedded(embedded) => *embedded == raw,
        }
    }
}

impl Display for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Hash(h) => write!(f, "{:x}", h),
            NodeRef::Embedded(raw) => write!(f, "embedded(0x{})", hex::encode(raw)),
        }
    }
}
