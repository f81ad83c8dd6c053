//! Error types shared by every stage of proof decoding and verification.

use ethereum_types::H256;
use thiserror::Error;

use crate::nibbles::FromHexPrefixError;

/// Stores the result of a proof operation. Returns a [`ProofError`] upon
/// failure.
pub type ProofResult<T> = Result<T, ProofError>;

/// Any failure while decoding or verifying a proof.
///
/// Every variant is fatal to the verification call that produced it. Nothing
/// is partially accepted.
#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum ProofError {
    /// The bytes are not a consistent RLP encoding.
    #[error("Malformed RLP: {0}")]
    MalformedRlp(#[from] MalformedReason),

    /// The bytes decode, but do not prove the claimed value.
    #[error("Invalid proof: {0}")]
    InvalidProof(#[from] InvalidProofReason),
}

impl From<FromHexPrefixError> for ProofError {
    fn from(e: FromHexPrefixError) -> Self {
        InvalidProofReason::HexPrefix(e).into()
    }
}

/// Structural problems with a byte buffer or its RLP encoding.
#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum MalformedReason {
    /// A read or sub-view would leave the bounds of its parent view.
    #[error("access of {len} bytes at offset {offset} exceeds a view of {available} bytes")]
    OutOfBounds {
        /// Requested start.
        offset: usize,
        /// Requested length.
        len: usize,
        /// Length of the view that was accessed.
        available: usize,
    },

    /// An RLP item was expected but the buffer is empty.
    #[error("empty RLP input")]
    Empty,

    /// The length declared by an RLP header disagrees with the buffer.
    #[error("encoded length {encoded} does not match the {actual} bytes available")]
    LengthMismatch {
        /// Length computed from the header.
        encoded: usize,
        /// Length of the buffer holding the item.
        actual: usize,
    },

    /// A long-form length prefix does not fit into a `usize`.
    #[error("length prefix of {0} bytes does not fit in a usize")]
    LengthOverflow(usize),

    /// Header and payload lengths together do not fit into a `usize`.
    #[error("header of {header_len} bytes plus payload of {payload_len} bytes overflows a usize")]
    TotalLengthOverflow {
        /// Bytes taken by the header.
        header_len: usize,
        /// Bytes of payload declared by the header.
        payload_len: usize,
    },

    /// A byte string was expected, but a list was found.
    #[error("expected a byte string, found a list")]
    ExpectedBytes,

    /// A list was expected, but a byte string was found.
    #[error("expected a list, found a byte string")]
    ExpectedList,

    /// A list did not hold the expected number of items.
    #[error("expected {expected} list items, found {found}")]
    ItemCount {
        /// Items required by the decoded type.
        expected: usize,
        /// Items present in the list.
        found: usize,
    },

    /// A scalar is wider than the integer type it decodes to.
    #[error("scalar of {len} bytes does not fit in {max} bytes")]
    ScalarTooLong {
        /// Payload length.
        len: usize,
        /// Width of the target type.
        max: usize,
    },

    /// A fixed-width field (hash, address) has the wrong length.
    #[error("expected a {expected}-byte string, found {found} bytes")]
    FixedLength {
        /// Required width.
        expected: usize,
        /// Actual payload length.
        found: usize,
    },
}

/// Reasons a well-formed proof fails to prove a value.
#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum InvalidProofReason {
    /// The trie root to verify against is the zero hash.
    #[error("root hash is zero")]
    ZeroRoot,

    /// A node does not hash (or compare) to the commitment held by its parent.
    #[error("node at depth {depth} does not match its commitment {expected}")]
    CommitmentMismatch {
        /// Number of nodes visited before this one.
        depth: usize,
        /// Hex of the expected hash or embedded node.
        expected: String,
    },

    /// A hash commitment could not be matched since the node is missing.
    #[error("proof ended after {consumed} nodes while expecting node {expected:x}")]
    IncompleteProof {
        /// Number of proof nodes consumed.
        consumed: usize,
        /// Hash of the missing node.
        expected: H256,
    },

    /// A trie node is an RLP byte string rather than a list.
    #[error("trie node is not an RLP list")]
    NodeNotList,

    /// A trie node has neither 2 nor 17 children.
    #[error("trie node has {0} children (expected 2 or 17)")]
    UnexpectedChildCount(usize),

    /// The partial key of a leaf or extension diverges from the queried key.
    #[error("partial key diverges from the queried key at nibble {0}")]
    KeyMismatch(usize),

    /// The partial key of a leaf or extension is longer than the rest of the
    /// queried key.
    #[error("partial key of {needed} nibbles overruns the {remaining} remaining key nibbles")]
    KeyOverrun {
        /// Nibbles in the partial key.
        needed: usize,
        /// Nibbles left in the queried key.
        remaining: usize,
    },

    /// The key was fully consumed by a node flagged as an extension.
    #[error("key ends at an extension node")]
    ExpectedLeaf,

    /// A leaf was reached before the key was fully consumed.
    #[error("leaf reached with {0} key nibbles left")]
    ExpectedExtension(usize),

    /// A child reference is neither a 32-byte hash nor an embedded node.
    #[error("child reference of {0} bytes is neither a hash nor an embedded node")]
    InvalidChildReference(usize),

    /// The value slot of a leaf or branch holds a list.
    #[error("value slot holds a list")]
    ValueIsList,

    /// The compact encoding of a partial key is invalid.
    #[error(transparent)]
    HexPrefix(FromHexPrefixError),
}
