//! Walks a Merkle Patricia Trie proof from a root hash down to the value
//! stored under a key.
//!
//! The proof is the ordered list of RLP-encoded nodes on the path from the
//! root to the value, as returned by `eth_getProof`. Each node must match the
//! commitment held by its parent (the root hash for the first node). The walk
//! is a loop over that list, so its depth is bounded by the proof length and
//! never by the call stack.
//!
//! Embedded nodes (shorter than 32 bytes) live inside their parent. Provers
//! differ on whether they repeat them as separate proof elements. Both forms
//! are accepted: an embedded node is always decoded from the parent's bytes,
//! and an identical copy at the next proof position is consumed along with it.

use ethereum_types::H256;
use log::{debug, trace};

use crate::{
    error::{InvalidProofReason, ProofResult},
    nibbles::NibblePath,
    node::{NodeRef, TrieNode},
    rlp_item::RlpItem,
    utils::{PathSegment, ProofPath},
};

/// Verifies `proof` against `root` and returns the value stored under `key`.
///
/// The returned bytes are the payload of the value item (for account and
/// storage tries this is itself an RLP encoding) and borrow from `proof`.
pub fn verify<T: AsRef<[u8]>>(key: H256, root: H256, proof: &[T]) -> ProofResult<&[u8]> {
    walk(key, root, proof, None)
}

/// Like [`verify`], but also returns the sequence of nodes that was walked.
pub fn verify_with_path<T: AsRef<[u8]>>(
    key: H256,
    root: H256,
    proof: &[T],
) -> ProofResult<(&[u8], ProofPath)> {
    let mut path = ProofPath::default();
    let value = walk(key, root, proof, Some(&mut path))?;

    Ok((value, path))
}

fn walk<'a, T: AsRef<[u8]>>(
    key: H256,
    root: H256,
    proof: &'a [T],
    mut path_out: Option<&mut ProofPath>,
) -> ProofResult<&'a [u8]> {
    if root.is_zero() {
        return Err(InvalidProofReason::ZeroRoot.into());
    }

    let mut key_path = NibblePath::from_key(key);
    let mut nodes = proof.iter().map(|node| -> &'a [u8] { node.as_ref() }).peekable();
    let mut consumed = 0;
    let mut depth = 0;
    let mut expected = NodeRef::Hash(root);

    let mut record = |seg: PathSegment| {
        if let Some(p) = path_out.as_deref_mut() {
            p.append(seg);
        }
    };

    loop {
        let raw: &'a [u8] = match expected {
            NodeRef::Hash(hash) => {
                let raw = nodes
                    .next()
                    .ok_or(InvalidProofReason::IncompleteProof {
                        consumed,
                        expected: hash,
                    })?;
                consumed += 1;
                raw
            }
            NodeRef::Embedded(embedded) => {
                if nodes.peek() == Some(&embedded) {
                    nodes.next();
                    consumed += 1;
                }
                embedded
            }
        };

        if !expected.matches(raw) {
            return Err(InvalidProofReason::CommitmentMismatch {
                depth,
                expected: expected.to_string(),
            }
            .into());
        }

        let node = TrieNode::decode(raw)?;
        trace!(
            "Visiting {} node at depth {} (key nibble {})",
            node.node_type(),
            depth,
            key_path.cursor()
        );
        depth += 1;

        expected = match node {
            TrieNode::Branch { children, value } => match key_path.pop_front() {
                None => {
                    record(PathSegment::BranchValue);
                    return value_bytes(value);
                }
                Some(nib) => {
                    record(PathSegment::Branch(nib));
                    NodeRef::from_item(children[nib as usize])?
                }
            },
            TrieNode::Extension { path, child } => {
                key_path.strip_prefix(&path)?;
                record(PathSegment::Extension(path.nibbles().collect()));

                if key_path.is_exhausted() {
                    return Err(InvalidProofReason::ExpectedLeaf.into());
                }
                NodeRef::from_item(child)?
            }
            TrieNode::Leaf { path, value } => {
                key_path.strip_prefix(&path)?;
                record(PathSegment::Leaf(path.nibbles().collect()));

                if !key_path.is_exhausted() {
                    return Err(InvalidProofReason::ExpectedExtension(key_path.remaining()).into());
                }

                debug!(
                    "Verified key {:x} against root {:x} ({} of {} proof nodes used)",
                    key,
                    root,
                    consumed,
                    proof.len()
                );
                return value_bytes(value);
            }
        };
    }
}

fn value_bytes(value: RlpItem<'_>) -> ProofResult<&[u8]> {
    match value.is_list() {
        false => Ok(value.payload().as_slice()),
        true => Err(InvalidProofReason::ValueIsList.into()),
    }
}
