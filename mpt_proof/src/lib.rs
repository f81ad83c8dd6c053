//! Verification of Ethereum Merkle Patricia Trie proofs, as returned by
//! `eth_getProof`, without trusting the node that produced them.
//!
//! Given a trusted root (a block's state root, or an account's storage root),
//! [`verify`](verifier::verify) walks the supplied proof nodes from the root
//! down to the value stored under a key, checking every node against the hash
//! its parent commits to. On top of that, [`account`] decodes account leaves
//! and storage values, and [`header`] extracts the state root from a block
//! header whose hash is known.
//!
//! Everything is decoded lazily and in place: [`ByteView`](byte_view::ByteView)
//! and [`RlpItem`](rlp_item::RlpItem) are bounds checked windows into the
//! caller's buffers, and nothing is copied until a value is returned.

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]

pub mod account;
pub mod byte_view;
pub mod error;
pub mod header;
pub mod nibbles;
pub mod node;
pub mod rlp_item;
pub mod utils;
pub mod verifier;

#[cfg(test)]
pub(crate) mod testing_utils;

pub use account::{
    mapping_slot, simple_slot, storage_key, verify_account_proof, verify_storage_proof,
    AccountState,
};
pub use error::{ProofError, ProofResult};
pub use header::{block_hash, state_root_at_fixed_offset, state_root_from_header};
pub use verifier::{verify, verify_with_path};
