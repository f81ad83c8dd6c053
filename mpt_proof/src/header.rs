//! Reading the state root out of an RLP-encoded block header.

use ethereum_types::H256;
use keccak_hash::keccak;

use crate::{
    byte_view::ByteView,
    error::{MalformedReason, ProofResult},
    rlp_item::RlpItem,
};

/// Position of `stateRoot` among the header fields (after parent hash, ommers
/// hash and beneficiary).
pub const STATE_ROOT_FIELD_INDEX: usize = 3;

/// Byte offset of the state root payload in a mainnet header: a 3-byte list
/// header, two 33-byte hash items, a 21-byte address item and the 1-byte tag of
/// the state root itself.
///
/// Only valid while the header payload length takes exactly two bytes.
pub const LEGACY_STATE_ROOT_OFFSET: usize = 91;

/// The block hash, i.e. the hash of the complete header encoding.
pub fn block_hash(header: &[u8]) -> H256 {
    keccak(header)
}

/// Decodes the header list and returns its state root field.
pub fn state_root_from_header(header: &[u8]) -> ProofResult<H256> {
    let fields = RlpItem::from_slice(header)?
        .iter()?
        .take(STATE_ROOT_FIELD_INDEX + 1)
        .collect::<ProofResult<Vec<_>>>()?;

    match fields.get(STATE_ROOT_FIELD_INDEX) {
        Some(field) => field.to_h256(),
        None => Err(MalformedReason::ItemCount {
            expected: STATE_ROOT_FIELD_INDEX + 1,
            found: fields.len(),
        }
        .into()),
    }
}

/// Reads the 32 bytes at [`LEGACY_STATE_ROOT_OFFSET`] without decoding the
/// header. Does not check that they actually are the state root.
pub fn state_root_at_fixed_offset(header: &[u8]) -> ProofResult<H256> {
    ByteView::new(header).load_bytes32(LEGACY_STATE_ROOT_OFFSET)
}
