//! EIP-712 typed-data hashing for off-chain votes and recovery of the voter
//! from a secp256k1 signature over it.

use ethereum_types::{Address, H256, U256};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use keccak_hash::keccak;
use serde::{Deserialize, Serialize};
use supa_common::{address_word, bool_word, keccak_words, u256_word};
use thiserror::Error;

use crate::proposal::ProposalId;

/// `EIP712Domain` type string, as hashed into the domain type hash.
pub const EIP712_DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// Type string of the signed vote.
pub const VOTE_TYPE: &str = "Vote(uint256 proposalId,bool support)";

/// Length of an `r || s || v` signature.
pub const SIGNATURE_LEN: usize = 65;

#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
/// Reasons a vote signature is rejected.
pub enum SignatureError {
    #[error("signature must be 65 bytes, got {0}")]
    /// Not an `r || s || v` signature.
    Length(usize),

    #[error("invalid recovery byte {0} (expected 0, 1, 27 or 28)")]
    /// `v` is not one of the accepted encodings.
    RecoveryByte(u8),

    #[error("signature s value is in the upper half of the curve order")]
    /// Malleable form of an otherwise valid signature.
    HighS,

    #[error("no public key can be recovered from the signature")]
    /// `r` or `s` is out of range, or no point matches.
    Unrecoverable,
}

/// The EIP-712 domain the votes are signed for.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Domain {
    /// Human readable name of the signing domain.
    pub name: String,
    /// Version of the signing domain.
    pub version: String,
    /// Chain the votes are valid on.
    pub chain_id: u64,
    /// Address of the voting contract.
    pub verifying_contract: Address,
}

impl Eip712Domain {
    /// `hashStruct(domain)`.
    pub fn separator(&self) -> H256 {
        keccak_words(&[
            keccak(EIP712_DOMAIN_TYPE).0,
            keccak(&self.name).0,
            keccak(&self.version).0,
            u256_word(U256::from(self.chain_id)),
            address_word(self.verifying_contract),
        ])
    }
}

/// `hashStruct(Vote { proposalId, support })`.
pub fn vote_struct_hash(proposal_id: ProposalId, support: bool) -> H256 {
    keccak_words(&[
        keccak(VOTE_TYPE).0,
        u256_word(U256::from(proposal_id)),
        bool_word(support),
    ])
}

/// The digest a voter signs: `keccak256("\x19\x01" || separator || hashStruct(vote))`.
pub fn vote_digest(domain_separator: H256, proposal_id: ProposalId, support: bool) -> H256 {
    let mut preimage = Vec::with_capacity(66);
    preimage.extend_from_slice(&[0x19, 0x01]);
    preimage.extend_from_slice(domain_separator.as_bytes());
    preimage.extend_from_slice(vote_struct_hash(proposal_id, support).as_bytes());

    keccak(preimage)
}

/// The Ethereum address controlled by `key`.
pub fn public_key_address(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    // Skip the 0x04 SEC1 tag.
    let hash = keccak(&point.as_bytes()[1..]);

    Address::from_slice(&hash.as_bytes()[12..])
}

/// Recovers the signer of `digest` from an `r || s || v` signature.
///
/// `v` may be given as 0/1 or as 27/28. Signatures with a high `s` are
/// rejected so that each vote has exactly one valid encoding.
pub fn recover_signer(digest: H256, signature: &[u8]) -> Result<Address, SignatureError> {
    if signature.len() != SIGNATURE_LEN {
        return Err(SignatureError::Length(signature.len()));
    }

    let v = signature[64];
    let recovery_id = match v {
        0 | 1 => v,
        27 | 28 => v - 27,
        _ => return Err(SignatureError::RecoveryByte(v)),
    };
    let recovery_id = RecoveryId::from_byte(recovery_id).ok_or(SignatureError::RecoveryByte(v))?;

    let sig = Signature::from_slice(&signature[..64]).map_err(|_| SignatureError::Unrecoverable)?;
    if sig.normalize_s().is_some() {
        return Err(SignatureError::HighS);
    }

    let key = VerifyingKey::recover_from_prehash(digest.as_bytes(), &sig, recovery_id)
        .map_err(|_| SignatureError::Unrecoverable)?;

    Ok(public_key_address(&key))
}

/// Signs `digest`, returning `r || s || v` with `v` in 27/28 form.
pub fn sign_digest(key: &SigningKey, digest: H256) -> Result<[u8; SIGNATURE_LEN], SignatureError> {
    let (sig, recovery_id) = key
        .sign_prehash_recoverable(digest.as_bytes())
        .map_err(|_| SignatureError::Unrecoverable)?;

    let mut out = [0; SIGNATURE_LEN];
    out[..64].copy_from_slice(&sig.to_bytes());
    out[64] = 27 + recovery_id.to_byte();

    Ok(out)
}
