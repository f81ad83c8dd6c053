//! Account and storage proofs: the two `eth_getProof` lookups built on top of
//! [`verify`](crate::verifier::verify).
//!
//! Both tries are "secure" tries. The state trie keys an account by
//! `keccak(address)` and a storage trie keys a slot by `keccak(slot)`, so the
//! path walked is always the full 64 nibbles of a hash.

use ethereum_types::{Address, H256, U256};
use keccak_hash::keccak;
use log::debug;
use supa_common::{address_word, keccak_words, u256_word};

use crate::{error::ProofResult, rlp_item::RlpItem, verifier::verify};

/// The four fields of an account leaf in the state trie.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct AccountState {
    /// Number of transactions sent (or contracts created) by the account.
    pub nonce: u64,
    /// Ether balance, in wei.
    pub balance: U256,
    /// Root of the account's storage trie.
    pub storage_root: H256,
    /// Hash of the account's code.
    pub code_hash: H256,
}

impl AccountState {
    /// Decodes the RLP list `[nonce, balance, storage_root, code_hash]`.
    pub fn decode(raw: &[u8]) -> ProofResult<Self> {
        let [nonce, balance, storage_root, code_hash] = RlpItem::from_slice(raw)?.to_list::<4>()?;

        Ok(Self {
            nonce: nonce.to_u64()?,
            balance: balance.to_u256()?,
            storage_root: storage_root.to_h256()?,
            code_hash: code_hash.to_h256()?,
        })
    }
}

/// Path of `address` in the state trie.
pub fn account_key(address: Address) -> H256 {
    keccak(address)
}

/// Path of storage slot `slot` in a storage trie.
pub fn storage_key(slot: H256) -> H256 {
    keccak(slot)
}

/// The storage slot of `mapping[holder]` for a Solidity mapping declared at
/// slot `declared_slot`, i.e. `keccak256(abi.encode(holder, declared_slot))`.
pub fn mapping_slot(holder: Address, declared_slot: U256) -> H256 {
    keccak_words(&[address_word(holder), u256_word(declared_slot)])
}

/// The storage slot of a plain (non-mapping) state variable.
pub fn simple_slot(slot: U256) -> H256 {
    H256(u256_word(slot))
}

/// Verifies an account proof against a block's state root.
pub fn verify_account_proof<T: AsRef<[u8]>>(
    address: Address,
    state_root: H256,
    proof: &[T],
) -> ProofResult<AccountState> {
    let raw = verify(account_key(address), state_root, proof)?;
    let account = AccountState::decode(raw)?;

    debug!(
        "Proved account {:x}: nonce {}, balance {}, storage root {:x}",
        address, account.nonce, account.balance, account.storage_root
    );

    Ok(account)
}

/// Verifies a storage proof against an account's storage root and returns the
/// slot's value.
///
/// Zero-valued slots are not present in the trie, so they cannot be proven
/// here and fail like any other missing key.
pub fn verify_storage_proof<T: AsRef<[u8]>>(
    slot: H256,
    storage_root: H256,
    proof: &[T],
) -> ProofResult<U256> {
    let raw = verify(storage_key(slot), storage_root, proof)?;
    let value = RlpItem::from_slice(raw)?.to_u256()?;

    debug!("Proved slot {:x} = {}", slot, value);

    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use eth_trie::{EthTrie, MemoryDB, Trie};
    use ethereum_types::{Address, H256, U256};
    use hex_literal::hex;
    use keccak_hash::keccak;
    use rlp_derive::RlpEncodable;

    use super::{
        mapping_slot, simple_slot, storage_key, verify_account_proof, verify_storage_proof,
        AccountState,
    };
    use crate::{
        error::{MalformedReason, ProofError},
        testing_utils::common_setup,
    };

    #[derive(RlpEncodable)]
    struct AccountEntry {
        nonce: u64,
        balance: U256,
        storage_root: H256,
        code_hash: H256,
    }

    fn create_truth_trie() -> EthTrie<MemoryDB> {
        EthTrie::new(Arc::new(MemoryDB::new(true)))
    }

    fn root_of(trie: &mut EthTrie<MemoryDB>) -> H256 {
        H256(trie.root_hash().unwrap().0)
    }

    /// A storage trie holding `slot -> value` pairs the way a contract stores
    /// them: path `keccak(slot)`, leaf value `rlp(value)`.
    fn storage_trie(slots: &[(H256, U256)]) -> EthTrie<MemoryDB> {
        let mut trie = create_truth_trie();
        for (slot, value) in slots {
            trie.insert(storage_key(*slot).as_bytes(), &rlp::encode(value))
                .unwrap();
        }
        trie
    }

    #[test]
    fn mapping_slot_matches_solidity_layout() {
        // keccak256(abi.encode(address(0x...01), uint256(0)))
        let holder = Address::from_low_u64_be(1);
        let mut preimage = [0u8; 64];
        preimage[31] = 1;
        assert_eq!(mapping_slot(holder, U256::zero()), keccak(preimage));

        assert_eq!(
            simple_slot(U256::from(2)),
            H256(hex!(
                "0000000000000000000000000000000000000000000000000000000000000002"
            ))
        );
    }

    #[test]
    fn account_proof_decodes_all_fields() {
        common_setup();

        let accounts: Vec<_> = (1..=40u64)
            .map(|i| {
                let address = Address::from_low_u64_be(i * 7919);
                let entry = AccountEntry {
                    nonce: i,
                    balance: U256::from(i) * U256::exp10(18),
                    storage_root: H256::from_low_u64_be(i),
                    code_hash: supa_common::EMPTY_CODE_HASH,
                };
                (address, entry)
            })
            .collect();

        let mut trie = create_truth_trie();
        for (address, entry) in &accounts {
            trie.insert(keccak(address).as_bytes(), &rlp::encode(entry))
                .unwrap();
        }
        let state_root = root_of(&mut trie);

        for (address, entry) in &accounts {
            let proof = trie.get_proof(keccak(address).as_bytes()).unwrap();
            let account = verify_account_proof(*address, state_root, &proof).unwrap();

            assert_eq!(
                account,
                AccountState {
                    nonce: entry.nonce,
                    balance: entry.balance,
                    storage_root: entry.storage_root,
                    code_hash: entry.code_hash,
                }
            );
        }

        // Right proof, wrong account.
        let proof = trie.get_proof(keccak(accounts[0].0).as_bytes()).unwrap();
        assert!(verify_account_proof(accounts[1].0, state_root, &proof).is_err());
    }

    #[test]
    fn storage_proof_returns_scalar() {
        common_setup();

        let total_supply_slot = simple_slot(U256::from(2));
        let holders: Vec<_> = (0..20u64).map(|i| Address::from_low_u64_be(0xabc0 + i)).collect();

        let mut slots = vec![(total_supply_slot, U256::from(1_000_000u64))];
        slots.extend(
            holders
                .iter()
                .enumerate()
                .map(|(i, h)| (mapping_slot(*h, U256::zero()), U256::from(i as u64 + 1))),
        );

        let mut trie = storage_trie(&slots);
        let storage_root = root_of(&mut trie);

        for (slot, value) in &slots {
            let proof = trie.get_proof(storage_key(*slot).as_bytes()).unwrap();
            assert_eq!(
                verify_storage_proof(*slot, storage_root, &proof).unwrap(),
                *value
            );
        }
    }

    #[test]
    fn storage_value_must_be_a_scalar() {
        common_setup();

        let slot = simple_slot(U256::one());
        let mut trie = create_truth_trie();
        trie.insert(storage_key(slot).as_bytes(), &rlp::encode(&vec![1u8; 33]))
            .unwrap();
        let storage_root = root_of(&mut trie);
        let proof = trie.get_proof(storage_key(slot).as_bytes()).unwrap();

        assert_eq!(
            verify_storage_proof(slot, storage_root, &proof),
            Err(ProofError::MalformedRlp(MalformedReason::ScalarTooLong {
                len: 33,
                max: 32
            }))
        );
    }

    #[test]
    fn account_with_wrong_field_count_is_rejected() {
        let raw = rlp::encode_list::<u64, u64>(&[1, 2, 3]);
        assert_eq!(
            AccountState::decode(&raw),
            Err(ProofError::MalformedRlp(MalformedReason::ItemCount {
                expected: 4,
                found: 3
            }))
        );
    }
}
