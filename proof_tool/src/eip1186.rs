//! Offline checking of `eth_getProof` (EIP-1186) responses.
//!
//! The node's claims are re-derived from the proofs alone, given a state root
//! the caller trusts (typically read from a block header).

use ethereum_types::{Address, H256, U256, U64};
use mpt_proof::{simple_slot, verify_account_proof, verify_storage_proof, AccountState, ProofError};
use serde::{Deserialize, Serialize};
use supa_common::HexBytes;

/// The result object of `eth_getProof`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProofResponse {
    pub address: Address,
    pub account_proof: Vec<HexBytes>,
    pub balance: U256,
    pub code_hash: H256,
    pub nonce: U64,
    pub storage_hash: H256,
    #[serde(default)]
    pub storage_proof: Vec<StorageProofEntry>,
}

/// One requested storage slot.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct StorageProofEntry {
    pub key: U256,
    pub value: U256,
    pub proof: Vec<HexBytes>,
}

/// What the proofs say about one claimed slot value.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SlotOutcome {
    /// The proof shows the claimed value.
    Proven,
    /// The proof shows a different value.
    Mismatch { proven: U256 },
    /// The claimed value is zero. Zero slots are absent from the trie and
    /// only an exclusion proof could back the claim, which is not checked.
    ZeroUnchecked,
    /// The proof does not verify.
    Unproven { reason: String },
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SlotReport {
    pub key: U256,
    pub claimed: U256,
    #[serde(flatten)]
    pub outcome: SlotOutcome,
}

/// Outcome of checking a whole response.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofReport {
    pub address: Address,
    pub state_root: H256,
    /// Account fields whose claimed value differs from the proven one.
    pub mismatched_fields: Vec<&'static str>,
    pub slots: Vec<SlotReport>,
}

impl ProofReport {
    /// `true` if nothing the node claimed contradicts the proofs.
    pub fn is_valid(&self) -> bool {
        self.mismatched_fields.is_empty()
            && self.slots.iter().all(|s| {
                matches!(s.outcome, SlotOutcome::Proven | SlotOutcome::ZeroUnchecked)
            })
    }
}

impl AccountProofResponse {
    /// The account as claimed by the node.
    pub fn claimed_account(&self) -> AccountState {
        AccountState {
            nonce: self.nonce.as_u64(),
            balance: self.balance,
            storage_root: self.storage_hash,
            code_hash: self.code_hash,
        }
    }

    /// Verifies the account proof against `state_root`, then every storage
    /// proof against the proven storage root.
    ///
    /// Fails only if the account itself cannot be proven. Problems with
    /// individual slots are reported per slot.
    pub fn check(&self, state_root: H256) -> Result<ProofReport, ProofError> {
        let proven = verify_account_proof(self.address, state_root, &self.account_proof)?;
        let claimed = self.claimed_account();

        let mut mismatched_fields = Vec::new();
        if proven.nonce != claimed.nonce {
            mismatched_fields.push("nonce");
        }
        if proven.balance != claimed.balance {
            mismatched_fields.push("balance");
        }
        if proven.storage_root != claimed.storage_root {
            mismatched_fields.push("storageHash");
        }
        if proven.code_hash != claimed.code_hash {
            mismatched_fields.push("codeHash");
        }

        let slots = self
            .storage_proof
            .iter()
            .map(|entry| SlotReport {
                key: entry.key,
                claimed: entry.value,
                outcome: check_slot(entry, proven.storage_root),
            })
            .collect();

        Ok(ProofReport {
            address: self.address,
            state_root,
            mismatched_fields,
            slots,
        })
    }
}

fn check_slot(entry: &StorageProofEntry, storage_root: H256) -> SlotOutcome {
    match verify_storage_proof(simple_slot(entry.key), storage_root, &entry.proof) {
        Ok(proven) if proven == entry.value => SlotOutcome::Proven,
        Ok(proven) => SlotOutcome::Mismatch { proven },
        Err(_) if entry.value.is_zero() => SlotOutcome::ZeroUnchecked,
        Err(e) => SlotOutcome::Unproven {
            reason: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use eth_trie::{EthTrie, MemoryDB, Trie};
    use ethereum_types::{Address, H256, U256};
    use keccak_hash::keccak;
    use mpt_proof::{simple_slot, storage_key};
    use rlp_derive::RlpEncodable;
    use serde_json::json;

    use super::{AccountProofResponse, SlotOutcome};

    #[derive(RlpEncodable)]
    struct AccountEntry {
        nonce: u64,
        balance: U256,
        storage_root: H256,
        code_hash: H256,
    }

    const CONTRACT: Address = Address::repeat_byte(0x42);

    fn hex_nodes(proof: &[Vec<u8>]) -> Vec<String> {
        proof
            .iter()
            .map(|node| format!("0x{}", hex::encode(node)))
            .collect()
    }

    /// An `eth_getProof` response for slots 0 (= 7) and 1 (unset) of
    /// [`CONTRACT`], and the state root it was taken at.
    fn response() -> (serde_json::Value, H256) {
        let mut storage = EthTrie::new(Arc::new(MemoryDB::new(true)));
        storage
            .insert(
                storage_key(simple_slot(U256::zero())).as_bytes(),
                &rlp::encode(&U256::from(7)),
            )
            .unwrap();
        for i in 2..20u64 {
            storage
                .insert(
                    storage_key(simple_slot(i.into())).as_bytes(),
                    &rlp::encode(&U256::from(i * 1000)),
                )
                .unwrap();
        }
        let storage_root = H256(storage.root_hash().unwrap().0);

        let mut state = EthTrie::new(Arc::new(MemoryDB::new(true)));
        let code_hash = keccak(b"code");
        let account = AccountEntry {
            nonce: 3,
            balance: U256::from(1_000_000),
            storage_root,
            code_hash,
        };
        state
            .insert(keccak(CONTRACT).as_bytes(), &rlp::encode(&account))
            .unwrap();
        for i in 0..20u64 {
            let other = AccountEntry {
                nonce: i,
                balance: U256::from(i),
                storage_root: supa_common::EMPTY_TRIE_HASH,
                code_hash: supa_common::EMPTY_CODE_HASH,
            };
            state
                .insert(
                    keccak(Address::from_low_u64_be(i)).as_bytes(),
                    &rlp::encode(&other),
                )
                .unwrap();
        }
        let state_root = H256(state.root_hash().unwrap().0);

        let account_proof = state.get_proof(keccak(CONTRACT).as_bytes()).unwrap();
        let slot0_proof = storage
            .get_proof(storage_key(simple_slot(U256::zero())).as_bytes())
            .unwrap();
        let slot1_proof = storage
            .get_proof(storage_key(simple_slot(U256::one())).as_bytes())
            .unwrap();

        let value = json!({
            "address": format!("{:?}", CONTRACT),
            "accountProof": hex_nodes(&account_proof),
            "balance": "0xf4240",
            "codeHash": format!("{:?}", code_hash),
            "nonce": "0x3",
            "storageHash": format!("{:?}", storage_root),
            "storageProof": [
                { "key": "0x0", "value": "0x7", "proof": hex_nodes(&slot0_proof) },
                { "key": "0x1", "value": "0x0", "proof": hex_nodes(&slot1_proof) },
            ],
        });

        (value, state_root)
    }

    fn parse(value: serde_json::Value) -> AccountProofResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn honest_response_checks_out() {
        let (value, state_root) = response();
        let report = parse(value).check(state_root).unwrap();

        assert!(report.is_valid());
        assert!(report.mismatched_fields.is_empty());
        assert_eq!(report.slots[0].outcome, SlotOutcome::Proven);
        assert_eq!(report.slots[1].outcome, SlotOutcome::ZeroUnchecked);
    }

    #[test]
    fn lying_about_account_fields_is_caught() {
        let (mut value, state_root) = response();
        value["balance"] = json!("0xf4241");
        value["nonce"] = json!("0x4");

        let report = parse(value).check(state_root).unwrap();

        assert!(!report.is_valid());
        assert_eq!(report.mismatched_fields, vec!["nonce", "balance"]);
    }

    #[test]
    fn lying_about_slot_values_is_caught() {
        let (mut value, state_root) = response();
        value["storageProof"][0]["value"] = json!("0x8");
        value["storageProof"][1]["value"] = json!("0x1");

        let report = parse(value).check(state_root).unwrap();

        assert!(!report.is_valid());
        assert_eq!(
            report.slots[0].outcome,
            SlotOutcome::Mismatch {
                proven: U256::from(7)
            }
        );
        assert!(matches!(
            report.slots[1].outcome,
            SlotOutcome::Unproven { .. }
        ));
    }

    #[test]
    fn wrong_state_root_fails_the_account() {
        let (value, _) = response();

        assert!(parse(value).check(H256::repeat_byte(1)).is_err());
    }

    #[test]
    fn storage_proof_defaults_to_empty() {
        let value = json!({
            "address": "0x0000000000000000000000000000000000000001",
            "accountProof": ["0x80"],
            "balance": "0x0",
            "codeHash": "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470",
            "nonce": "0x0",
            "storageHash": "0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421",
        });

        let response = parse(value);
        assert!(response.storage_proof.is_empty());
        assert_eq!(response.account_proof[0].0, vec![0x80]);
        assert_eq!(
            response.claimed_account().code_hash,
            supa_common::EMPTY_CODE_HASH
        );
    }
}
