#![allow(dead_code)]

use std::sync::Arc;

use eth_trie::{EthTrie, MemoryDB, Trie};
use ethereum_types::{Address, Bloom, H256, H64, U256};
use k256::ecdsa::SigningKey;
use keccak_hash::keccak;
use mpt_proof::storage_key;
use rlp::RlpStream;
use rlp_derive::RlpEncodable;
use supa_governance::{
    signature::{public_key_address, sign_digest},
    Call, CallBatch, Eip712Domain, ExecutionTokens, GovernanceConfig, InMemoryChain,
    ProposalId, ProposalRequest, Voting,
};

pub const TOKEN: Address = Address::repeat_byte(0x70);
pub const PROPOSAL_BLOCK: u64 = 17_000_000;
pub const START_TIME: u64 = 1_700_000_000;
pub const TOTAL_SUPPLY: u64 = 1000;

const BALANCES_SLOT: u64 = 0;
const TOTAL_SUPPLY_SLOT: u64 = 2;

#[derive(RlpEncodable)]
struct AccountEntry {
    nonce: u64,
    balance: U256,
    storage_root: H256,
    code_hash: H256,
}

pub fn common_setup() {
    // Try init since multiple tests calling `init` will cause an error.
    let _ = pretty_env_logger::try_init();
}

pub fn config() -> GovernanceConfig {
    GovernanceConfig::new(
        TOKEN,
        BALANCES_SLOT.into(),
        TOTAL_SUPPLY_SLOT.into(),
        Eip712Domain {
            name: "Supa Governance".to_string(),
            version: "1".to_string(),
            chain_id: 1,
            verifying_contract: Address::repeat_byte(0x60),
        },
    )
}

pub fn calls() -> CallBatch {
    CallBatch(vec![Call {
        to: TOKEN,
        value: U256::zero(),
        data: vec![0x40, 0xc1, 0x0f, 0x19].into(),
    }])
}

/// A token holder at the proposal block.
pub struct Voter {
    pub key: SigningKey,
    pub address: Address,
    pub balance: U256,
    pub proof: Vec<Vec<u8>>,
}

impl Voter {
    pub fn sign(
        &self,
        voting: &Voting<InMemoryChain, ExecutionTokens>,
        id: ProposalId,
        support: bool,
    ) -> Vec<u8> {
        sign_digest(&self.key, voting.vote_digest(id, support))
            .unwrap()
            .to_vec()
    }
}

/// Chain state at [`PROPOSAL_BLOCK`]: the token's storage, its account in the
/// state trie, and a header committing to that state.
pub struct Fixture {
    pub header: Vec<u8>,
    pub state_root: H256,
    pub storage_root: H256,
    pub account_proof: Vec<Vec<u8>>,
    pub total_supply_proof: Vec<Vec<u8>>,
    pub voters: Vec<Voter>,
}

fn create_truth_trie() -> EthTrie<MemoryDB> {
    EthTrie::new(Arc::new(MemoryDB::new(true)))
}

fn root_of(trie: &mut EthTrie<MemoryDB>) -> H256 {
    // Same type, re-exported from another `ethereum-types` version.
    H256(trie.root_hash().unwrap().0)
}

fn header_with_state_root(state_root: H256) -> Vec<u8> {
    let mut stream = RlpStream::new_list(15);
    stream
        .append(&H256::repeat_byte(1))
        .append(&H256::repeat_byte(2))
        .append(&Address::repeat_byte(3))
        .append(&state_root)
        .append(&H256::repeat_byte(4))
        .append(&H256::repeat_byte(5))
        .append(&Bloom::zero())
        .append(&U256::zero())
        .append(&PROPOSAL_BLOCK)
        .append(&30_000_000u64)
        .append(&15_000_000u64)
        .append(&(START_TIME - 120))
        .append(&Vec::<u8>::new())
        .append(&H256::repeat_byte(6))
        .append(&H64::zero());

    stream.out().to_vec()
}

impl Fixture {
    /// One voter per balance, with signing keys derived from their index.
    pub fn new(balances: &[u64]) -> Self {
        let config = config();

        let voters_without_proofs: Vec<_> = balances
            .iter()
            .enumerate()
            .map(|(i, balance)| {
                let key = SigningKey::from_slice(&[i as u8 + 1; 32]).unwrap();
                let address = public_key_address(key.verifying_key());
                (key, address, U256::from(*balance))
            })
            .collect();

        // Storage of the token.
        let mut storage = create_truth_trie();
        let mut set_slot = |slot: H256, value: U256| {
            storage
                .insert(storage_key(slot).as_bytes(), &rlp::encode(&value))
                .unwrap();
        };
        set_slot(config.total_supply_slot(), TOTAL_SUPPLY.into());
        for (_, address, balance) in &voters_without_proofs {
            set_slot(config.balance_slot(*address), *balance);
        }
        for i in 0..30u64 {
            set_slot(
                config.balance_slot(Address::from_low_u64_be(0xdead_0000 + i)),
                U256::from(i + 1),
            );
        }
        let storage_root = root_of(&mut storage);

        // State trie with the token and some other accounts.
        let mut state = create_truth_trie();
        let token_account = AccountEntry {
            nonce: 1,
            balance: U256::zero(),
            storage_root,
            code_hash: keccak(b"token code"),
        };
        state
            .insert(keccak(TOKEN).as_bytes(), &rlp::encode(&token_account))
            .unwrap();
        for i in 0..50u64 {
            let other = AccountEntry {
                nonce: i,
                balance: U256::from(i) * U256::exp10(18),
                storage_root: supa_common::EMPTY_TRIE_HASH,
                code_hash: supa_common::EMPTY_CODE_HASH,
            };
            state
                .insert(
                    keccak(Address::from_low_u64_be(i + 1)).as_bytes(),
                    &rlp::encode(&other),
                )
                .unwrap();
        }
        let state_root = root_of(&mut state);

        let account_proof = state.get_proof(keccak(TOKEN).as_bytes()).unwrap();
        let total_supply_proof = storage
            .get_proof(storage_key(config.total_supply_slot()).as_bytes())
            .unwrap();

        let voters = voters_without_proofs
            .into_iter()
            .map(|(key, address, balance)| {
                let proof = storage
                    .get_proof(storage_key(config.balance_slot(address)).as_bytes())
                    .unwrap();
                Voter {
                    key,
                    address,
                    balance,
                    proof,
                }
            })
            .collect();

        Self {
            header: header_with_state_root(state_root),
            state_root,
            storage_root,
            account_proof,
            total_supply_proof,
            voters,
        }
    }

    /// A chain ten blocks past [`PROPOSAL_BLOCK`] that knows its hash.
    pub fn chain(&self) -> InMemoryChain {
        let mut chain = InMemoryChain::new(PROPOSAL_BLOCK + 10, START_TIME);
        chain.set_block_hash(PROPOSAL_BLOCK, keccak(&self.header));
        chain
    }

    pub fn voting(&self) -> Voting<InMemoryChain, ExecutionTokens> {
        Voting::new(config(), self.chain(), ExecutionTokens::default()).unwrap()
    }

    pub fn request<'a>(&'a self, calls: &'a CallBatch) -> ProposalRequest<'a, Vec<u8>> {
        ProposalRequest {
            calls,
            block_number: PROPOSAL_BLOCK,
            header: &self.header,
            account_proof: &self.account_proof,
            total_supply_proof: &self.total_supply_proof,
        }
    }
}
