use std::sync::Arc;

use eth_trie::{EthTrie, MemoryDB, Trie};
use ethereum_types::H256;
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rlp::RlpStream;

use crate::nibbles::{encode_hex_prefix, Nibble};

/// Values at least this long keep every leaf above the embedding limit, so
/// `eth_trie` proofs contain one element per node on the path.
const MIN_VALUE_BYTES: usize = 33;
const MAX_VALUE_BYTES: usize = 80;

pub(crate) type TestEntry = (H256, Vec<u8>);

pub(crate) fn common_setup() {
    // Try init since multiple tests calling `init` will cause an error.
    let _ = pretty_env_logger::try_init();
}

pub(crate) fn random_entries(n: usize, seed: u64) -> Vec<TestEntry> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..n)
        .map(|_| {
            let key = H256(rng.gen());
            let len = rng.gen_range(MIN_VALUE_BYTES..MAX_VALUE_BYTES);
            let val = (0..len).map(|_| rng.gen()).collect();

            (key, val)
        })
        .collect()
}

fn create_truth_trie() -> EthTrie<MemoryDB> {
    let db = Arc::new(MemoryDB::new(true));
    EthTrie::new(db)
}

/// Inserts `entries` into an `eth_trie` instance and returns its root along
/// with one proof per entry, in the same order.
pub(crate) fn build_trie_and_proofs(entries: &[TestEntry]) -> (H256, Vec<Vec<Vec<u8>>>) {
    let mut truth_trie = create_truth_trie();

    for (k, v) in entries {
        truth_trie.insert(k.as_bytes(), v).unwrap();
    }

    // Both of these types are identical except that one is re-exported from a
    // different version of `ethereum-types`.
    let root = H256(truth_trie.root_hash().unwrap().0);

    let proofs = entries
        .iter()
        .map(|(k, _)| truth_trie.get_proof(k.as_bytes()).unwrap())
        .collect::<Vec<_>>();

    info!(
        "Built reference trie with {} entries (root: {:x})",
        entries.len(),
        root
    );

    (root, proofs)
}

pub(crate) fn key_nibbles(key: H256) -> Vec<Nibble> {
    key.as_bytes()
        .iter()
        .flat_map(|b| [b >> 4, b & 0x0f])
        .collect()
}

pub(crate) fn leaf_node(nibbles: &[Nibble], value: &[u8]) -> Vec<u8> {
    let mut stream = RlpStream::new_list(2);
    stream.append(&encode_hex_prefix(nibbles, true));
    stream.append(&value.to_vec());

    stream.out().to_vec()
}

/// `child` is appended as is, so it must already be an RLP item (an encoded
/// hash or a short node).
pub(crate) fn extension_node(nibbles: &[Nibble], child: &[u8]) -> Vec<u8> {
    let mut stream = RlpStream::new_list(2);
    stream.append(&encode_hex_prefix(nibbles, false));
    stream.append_raw(child, 1);

    stream.out().to_vec()
}

pub(crate) fn branch_node(children: [Option<Vec<u8>>; 16], value: Option<&[u8]>) -> Vec<u8> {
    let mut stream = RlpStream::new_list(17);

    for child in children.iter() {
        match child {
            Some(raw) => stream.append_raw(raw, 1),
            None => stream.append_empty_data(),
        };
    }

    match value {
        Some(v) => stream.append(&v.to_vec()),
        None => stream.append_empty_data(),
    };

    stream.out().to_vec()
}
