//! Constants and small helpers shared by the proof verifier, the governance
//! protocol and the tooling built on top of them.

use std::ops::Deref;

use ethereum_types::{Address, H256, U256};
use keccak_hash::keccak;
use serde::{Deserialize, Serialize};

/// The hash value of an account empty EVM code.
/// 0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470
pub const EMPTY_CODE_HASH: H256 = H256([
    197, 210, 70, 1, 134, 247, 35, 60, 146, 126, 125, 178, 220, 199, 3, 192, 229, 0, 182, 83, 202,
    130, 39, 59, 123, 250, 216, 4, 93, 133, 164, 112,
]);

/// The hash of an empty Merkle Patricia trie.
/// 0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421
pub const EMPTY_TRIE_HASH: H256 = H256([
    86, 232, 31, 23, 27, 204, 85, 166, 255, 131, 69, 230, 146, 192, 248, 110, 91, 72, 224, 27, 153,
    108, 173, 192, 1, 98, 47, 181, 227, 99, 180, 33,
]);

/// How far back the `BLOCKHASH` opcode can see. Older (and future) blocks
/// resolve to the zero hash on chain.
pub const BLOCKHASH_LOOKBACK: u64 = 256;

/// A single 32-byte ABI word, as produced by `abi.encode` for static types.
pub type AbiWord = [u8; 32];

/// Returns `true` if `number` is a block whose hash is still reachable from a
/// block executing at `current`.
pub const fn within_blockhash_window(current: u64, number: u64) -> bool {
    number < current && current - number <= BLOCKHASH_LOOKBACK
}

/// Left pads an address to a full word.
pub fn address_word(address: Address) -> AbiWord {
    let mut word = [0; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

/// Big-endian encoding of a `U256`.
pub fn u256_word(v: U256) -> AbiWord {
    let mut word = [0; 32];
    v.to_big_endian(&mut word);
    word
}

/// `abi.encode(bool)`.
pub fn bool_word(v: bool) -> AbiWord {
    let mut word = [0; 32];
    word[31] = v as u8;
    word
}

/// `keccak256(abi.encode(w_0, .., w_n))` for static words.
pub fn keccak_words(words: &[AbiWord]) -> H256 {
    keccak(words.concat())
}

/// A byte string that (de)serializes as a `0x`-prefixed hex string, the way
/// JSON-RPC returns data and proof nodes.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct HexBytes(#[serde(with = "hex")] pub Vec<u8>);

impl Deref for HexBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for HexBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for HexBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// `#[serde(with = "hex")]` for byte strings as JSON-RPC returns them, such as
/// the trie nodes of an `eth_getProof` response.
pub mod hex {
    use serde::{de::Error as _, Deserialize as _, Deserializer, Serializer};

    /// Writes `0x` followed by lowercase hex.
    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("0x{}", ::hex::encode(bytes)))
    }

    /// Reads a node or data string. Nodes dumped by hand often lack the `0x`,
    /// so it is optional.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let digits = s.strip_prefix("0x").unwrap_or(&s);

        ::hex::decode(digits).map_err(D::Error::custom)
    }
}

#[test]
fn test_empty_code_hash() {
    assert_eq!(EMPTY_CODE_HASH, keccak_hash::keccak([]));
}

#[test]
fn test_empty_trie_hash() {
    assert_eq!(
        EMPTY_TRIE_HASH,
        keccak_hash::keccak(bytes::Bytes::from_static(&rlp::NULL_RLP))
    );
}

#[test]
fn test_blockhash_window() {
    assert!(within_blockhash_window(1000, 999));
    assert!(within_blockhash_window(1000, 744));
    assert!(!within_blockhash_window(1000, 743));
    assert!(!within_blockhash_window(1000, 1000));
    assert!(!within_blockhash_window(1000, 1001));
    assert!(!within_blockhash_window(0, 0));
}

#[test]
fn test_words() {
    let addr = Address::repeat_byte(0xab);
    let word = address_word(addr);
    assert_eq!(&word[..12], &[0; 12]);
    assert_eq!(&word[12..], addr.as_bytes());

    assert_eq!(u256_word(U256::from(0x0102))[30..], [1, 2]);
    assert_eq!(bool_word(true)[31], 1);
    assert_eq!(bool_word(false), [0; 32]);
    assert_eq!(
        keccak_words(&[u256_word(U256::one()), bool_word(true)]),
        keccak([u256_word(U256::one()), bool_word(true)].concat())
    );
}

#[test]
fn test_hex_bytes_serde() {
    let bytes: HexBytes = serde_json::from_str("\"0xdeadbeef\"").unwrap();
    assert_eq!(&*bytes, &[0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(serde_json::to_string(&bytes).unwrap(), "\"0xdeadbeef\"");

    let unprefixed: HexBytes = serde_json::from_str("\"00ff\"").unwrap();
    assert_eq!(unprefixed.0, vec![0x00, 0xff]);

    assert!(serde_json::from_str::<HexBytes>("\"0xabc\"").is_err());
}
