//! Nibble paths through the trie and the hex-prefix ("compact") encoding of
//! partial keys stored in leaf and extension nodes.

use std::fmt::{self, Display};

use ethereum_types::H256;
use thiserror::Error;

use crate::error::{InvalidProofReason, ProofResult};

// Use a whole byte for a Nibble just for convenience
/// A Nibble has 4 bits and is stored as `u8`.
pub type Nibble = u8;

/// Number of nibbles in a full 32-byte trie key.
pub const KEY_NIBBLES: usize = 64;

/// A hex-prefix encoding never exceeds a 64 nibble path plus its flag byte.
const MAX_HEX_PREFIX_BYTES: usize = 33;

#[derive(Clone, Debug, Eq, Error, PartialEq, Hash)]
/// Errors encountered when converting from bytes to a key path.
pub enum BytesToNibblesError {
    #[error("Tried constructing a key path from a byte slice with more than 32 bytes (len: {0})")]
    /// The slice is too large.
    TooManyBytes(usize),
}

#[derive(Clone, Debug, Eq, Error, PartialEq, Hash)]
/// Errors encountered when decoding a hex prefix encoding.
pub enum FromHexPrefixError {
    #[error("Tried to decode an empty hex prefix byte string")]
    /// There is not even a flag byte.
    Empty,

    #[error("Tried to decode a hex prefix byte string with invalid flags at the start: {0:#06b}")]
    /// The hex prefix encoding flag is invalid.
    InvalidFlags(Nibble),

    #[error("Tried to decode an even-length hex prefix byte string with a non-zero padding nibble: {0:#x}")]
    /// Even-length paths must pad the flag byte with a zero nibble.
    NonZeroPadding(Nibble),

    #[error("Tried to decode a hex prefix byte string longer than 33 bytes (length: {0})")]
    /// The hex prefix encoding is too large.
    TooLong(usize),
}

/// The 64-nibble path of a 32-byte key, with a cursor marking how much of it
/// the trie walk has consumed so far.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NibblePath {
    nibbles: [Nibble; KEY_NIBBLES],
    cursor: usize,
}

impl NibblePath {
    /// Splits `key` into nibbles, high nibble first.
    pub fn from_key(key: H256) -> Self {
        let mut nibbles = [0; KEY_NIBBLES];
        for (i, b) in key.as_bytes().iter().enumerate() {
            nibbles[2 * i] = b >> 4;
            nibbles[2 * i + 1] = b & 0x0f;
        }

        Self { nibbles, cursor: 0 }
    }

    /// Like [`Self::from_key`], but accepts keys shorter than 32 bytes, which
    /// are left padded with zeros like an integer would be.
    pub fn from_key_bytes(key: &[u8]) -> Result<Self, BytesToNibblesError> {
        if key.len() > 32 {
            return Err(BytesToNibblesError::TooManyBytes(key.len()));
        }

        let mut padded = H256::zero();
        padded.as_bytes_mut()[32 - key.len()..].copy_from_slice(key);

        Ok(Self::from_key(padded))
    }

    /// Number of nibbles consumed so far.
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of nibbles not yet consumed.
    pub const fn remaining(&self) -> usize {
        KEY_NIBBLES - self.cursor
    }

    /// Returns `true` once every nibble has been consumed.
    pub const fn is_exhausted(&self) -> bool {
        self.cursor == KEY_NIBBLES
    }

    /// Consumes and returns the next nibble.
    pub fn pop_front(&mut self) -> Option<Nibble> {
        let n = self.nibbles.get(self.cursor).copied()?;
        self.cursor += 1;

        Some(n)
    }

    /// Consumes the partial key `prefix`, which must match the next nibbles of
    /// the path exactly. The cursor does not move on failure.
    pub fn strip_prefix(&mut self, prefix: &HexPrefix<'_>) -> ProofResult<()> {
        let needed = prefix.len();
        if needed > self.remaining() {
            return Err(InvalidProofReason::KeyOverrun {
                needed,
                remaining: self.remaining(),
            }
            .into());
        }

        let ours = &self.nibbles[self.cursor..self.cursor + needed];
        if let Some(i) = ours.iter().zip(prefix.nibbles()).position(|(a, b)| *a != b) {
            return Err(InvalidProofReason::KeyMismatch(self.cursor + i).into());
        }

        self.cursor += needed;
        Ok(())
    }
}

/// A decoded hex-prefix partial key, borrowing the encoded bytes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct HexPrefix<'a> {
    is_leaf: bool,
    odd_nibble: Option<Nibble>,
    rest: &'a [u8],
}

impl<'a> HexPrefix<'a> {
    /// Decodes a hex prefix byte string.
    ///
    /// The high nibble of the first byte carries the flags; the low nibble is
    /// either the first path nibble (odd length) or zero padding (even length).
    pub fn decode(hex_prefix_bytes: &'a [u8]) -> Result<Self, FromHexPrefixError> {
        let (&first, rest) = hex_prefix_bytes
            .split_first()
            .ok_or(FromHexPrefixError::Empty)?;

        if hex_prefix_bytes.len() > MAX_HEX_PREFIX_BYTES {
            return Err(FromHexPrefixError::TooLong(hex_prefix_bytes.len()));
        }

        let flag_bits = first >> 4;
        let low = first & 0x0f;

        // is_odd --> 0b01
        // is_leaf --> 0b10
        let (is_leaf, is_odd) = match flag_bits {
            0b00 => (false, false),
            0b01 => (false, true),
            0b10 => (true, false),
            0b11 => (true, true),
            _ => return Err(FromHexPrefixError::InvalidFlags(flag_bits)),
        };

        if !is_odd && low != 0 {
            return Err(FromHexPrefixError::NonZeroPadding(low));
        }

        Ok(Self {
            is_leaf,
            odd_nibble: is_odd.then_some(low),
            rest,
        })
    }

    /// Whether the node holding this key is a leaf (terminator flag set).
    pub const fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    /// Number of nibbles in the partial key.
    pub const fn len(&self) -> usize {
        self.rest.len() * 2 + self.odd_nibble.is_some() as usize
    }

    /// Returns `true` for a zero-length partial key.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The nibbles of the partial key, in path order.
    pub fn nibbles(&self) -> impl Iterator<Item = Nibble> + 'a {
        let rest = self.rest;
        self.odd_nibble
            .into_iter()
            .chain(rest.iter().flat_map(|&b| [b >> 4, b & 0x0f]))
    }
}

impl Display for HexPrefix<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for n in self.nibbles() {
            write!(f, "{:x}", n)?;
        }

        Ok(())
    }
}

/// Encodes `nibbles` (each `< 16`) into hex-prefix form with the leaf flag
/// set as requested.
pub fn encode_hex_prefix(nibbles: &[Nibble], is_leaf: bool) -> Vec<u8> {
    let is_odd = nibbles.len() % 2 == 1;
    let flags: u8 = ((is_odd as u8) | ((is_leaf as u8) << 1)) << 4;

    let (first, rest) = match is_odd {
        true => (flags | nibbles[0], &nibbles[1..]),
        false => (flags, nibbles),
    };

    let mut bytes = Vec::with_capacity(1 + rest.len() / 2);
    bytes.push(first);
    bytes.extend(rest.chunks_exact(2).map(|pair| (pair[0] << 4) | pair[1]));

    bytes
}
