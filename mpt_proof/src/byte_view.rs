//! A bounds-checked, non-owning window over an immutable byte buffer.
//!
//! Every decoder in this crate works on [`ByteView`]s that borrow from the
//! proof nodes handed in by the caller, so verification never copies node
//! bytes around. All derived views stay within their parent, and any access
//! past the end is reported as [`MalformedReason::OutOfBounds`] instead of
//! being truncated.

use std::{
    fmt::{self, Display},
    mem::size_of,
};

use ethereum_types::H256;
use keccak_hash::keccak;

use crate::error::{MalformedReason, ProofResult};

/// A view into a byte buffer: a start and a length.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct ByteView<'a> {
    bytes: &'a [u8],
}

impl<'a> ByteView<'a> {
    /// Creates a view over the whole of `bytes`.
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Number of bytes in the view.
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the view covers no bytes.
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The underlying bytes, with the lifetime of the buffer rather than of
    /// the view.
    pub const fn as_slice(&self) -> &'a [u8] {
        self.bytes
    }

    /// Returns the sub-view `[offset, offset + len)`.
    pub fn slice(&self, offset: usize, len: usize) -> ProofResult<ByteView<'a>> {
        let end = offset
            .checked_add(len)
            .filter(|end| *end <= self.len())
            .ok_or(self.out_of_bounds(offset, len))?;

        Ok(Self::new(&self.bytes[offset..end]))
    }

    /// Returns the sub-view starting at `offset` and running to the end.
    pub fn skip(&self, offset: usize) -> ProofResult<ByteView<'a>> {
        let len = self
            .len()
            .checked_sub(offset)
            .ok_or(self.out_of_bounds(offset, 0))?;

        self.slice(offset, len)
    }

    /// Splits the view in two at `mid`.
    pub fn split_at(&self, mid: usize) -> ProofResult<(ByteView<'a>, ByteView<'a>)> {
        Ok((self.slice(0, mid)?, self.skip(mid)?))
    }

    /// Reads the byte at `offset`.
    pub fn load_u8(&self, offset: usize) -> ProofResult<u8> {
        self.bytes
            .get(offset)
            .copied()
            .ok_or(self.out_of_bounds(offset, 1).into())
    }

    /// Reads 32 bytes starting at `offset`. At least 32 bytes must remain.
    pub fn load_bytes32(&self, offset: usize) -> ProofResult<H256> {
        let word = self.slice(offset, 32)?;
        Ok(H256::from_slice(word.as_slice()))
    }

    /// Reads `len` bytes at `offset` as a big-endian unsigned integer.
    pub fn load_be_usize(&self, offset: usize, len: usize) -> ProofResult<usize> {
        if len > size_of::<usize>() {
            return Err(MalformedReason::LengthOverflow(len).into());
        }

        let bytes = self.slice(offset, len)?;
        Ok(bytes
            .as_slice()
            .iter()
            .fold(0, |acc, b| (acc << 8) | *b as usize))
    }

    /// Keccak-256 of exactly the bytes in the view.
    pub fn keccak(&self) -> H256 {
        keccak(self.bytes)
    }

    /// Copies the view into an owned buffer.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    const fn out_of_bounds(&self, offset: usize, len: usize) -> MalformedReason {
        MalformedReason::OutOfBounds {
            offset,
            len,
            available: self.len(),
        }
    }
}

impl<'a> From<&'a [u8]> for ByteView<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::new(bytes)
    }
}

impl AsRef<[u8]> for ByteView<'_> {
    fn as_ref(&self) -> &[u8] {
        self.bytes
    }
}

impl Display for ByteView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.bytes))
    }
}
