//! A lazy, zero-copy RLP decoder.
//!
//! Items are classified from their first byte:
//!
//! | first byte    | meaning                                             |
//! |---------------|-----------------------------------------------------|
//! | `0x00..=0x7f` | a single byte that encodes itself (no header)       |
//! | `0x80..=0xb7` | a string of `tag - 0x80` bytes                      |
//! | `0xb8..=0xbf` | a string whose length takes `tag - 0xb7` bytes      |
//! | `0xc0..=0xf7` | a list whose payload is `tag - 0xc0` bytes          |
//! | `0xf8..=0xff` | a list whose payload length takes `tag - 0xf7` bytes |
//!
//! Lists are never materialized: [`RlpItem::iter`] walks the payload one
//! child at a time.

use ethereum_types::{H256, U256};

use crate::{
    byte_view::ByteView,
    error::{MalformedReason, ProofError, ProofResult},
};

const SHORT_STRING: u8 = 0x80;
const LONG_STRING: u8 = 0xb8;
const SHORT_LIST: u8 = 0xc0;
const LONG_LIST: u8 = 0xf8;

/// The decoded header of one RLP item.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RlpHeader {
    /// Whether the item is a list.
    pub is_list: bool,

    /// Bytes taken by the tag and any length-of-length bytes. Zero for a
    /// self-encoding single byte.
    pub header_len: usize,

    /// Bytes of payload following the header.
    pub payload_len: usize,
}

impl RlpHeader {
    /// Decodes the header at the start of `view`.
    ///
    /// Only the header is checked here. See [`rlp_len`] for the check that
    /// the payload is present too.
    pub fn decode(view: ByteView<'_>) -> ProofResult<Self> {
        if view.is_empty() {
            return Err(MalformedReason::Empty.into());
        }

        let tag = view.load_u8(0)?;
        let (is_list, header_len, payload_len) = match tag {
            0x00..=0x7f => (false, 0, 1),
            0x80..=0xb7 => (false, 1, (tag - SHORT_STRING) as usize),
            0xb8..=0xbf => {
                let len_of_len = (tag - (LONG_STRING - 1)) as usize;
                (false, 1 + len_of_len, view.load_be_usize(1, len_of_len)?)
            }
            0xc0..=0xf7 => (true, 1, (tag - SHORT_LIST) as usize),
            0xf8..=0xff => {
                let len_of_len = (tag - (LONG_LIST - 1)) as usize;
                (true, 1 + len_of_len, view.load_be_usize(1, len_of_len)?)
            }
        };

        Ok(Self {
            is_list,
            header_len,
            payload_len,
        })
    }

    /// Total encoded length (header plus payload).
    pub fn total_len(&self) -> ProofResult<usize> {
        self.header_len
            .checked_add(self.payload_len)
            .ok_or(
                MalformedReason::TotalLengthOverflow {
                    header_len: self.header_len,
                    payload_len: self.payload_len,
                }
                .into(),
            )
    }
}

/// Returns the full encoded length (header and payload) of the item at the
/// start of `view`. Fails if that length runs past the end of `view`.
pub fn rlp_len(view: ByteView<'_>) -> ProofResult<usize> {
    let len = RlpHeader::decode(view)?.total_len()?;

    match len <= view.len() {
        false => Err(MalformedReason::LengthMismatch {
            encoded: len,
            actual: view.len(),
        }
        .into()),
        true => Ok(len),
    }
}

/// A view holding exactly one complete RLP item.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RlpItem<'a> {
    raw: ByteView<'a>,
    header: RlpHeader,
}

impl<'a> RlpItem<'a> {
    /// Wraps `raw` as an item. The length computed from the header must equal
    /// the length of `raw` exactly; trailing bytes are rejected.
    pub fn new(raw: ByteView<'a>) -> ProofResult<Self> {
        let header = RlpHeader::decode(raw)?;
        let encoded = header.total_len()?;

        if encoded != raw.len() {
            return Err(MalformedReason::LengthMismatch {
                encoded,
                actual: raw.len(),
            }
            .into());
        }

        Ok(Self { raw, header })
    }

    /// Shorthand for `RlpItem::new(ByteView::new(bytes))`.
    pub fn from_slice(bytes: &'a [u8]) -> ProofResult<Self> {
        Self::new(ByteView::new(bytes))
    }

    /// Returns `true` if the item is a list.
    pub const fn is_list(&self) -> bool {
        self.header.is_list
    }

    /// Returns `true` if the item is a byte string (including a single
    /// self-encoded byte).
    pub const fn is_bytes(&self) -> bool {
        !self.header.is_list
    }

    /// The decoded header.
    pub const fn header(&self) -> RlpHeader {
        self.header
    }

    /// The complete encoding, header included.
    pub const fn raw(&self) -> ByteView<'a> {
        self.raw
    }

    /// The bytes after the header. For a single self-encoded byte this is the
    /// byte itself.
    pub fn payload(&self) -> ByteView<'a> {
        // `new` checked that `header_len + payload_len == raw.len()`.
        ByteView::new(&self.raw.as_slice()[self.header.header_len..])
    }

    /// The payload of a byte string. Fails on lists.
    pub fn to_bytes(&self) -> ProofResult<ByteView<'a>> {
        match self.is_list() {
            false => Ok(self.payload()),
            true => Err(MalformedReason::ExpectedBytes.into()),
        }
    }

    /// An iterator over the children of a list. Fails on byte strings.
    pub fn iter(&self) -> ProofResult<RlpIterator<'a>> {
        match self.is_list() {
            false => Err(MalformedReason::ExpectedList.into()),
            true => Ok(RlpIterator {
                remaining: self.payload(),
            }),
        }
    }

    /// Decodes a list of exactly `N` items.
    pub fn to_list<const N: usize>(&self) -> ProofResult<[RlpItem<'a>; N]> {
        let items = self.iter()?.collect::<ProofResult<Vec<_>>>()?;

        items.try_into().map_err(|items: Vec<_>| {
            MalformedReason::ItemCount {
                expected: N,
                found: items.len(),
            }
            .into()
        })
    }

    /// Decodes a big-endian scalar of at most 8 bytes.
    pub fn to_u64(&self) -> ProofResult<u64> {
        let bytes = self.scalar_bytes(8)?;
        Ok(bytes.iter().fold(0, |acc, b| (acc << 8) | *b as u64))
    }

    /// Decodes a big-endian scalar of at most 32 bytes, left padding it.
    pub fn to_u256(&self) -> ProofResult<U256> {
        let bytes = self.scalar_bytes(32)?;
        Ok(U256::from_big_endian(bytes))
    }

    /// Decodes a string of exactly 32 bytes.
    pub fn to_h256(&self) -> ProofResult<H256> {
        let bytes = self.to_bytes()?;

        match bytes.len() {
            32 => Ok(H256::from_slice(bytes.as_slice())),
            found => Err(MalformedReason::FixedLength {
                expected: 32,
                found,
            }
            .into()),
        }
    }

    fn scalar_bytes(&self, max: usize) -> ProofResult<&'a [u8]> {
        let bytes = self.to_bytes()?;

        match bytes.len() > max {
            false => Ok(bytes.as_slice()),
            true => Err(MalformedReason::ScalarTooLong {
                len: bytes.len(),
                max,
            }
            .into()),
        }
    }
}

/// A cursor over the children in the payload of a list.
///
/// Each call to [`Iterator::next`] consumes exactly one child. After the first
/// error the iterator is exhausted.
#[derive(Clone, Copy, Debug, Default)]
pub struct RlpIterator<'a> {
    remaining: ByteView<'a>,
}

impl<'a> RlpIterator<'a> {
    /// Returns `true` while payload bytes remain.
    pub const fn has_next(&self) -> bool {
        !self.remaining.is_empty()
    }

    fn next_item(&mut self) -> ProofResult<RlpItem<'a>> {
        let len = rlp_len(self.remaining)?;
        let (item, rest) = self.remaining.split_at(len)?;
        self.remaining = rest;

        RlpItem::new(item)
    }
}

impl<'a> Iterator for RlpIterator<'a> {
    type Item = ProofResult<RlpItem<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_next() {
            return None;
        }

        let res = self.next_item();
        if res.is_err() {
            self.remaining = ByteView::default();
        }

        Some(res)
    }
}

impl<'a> TryFrom<&'a [u8]> for RlpItem<'a> {
    type Error = ProofError;

    fn try_from(bytes: &'a [u8]) -> Result<Self, Self::Error> {
        Self::from_slice(bytes)
    }
}
