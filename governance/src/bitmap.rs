//! The has-voted bitmap.

use std::collections::HashMap;

use ethereum_types::{Address, U256};

use crate::proposal::ProposalId;

const BITS_PER_WORD: u64 = 256;

/// Which voters voted on which proposals, one bit per pair, packed 256
/// proposals to a word.
///
/// Bits only ever go from unset to set.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VoteBitmap {
    words: HashMap<(Address, u64), U256>,
}

fn position(proposal_id: ProposalId) -> (u64, usize) {
    (
        proposal_id / BITS_PER_WORD,
        (proposal_id % BITS_PER_WORD) as usize,
    )
}

impl VoteBitmap {
    /// Returns `true` if `voter` voted on `proposal_id`.
    pub fn is_set(&self, voter: Address, proposal_id: ProposalId) -> bool {
        let (word, bit) = position(proposal_id);

        self.words
            .get(&(voter, word))
            .is_some_and(|w| w.bit(bit))
    }

    /// Sets the bit for `(voter, proposal_id)`. Returns `false` if it was
    /// already set.
    pub fn check_and_set(&mut self, voter: Address, proposal_id: ProposalId) -> bool {
        let (word, bit) = position(proposal_id);
        let w = self.words.entry((voter, word)).or_default();

        if w.bit(bit) {
            return false;
        }
        *w = *w | (U256::one() << bit);

        true
    }
}
