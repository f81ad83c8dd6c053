//! Events emitted by the voting protocol.

use ethereum_types::{Address, H256, U256};

use crate::proposal::ProposalId;

/// State changes of the protocol, in the order they happened.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum VotingEvent {
    /// A proposal was created.
    ProposalCreated {
        /// The new proposal.
        proposal_id: ProposalId,
        /// Digest of its call batch.
        digest: H256,
        /// The block whose state decides voting power.
        block_number: u64,
        /// Token supply at that block.
        total_supply: U256,
        /// When voting closes.
        deadline: u64,
    },

    /// A vote was counted.
    VoteCast {
        /// The proposal voted on.
        proposal_id: ProposalId,
        /// Who voted.
        voter: Address,
        /// In favor or against.
        support: bool,
        /// Voting power counted.
        weight: U256,
    },

    /// A proposal was resolved and deleted.
    ProposalResolved {
        /// The proposal.
        proposal_id: ProposalId,
        /// Whether an execution token was minted.
        passed: bool,
        /// Final yes tally.
        yes_votes: U256,
        /// Final no tally.
        no_votes: U256,
    },
}
