//! Governance errors.

use ethereum_types::{Address, H256};
use mpt_proof::ProofError;
use thiserror::Error;

use crate::{config::ConfigError, proposal::ProposalId, signature::SignatureError};

/// Stores the result of a governance operation. Returns a [`VotingError`] upon
/// failure.
pub type VotingResult<T> = Result<T, VotingError>;

/// Every way a governance call can fail. A failed call leaves the protocol
/// state exactly as it was.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum VotingError {
    /// A header, account or storage proof failed to decode or verify.
    #[error(transparent)]
    Proof(#[from] ProofError),

    /// The referenced block is outside the window whose hashes are known.
    #[error("block {number} is not within the last 256 blocks of block {current}")]
    StaleBlock {
        /// The block the proposal refers to.
        number: u64,
        /// The block being executed.
        current: u64,
    },

    /// The supplied header does not hash to the canonical block hash.
    #[error("header hashes to {actual:x}, but block hash is {expected:x}")]
    BlockHashMismatch {
        /// The block hash reported by the chain.
        expected: H256,
        /// The hash of the supplied header.
        actual: H256,
    },

    /// A signed vote in a batch could not be attributed to a voter.
    #[error("invalid signature for vote {index} of the batch: {source}")]
    InvalidSignature {
        /// Position of the vote in the batch.
        index: usize,
        /// What was wrong with the signature.
        source: SignatureError,
    },

    /// The voter has already voted on this proposal.
    #[error("{voter:x} already voted on proposal {proposal_id}")]
    AlreadyVoted {
        /// The voter.
        voter: Address,
        /// The proposal.
        proposal_id: ProposalId,
    },

    /// There is no proposal with this id (never created, or already resolved).
    #[error("proposal {0} does not exist")]
    ProposalNotFound(ProposalId),

    /// Votes are no longer accepted.
    #[error("voting on proposal {proposal_id} ended at {deadline}")]
    VotingEnded {
        /// The proposal.
        proposal_id: ProposalId,
        /// The deadline that has passed.
        deadline: u64,
    },

    /// The proposal cannot be resolved before its deadline.
    #[error("voting on proposal {proposal_id} is open until {deadline}")]
    VotingNotEnded {
        /// The proposal.
        proposal_id: ProposalId,
        /// The deadline that has not yet passed.
        deadline: u64,
    },

    /// The voter held no tokens at the proposal's block.
    #[error("{0:x} has no voting power")]
    NoVotingPower(Address),

    /// Adding the vote would overflow a 256-bit tally.
    #[error("tally of proposal {0} would overflow")]
    TallyOverflow(ProposalId),

    /// The per-vote slices of a batch differ in length.
    #[error("batch has {supports} votes, {signatures} signatures and {proofs} proofs")]
    BatchLengthMismatch {
        /// Number of `support` flags.
        supports: usize,
        /// Number of signatures.
        signatures: usize,
        /// Number of balance proofs.
        proofs: usize,
    },

    /// The governance configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
