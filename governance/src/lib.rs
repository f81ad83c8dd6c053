//! Token-weighted governance where voting power is proven, not reported.
//!
//! A proposal is pinned to a recent block. Its voters prove their token
//! balance at that block with Merkle Patricia Trie storage proofs (see
//! [`mpt_proof`]), either directly through [`Voting::vote`] or, for voters who
//! only signed an EIP-712 message off-chain, through [`Voting::vote_batch`].
//! Once the voting period is over, [`Voting::resolve`] either discards the
//! proposal or mints an execution token for its call batch through the
//! configured [`GovernanceExecutor`].
//!
//! The host supplies the chain context ([`ChainContext`]): the current block,
//! its timestamp, and the hashes of the last 256 blocks.

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]

pub mod bitmap;
pub mod chain;
pub mod config;
pub mod error;
pub mod events;
pub mod executor;
pub mod proposal;
pub mod signature;
pub mod voting;

pub use chain::{ChainContext, InMemoryChain};
pub use config::{GovernanceConfig, StateRootExtraction};
pub use error::{VotingError, VotingResult};
pub use events::VotingEvent;
pub use executor::{ExecutionTokens, GovernanceExecutor};
pub use proposal::{Call, CallBatch, Proposal, ProposalId, ProposalState, Resolution};
pub use signature::Eip712Domain;
pub use voting::{ProposalRequest, Voting};
