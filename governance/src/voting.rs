//! The proposal lifecycle.
//!
//! A proposal is created against a recent block: its header is matched to the
//! block hash the chain reports, its state root anchors an account proof for
//! the governance token, and the token's storage root (kept in the proposal)
//! anchors every later balance proof. Voting power is therefore the balance
//! held at that block, and cannot be moved between voters after the fact.
//!
//! Every public operation either succeeds completely or returns an error with
//! no state changed.

use std::collections::{HashMap, HashSet};

use ethereum_types::{Address, H256, U256};
use log::{debug, info};
use mpt_proof::{block_hash, verify_account_proof, verify_storage_proof};
use supa_common::within_blockhash_window;

use crate::{
    bitmap::VoteBitmap,
    chain::ChainContext,
    config::GovernanceConfig,
    error::{VotingError, VotingResult},
    events::VotingEvent,
    executor::GovernanceExecutor,
    proposal::{CallBatch, Proposal, ProposalId, ProposalState, Resolution},
    signature::{recover_signer, vote_digest},
};

/// Everything needed to open a proposal.
#[derive(Clone, Copy, Debug)]
pub struct ProposalRequest<'a, T> {
    /// The calls to authorize if the proposal passes.
    pub calls: &'a CallBatch,
    /// The block whose state decides voting power.
    pub block_number: u64,
    /// RLP encoding of that block's header.
    pub header: &'a [u8],
    /// Proof of the governance token's account in the block's state trie.
    pub account_proof: &'a [T],
    /// Proof of the total supply slot in the token's storage trie.
    pub total_supply_proof: &'a [T],
}

/// A counted vote, before it is written.
#[derive(Clone, Copy, Debug)]
struct Ballot {
    voter: Address,
    support: bool,
    weight: U256,
}

/// A governance instance: its configuration, the chain it runs against and
/// the executor that receives passed proposals.
#[derive(Debug)]
pub struct Voting<C, E> {
    config: GovernanceConfig,
    domain_separator: H256,
    chain: C,
    executor: E,
    proposals: HashMap<ProposalId, Proposal>,
    next_proposal_id: ProposalId,
    has_voted: VoteBitmap,
    events: Vec<VotingEvent>,
}

impl<C: ChainContext, E: GovernanceExecutor> Voting<C, E> {
    /// Creates an instance with no proposals.
    pub fn new(config: GovernanceConfig, chain: C, executor: E) -> VotingResult<Self> {
        config.validate()?;
        let domain_separator = config.domain.separator();

        Ok(Self {
            config,
            domain_separator,
            chain,
            executor,
            proposals: HashMap::new(),
            next_proposal_id: 0,
            has_voted: VoteBitmap::default(),
            events: Vec::new(),
        })
    }

    /// The configuration this instance was created with.
    pub const fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    /// The chain context.
    pub const fn chain(&self) -> &C {
        &self.chain
    }

    /// Mutable access to the chain context, e.g. to advance time.
    pub fn chain_mut(&mut self) -> &mut C {
        &mut self.chain
    }

    /// The executor receiving execution tokens.
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    /// Mutable access to the executor, e.g. to redeem tokens.
    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    /// EIP-712 domain separator of off-chain votes.
    pub const fn domain_separator(&self) -> H256 {
        self.domain_separator
    }

    /// The digest a voter signs to vote `support` on `proposal_id`.
    pub fn vote_digest(&self, proposal_id: ProposalId, support: bool) -> H256 {
        vote_digest(self.domain_separator, proposal_id, support)
    }

    /// A live (not yet resolved) proposal.
    pub fn proposal(&self, proposal_id: ProposalId) -> Option<&Proposal> {
        self.proposals.get(&proposal_id)
    }

    /// Whether `voter` has voted on `proposal_id`.
    pub fn has_voted(&self, voter: Address, proposal_id: ProposalId) -> bool {
        self.has_voted.is_set(voter, proposal_id)
    }

    /// Where a live proposal is in its lifecycle.
    pub fn proposal_state(&self, proposal_id: ProposalId) -> VotingResult<ProposalState> {
        let proposal = self.get(proposal_id)?;
        Ok(proposal.state_at(self.chain.timestamp()))
    }

    /// Events emitted so far.
    pub fn events(&self) -> &[VotingEvent] {
        &self.events
    }

    /// Takes the events emitted so far.
    pub fn drain_events(&mut self) -> Vec<VotingEvent> {
        std::mem::take(&mut self.events)
    }

    /// Opens a proposal to authorize `request.calls`.
    ///
    /// The block must be among the last 256, its header must hash to the
    /// chain's block hash, and both proofs must verify from the header's state
    /// root. Voting closes one voting period from now.
    pub fn propose_vote<T: AsRef<[u8]>>(
        &mut self,
        request: ProposalRequest<'_, T>,
    ) -> VotingResult<ProposalId> {
        let current = self.chain.block_number();
        let stale = || VotingError::StaleBlock {
            number: request.block_number,
            current,
        };

        if !within_blockhash_window(current, request.block_number) {
            return Err(stale());
        }
        let expected = self
            .chain
            .block_hash(request.block_number)
            .ok_or_else(stale)?;

        let actual = block_hash(request.header);
        if actual != expected {
            return Err(VotingError::BlockHashMismatch { expected, actual });
        }

        let state_root = self
            .config
            .state_root_extraction
            .extract(request.header)?;
        let account = verify_account_proof(
            self.config.governance_token,
            state_root,
            request.account_proof,
        )?;
        let total_supply = verify_storage_proof(
            self.config.total_supply_slot(),
            account.storage_root,
            request.total_supply_proof,
        )?;

        let proposal_id = self.next_proposal_id;
        let digest = request.calls.digest();
        let deadline = self
            .chain
            .timestamp()
            .saturating_add(self.config.voting_period_secs);

        self.next_proposal_id += 1;
        self.proposals.insert(
            proposal_id,
            Proposal {
                digest,
                deadline,
                storage_root: account.storage_root,
                total_supply,
                yes_votes: U256::zero(),
                no_votes: U256::zero(),
            },
        );

        info!(
            "Created proposal {} for batch {:x} at block {} (total supply {}, deadline {})",
            proposal_id, digest, request.block_number, total_supply, deadline
        );
        self.events.push(VotingEvent::ProposalCreated {
            proposal_id,
            digest,
            block_number: request.block_number,
            total_supply,
            deadline,
        });

        Ok(proposal_id)
    }

    /// Votes with `voter`'s balance at the proposal's block, proven by
    /// `balance_proof` against the proposal's storage root. Returns the
    /// voting power counted.
    pub fn vote<T: AsRef<[u8]>>(
        &mut self,
        voter: Address,
        proposal_id: ProposalId,
        support: bool,
        balance_proof: &[T],
    ) -> VotingResult<U256> {
        let proposal = self.open_proposal(proposal_id)?;
        let ballot = Ballot {
            voter,
            support,
            weight: self.voting_power(proposal_id, proposal, voter, balance_proof)?,
        };
        let (yes, no) = tally(proposal_id, proposal.yes_votes, proposal.no_votes, &ballot)?;

        self.apply(proposal_id, &[ballot], yes, no);

        Ok(ballot.weight)
    }

    /// Counts a batch of off-chain votes on one proposal. Vote `i` is
    /// `supports[i]`, signed as EIP-712 typed data by the voter in
    /// `signatures[i]`, with voting power proven by `balance_proofs[i]`.
    ///
    /// Either every vote is counted or none is. Returns the recovered voters.
    pub fn vote_batch<S: AsRef<[u8]>, T: AsRef<[u8]>>(
        &mut self,
        proposal_id: ProposalId,
        supports: &[bool],
        signatures: &[S],
        balance_proofs: &[Vec<T>],
    ) -> VotingResult<Vec<Address>> {
        if supports.len() != signatures.len() || supports.len() != balance_proofs.len() {
            return Err(VotingError::BatchLengthMismatch {
                supports: supports.len(),
                signatures: signatures.len(),
                proofs: balance_proofs.len(),
            });
        }

        let proposal = self.open_proposal(proposal_id)?;
        let (mut yes, mut no) = (proposal.yes_votes, proposal.no_votes);
        let mut seen = HashSet::new();
        let mut ballots = Vec::with_capacity(supports.len());

        for (index, ((&support, signature), proof)) in supports
            .iter()
            .zip(signatures)
            .zip(balance_proofs)
            .enumerate()
        {
            let digest = vote_digest(self.domain_separator, proposal_id, support);
            let voter = recover_signer(digest, signature.as_ref())
                .map_err(|source| VotingError::InvalidSignature { index, source })?;

            if !seen.insert(voter) {
                return Err(VotingError::AlreadyVoted { voter, proposal_id });
            }

            let ballot = Ballot {
                voter,
                support,
                weight: self.voting_power(proposal_id, proposal, voter, proof)?,
            };
            (yes, no) = tally(proposal_id, yes, no, &ballot)?;
            ballots.push(ballot);
        }

        self.apply(proposal_id, &ballots, yes, no);

        Ok(ballots.iter().map(|b| b.voter).collect())
    }

    /// Resolves a proposal whose voting has ended, deleting it.
    ///
    /// It passes with a strict majority in favor and a turnout of at least
    /// `total_supply / quorum_divisor`, in which case an execution token for
    /// its call batch is minted. Otherwise it is discarded.
    pub fn resolve(&mut self, proposal_id: ProposalId) -> VotingResult<Resolution> {
        let proposal = self.get(proposal_id)?;
        if proposal.state_at(self.chain.timestamp()) == ProposalState::Open {
            return Err(VotingError::VotingNotEnded {
                proposal_id,
                deadline: proposal.deadline,
            });
        }

        let proposal = self
            .proposals
            .remove(&proposal_id)
            .ok_or(VotingError::ProposalNotFound(proposal_id))?;
        let passed = proposal.passes(self.config.quorum(proposal.total_supply));

        let resolution = match passed {
            true => {
                self.executor.mint(proposal_id, proposal.digest);
                Resolution::Executed(proposal.digest)
            }
            false => Resolution::Discarded,
        };

        info!(
            "Resolved proposal {}: {:?} (yes {}, no {}, total supply {})",
            proposal_id, resolution, proposal.yes_votes, proposal.no_votes, proposal.total_supply
        );
        self.events.push(VotingEvent::ProposalResolved {
            proposal_id,
            passed,
            yes_votes: proposal.yes_votes,
            no_votes: proposal.no_votes,
        });

        Ok(resolution)
    }

    fn get(&self, proposal_id: ProposalId) -> VotingResult<&Proposal> {
        self.proposals
            .get(&proposal_id)
            .ok_or(VotingError::ProposalNotFound(proposal_id))
    }

    fn open_proposal(&self, proposal_id: ProposalId) -> VotingResult<&Proposal> {
        let proposal = self.get(proposal_id)?;

        match proposal.state_at(self.chain.timestamp()) {
            ProposalState::Open => Ok(proposal),
            ProposalState::Resolvable => Err(VotingError::VotingEnded {
                proposal_id,
                deadline: proposal.deadline,
            }),
        }
    }

    fn voting_power<T: AsRef<[u8]>>(
        &self,
        proposal_id: ProposalId,
        proposal: &Proposal,
        voter: Address,
        balance_proof: &[T],
    ) -> VotingResult<U256> {
        if self.has_voted.is_set(voter, proposal_id) {
            return Err(VotingError::AlreadyVoted { voter, proposal_id });
        }

        let balance = verify_storage_proof(
            self.config.balance_slot(voter),
            proposal.storage_root,
            balance_proof,
        )?;
        if balance.is_zero() {
            return Err(VotingError::NoVotingPower(voter));
        }

        Ok(balance)
    }

    /// Writes ballots that were fully checked, along with the resulting
    /// tallies.
    fn apply(&mut self, proposal_id: ProposalId, ballots: &[Ballot], yes: U256, no: U256) {
        for ballot in ballots {
            let newly_set = self.has_voted.check_and_set(ballot.voter, proposal_id);
            debug_assert!(newly_set);

            debug!(
                "{:x} voted {} on proposal {} with {}",
                ballot.voter,
                if ballot.support { "yes" } else { "no" },
                proposal_id,
                ballot.weight
            );
            self.events.push(VotingEvent::VoteCast {
                proposal_id,
                voter: ballot.voter,
                support: ballot.support,
                weight: ballot.weight,
            });
        }

        if let Some(proposal) = self.proposals.get_mut(&proposal_id) {
            proposal.yes_votes = yes;
            proposal.no_votes = no;
        }
    }
}

fn tally(
    proposal_id: ProposalId,
    yes: U256,
    no: U256,
    ballot: &Ballot,
) -> VotingResult<(U256, U256)> {
    let add = |tally: U256| {
        tally
            .checked_add(ballot.weight)
            .ok_or(VotingError::TallyOverflow(proposal_id))
    };

    match ballot.support {
        true => Ok((add(yes)?, no)),
        false => Ok((yes, add(no)?)),
    }
}
