//! Proposals and the call batches they would authorize.

use ethereum_types::{Address, H256, U256};
use keccak_hash::keccak;
use rlp::{Encodable, RlpStream};
use serde::{Deserialize, Serialize};
use supa_common::HexBytes;

/// Sequential proposal identifier.
pub type ProposalId = u64;

/// One call the governance executor performs if a proposal passes.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Call {
    /// Target contract.
    pub to: Address,
    /// Wei sent along.
    pub value: U256,
    /// Calldata.
    pub data: HexBytes,
}

impl Encodable for Call {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(3);
        s.append(&self.to);
        s.append(&self.value);
        s.append(&self.data.0);
    }
}

/// The calls a proposal would authorize, in execution order.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CallBatch(pub Vec<Call>);

impl CallBatch {
    /// The commitment stored in a proposal: `keccak(rlp([[to, value, data], ..]))`.
    pub fn digest(&self) -> H256 {
        keccak(rlp::encode_list::<Call, _>(&self.0))
    }
}

/// An open proposal.
///
/// Everything but the tallies is fixed at creation.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Proposal {
    /// Digest of the [`CallBatch`] to authorize.
    pub digest: H256,
    /// Timestamp at which voting closes.
    pub deadline: u64,
    /// Storage root of the governance token at the proposal's block. Every
    /// vote proves its balance against it.
    pub storage_root: H256,
    /// Total token supply at the proposal's block.
    pub total_supply: U256,
    /// Voting power in favor.
    pub yes_votes: U256,
    /// Voting power against.
    pub no_votes: U256,
}

impl Proposal {
    /// Returns `true` if the votes are a strict majority in favor and reach
    /// `quorum` in total.
    pub fn passes(&self, quorum: U256) -> bool {
        let turnout = self.yes_votes.saturating_add(self.no_votes);
        self.yes_votes > self.no_votes && turnout >= quorum
    }

    /// Accepts votes while `now` is before the deadline.
    pub const fn state_at(&self, now: u64) -> ProposalState {
        match now < self.deadline {
            true => ProposalState::Open,
            false => ProposalState::Resolvable,
        }
    }
}

/// Where a live proposal is in its lifecycle. Resolved proposals are deleted.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ProposalState {
    /// Accepting votes.
    Open,
    /// Voting has ended; waiting for `resolve`.
    Resolvable,
}

/// What resolving a proposal did.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Resolution {
    /// Passed. An execution token for the digest was minted.
    Executed(H256),
    /// Failed majority or quorum. Nothing was authorized.
    Discarded,
}

#[cfg(test)]
mod tests {
    use ethereum_types::{Address, H256, U256};
    use keccak_hash::keccak;
    use rlp::RlpStream;

    use super::{Call, CallBatch, Proposal, ProposalState};

    fn proposal(yes: u64, no: u64, total_supply: u64) -> Proposal {
        Proposal {
            digest: H256::zero(),
            deadline: 100,
            storage_root: H256::zero(),
            total_supply: total_supply.into(),
            yes_votes: yes.into(),
            no_votes: no.into(),
        }
    }

    #[test]
    fn quorum_and_majority() {
        let quorum = U256::from(100);

        // Majority, but 50 < 100.
        assert!(!proposal(40, 10, 1000).passes(quorum));
        assert!(proposal(200, 50, 1000).passes(quorum));
        // Turnout exactly at quorum.
        assert!(proposal(60, 40, 1000).passes(quorum));
        // Ties fail.
        assert!(!proposal(300, 300, 1000).passes(quorum));
        assert!(!proposal(0, 0, 0).passes(U256::zero()));
    }

    #[test]
    fn deadline_is_exclusive() {
        let p = proposal(0, 0, 0);
        assert_eq!(p.state_at(99), ProposalState::Open);
        assert_eq!(p.state_at(100), ProposalState::Resolvable);
    }

    #[test]
    fn batch_digest_is_hash_of_rlp_list() {
        let call = Call {
            to: Address::repeat_byte(1),
            value: U256::from(5),
            data: vec![0xa9, 0x05, 0x9c, 0xbb].into(),
        };
        let batch = CallBatch(vec![call.clone(), Call::default()]);

        let mut stream = RlpStream::new_list(2);
        stream
            .begin_list(3)
            .append(&call.to)
            .append(&call.value)
            .append(&call.data.0);
        stream
            .begin_list(3)
            .append(&Address::zero())
            .append(&U256::zero())
            .append(&Vec::<u8>::new());

        assert_eq!(batch.digest(), keccak(stream.out()));
        assert_ne!(batch.digest(), CallBatch(vec![call]).digest());
    }

    #[test]
    fn batch_reads_json() {
        let batch: CallBatch = serde_json::from_str(
            r#"[{"to": "0x0101010101010101010101010101010101010101", "value": "0x5", "data": "0xa9059cbb"}]"#,
        )
        .unwrap();

        assert_eq!(batch.0.len(), 1);
        assert_eq!(batch.0[0].value, U256::from(5));
        assert_eq!(batch.0[0].data.0, vec![0xa9, 0x05, 0x9c, 0xbb]);
    }
}
