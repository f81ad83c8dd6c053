//! The seam between a passed proposal and the execution of its calls.

use std::collections::HashMap;

use ethereum_types::H256;
use log::info;

use crate::proposal::{CallBatch, ProposalId};

/// Receives the execution tokens minted for passed proposals.
pub trait GovernanceExecutor {
    /// Mints a token authorizing one execution of the call batch with hash
    /// `digest`.
    fn mint(&mut self, proposal_id: ProposalId, digest: H256);
}

/// Keeps minted tokens until the authorized batch is executed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ExecutionTokens {
    tokens: HashMap<H256, Vec<ProposalId>>,
}

impl ExecutionTokens {
    /// Returns `true` if executing `batch` is currently authorized.
    pub fn is_authorized(&self, batch: &CallBatch) -> bool {
        self.tokens.contains_key(&batch.digest())
    }

    /// Spends one token for `batch`, returning the proposal it came from.
    pub fn redeem(&mut self, batch: &CallBatch) -> Option<ProposalId> {
        let digest = batch.digest();
        let ids = self.tokens.get_mut(&digest)?;
        let id = ids.pop()?;

        if ids.is_empty() {
            self.tokens.remove(&digest);
        }

        info!("Redeemed execution token of proposal {} ({:x})", id, digest);
        Some(id)
    }
}

impl GovernanceExecutor for ExecutionTokens {
    fn mint(&mut self, proposal_id: ProposalId, digest: H256) {
        self.tokens.entry(digest).or_default().push(proposal_id);
    }
}

#[cfg(test)]
mod tests {
    use ethereum_types::{Address, U256};

    use super::{ExecutionTokens, GovernanceExecutor};
    use crate::proposal::{Call, CallBatch};

    #[test]
    fn tokens_are_single_use() {
        let batch = CallBatch(vec![Call {
            to: Address::repeat_byte(1),
            value: U256::zero(),
            data: vec![1, 2, 3].into(),
        }]);
        let mut tokens = ExecutionTokens::default();
        assert!(!tokens.is_authorized(&batch));

        tokens.mint(4, batch.digest());
        tokens.mint(9, batch.digest());
        assert!(tokens.is_authorized(&batch));

        assert_eq!(tokens.redeem(&batch), Some(9));
        assert_eq!(tokens.redeem(&batch), Some(4));
        assert_eq!(tokens.redeem(&batch), None);
        assert!(!tokens.is_authorized(&batch));
        assert!(!tokens.is_authorized(&CallBatch::default()));
    }
}
