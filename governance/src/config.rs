//! Deployment parameters of a governance instance.

use ethereum_types::{Address, H256, U256};
use mpt_proof::{
    mapping_slot, simple_slot, state_root_at_fixed_offset, state_root_from_header, ProofResult,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::signature::Eip712Domain;

/// Two days, in seconds.
pub const DEFAULT_VOTING_PERIOD_SECS: u64 = 2 * 24 * 60 * 60;

/// A proposal needs a tenth of the total supply to vote.
pub const DEFAULT_QUORUM_DIVISOR: u64 = 10;

#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
/// Inconsistent governance parameters.
pub enum ConfigError {
    #[error("quorum divisor must be non-zero")]
    /// Quorum would be a division by zero.
    ZeroQuorumDivisor,

    #[error("voting period must be non-zero")]
    /// Proposals would be resolvable the moment they are created.
    ZeroVotingPeriod,
}

/// How the state root is read out of a block header.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateRootExtraction {
    /// Decode the header list and take field 3.
    #[default]
    Rlp,

    /// Read 32 bytes at a fixed offset. Only correct for headers whose payload
    /// length is encoded in exactly two bytes.
    FixedOffset,
}

impl StateRootExtraction {
    /// Extracts the state root from `header`.
    pub fn extract(self, header: &[u8]) -> ProofResult<H256> {
        match self {
            StateRootExtraction::Rlp => state_root_from_header(header),
            StateRootExtraction::FixedOffset => state_root_at_fixed_offset(header),
        }
    }
}

/// Governance parameters, fixed at deployment.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GovernanceConfig {
    /// The token whose balances are the voting power.
    pub governance_token: Address,

    /// Declared slot of the token's `mapping(address => uint256)` of balances.
    pub balance_mapping_slot: U256,

    /// Slot of the token's total supply.
    pub total_supply_slot: U256,

    /// How long a proposal accepts votes.
    #[serde(default = "default_voting_period")]
    pub voting_period_secs: u64,

    /// Quorum is `total_supply / quorum_divisor`.
    #[serde(default = "default_quorum_divisor")]
    pub quorum_divisor: u64,

    /// Signing domain of off-chain votes.
    pub domain: Eip712Domain,

    /// How the state root is read from block headers.
    #[serde(default)]
    pub state_root_extraction: StateRootExtraction,
}

const fn default_voting_period() -> u64 {
    DEFAULT_VOTING_PERIOD_SECS
}

const fn default_quorum_divisor() -> u64 {
    DEFAULT_QUORUM_DIVISOR
}

impl GovernanceConfig {
    /// A configuration with the default period, quorum and header parsing.
    pub fn new(
        governance_token: Address,
        balance_mapping_slot: U256,
        total_supply_slot: U256,
        domain: Eip712Domain,
    ) -> Self {
        Self {
            governance_token,
            balance_mapping_slot,
            total_supply_slot,
            voting_period_secs: DEFAULT_VOTING_PERIOD_SECS,
            quorum_divisor: DEFAULT_QUORUM_DIVISOR,
            domain,
            state_root_extraction: StateRootExtraction::default(),
        }
    }

    /// Checks the parameters are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quorum_divisor == 0 {
            return Err(ConfigError::ZeroQuorumDivisor);
        }
        if self.voting_period_secs == 0 {
            return Err(ConfigError::ZeroVotingPeriod);
        }

        Ok(())
    }

    /// Storage slot holding `holder`'s token balance.
    pub fn balance_slot(&self, holder: Address) -> H256 {
        mapping_slot(holder, self.balance_mapping_slot)
    }

    /// Storage slot holding the token's total supply.
    pub fn total_supply_slot(&self) -> H256 {
        simple_slot(self.total_supply_slot)
    }

    /// Minimum number of votes (yes and no together) for a proposal to pass.
    pub fn quorum(&self, total_supply: U256) -> U256 {
        total_supply / U256::from(self.quorum_divisor)
    }
}
