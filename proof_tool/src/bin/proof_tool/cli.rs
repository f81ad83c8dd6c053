use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};
use ethereum_types::{Address, H256, U256};
use supa_common::HexBytes;

/// Offline checks for storage proofs and governance votes.
#[derive(Parser)]
#[command(version, propagate_version = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Checks an `eth_getProof` response against a trusted state root.
    Verify {
        /// The file containing the JSON result of `eth_getProof`.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        file_path: PathBuf,
        /// The state root of the block the proof was taken at.
        #[arg(short, long, env = "PROOF_TOOL_STATE_ROOT", value_parser = parse_h256)]
        state_root: H256,
    },
    /// Prints the storage slot of `balances[holder]` and its trie path.
    BalanceSlot {
        /// The token holder.
        #[arg(long, value_parser = parse_address)]
        holder: Address,
        /// Declared slot of the balances mapping.
        #[arg(long, value_parser = parse_u256)]
        slot: U256,
    },
    /// Prints the hash and state root of an RLP encoded block header.
    StateRoot {
        /// The header, hex encoded.
        #[arg(long, value_parser = parse_bytes)]
        header: HexBytes,
        /// Read the root at the fixed byte offset used by mainnet headers
        /// instead of decoding the header.
        #[arg(long)]
        fixed_offset: bool,
    },
    /// Prints the EIP-712 digest of a vote, and signs it if a key is given.
    VoteDigest {
        /// The governance configuration, as JSON.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        config: PathBuf,
        #[arg(short, long)]
        proposal_id: u64,
        #[arg(long)]
        support: bool,
        /// Hex encoded secp256k1 key to sign the digest with.
        #[arg(
            long,
            env = "PROOF_TOOL_PRIVATE_KEY",
            hide_env_values = true,
            value_parser = parse_bytes
        )]
        private_key: Option<HexBytes>,
    },
}

fn decode_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(s.strip_prefix("0x").unwrap_or(s))
}

fn parse_bytes(s: &str) -> Result<HexBytes, hex::FromHexError> {
    decode_hex(s).map(HexBytes)
}

fn parse_h256(s: &str) -> Result<H256, String> {
    let bytes = decode_hex(s).map_err(|e| e.to_string())?;
    if bytes.len() != 32 {
        return Err(format!("expected 32 bytes, got {}", bytes.len()));
    }
    Ok(H256::from_slice(&bytes))
}

fn parse_address(s: &str) -> Result<Address, String> {
    let bytes = decode_hex(s).map_err(|e| e.to_string())?;
    if bytes.len() != 20 {
        return Err(format!("expected 20 bytes, got {}", bytes.len()));
    }
    Ok(Address::from_slice(&bytes))
}

/// Decimal, or hex with a `0x` prefix.
fn parse_u256(s: &str) -> Result<U256, String> {
    match s.strip_prefix("0x") {
        Some(digits) => U256::from_str_radix(digits, 16).map_err(|e| e.to_string()),
        None => U256::from_dec_str(s).map_err(|e| e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use ethereum_types::U256;

    use super::{parse_address, parse_h256, parse_u256, Cli};

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_values() {
        assert_eq!(parse_u256("10").unwrap(), U256::from(10));
        assert_eq!(parse_u256("0x10").unwrap(), U256::from(16));
        assert!(parse_u256("ten").is_err());

        assert!(parse_h256(&format!("0x{}", "ab".repeat(32))).is_ok());
        assert!(parse_h256("0xabcd").is_err());
        assert!(parse_address(&"11".repeat(20)).is_ok());
        assert!(parse_address(&"11".repeat(32)).is_err());
    }
}
