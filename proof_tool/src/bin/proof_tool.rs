use std::{fs::File, io};

use anyhow::{bail, Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use k256::ecdsa::SigningKey;
use mpt_proof::{
    block_hash, mapping_slot, state_root_at_fixed_offset, state_root_from_header, storage_key,
};
use serde::Serialize;
use serde_json::{json, Deserializer};
use supa_common::HexBytes;
use supa_governance::{
    signature::{sign_digest, vote_digest},
    GovernanceConfig,
};
use supa_proof_tool::eip1186::AccountProofResponse;
use tracing::{error, info, warn};

use self::proof_tool::*;
mod proof_tool {
    pub mod cli;
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    serde_json::to_writer_pretty(io::stdout(), value)?;
    println!();
    Ok(())
}

fn main() -> Result<()> {
    dotenv().ok();
    supa_proof_tool::tracing::init();

    let args = cli::Cli::parse();

    match args.command {
        cli::Command::Verify {
            file_path,
            state_root,
        } => {
            let file = File::open(&file_path)
                .with_context(|| format!("Failed to open {}", file_path.display()))?;
            let des = &mut Deserializer::from_reader(&file);
            let response: AccountProofResponse = serde_path_to_error::deserialize(des)?;

            let report = response
                .check(state_root)
                .context("Failed to verify account proof")
                .inspect_err(|e| error!("{e:?}"))?;
            print(&report)?;

            if !report.is_valid() {
                bail!("Proof response contradicts its own proofs");
            }
            info!("All claims verified against state root {state_root:x}");
        }
        cli::Command::BalanceSlot { holder, slot } => {
            let slot = mapping_slot(holder, slot);
            print(&json!({
                "slot": slot,
                "trieKey": storage_key(slot),
            }))?;
        }
        cli::Command::StateRoot {
            header,
            fixed_offset,
        } => {
            let state_root = if fixed_offset {
                state_root_at_fixed_offset(&header)?
            } else {
                state_root_from_header(&header)?
            };
            print(&json!({
                "blockHash": block_hash(&header),
                "stateRoot": state_root,
            }))?;
        }
        cli::Command::VoteDigest {
            config,
            proposal_id,
            support,
            private_key,
        } => {
            let file = File::open(&config)
                .with_context(|| format!("Failed to open {}", config.display()))?;
            let des = &mut Deserializer::from_reader(&file);
            let config: GovernanceConfig = serde_path_to_error::deserialize(des)?;
            config.validate()?;

            let digest = vote_digest(config.domain.separator(), proposal_id, support);
            let signature = match private_key {
                Some(key) => {
                    let key = SigningKey::from_slice(&key.0).context("Invalid private key")?;
                    Some(HexBytes::from(sign_digest(&key, digest)?.to_vec()))
                }
                None => {
                    warn!("No private key given, printing the digest only");
                    None
                }
            };
            print(&json!({
                "digest": digest,
                "signature": signature,
            }))?;
        }
    }

    Ok(())
}
