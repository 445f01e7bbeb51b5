//! Command-line and environment configuration.

use crate::{
    processor::{EscrowAccounts, ProcessorOptions, Session},
    provisioner::DEFAULT_MAX_ALLOCATION_ATTEMPTS,
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use solana_program::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Create, join and settle price-settled escrow games")]
pub struct Config {
    #[arg(long, env = "SOLANA_RPC", default_value = "http://127.0.0.1:8899")]
    pub rpc_url: String,

    /// Keypair file of player 1, who also pays fees.
    #[arg(long, env = "PATH_TO_YOUR_SOLANA_PAYER_JSON")]
    pub payer_keypair: PathBuf,

    #[arg(long, env = "PATH_TO_YOUR_SOLANA_PLAYER2_JSON")]
    pub player2_keypair: PathBuf,

    /// Authority of the escrow token account; needed by withdraw and close.
    #[arg(long, env = "ESCROW_AUTHORITY_JSON")]
    pub escrow_authority_keypair: Option<PathBuf>,

    #[arg(long, env = "PROGRAM_SC", value_parser = parse_pubkey)]
    pub program_id: Pubkey,

    #[arg(long, env = "SCROW_TOKEN_ACCOUNT", value_parser = parse_pubkey)]
    pub escrow_token_account: Pubkey,

    #[arg(long, env = "PAYER_TOKEN_ACCOUNT", value_parser = parse_pubkey)]
    pub payer_token_account: Pubkey,

    #[arg(long, env = "PLAYER2_TOKEN_ACCOUNT", value_parser = parse_pubkey)]
    pub player2_token_account: Pubkey,

    #[arg(long, env = "TOKEN_PROGRAM_ID", value_parser = parse_pubkey, default_value_t = spl_token::id())]
    pub token_program: Pubkey,

    #[arg(long, env = "USDC_PRICE_ACCOUNT", value_parser = parse_pubkey)]
    pub price_oracle: Pubkey,

    /// JSON file holding the mirrored game records.
    #[arg(long, env = "GAME_STORE_PATH", default_value = "games.json")]
    pub store_path: PathBuf,

    #[arg(long, env = "RPC_TIMEOUT_SECS", default_value_t = 30)]
    pub rpc_timeout_secs: u64,

    #[arg(long, env = "MAX_ALLOCATION_ATTEMPTS", default_value_t = DEFAULT_MAX_ALLOCATION_ATTEMPTS)]
    pub max_allocation_attempts: usize,

    /// Close a game's record when settle reads back a decided game.
    #[arg(long, env = "RECONCILE_ON_SETTLE")]
    pub reconcile_on_settle: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Open a new game as player 1
    Create,
    /// Join an existing game as player 2
    Join {
        #[arg(long)]
        game_id: String,
        #[arg(long, allow_negative_numbers = true)]
        last_price: f64,
    },
    /// Settle a game at the given price
    Settle {
        #[arg(long)]
        game_id: String,
        #[arg(long, allow_negative_numbers = true)]
        last_price: f64,
    },
    /// Refund player 1 from a game nobody joined
    Withdraw {
        #[arg(long)]
        game_id: String,
    },
    /// Pay a settled game out to its winner
    Close {
        #[arg(long)]
        game_id: String,
    },
    /// Show the mirrored record and the ledger state of a game
    Status {
        #[arg(long)]
        game_id: String,
    },
}

fn parse_pubkey(value: &str) -> std::result::Result<Pubkey, String> {
    value
        .trim()
        .parse()
        .map_err(|e| format!("invalid public key {value:?}: {e}"))
}

fn load_keypair(path: &Path) -> Result<Keypair> {
    read_keypair_file(path)
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("failed to read keypair {}", path.display()))
}

impl Config {
    pub fn session(&self) -> Result<Session> {
        Ok(Session {
            payer: load_keypair(&self.payer_keypair)?,
            player2: load_keypair(&self.player2_keypair)?,
            escrow_authority: self
                .escrow_authority_keypair
                .as_ref()
                .map(|path| load_keypair(path))
                .transpose()?,
        })
    }

    pub fn accounts(&self) -> EscrowAccounts {
        EscrowAccounts {
            program_id: self.program_id,
            escrow_token_account: self.escrow_token_account,
            payer_token_account: self.payer_token_account,
            player2_token_account: self.player2_token_account,
            token_program: self.token_program,
            price_oracle: self.price_oracle,
        }
    }

    pub fn options(&self) -> Result<ProcessorOptions> {
        if self.rpc_timeout_secs == 0 {
            anyhow::bail!("RPC_TIMEOUT_SECS must be positive");
        }
        if self.max_allocation_attempts == 0 {
            anyhow::bail!("MAX_ALLOCATION_ATTEMPTS must be positive");
        }
        Ok(ProcessorOptions {
            rpc_timeout: Duration::from_secs(self.rpc_timeout_secs),
            max_allocation_attempts: self.max_allocation_attempts,
            reconcile_on_settle: self.reconcile_on_settle,
        })
    }
}
