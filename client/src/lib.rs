//! Off-chain client for the price-settled escrow game program.
//!
//! The program itself runs on the ledger; this crate encodes its
//! instructions, decodes its game account and keeps a local mirror of the
//! games it created.

pub mod config;
pub mod error;
pub mod instructions;
pub mod ledger;
pub mod orchestrator;
pub mod price;
pub mod processor;
pub mod provisioner;
pub mod state;
pub mod store;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;


pub use error::{EscrowError, LedgerError, Result};
pub use instructions::{
    create_game::CreatedGame, settle_game::SettleOutcome, EscrowInstruction,
};
pub use ledger::{Ledger, RpcLedger};
pub use price::Price;
pub use processor::{EscrowAccounts, GameStatus, Processor, ProcessorOptions, Session};
pub use state::{GameRecord, GameState};
pub use store::{GameStore, JsonFileGameStore, MemoryGameStore};
