use crate::{
    error::{EscrowError, Result},
    ledger::Ledger,
    orchestrator::{bounded, Orchestrator},
    price::Price,
    provisioner::DEFAULT_MAX_ALLOCATION_ATTEMPTS,
    state::{GameRecord, GameState},
    store::GameStore,
};
use serde::Serialize;
use solana_program::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use std::{future::Future, time::Duration};

pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Key material the client signs with, loaded once and never mutated.
pub struct Session {
    pub payer: Keypair,
    pub player2: Keypair,
    /// Authority over the escrow token account; withdraw and close need it.
    pub escrow_authority: Option<Keypair>,
}

/// Fixed accounts every instruction references besides the game account.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EscrowAccounts {
    pub program_id: Pubkey,
    pub escrow_token_account: Pubkey,
    pub payer_token_account: Pubkey,
    pub player2_token_account: Pubkey,
    pub token_program: Pubkey,
    pub price_oracle: Pubkey,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessorOptions {
    /// Upper bound for each ledger or store round trip.
    pub rpc_timeout: Duration,
    pub max_allocation_attempts: usize,
    /// Close the mirrored record when settle observes a decided game.
    pub reconcile_on_settle: bool,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
            max_allocation_attempts: DEFAULT_MAX_ALLOCATION_ATTEMPTS,
            reconcile_on_settle: false,
        }
    }
}

/// Mirrored record next to the decoded ledger snapshot of the same game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatus {
    pub game_id: String,
    pub game_account: String,
    pub is_closed: bool,
    pub player1: String,
    pub player2: Option<String>,
    pub player1_choice: bool,
    pub entry_price: Price,
    pub last_price: Price,
    pub game_active: bool,
    pub winner: String,
}

impl GameStatus {
    fn new(record: &GameRecord, state: &GameState) -> Self {
        Self {
            game_id: record.id.clone(),
            game_account: record.game_account.to_string(),
            is_closed: record.is_closed,
            player1: state.player1.to_string(),
            player2: state.has_player2().then(|| state.player2.to_string()),
            player1_choice: state.player1_choice,
            entry_price: Price::from_raw(state.entry_price),
            last_price: Price::from_raw(state.last_price),
            game_active: state.game_active,
            winner: state.winner_label(),
        }
    }
}

/// Drives game lifecycles: encodes instructions, submits them and keeps the
/// mirrored records in step. The operations themselves live next to their
/// instruction in [`crate::instructions`].
pub struct Processor<L, S> {
    pub(crate) ledger: L,
    pub(crate) store: S,
    pub(crate) session: Session,
    pub(crate) accounts: EscrowAccounts,
    pub(crate) options: ProcessorOptions,
}

impl<L: Ledger, S: GameStore> Processor<L, S> {
    pub fn new(
        ledger: L,
        store: S,
        session: Session,
        accounts: EscrowAccounts,
        options: ProcessorOptions,
    ) -> Self {
        Self {
            ledger,
            store,
            session,
            accounts,
            options,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn accounts(&self) -> &EscrowAccounts {
        &self.accounts
    }

    pub(crate) fn orchestrator(&self) -> Orchestrator<'_, L> {
        Orchestrator::new(&self.ledger, self.options.rpc_timeout)
    }

    pub(crate) async fn bounded<F: Future>(&self, stage: &'static str, future: F) -> Result<F::Output> {
        bounded(stage, self.options.rpc_timeout, future).await
    }

    pub(crate) async fn load_record(&self, game_id: &str) -> Result<GameRecord> {
        self.bounded("store read", self.store.find_by_id(game_id))
            .await??
            .ok_or_else(|| EscrowError::GameNotFound(game_id.to_string()))
    }

    /// Like [`Self::load_record`] but refuses games already marked closed.
    pub(crate) async fn load_open_record(&self, game_id: &str) -> Result<GameRecord> {
        let record = self.load_record(game_id).await?;
        if record.is_closed {
            return Err(EscrowError::GameClosed(record.id));
        }
        Ok(record)
    }

    pub(crate) async fn mark_closed(&self, game_id: &str) -> Result<GameRecord> {
        self.bounded("store write", self.store.mark_closed(game_id))
            .await??
            .ok_or_else(|| EscrowError::GameNotFound(game_id.to_string()))
    }

    pub(crate) async fn read_account(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        Ok(self
            .bounded("account read", self.ledger.account_data(address))
            .await??)
    }

    /// Current ledger view of a game, without submitting anything.
    pub async fn game_status(&self, game_id: &str) -> Result<GameStatus> {
        let record = self.load_record(game_id).await?;
        let data = self.read_account(&record.game_account).await?;
        let state = GameState::unpack(&record.game_account, data.as_deref())?;
        Ok(GameStatus::new(&record, &state))
    }
}
