use crate::{
    error::{EscrowError, Result},
    instructions::EscrowInstruction,
    ledger::Ledger,
    price::Price,
    processor::{EscrowAccounts, Processor},
    state::GameState,
    store::GameStore,
};
use serde::Serialize;
use solana_program::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};
use solana_sdk::signature::{Signature, Signer};
use tracing::{info, warn};

/// What the game account says right after a settle confirmed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleOutcome {
    pub game_active: bool,
    /// Base58 winner identity, or "No winner".
    pub winner: String,
    #[serde(serialize_with = "as_display")]
    pub signature: Signature,
    /// Whether the mirrored record was closed because of this outcome.
    pub reconciled: bool,
}

fn as_display<S: serde::Serializer>(
    signature: &Signature,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(signature)
}

pub fn settle_game_accounts(
    payer: &Pubkey,
    game_account: &Pubkey,
    accounts: &EscrowAccounts,
) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new(*game_account, false),
        AccountMeta::new(accounts.payer_token_account, false), // Player 1's token account
        AccountMeta::new(accounts.player2_token_account, false), // Player 2's token account
        AccountMeta::new_readonly(accounts.price_oracle, false),
        AccountMeta::new_readonly(system_program::id(), false),
        AccountMeta::new(*payer, true),
        AccountMeta::new_readonly(accounts.token_program, false),
    ]
}

impl<L: Ledger, S: GameStore> Processor<L, S> {
    /// Settles a mirrored game at `last_price` (rounded to 8 decimals) and
    /// reads the outcome back from the game account.
    ///
    /// The mirrored record is left untouched unless `reconcile_on_settle` is
    /// set, in which case a decided game closes it.
    pub async fn settle_game(&self, game_id: &str, last_price: f64) -> Result<SettleOutcome> {
        info!(game_id, last_price, "Entering the settle_game instruction");
        let last_price = Price::rounded(last_price)?;
        let record = self.load_open_record(game_id).await?;

        let payer = &self.session.payer;
        let data = EscrowInstruction::SettleGame { last_price }.pack();
        let instruction = Instruction::new_with_bytes(
            self.accounts.program_id,
            &data,
            settle_game_accounts(&payer.pubkey(), &record.game_account, &self.accounts),
        );
        let signature = self.orchestrator().submit(instruction, &[payer]).await?;

        // The snapshot is always read fresh; a missing account here is ledger
        // read-lag, not an undecided game.
        let data = self
            .read_account(&record.game_account)
            .await?
            .ok_or(EscrowError::SettlementStateUnavailable(record.game_account))?;
        let state = GameState::unpack(&record.game_account, Some(&data))?;
        let winner = state.winner_label();

        let reconciled = if self.options.reconcile_on_settle
            && !state.game_active
            && state.winner().is_some()
        {
            self.mark_closed(&record.id).await?;
            true
        } else {
            if !state.game_active {
                warn!(game_id, "game is inactive on the ledger but its record stays open");
            }
            false
        };

        info!(
            game_id,
            game_active = state.game_active,
            %winner,
            %signature,
            reconciled,
            "Game settled"
        );
        Ok(SettleOutcome {
            game_active: state.game_active,
            winner,
            signature,
            reconciled,
        })
    }
}
