use crate::{
    error::{EscrowError, Result},
    instructions::EscrowInstruction,
    ledger::Ledger,
    price::Price,
    processor::{EscrowAccounts, Processor},
    provisioner::allocate_fresh_account,
    state::GameRecord,
    store::GameStore,
};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};
use solana_sdk::signature::{Signature, Signer};
use tracing::{info, warn};

/// Entry price every new game opens with.
pub const ENTRY_PRICE: f64 = 2500.0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedGame {
    pub game_id: String,
    pub game_account: Pubkey,
    pub signature: Signature,
}

pub fn create_game_accounts(
    payer: &Pubkey,
    game_account: &Pubkey,
    accounts: &EscrowAccounts,
) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new(*payer, true), // Player 1 (payer)
        AccountMeta::new(*game_account, true), // Allocated by the program, signs for itself
        AccountMeta::new(accounts.escrow_token_account, false),
        AccountMeta::new(accounts.payer_token_account, false),
        AccountMeta::new_readonly(accounts.token_program, false),
        AccountMeta::new_readonly(accounts.price_oracle, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ]
}

impl<L: Ledger, S: GameStore> Processor<L, S> {
    /// Opens a game on a fresh account and mirrors it once the ledger confirms.
    pub async fn create_game(&self) -> Result<CreatedGame> {
        info!("Entering the create_game instruction");
        self.try_create_game().await.map_err(|e| {
            warn!(error = %e, "game creation failed");
            EscrowError::GameCreationFailed(Box::new(e))
        })
    }

    async fn try_create_game(&self) -> Result<CreatedGame> {
        let entry_price = Price::truncated(ENTRY_PRICE)?;
        let game_account = self
            .bounded(
                "account allocation",
                allocate_fresh_account(&self.ledger, self.options.max_allocation_attempts),
            )
            .await??;

        let payer = &self.session.payer;
        let data = EscrowInstruction::CreateGame {
            player1_choice: false,
            entry_price,
        }
        .pack();
        let instruction = Instruction::new_with_bytes(
            self.accounts.program_id,
            &data,
            create_game_accounts(&payer.pubkey(), &game_account.pubkey(), &self.accounts),
        );
        let signature = self
            .orchestrator()
            .submit(instruction, &[payer, &game_account])
            .await?;

        // Only a confirmed game gets a record.
        let record = GameRecord::new(game_account.pubkey(), payer.pubkey(), entry_price);
        let record = self
            .bounded("store write", self.store.create(record))
            .await?
            .inspect_err(|e| {
                warn!(
                    game_account = %game_account.pubkey(),
                    %signature,
                    error = %e,
                    "game confirmed on the ledger but not mirrored"
                )
            })?;

        info!(
            game_id = %record.id,
            game_account = %record.game_account,
            %entry_price,
            %signature,
            "Game created successfully"
        );
        Ok(CreatedGame {
            game_id: record.id,
            game_account: record.game_account,
            signature,
        })
    }
}
