use crate::{
    error::Result,
    instructions::EscrowInstruction,
    ledger::Ledger,
    price::Price,
    processor::{EscrowAccounts, Processor},
    store::GameStore,
};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};
use solana_sdk::signature::{Signature, Signer};
use tracing::info;

pub fn join_game_accounts(
    player2: &Pubkey,
    game_account: &Pubkey,
    accounts: &EscrowAccounts,
) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new(*player2, true), // Player 2
        AccountMeta::new(*game_account, false),
        AccountMeta::new(accounts.escrow_token_account, false), // Receives player 2's stake
        AccountMeta::new(accounts.player2_token_account, false),
        AccountMeta::new_readonly(accounts.token_program, false),
        AccountMeta::new_readonly(accounts.price_oracle, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ]
}

impl<L: Ledger, S: GameStore> Processor<L, S> {
    /// Seats player 2 in a mirrored game. The game account always comes from
    /// the record, never from the caller.
    pub async fn join_game(&self, game_id: &str, last_price: f64) -> Result<Signature> {
        info!(game_id, last_price, "Entering the join_game instruction");
        let last_price = Price::truncated(last_price)?;
        let record = self.load_open_record(game_id).await?;

        let payer = &self.session.payer;
        let player2 = &self.session.player2;
        let data = EscrowInstruction::JoinGame { last_price }.pack();
        let instruction = Instruction::new_with_bytes(
            self.accounts.program_id,
            &data,
            join_game_accounts(&player2.pubkey(), &record.game_account, &self.accounts),
        );
        let signature = self
            .orchestrator()
            .submit(instruction, &[payer, player2])
            .await?;

        info!(game_id, %signature, "Player 2 joined the game successfully.");
        Ok(signature)
    }
}
