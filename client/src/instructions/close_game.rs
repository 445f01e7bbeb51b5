use crate::{
    error::{EscrowError, Result},
    instructions::EscrowInstruction,
    ledger::Ledger,
    processor::{EscrowAccounts, Processor},
    store::GameStore,
};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use solana_sdk::signature::{Signature, Signer};
use tracing::info;

pub fn close_game_accounts(
    payer: &Pubkey,
    player2: &Pubkey,
    game_account: &Pubkey,
    escrow_authority: &Pubkey,
    accounts: &EscrowAccounts,
) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new(*payer, true), // Player 1
        AccountMeta::new_readonly(*player2, false),
        AccountMeta::new(*game_account, false),
        AccountMeta::new_readonly(*escrow_authority, true),
        AccountMeta::new(accounts.escrow_token_account, false),
        AccountMeta::new(accounts.payer_token_account, false),
        AccountMeta::new(accounts.player2_token_account, false),
        AccountMeta::new_readonly(accounts.token_program, false),
        AccountMeta::new_readonly(accounts.price_oracle, false),
    ]
}

impl<L: Ledger, S: GameStore> Processor<L, S> {
    /// Pays out a settled game to its winner and closes the record.
    pub async fn close_game(&self, game_id: &str) -> Result<Signature> {
        info!(game_id, "Entering the close_game instruction");
        let authority = self
            .session
            .escrow_authority
            .as_ref()
            .ok_or(EscrowError::MissingSigner("escrow authority"))?;
        let record = self.load_open_record(game_id).await?;

        let payer = &self.session.payer;
        let instruction = Instruction::new_with_bytes(
            self.accounts.program_id,
            &EscrowInstruction::CloseGame.pack(),
            close_game_accounts(
                &payer.pubkey(),
                &self.session.player2.pubkey(),
                &record.game_account,
                &authority.pubkey(),
                &self.accounts,
            ),
        );
        let signature = self
            .orchestrator()
            .submit(instruction, &[payer, authority])
            .await?;

        self.mark_closed(&record.id).await?;
        info!(game_id, %signature, "Game closed successfully. Winner has been paid.");
        Ok(signature)
    }
}
