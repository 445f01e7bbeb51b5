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

pub fn withdraw_funds_accounts(
    payer: &Pubkey,
    game_account: &Pubkey,
    escrow_authority: &Pubkey,
    accounts: &EscrowAccounts,
) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new(*payer, true), // Player 1
        AccountMeta::new(*game_account, false),
        AccountMeta::new_readonly(*escrow_authority, true),
        AccountMeta::new(accounts.escrow_token_account, false),
        AccountMeta::new(accounts.payer_token_account, false), // Refund destination
        AccountMeta::new_readonly(accounts.token_program, false),
    ]
}

impl<L: Ledger, S: GameStore> Processor<L, S> {
    /// Refunds player 1 from a game nobody joined and closes its record.
    pub async fn withdraw_funds(&self, game_id: &str) -> Result<Signature> {
        info!(game_id, "Entering the withdraw_funds instruction");
        let authority = self
            .session
            .escrow_authority
            .as_ref()
            .ok_or(EscrowError::MissingSigner("escrow authority"))?;
        let record = self.load_open_record(game_id).await?;

        let payer = &self.session.payer;
        let instruction = Instruction::new_with_bytes(
            self.accounts.program_id,
            &EscrowInstruction::WithdrawFunds.pack(),
            withdraw_funds_accounts(
                &payer.pubkey(),
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
        info!(game_id, %signature, "Funds withdrawn, game closed");
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_order_and_roles() {
        let accounts = EscrowAccounts {
            program_id: Pubkey::new_unique(),
            escrow_token_account: Pubkey::new_unique(),
            payer_token_account: Pubkey::new_unique(),
            player2_token_account: Pubkey::new_unique(),
            token_program: spl_token::id(),
            price_oracle: Pubkey::new_unique(),
        };
        let payer = Pubkey::new_unique();
        let game = Pubkey::new_unique();
        let authority = Pubkey::new_unique();

        let metas = withdraw_funds_accounts(&payer, &game, &authority, &accounts);
        let expected = [
            (payer, true, true),
            (game, false, true),
            (authority, true, false),
            (accounts.escrow_token_account, false, true),
            (accounts.payer_token_account, false, true),
            (spl_token::id(), false, false),
        ];
        assert_eq!(metas.len(), expected.len());
        for (meta, (key, signer, writable)) in metas.iter().zip(expected) {
            assert_eq!((meta.pubkey, meta.is_signer, meta.is_writable), (key, signer, writable));
        }
    }
}
