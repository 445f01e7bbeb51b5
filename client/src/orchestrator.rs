//! Signs and submits single-instruction transactions.

use crate::{
    error::{EscrowError, Result},
    ledger::Ledger,
};
use solana_program::instruction::Instruction;
use solana_sdk::{
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use std::{future::Future, time::Duration};
use tracing::{debug, info, warn};

/// Runs `future` for at most `after`, reporting `stage` when it expires.
pub(crate) async fn bounded<F: Future>(
    stage: &'static str,
    after: Duration,
    future: F,
) -> Result<F::Output> {
    tokio::time::timeout(after, future)
        .await
        .map_err(|_| EscrowError::Timeout { stage, after })
}

pub struct Orchestrator<'a, L> {
    ledger: &'a L,
    timeout: Duration,
}

impl<'a, L: Ledger> Orchestrator<'a, L> {
    pub fn new(ledger: &'a L, timeout: Duration) -> Self {
        Self { ledger, timeout }
    }

    /// Anchors `instruction` to a fresh blockhash, signs it with every signer
    /// (the first one pays the fee), submits it once and waits for confirmation.
    ///
    /// Failures are never retried here: a caller wanting another attempt must
    /// rebuild the whole operation rather than resend this envelope.
    pub async fn submit(&self, instruction: Instruction, signers: &[&Keypair]) -> Result<Signature> {
        let fee_payer = signers
            .first()
            .map(|signer| signer.pubkey())
            .ok_or(EscrowError::MissingSigner("fee payer"))?;

        let blockhash = bounded("blockhash fetch", self.timeout, self.ledger.latest_blockhash())
            .await?
            .map_err(|e| {
                warn!(error = %e, "could not fetch a blockhash");
                EscrowError::TransactionFailed(e.diagnostic())
            })?;

        let mut transaction = Transaction::new_with_payer(&[instruction], Some(&fee_payer));
        transaction
            .try_sign(signers, blockhash)
            .map_err(|e| EscrowError::TransactionFailed(e.to_string()))?;
        debug!(
            %blockhash,
            signers = signers.len(),
            "signed transaction"
        );

        match bounded(
            "transaction confirmation",
            self.timeout,
            self.ledger.send_and_confirm(&transaction),
        )
        .await?
        {
            Ok(signature) => {
                info!(%signature, "transaction confirmed");
                Ok(signature)
            }
            Err(e) => {
                let diagnostic = e.diagnostic();
                warn!(%diagnostic, "transaction failed");
                Err(EscrowError::TransactionFailed(diagnostic))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::LedgerError, mocks::MockLedger};
    use solana_program::{instruction::AccountMeta, pubkey::Pubkey};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn instruction(signers: &[&Keypair]) -> Instruction {
        let accounts = signers
            .iter()
            .map(|signer| AccountMeta::new(signer.pubkey(), true))
            .chain(std::iter::once(AccountMeta::new_readonly(Pubkey::new_unique(), false)))
            .collect();
        Instruction::new_with_bytes(Pubkey::new_unique(), &[3, 1, 2, 3, 4, 5, 6, 7, 8], accounts)
    }

    #[tokio::test]
    async fn submits_a_signed_transaction_on_the_latest_blockhash() {
        let ledger = MockLedger::new();
        let payer = Keypair::new();
        let player2 = Keypair::new();
        let signers = [&payer, &player2];

        let signature = Orchestrator::new(&ledger, TIMEOUT)
            .submit(instruction(&signers), &signers)
            .await
            .unwrap();

        let submitted = ledger.submitted();
        assert_eq!(submitted.len(), 1);
        let transaction = &submitted[0];
        assert_eq!(transaction.signatures[0], signature);
        assert_eq!(transaction.message.account_keys[0], payer.pubkey());
        assert_eq!(transaction.message.recent_blockhash, ledger.blockhash());
        assert!(transaction.verify().is_ok());
        let calls = ledger.calls();
        assert_eq!(calls.blockhash, 1);
        assert_eq!(calls.submissions, 1);
    }

    #[tokio::test]
    async fn failure_carries_program_logs_and_is_not_retried() {
        let ledger = MockLedger::new();
        ledger.fail_next_submission(LedgerError::with_logs(
            "Transaction simulation failed",
            vec!["Program log: Impossible to settle game, there is not a player2".to_string()],
        ));
        let payer = Keypair::new();

        let err = Orchestrator::new(&ledger, TIMEOUT)
            .submit(instruction(&[&payer]), &[&payer])
            .await
            .unwrap_err();

        match err {
            EscrowError::TransactionFailed(diagnostic) => assert_eq!(
                diagnostic,
                "Program log: Impossible to settle game, there is not a player2"
            ),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(ledger.calls().submissions, 1);
        assert!(ledger.submitted().is_empty());
    }

    #[tokio::test]
    async fn missing_signer_fails_before_submission() {
        let ledger = MockLedger::new();
        let payer = Keypair::new();
        let game_account = Keypair::new();

        let err = Orchestrator::new(&ledger, TIMEOUT)
            .submit(instruction(&[&payer, &game_account]), &[&payer])
            .await
            .unwrap_err();

        assert!(matches!(err, EscrowError::TransactionFailed(_)));
        assert_eq!(ledger.calls().submissions, 0);
    }

    #[tokio::test]
    async fn no_signers_is_rejected() {
        let ledger = MockLedger::new();
        let err = Orchestrator::new(&ledger, TIMEOUT)
            .submit(instruction(&[]), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, EscrowError::MissingSigner(_)));
        assert_eq!(ledger.calls().blockhash, 0);
    }

    #[tokio::test]
    async fn stalled_confirmation_times_out() {
        let ledger = MockLedger::new();
        ledger.stall_submissions(true);
        let payer = Keypair::new();

        let err = Orchestrator::new(&ledger, Duration::from_millis(50))
            .submit(instruction(&[&payer]), &[&payer])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EscrowError::Timeout {
                stage: "transaction confirmation",
                ..
            }
        ));
    }
}
