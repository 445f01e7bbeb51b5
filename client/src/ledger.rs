//! Access to the ledger: blockhashes, raw account data and transaction submission.

use crate::error::LedgerError;
use solana_client::{
    client_error::{ClientError, ClientErrorKind},
    nonblocking::rpc_client::RpcClient,
    rpc_request::{RpcError, RpcResponseErrorData},
};
use solana_program::{hash::Hash, pubkey::Pubkey};
use solana_sdk::{
    commitment_config::CommitmentConfig, signature::Signature, transaction::Transaction,
};
use std::future::Future;
use tracing::debug;

/// The three ledger calls the client depends on.
pub trait Ledger: Send + Sync {
    fn latest_blockhash(&self) -> impl Future<Output = Result<Hash, LedgerError>> + Send;

    /// Raw data at `address`. `None` when no account exists there; an existing
    /// account with an empty data field is `Some(vec![])`.
    fn account_data(
        &self,
        address: &Pubkey,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, LedgerError>> + Send;

    /// Submits once and waits for confirmation.
    fn send_and_confirm(
        &self,
        transaction: &Transaction,
    ) -> impl Future<Output = Result<Signature, LedgerError>> + Send;
}

/// [`Ledger`] backed by a JSON-RPC node at `confirmed` commitment.
pub struct RpcLedger {
    client: RpcClient,
}

impl RpcLedger {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: RpcClient::new_with_commitment(url.into(), CommitmentConfig::confirmed()),
        }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }
}

impl Ledger for RpcLedger {
    async fn latest_blockhash(&self) -> Result<Hash, LedgerError> {
        let blockhash = self
            .client
            .get_latest_blockhash()
            .await
            .map_err(ledger_error)?;
        debug!(%blockhash, "fetched latest blockhash");
        Ok(blockhash)
    }

    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, LedgerError> {
        let response = self
            .client
            .get_account_with_commitment(address, self.client.commitment())
            .await
            .map_err(ledger_error)?;
        Ok(response.value.map(|account| account.data))
    }

    async fn send_and_confirm(&self, transaction: &Transaction) -> Result<Signature, LedgerError> {
        self.client
            .send_and_confirm_transaction(transaction)
            .await
            .map_err(ledger_error)
    }
}

/// Keeps the program logs of a failed preflight simulation when the node sent them.
fn ledger_error(error: ClientError) -> LedgerError {
    if let ClientErrorKind::RpcError(RpcError::RpcResponseError {
        message,
        data: RpcResponseErrorData::SendTransactionPreflightFailure(simulation),
        ..
    }) = error.kind()
    {
        if let Some(logs) = &simulation.logs {
            return LedgerError::with_logs(message.clone(), logs.clone());
        }
    }
    LedgerError::new(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_client::rpc_response::RpcSimulateTransactionResult;

    fn preflight_failure(logs: Option<Vec<String>>) -> ClientError {
        let simulation: RpcSimulateTransactionResult =
            serde_json::from_value(serde_json::json!({ "err": null, "logs": logs })).unwrap();
        ClientError::from(ClientErrorKind::RpcError(RpcError::RpcResponseError {
            code: -32002,
            message: "Transaction simulation failed: Error processing Instruction 0".to_string(),
            data: RpcResponseErrorData::SendTransactionPreflightFailure(simulation),
        }))
    }

    #[test]
    fn preflight_logs_are_kept() {
        let logs = vec![
            "Program log: Entering the settle_game instruction".to_string(),
            "Program log: Impossible to settle game, game is inactive".to_string(),
        ];
        let error = ledger_error(preflight_failure(Some(logs.clone())));
        assert_eq!(error.logs, Some(logs));
        assert_eq!(
            error.message,
            "Transaction simulation failed: Error processing Instruction 0"
        );
    }

    #[test]
    fn other_errors_keep_their_message() {
        let error = ledger_error(preflight_failure(None));
        assert!(error.logs.is_none());

        let error = ledger_error(ClientError::from(ClientErrorKind::Custom(
            "connection refused".to_string(),
        )));
        assert!(error.logs.is_none());
        assert!(error.message.contains("connection refused"));
    }

    #[test]
    fn rpc_ledger_keeps_url() {
        let ledger = RpcLedger::new("http://127.0.0.1:8899");
        assert_eq!(ledger.url(), "http://127.0.0.1:8899");
    }
}
