use solana_program::pubkey::Pubkey;
use std::time::Duration;
use thiserror::Error;

/// Error type for escrow client operations.
#[derive(Error, Debug)]
pub enum EscrowError {
    #[error("unsupported parameter type for {name}")]
    UnsupportedParameterType { name: String },
    #[error("invalid price: {0}")]
    InvalidPrice(f64),
    #[error("invalid instruction data")]
    InvalidInstructionData,
    #[error("account {0} holds no data")]
    AccountDataAbsent(Pubkey),
    #[error("malformed account data: {0}")]
    MalformedAccountData(String),
    #[error("no unused account address found after {attempts} attempts")]
    AccountAllocationExhausted { attempts: usize },
    #[error("transaction failed: {0}")]
    TransactionFailed(String),
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: &'static str, after: Duration },
    #[error("game with ID {0} not found")]
    GameNotFound(String),
    #[error("game with ID {0} is already closed")]
    GameClosed(String),
    #[error("failed to create game: {0}")]
    GameCreationFailed(#[source] Box<EscrowError>),
    #[error("game account {0} unavailable after settlement")]
    SettlementStateUnavailable(Pubkey),
    #[error("missing signer: {0}")]
    MissingSigner(&'static str),
    #[error("store error: {0}")]
    Store(String),
}

/// Result type for escrow client operations.
pub type Result<T> = std::result::Result<T, EscrowError>;

/// Failure reported by the ledger RPC endpoint.
///
/// `logs` carries the program log lines when the node ran a preflight
/// simulation and returned them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct LedgerError {
    pub message: String,
    pub logs: Option<Vec<String>>,
}

impl LedgerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            logs: None,
        }
    }

    pub fn with_logs(message: impl Into<String>, logs: Vec<String>) -> Self {
        Self {
            message: message.into(),
            logs: Some(logs),
        }
    }

    /// Program logs when present, otherwise the raw message.
    pub fn diagnostic(&self) -> String {
        match &self.logs {
            Some(logs) if !logs.is_empty() => logs.join("\n"),
            _ => self.message.clone(),
        }
    }
}
