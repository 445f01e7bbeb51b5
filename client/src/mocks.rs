//! In-memory [`Ledger`] for tests and local experiments.

use crate::{error::LedgerError, ledger::Ledger};
use solana_program::{hash::Hash, pubkey::Pubkey};
use solana_sdk::{signature::Signature, transaction::Transaction};
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

/// Number of calls the mock has served, per ledger method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedgerCalls {
    pub blockhash: usize,
    pub account_reads: usize,
    pub submissions: usize,
}

impl LedgerCalls {
    pub fn total(&self) -> usize {
        self.blockhash + self.account_reads + self.submissions
    }
}

#[derive(Default)]
struct MockState {
    blockhash: Hash,
    accounts: HashMap<Pubkey, Vec<u8>>,
    // Written into `accounts` when the next submission confirms.
    staged: Vec<(Pubkey, Vec<u8>)>,
    submitted: Vec<Transaction>,
    calls: LedgerCalls,
    fail_next_submission: Option<LedgerError>,
    fail_account_reads: bool,
    stall_submissions: bool,
}

/// Ledger double holding accounts in memory and accepting any correctly signed
/// transaction anchored to its current blockhash.
pub struct MockLedger {
    state: Mutex<MockState>,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                blockhash: Hash::new_unique(),
                ..MockState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the state from the others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn blockhash(&self) -> Hash {
        self.state().blockhash
    }

    /// Moves the chain forward; transactions signed on the old hash are rejected.
    pub fn advance_blockhash(&self) -> Hash {
        let mut state = self.state();
        state.blockhash = Hash::new_unique();
        state.blockhash
    }

    pub fn set_account(&self, address: Pubkey, data: Vec<u8>) {
        self.state().accounts.insert(address, data);
    }

    pub fn remove_account(&self, address: &Pubkey) {
        self.state().accounts.remove(address);
    }

    pub fn account(&self, address: &Pubkey) -> Option<Vec<u8>> {
        self.state().accounts.get(address).cloned()
    }

    /// Stores `data` at `address` once the next submission confirms, as the
    /// program would when it rewrites the game account.
    pub fn stage_account(&self, address: Pubkey, data: Vec<u8>) {
        self.state().staged.push((address, data));
    }

    pub fn fail_next_submission(&self, error: LedgerError) {
        self.state().fail_next_submission = Some(error);
    }

    pub fn fail_account_reads(&self, fail: bool) {
        self.state().fail_account_reads = fail;
    }

    pub fn stall_submissions(&self, stall: bool) {
        self.state().stall_submissions = stall;
    }

    /// Confirmed transactions, oldest first.
    pub fn submitted(&self) -> Vec<Transaction> {
        self.state().submitted.clone()
    }

    pub fn calls(&self) -> LedgerCalls {
        self.state().calls
    }
}

impl Ledger for MockLedger {
    async fn latest_blockhash(&self) -> Result<Hash, LedgerError> {
        let mut state = self.state();
        state.calls.blockhash += 1;
        Ok(state.blockhash)
    }

    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, LedgerError> {
        let mut state = self.state();
        state.calls.account_reads += 1;
        if state.fail_account_reads {
            return Err(LedgerError::new("account read failed"));
        }
        Ok(state.accounts.get(address).cloned())
    }

    async fn send_and_confirm(&self, transaction: &Transaction) -> Result<Signature, LedgerError> {
        let stall = {
            let mut state = self.state();
            state.calls.submissions += 1;
            state.stall_submissions
        };
        if stall {
            std::future::pending::<()>().await;
        }

        let mut state = self.state();
        if let Some(error) = state.fail_next_submission.take() {
            state.staged.clear();
            return Err(error);
        }
        if transaction.message.recent_blockhash != state.blockhash {
            return Err(LedgerError::new("Blockhash not found"));
        }
        if transaction.verify().is_err() {
            return Err(LedgerError::new(
                "Transaction did not pass signature verification",
            ));
        }
        let staged = std::mem::take(&mut state.staged);
        state.accounts.extend(staged);
        state.submitted.push(transaction.clone());
        Ok(transaction.signatures[0])
    }
}
