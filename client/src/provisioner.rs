//! Fresh game accounts.

use crate::{
    error::{EscrowError, Result},
    ledger::Ledger,
};
use solana_sdk::signature::{Keypair, Signer};
use tracing::{debug, warn};

pub const DEFAULT_MAX_ALLOCATION_ATTEMPTS: usize = 16;

/// Generates keypairs until one addresses an account the ledger has never seen.
pub async fn allocate_fresh_account<L: Ledger>(ledger: &L, max_attempts: usize) -> Result<Keypair> {
    allocate_fresh_account_with(ledger, max_attempts, Keypair::new).await
}

/// Same as [`allocate_fresh_account`] with the candidate source supplied by the caller.
pub async fn allocate_fresh_account_with<L, G>(
    ledger: &L,
    max_attempts: usize,
    mut generate: G,
) -> Result<Keypair>
where
    L: Ledger,
    G: FnMut() -> Keypair,
{
    for attempt in 1..=max_attempts {
        let candidate = generate();
        let address = candidate.pubkey();
        match ledger.account_data(&address).await? {
            None => {
                debug!(%address, attempt, "allocated game account");
                return Ok(candidate);
            }
            Some(_) => warn!(%address, attempt, "address already in use, regenerating"),
        }
    }
    Err(EscrowError::AccountAllocationExhausted {
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockLedger;

    #[tokio::test]
    async fn first_unused_candidate_wins() {
        let ledger = MockLedger::new();
        let candidates: Vec<Keypair> = (0..3).map(|_| Keypair::new()).collect();
        let expected = candidates[2].pubkey();
        ledger.set_account(candidates[0].pubkey(), vec![1; 115]);
        // An existing account with no data is still taken.
        ledger.set_account(candidates[1].pubkey(), Vec::new());

        let mut pool = candidates.into_iter();
        let allocated = allocate_fresh_account_with(&ledger, 8, || pool.next().unwrap())
            .await
            .unwrap();

        assert_eq!(allocated.pubkey(), expected);
        assert_eq!(ledger.calls().account_reads, 3);
    }

    #[tokio::test]
    async fn gives_up_after_the_attempt_limit() {
        let ledger = MockLedger::new();
        let taken = Keypair::new();
        ledger.set_account(taken.pubkey(), vec![0; 115]);

        let err = allocate_fresh_account_with(&ledger, 4, || taken.insecure_clone())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EscrowError::AccountAllocationExhausted { attempts: 4 }
        ));
        assert_eq!(ledger.calls().account_reads, 4);
    }

    #[tokio::test]
    async fn random_candidates_are_unused_on_an_empty_ledger() {
        let ledger = MockLedger::new();
        let allocated = allocate_fresh_account(&ledger, DEFAULT_MAX_ALLOCATION_ATTEMPTS)
            .await
            .unwrap();
        assert_eq!(ledger.calls().account_reads, 1);
        assert!(ledger.account(&allocated.pubkey()).is_none());
    }

    #[tokio::test]
    async fn read_failures_abort_allocation() {
        let ledger = MockLedger::new();
        ledger.fail_account_reads(true);
        let err = allocate_fresh_account(&ledger, 4).await.unwrap_err();
        assert!(matches!(err, EscrowError::Ledger(_)));
    }
}
