use crate::error::{EscrowError, Result};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

/// Rendered in place of a winner identity while the winner field is zeroed.
pub const NO_WINNER: &str = "No winner";

/// Snapshot of the game account as written by the escrow program.
#[derive(BorshSerialize, BorshDeserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct GameState {
    pub player1: Pubkey,// 32 bytes
    pub player2: Pubkey,// 32 bytes
    pub player1_choice: bool, // Player 1's bet: true for increase, false for decrease
    pub player2_choice: bool,
    pub entry_price: u64, // 8 implied decimals
    pub last_price: u64, // 8 bytes
    pub game_active: bool,// 1 byte (0 or 1 to represent true/false)
    pub winner: Pubkey,// all zero until a winner is decided
}

impl GameState {
    pub const LEN: usize = 32 + // player1
        32 + // player2
        1 +  // player1_choice
        1 +  // player2_choice
        8 +  // entry_price
        8 +  // last_price
        1 +  // game_active
        32;  // winner

    /// Decodes the raw data of `address`; `None` means the ledger has no account there.
    pub fn unpack(address: &Pubkey, data: Option<&[u8]>) -> Result<Self> {
        let data = data.ok_or(EscrowError::AccountDataAbsent(*address))?;
        if data.len() != Self::LEN {
            return Err(EscrowError::MalformedAccountData(format!(
                "expected {} bytes, got {}",
                Self::LEN,
                data.len()
            )));
        }
        Self::try_from_slice(data).map_err(|e| EscrowError::MalformedAccountData(e.to_string()))
    }

    pub fn pack(&self) -> std::io::Result<Vec<u8>> {
        borsh::to_vec(self)
    }

    pub fn has_player2(&self) -> bool {
        self.player2 != Pubkey::default()
    }

    pub fn winner(&self) -> Option<Pubkey> {
        if self.winner == Pubkey::default() {
            None
        } else {
            Some(self.winner)
        }
    }

    /// Base58 identity of the winner, or [`NO_WINNER`].
    pub fn winner_label(&self) -> String {
        self.winner()
            .map(|winner| winner.to_string())
            .unwrap_or_else(|| NO_WINNER.to_string())
    }
}
