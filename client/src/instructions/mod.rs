//! Instruction payloads understood by the escrow program, plus the account
//! lists and processor operations that send them.

pub mod close_game;
pub mod create_game;
pub mod join_game;
pub mod settle_game;
pub mod withdraw_funds;

use crate::{
    error::{EscrowError, Result},
    price::Price,
};
use serde_json::Value;

pub const CREATE_GAME: u8 = 0;
pub const FETCH_PRICE: u8 = 1;
pub const JOIN_GAME: u8 = 2;
pub const SETTLE_GAME: u8 = 3;
pub const WITHDRAW_FUNDS: u8 = 4;
pub const CLOSE_GAME: u8 = 5;

/// Instructions for the escrow program, one variant per opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EscrowInstruction {
    /// Open a game and deposit player 1's stake.
    /// Accounts expected:
    /// 0. `[signer, writable]` Payer (player 1)
    /// 1. `[signer, writable]` Game account, freshly generated
    /// 2. `[writable]` Escrow token account
    /// 3. `[writable]` Payer token account
    /// 4. `[]` Token program
    /// 5. `[]` Price oracle
    /// 6. `[]` System program
    CreateGame {
        player1_choice: bool,
        entry_price: Price,
    },

    /// Refresh `last_price` in the game account from the oracle. The
    /// program runs it internally when a supplied price is zero; this
    /// client never sends it on its own.
    FetchPrice,

    /// Seat player 2 and deposit their stake.
    /// Accounts expected:
    /// 0. `[signer, writable]` Player 2
    /// 1. `[writable]` Game account
    /// 2. `[writable]` Escrow token account
    /// 3. `[writable]` Player 2 token account
    /// 4. `[]` Token program
    /// 5. `[]` Price oracle
    /// 6. `[]` System program
    JoinGame { last_price: Price },

    /// Decide the winner against `last_price`.
    /// Accounts expected:
    /// 0. `[writable]` Game account
    /// 1. `[writable]` Payer token account
    /// 2. `[writable]` Player 2 token account
    /// 3. `[]` Price oracle
    /// 4. `[]` System program
    /// 5. `[signer, writable]` Payer
    /// 6. `[]` Token program
    SettleGame { last_price: Price },

    /// Refund player 1 while no second player has joined.
    /// Accounts expected:
    /// 0. `[signer, writable]` Payer (player 1)
    /// 1. `[writable]` Game account
    /// 2. `[signer]` Escrow token authority
    /// 3. `[writable]` Escrow token account
    /// 4. `[writable]` Payer token account
    /// 5. `[]` Token program
    WithdrawFunds,

    /// Pay the decided winner out of escrow.
    /// Accounts expected:
    /// 0. `[signer, writable]` Payer (player 1)
    /// 1. `[]` Player 2
    /// 2. `[writable]` Game account
    /// 3. `[signer]` Escrow token authority
    /// 4. `[writable]` Escrow token account
    /// 5. `[writable]` Payer token account
    /// 6. `[writable]` Player 2 token account
    /// 7. `[]` Token program
    /// 8. `[]` Price oracle
    CloseGame,
}

impl EscrowInstruction {
    pub fn opcode(&self) -> u8 {
        match self {
            Self::CreateGame { .. } => CREATE_GAME,
            Self::FetchPrice => FETCH_PRICE,
            Self::JoinGame { .. } => JOIN_GAME,
            Self::SettleGame { .. } => SETTLE_GAME,
            Self::WithdrawFunds => WITHDRAW_FUNDS,
            Self::CloseGame => CLOSE_GAME,
        }
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(10);
        data.push(self.opcode());
        match self {
            Self::CreateGame {
                player1_choice,
                entry_price,
            } => {
                data.push(u8::from(*player1_choice));
                data.extend_from_slice(&entry_price.to_le_bytes());
            }
            Self::JoinGame { last_price } | Self::SettleGame { last_price } => {
                data.extend_from_slice(&last_price.to_le_bytes());
            }
            Self::FetchPrice | Self::WithdrawFunds | Self::CloseGame => {}
        }
        data
    }

    /// Parses a payload the way the program's dispatcher reads it.
    pub fn unpack(data: &[u8]) -> Result<Self> {
        let (&opcode, rest) = data
            .split_first()
            .ok_or(EscrowError::InvalidInstructionData)?;
        Ok(match opcode {
            CREATE_GAME => {
                let (&choice, rest) = rest
                    .split_first()
                    .ok_or(EscrowError::InvalidInstructionData)?;
                Self::CreateGame {
                    player1_choice: choice != 0,
                    entry_price: read_price(rest)?,
                }
            }
            FETCH_PRICE => Self::FetchPrice,
            JOIN_GAME => Self::JoinGame {
                last_price: read_price(rest)?,
            },
            SETTLE_GAME => Self::SettleGame {
                last_price: read_price(rest)?,
            },
            WITHDRAW_FUNDS => Self::WithdrawFunds,
            CLOSE_GAME => Self::CloseGame,
            _ => return Err(EscrowError::InvalidInstructionData),
        })
    }
}

fn read_price(data: &[u8]) -> Result<Price> {
    data.get(..8)
        .and_then(|bytes| bytes.try_into().ok())
        .map(|bytes| Price::from_raw(u64::from_le_bytes(bytes)))
        .ok_or(EscrowError::InvalidInstructionData)
}

/// Encodes an opcode followed by loosely typed parameters, in the given order.
///
/// Booleans take one byte, numbers become a truncated [`Price`] (8 bytes LE)
/// and arrays of byte values are copied verbatim. Every parameter is checked
/// before anything is returned.
pub fn encode_params(opcode: u8, params: &[(&str, Value)]) -> Result<Vec<u8>> {
    let mut blocks = Vec::with_capacity(params.len());
    for (name, value) in params {
        blocks.push(encode_param(name, value)?);
    }
    let mut data = Vec::with_capacity(1 + blocks.iter().map(Vec::len).sum::<usize>());
    data.push(opcode);
    for block in blocks {
        data.extend_from_slice(&block);
    }
    Ok(data)
}

fn encode_param(name: &str, value: &Value) -> Result<Vec<u8>> {
    let unsupported = || EscrowError::UnsupportedParameterType {
        name: name.to_string(),
    };
    match value {
        Value::Bool(flag) => Ok(vec![u8::from(*flag)]),
        Value::Number(number) => {
            let value = number.as_f64().ok_or_else(unsupported)?;
            Ok(Price::truncated(value)?.to_le_bytes().to_vec())
        }
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|byte| u8::try_from(byte).ok())
                    .ok_or_else(unsupported)
            })
            .collect(),
        _ => Err(unsupported()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn price(value: f64) -> Price {
        Price::truncated(value).unwrap()
    }

    #[test]
    fn payload_widths_follow_parameters() {
        let cases = [
            (
                EscrowInstruction::CreateGame {
                    player1_choice: false,
                    entry_price: price(2500.0),
                },
                10,
            ),
            (EscrowInstruction::FetchPrice, 1),
            (EscrowInstruction::JoinGame { last_price: price(2600.0) }, 9),
            (EscrowInstruction::SettleGame { last_price: price(2601.0) }, 9),
            (EscrowInstruction::WithdrawFunds, 1),
            (EscrowInstruction::CloseGame, 1),
        ];
        for (instruction, len) in cases {
            let data = instruction.pack();
            assert_eq!(data.len(), len, "{instruction:?}");
            assert_eq!(data[0], instruction.opcode());
        }
    }

    #[test]
    fn create_payload_bytes() {
        let data = EscrowInstruction::CreateGame {
            player1_choice: false,
            entry_price: price(2500.0),
        }
        .pack();
        let mut expected = vec![0u8, 0u8];
        expected.extend_from_slice(&250_000_000_000u64.to_le_bytes());
        assert_eq!(data, expected);
    }

    #[test]
    fn settle_payload_is_opcode_and_rounded_price() {
        let data = EscrowInstruction::SettleGame {
            last_price: Price::rounded(12.345).unwrap(),
        }
        .pack();
        assert_eq!(data[0], SETTLE_GAME);
        assert_eq!(&data[1..], &1_234_500_000u64.to_le_bytes());
    }

    #[test]
    fn unpack_reads_what_pack_writes() {
        for instruction in [
            EscrowInstruction::CreateGame {
                player1_choice: true,
                entry_price: Price::from_raw(u64::MAX),
            },
            EscrowInstruction::JoinGame {
                last_price: Price::from_raw(0),
            },
            EscrowInstruction::SettleGame {
                last_price: price(2601.0),
            },
            EscrowInstruction::FetchPrice,
            EscrowInstruction::WithdrawFunds,
            EscrowInstruction::CloseGame,
        ] {
            assert_eq!(EscrowInstruction::unpack(&instruction.pack()).unwrap(), instruction);
        }
    }

    #[test]
    fn unpack_rejects_short_and_unknown_payloads() {
        for data in [&[][..], &[0, 1, 2][..], &[2, 0, 0][..], &[3][..], &[6][..], &[255][..]] {
            assert!(matches!(
                EscrowInstruction::unpack(data),
                Err(EscrowError::InvalidInstructionData)
            ));
        }
    }

    #[test]
    fn open_encoder_matches_typed_create() {
        let dynamic = encode_params(
            CREATE_GAME,
            &[("player1_choice", json!(false)), ("entry_price", json!(2500))],
        )
        .unwrap();
        let typed = EscrowInstruction::CreateGame {
            player1_choice: false,
            entry_price: price(2500.0),
        }
        .pack();
        assert_eq!(dynamic, typed);

        let float = encode_params(
            CREATE_GAME,
            &[("player1_choice", json!(false)), ("entry_price", json!(2500.0))],
        )
        .unwrap();
        assert_eq!(float, typed);
    }

    #[test]
    fn open_encoder_keeps_caller_order() {
        let data = encode_params(
            9,
            &[
                ("raw", json!([0xde, 0xad])),
                ("flag", json!(true)),
                ("price", json!(1)),
            ],
        )
        .unwrap();
        assert_eq!(data.len(), 1 + 2 + 1 + 8);
        assert_eq!(&data[..4], &[9, 0xde, 0xad, 1]);
        assert_eq!(&data[4..], &100_000_000u64.to_le_bytes());
    }

    #[test]
    fn open_encoder_rejects_unsupported_kinds() {
        for value in [json!("2500"), json!(null), json!({"a": 1}), json!([256]), json!([-1])] {
            match encode_params(0, &[("player1_choice", json!(true)), ("bad", value)]) {
                Err(EscrowError::UnsupportedParameterType { name }) => assert_eq!(name, "bad"),
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }
}
