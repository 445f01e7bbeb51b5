use crate::price::Price;
use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;

/// Local mirror of a game created through this client.
///
/// The ledger account stays the source of truth for the outcome; this record
/// only remembers which account belongs to which game id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub id: String,
    #[serde(rename = "gameAccountPublicKey", with = "base58")]
    pub game_account: Pubkey,
    #[serde(rename = "player1PublicKey", with = "base58")]
    pub player1: Pubkey,
    pub entry_price: Price,
    #[serde(default)]
    pub is_closed: bool,
}

impl GameRecord {
    pub fn new(game_account: Pubkey, player1: Pubkey, entry_price: Price) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            game_account,
            player1,
            entry_price,
            is_closed: false,
        }
    }
}

mod base58 {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use solana_program::pubkey::Pubkey;
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(key: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(key)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Pubkey, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Pubkey::from_str(&encoded).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_records_start_open_with_unique_ids() {
        let account = Pubkey::new_unique();
        let player1 = Pubkey::new_unique();
        let a = GameRecord::new(account, player1, Price::from_raw(250_000_000_000));
        let b = GameRecord::new(account, player1, Price::from_raw(250_000_000_000));
        assert!(!a.is_closed);
        assert_ne!(a.id, b.id);
        assert!(uuid::Uuid::parse_str(&a.id).is_ok());
    }

    #[test]
    fn json_uses_base58_keys() {
        let record = GameRecord::new(
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Price::from_raw(250_000_000_000),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["gameAccountPublicKey"], record.game_account.to_string());
        assert_eq!(json["player1PublicKey"], record.player1.to_string());
        assert_eq!(json["entryPrice"], 250_000_000_000u64);
        assert_eq!(json["isClosed"], false);

        let parsed: GameRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn rejects_bad_base58() {
        let json = serde_json::json!({
            "id": "x",
            "gameAccountPublicKey": "not-a-key",
            "player1PublicKey": Pubkey::new_unique().to_string(),
            "entryPrice": 1,
        });
        assert!(serde_json::from_value::<GameRecord>(json).is_err());
    }
}
