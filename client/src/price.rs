//! Fixed-point prices as they cross the wire: u64 with 8 implied fraction digits.

use crate::error::{EscrowError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const PRICE_DECIMALS: u32 = 8;
pub const PRICE_SCALE: u64 = 100_000_000;

// 2^64 as f64; any scaled value at or above it does not fit a u64.
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(u64);

impl Price {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Scales by 10^8 and drops the remaining fraction.
    pub fn truncated(value: f64) -> Result<Self> {
        Self::scale(value).map(|scaled| Self(scaled.trunc() as u64))
    }

    /// Scales by 10^8 and rounds half away from zero.
    pub fn rounded(value: f64) -> Result<Self> {
        let scaled = Self::scale(value)?.round();
        if scaled >= U64_LIMIT {
            return Err(EscrowError::InvalidPrice(value));
        }
        Ok(Self(scaled as u64))
    }

    fn scale(value: f64) -> Result<f64> {
        if !value.is_finite() || value < 0.0 {
            return Err(EscrowError::InvalidPrice(value));
        }
        let scaled = value * PRICE_SCALE as f64;
        if scaled >= U64_LIMIT {
            return Err(EscrowError::InvalidPrice(value));
        }
        Ok(scaled)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub const fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:08}",
            self.0 / PRICE_SCALE,
            self.0 % PRICE_SCALE
        )
    }
}
