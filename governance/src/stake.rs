//! Stake arithmetic
//!
//! Raw stakes are fixed-point integers with 18 implied decimals. They are
//! kept as 256-bit integers end to end and only split into whole and
//! fractional parts for display.

use std::fmt;

use ethnum::U256;
use serde::{Deserialize, Serialize};

use crate::constants::MIN_VOTING_POWER;
use crate::error::{GovernanceError, Result};

/// Stake in the ledger's smallest unit (10^-18 of a token)
pub type RawStake = U256;

/// 10^18, the number of raw units in one whole token
pub const STAKE_SCALE: U256 = U256::new(1_000_000_000_000_000_000);

/// Display-precision stake: whole tokens plus an 18-digit fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DisplayStake {
    whole: U256,
    fraction: u64,
}

impl DisplayStake {
    pub const ZERO: DisplayStake = DisplayStake {
        whole: U256::ZERO,
        fraction: 0,
    };

    pub fn from_whole(units: u64) -> Self {
        Self {
            whole: U256::from(units),
            fraction: 0,
        }
    }

    /// Whole tokens, rounded down
    pub fn floor(&self) -> U256 {
        self.whole
    }

    /// Fractional part in raw units, always below 10^18
    pub fn fraction(&self) -> u64 {
        self.fraction
    }

    pub fn is_zero(&self) -> bool {
        self.whole == U256::ZERO && self.fraction == 0
    }

    /// Back to raw units without loss
    pub fn to_raw(&self) -> RawStake {
        self.whole * STAKE_SCALE + U256::from(self.fraction)
    }
}

impl fmt::Display for DisplayStake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fraction == 0 {
            return write!(f, "{}", self.whole);
        }
        let digits = format!("{:018}", self.fraction);
        write!(f, "{}.{}", self.whole, digits.trim_end_matches('0'))
    }
}

/// Divide a raw stake by 10^18.
pub fn to_display_stake(raw: RawStake) -> DisplayStake {
    let fraction = u64::try_from(raw % STAKE_SCALE).unwrap_or(0);
    DisplayStake {
        whole: raw / STAKE_SCALE,
        fraction,
    }
}

/// Multiply a whole-token count by 10^18. Cannot overflow for any `u64`.
pub fn to_raw_stake(whole_units: u64) -> RawStake {
    U256::from(whole_units) * STAKE_SCALE
}

/// Largest whole-token voting power a balance can back
pub fn max_voting_power(balance: RawStake) -> U256 {
    balance / STAKE_SCALE
}

/// A voting power chosen within `[1, floor(balance / 10^18)]` whole tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VotingPower {
    whole_units: u64,
    raw: RawStake,
}

impl VotingPower {
    /// Validate a selection against the account balance.
    ///
    /// The balance must be the caller's freshly queried token balance; the
    /// ledger rejects stakes the account cannot cover anyway, this check only
    /// keeps the request from being sent.
    pub fn select(whole_units: u64, balance: RawStake) -> Result<Self> {
        let max = max_voting_power(balance);
        if whole_units < MIN_VOTING_POWER || U256::from(whole_units) > max {
            return Err(GovernanceError::OutOfRange {
                requested: whole_units,
                min: MIN_VOTING_POWER,
                max,
            });
        }

        Ok(Self {
            whole_units,
            raw: to_raw_stake(whole_units),
        })
    }

    pub fn whole_units(&self) -> u64 {
        self.whole_units
    }

    pub fn raw(&self) -> RawStake {
        self.raw
    }
}

/// Parse a raw stake from a decimal or `0x`-prefixed hex string.
pub fn parse_raw_stake(input: &str) -> std::result::Result<RawStake, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => U256::from_str_radix(hex, 16),
        None => U256::from_str_radix(input, 10),
    };
    parsed.map_err(|e| format!("invalid stake amount {:?}: {}", input, e))
}

/// Serde adapter: raw stakes travel as decimal strings, and are accepted as
/// decimal strings, hex strings or plain JSON integers.
pub mod serde_raw_stake {
    use std::fmt;

    use serde::{de, Deserializer, Serializer};

    use super::{parse_raw_stake, RawStake};

    pub fn serialize<S: Serializer>(value: &RawStake, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RawStake, D::Error> {
        deserializer.deserialize_any(RawStakeVisitor)
    }

    struct RawStakeVisitor;

    impl<'de> de::Visitor<'de> for RawStakeVisitor {
        type Value = RawStake;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-negative integer or integer string")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<RawStake, E> {
            Ok(RawStake::from(value))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<RawStake, E> {
            u64::try_from(value)
                .map(RawStake::from)
                .map_err(|_| E::custom(format!("negative stake amount {}", value)))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<RawStake, E> {
            parse_raw_stake(value).map_err(E::custom)
        }
    }
}

/// Token balance as reported by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    #[serde(with = "serde_raw_stake")]
    pub balance: RawStake,
}
