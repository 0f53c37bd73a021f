//! Stake tally for the for/against scale

use std::fmt;

use ethnum::U256;

use crate::constants::EMPTY_TALLY_PERCENTAGE;
use crate::proposal::Vote;
use crate::stake::{to_display_stake, DisplayStake, RawStake};

/// Percentages are resolved to 10^-6 of a percent.
const PERCENT_SCALE: U256 = U256::new(100_000_000);
const PERCENT_DIVISOR: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tally {
    pub for_total: DisplayStake,
    pub against_total: DisplayStake,
    pub for_percentage: f64,
    pub against_percentage: f64,
}

impl Tally {
    /// No stake on either side
    pub fn is_empty(&self) -> bool {
        self.for_total.is_zero() && self.against_total.is_zero()
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "for {} ({:.2}%) / against {} ({:.2}%)",
            self.for_total, self.for_percentage, self.against_total, self.against_percentage
        )
    }
}

/// Sum both sides in raw units, then convert once.
///
/// With no stake at all both percentages are 1, which leaves a sliver of
/// each colour on an otherwise empty scale.
pub fn aggregate(positive: &[Vote], negative: &[Vote]) -> Tally {
    let for_raw = sum_stakes(positive);
    let against_raw = sum_stakes(negative);
    let total = for_raw.saturating_add(against_raw);

    let (for_percentage, against_percentage) = if total == U256::ZERO {
        (EMPTY_TALLY_PERCENTAGE, EMPTY_TALLY_PERCENTAGE)
    } else {
        let for_percentage = percentage(for_raw, total);
        (for_percentage, 100.0 - for_percentage)
    };

    Tally {
        for_total: to_display_stake(for_raw),
        against_total: to_display_stake(against_raw),
        for_percentage,
        against_percentage,
    }
}

fn sum_stakes(votes: &[Vote]) -> RawStake {
    votes
        .iter()
        .fold(U256::ZERO, |acc, vote| acc.saturating_add(vote.stake))
}

/// `100 * part / total` rounded to nearest, for `part <= total`, `total > 0`
fn percentage(part: RawStake, total: RawStake) -> f64 {
    let two = U256::new(2);
    let (mut part, mut total) = (part, total);
    let scaled = loop {
        let numerator = part
            .checked_mul(PERCENT_SCALE)
            .and_then(|n| n.checked_add(total / two));
        match numerator {
            Some(n) => break n / total,
            None => {
                part /= two;
                total /= two;
            }
        }
    };

    u64::try_from(scaled).unwrap_or(u64::MAX) as f64 / PERCENT_DIVISOR
}
