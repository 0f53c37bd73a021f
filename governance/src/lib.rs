//! LCT Governance client core
//!
//! Reconstructs proposal lifecycle, per-account vote state, withdrawal
//! eligibility and stake tallies from the data the governance ledger exposes.
//! The ledger stays authoritative; everything here is recomputed on demand
//! from an explicit snapshot, account and current time.

pub mod board;
pub mod config;
pub mod error;
pub mod ledger;
pub mod proposal;
pub mod stake;
pub mod tally;
pub mod time_codec;
pub mod voting;
pub mod withdrawal;

pub use board::{ProposalBoard, ProposalView};
pub use config::{Config, ConfigError};
pub use error::{GovernanceError, Result};
pub use ledger::{GovernanceActions, LedgerClient, LedgerQuery};
pub use proposal::{
    classify, Account, FieldErrors, Proposal, ProposalDraft, ProposalId, ProposalPhase,
    ValidProposal, Vote,
};
pub use stake::{to_display_stake, to_raw_stake, DisplayStake, RawStake, VotingPower};
pub use tally::{aggregate, Tally};
pub use time_codec::{date_to_epoch_seconds, epoch_seconds_to_date_string, EpochSeconds};
pub use voting::{project, AccountVoteView, VoteActions, VoteRequest, VoteSide};
pub use withdrawal::{can_withdraw, EligibilityTracker, LookupTicket, WithdrawalQuery};

/// Fixed protocol constants
pub mod constants {
    /// Implied fractional decimal digits of a raw stake amount
    pub const STAKE_DECIMALS: u32 = 18;

    /// Percentage shown on both sides of an empty tally
    pub const EMPTY_TALLY_PERCENTAGE: f64 = 1.0;

    /// Seconds in one calendar day (UTC, no leap seconds)
    pub const SECONDS_PER_DAY: u64 = 86_400;

    /// Smallest voting power the vote form accepts, in whole tokens
    pub const MIN_VOTING_POWER: u64 = 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_governance_constants() {
        assert_eq!(constants::STAKE_DECIMALS, 18);
        assert_eq!(constants::EMPTY_TALLY_PERCENTAGE, 1.0);
        assert_eq!(constants::SECONDS_PER_DAY, 24 * 60 * 60);
    }
}
