//! Governance error types

use ethnum::U256;
use thiserror::Error;

use crate::proposal::FieldErrors;

#[derive(Error, Debug)]
pub enum GovernanceError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Voting power out of range: requested {requested}, allowed {min}..={max}")]
    OutOfRange { requested: u64, min: u64, max: U256 },

    #[error("Inconsistent ledger: account {account} on proposal {proposal_id}: {reason}")]
    InconsistentLedger {
        proposal_id: u64,
        account: String,
        reason: String,
    },

    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("Invalid proposal: {0}")]
    Validation(FieldErrors),

    #[error("Voting period not active: {0}")]
    VotingNotActive(String),

    #[error("Already voted: {0}")]
    AlreadyVoted(String),

    #[error("Nothing to withdraw: {0}")]
    WithdrawalUnavailable(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Proposal not found: {0}")]
    ProposalNotFound(u64),
}

impl GovernanceError {
    /// Field-level input errors the caller can fix by re-entry
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidDate(_) | Self::OutOfRange { .. } | Self::Validation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, GovernanceError>;
