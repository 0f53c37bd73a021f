//! Per-account vote projection and the actions it unlocks

use serde::{Deserialize, Serialize};

use crate::error::{GovernanceError, Result};
use crate::proposal::{Account, Proposal, ProposalId, ProposalPhase};
use crate::stake::{RawStake, VotingPower};
use crate::time_codec::EpochSeconds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteSide {
    InFavor,
    Against,
}

impl VoteSide {
    pub fn in_favor(&self) -> bool {
        matches!(self, Self::InFavor)
    }
}

/// What an account has on record for one proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountVoteView {
    NoVote,
    VotedFor(RawStake),
    VotedAgainst(RawStake),
}

impl AccountVoteView {
    pub fn has_voted(&self) -> bool {
        !matches!(self, Self::NoVote)
    }

    pub fn side(&self) -> Option<VoteSide> {
        match self {
            Self::NoVote => None,
            Self::VotedFor(_) => Some(VoteSide::InFavor),
            Self::VotedAgainst(_) => Some(VoteSide::Against),
        }
    }

    pub fn stake(&self) -> Option<RawStake> {
        match self {
            Self::NoVote => None,
            Self::VotedFor(stake) | Self::VotedAgainst(stake) => Some(*stake),
        }
    }
}

/// Derive the account's vote from the proposal's vote lists.
///
/// More than one entry for the account, in either or both lists, is an
/// upstream invariant violation and is reported as `InconsistentLedger`
/// instead of being resolved in favour of one side.
pub fn project(proposal: &Proposal, account: &Account) -> Result<AccountVoteView> {
    let mut positive = proposal.positive.iter().filter(|v| &v.voter == account);
    let mut negative = proposal.negative.iter().filter(|v| &v.voter == account);

    let for_vote = positive.next();
    let against_vote = negative.next();
    let for_count = for_vote.map_or(0, |_| 1 + positive.count());
    let against_count = against_vote.map_or(0, |_| 1 + negative.count());

    if for_count > 0 && against_count > 0 {
        log::warn!(
            "⚠️ Account {} voted both for and against proposal {}",
            account,
            proposal.id
        );
        return Err(GovernanceError::InconsistentLedger {
            proposal_id: proposal.id,
            account: account.to_string(),
            reason: "recorded in both the for and against lists".to_string(),
        });
    }

    if for_count > 1 || against_count > 1 {
        log::warn!(
            "⚠️ Account {} has {} votes on proposal {}",
            account,
            for_count + against_count,
            proposal.id
        );
        return Err(GovernanceError::InconsistentLedger {
            proposal_id: proposal.id,
            account: account.to_string(),
            reason: format!("recorded {} times", for_count + against_count),
        });
    }

    Ok(match (for_vote, against_vote) {
        (Some(vote), _) => AccountVoteView::VotedFor(vote.stake),
        (None, Some(vote)) => AccountVoteView::VotedAgainst(vote.stake),
        (None, None) => AccountVoteView::NoVote,
    })
}

/// Vote buttons a front end should offer for one proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteActions {
    pub cast_for: bool,
    pub cast_against: bool,
    /// Side already on record, shown as selected
    pub highlighted: Option<VoteSide>,
}

impl VoteActions {
    /// Casting is offered only to a connected account with no vote on an
    /// active proposal.
    pub fn resolve(phase: ProposalPhase, view: &AccountVoteView, connected: bool) -> Self {
        let open = connected && phase.is_active() && !view.has_voted();
        Self {
            cast_for: open,
            cast_against: open,
            highlighted: view.side(),
        }
    }

    /// Nothing is offered while the ledger disagrees with itself.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn can_cast(&self) -> bool {
        self.cast_for || self.cast_against
    }
}

/// A vote ready to be sent to the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteRequest {
    pub proposal_id: ProposalId,
    pub side: VoteSide,
    pub power: VotingPower,
}

impl VoteRequest {
    /// Build a request, refusing it when the account may not cast.
    pub fn new(
        proposal: &Proposal,
        account: &Account,
        now: EpochSeconds,
        side: VoteSide,
        power: VotingPower,
    ) -> Result<Self> {
        let view = project(proposal, account)?;
        let phase = proposal.phase(now);

        if !phase.is_active() {
            return Err(GovernanceError::VotingNotActive(format!(
                "proposal {} closed",
                proposal.id
            )));
        }
        if view.has_voted() {
            return Err(GovernanceError::AlreadyVoted(format!(
                "{} on proposal {}",
                account, proposal.id
            )));
        }

        Ok(Self {
            proposal_id: proposal.id,
            side,
            power,
        })
    }
}
