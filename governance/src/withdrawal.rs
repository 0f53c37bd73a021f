//! Withdrawal eligibility
//!
//! Stake becomes reclaimable once a proposal closes, exactly once per
//! account. The only suspension point in the engine is the withdrawal-event
//! lookup; it runs after the lifecycle check so an active proposal never
//! costs a round-trip.

use async_trait::async_trait;

use crate::error::{GovernanceError, Result};
use crate::proposal::{classify, Account, Proposal, ProposalId};
use crate::time_codec::EpochSeconds;
use crate::voting::AccountVoteView;

/// Read access to recorded withdrawal events
#[async_trait]
pub trait WithdrawalQuery: Send + Sync {
    async fn has_withdrawn(&self, proposal_id: ProposalId, account: &Account) -> Result<bool>;
}

/// Whether a withdraw action should be offered to `account`.
pub async fn can_withdraw<W>(
    proposal: &Proposal,
    account: &Account,
    view: &AccountVoteView,
    now: EpochSeconds,
    lookup: &W,
) -> Result<bool>
where
    W: WithdrawalQuery + ?Sized,
{
    if !view.has_voted() {
        return Ok(false);
    }
    if classify(proposal, now).is_active() {
        return Ok(false);
    }

    let withdrawn = lookup.has_withdrawn(proposal.id, account).await?;
    log::debug!(
        "Withdrawal lookup for proposal {} / {}: withdrawn={}",
        proposal.id,
        account,
        withdrawn
    );
    Ok(!withdrawn)
}

/// Handle for one in-flight eligibility lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    generation: u64,
    proposal_id: ProposalId,
    account: Account,
}

impl LookupTicket {
    pub fn proposal_id(&self) -> ProposalId {
        self.proposal_id
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    /// Run the lookup for this ticket. The tracker is not borrowed while the
    /// lookup is in flight, so a newer `select` can supersede it; hand the
    /// returned ticket back to `EligibilityTracker::apply`.
    pub async fn resolve<W>(
        self,
        proposal: &Proposal,
        view: &AccountVoteView,
        now: EpochSeconds,
        lookup: &W,
    ) -> Result<(LookupTicket, bool)>
    where
        W: WithdrawalQuery + ?Sized,
    {
        if proposal.id != self.proposal_id {
            return Err(GovernanceError::ProposalNotFound(self.proposal_id));
        }
        let eligible = can_withdraw(proposal, &self.account, view, now, lookup).await?;
        Ok((self, eligible))
    }
}

/// Keeps a superseded lookup from overwriting the answer for the current
/// selection.
#[derive(Debug, Default)]
pub struct EligibilityTracker {
    generation: u64,
    selection: Option<(ProposalId, Account)>,
    eligible: Option<bool>,
}

impl EligibilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a new (proposal, account) pair. Any outstanding ticket
    /// becomes stale.
    pub fn select(&mut self, proposal_id: ProposalId, account: Account) -> LookupTicket {
        self.generation += 1;
        self.selection = Some((proposal_id, account.clone()));
        self.eligible = None;
        LookupTicket {
            generation: self.generation,
            proposal_id,
            account,
        }
    }

    /// Record a lookup result. Returns `false` and drops the result when the
    /// ticket no longer matches the current selection.
    pub fn apply(&mut self, ticket: &LookupTicket, eligible: bool) -> bool {
        if ticket.generation != self.generation {
            log::debug!(
                "Discarding stale withdrawal lookup for proposal {} / {}",
                ticket.proposal_id,
                ticket.account
            );
            return false;
        }
        self.eligible = Some(eligible);
        true
    }

    pub fn selection(&self) -> Option<(ProposalId, &Account)> {
        self.selection.as_ref().map(|(id, account)| (*id, account))
    }

    /// Result for the current selection, `None` until its lookup lands
    pub fn eligible(&self) -> Option<bool> {
        self.eligible
    }
}
