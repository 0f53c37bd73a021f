//! Proposal board: the last fetched snapshot and its per-account evaluation
//!
//! A failed refresh keeps the previous snapshot so the user never loses
//! their view to a transient ledger outage.

use crate::error::{GovernanceError, Result};
use crate::ledger::LedgerQuery;
use crate::proposal::{Account, Proposal, ProposalId, ProposalPhase, ValidProposal};
use crate::stake::VotingPower;
use crate::tally::{aggregate, Tally};
use crate::time_codec::{epoch_seconds_to_date_string, EpochSeconds};
use crate::voting::{project, AccountVoteView, VoteActions, VoteRequest, VoteSide};
use crate::withdrawal::{can_withdraw, WithdrawalQuery};

/// Everything a front end needs to draw one proposal
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalView {
    pub id: ProposalId,
    pub title: String,
    pub description: String,
    pub proposer: Account,
    pub phase: ProposalPhase,
    /// `None` when the ledger timestamp has no calendar date
    pub started: Option<String>,
    pub finishes: Option<String>,
    pub starts_in_future: bool,
    pub tally: Tally,
    /// `None` without a connected account or while the ledger is inconsistent
    pub vote: Option<AccountVoteView>,
    pub actions: VoteActions,
    /// `None` until the withdrawal lookup has run
    pub can_withdraw: Option<bool>,
    pub warning: Option<String>,
}

#[derive(Debug, Default)]
pub struct ProposalBoard {
    proposals: Vec<Proposal>,
    refreshed_at: Option<EpochSeconds>,
}

impl ProposalBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(proposals: Vec<Proposal>, fetched_at: EpochSeconds) -> Self {
        Self {
            proposals,
            refreshed_at: Some(fetched_at),
        }
    }

    /// Replace the snapshot with a fresh fetch. On failure the previous
    /// snapshot stays in place and the error is returned.
    pub async fn refresh<L>(&mut self, ledger: &L, now: EpochSeconds) -> Result<usize>
    where
        L: LedgerQuery + ?Sized,
    {
        match ledger.fetch_proposals().await {
            Ok(proposals) => {
                self.proposals = proposals;
                self.refreshed_at = Some(now);
                Ok(self.proposals.len())
            }
            Err(e) => {
                log::error!(
                    "❌ Proposal refresh failed, keeping {} cached proposals: {}",
                    self.proposals.len(),
                    e
                );
                Err(e)
            }
        }
    }

    /// Proposals in ledger order
    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    pub fn refreshed_at(&self) -> Option<EpochSeconds> {
        self.refreshed_at
    }

    pub fn get(&self, id: ProposalId) -> Result<&Proposal> {
        self.proposals
            .iter()
            .find(|p| p.id == id)
            .ok_or(GovernanceError::ProposalNotFound(id))
    }

    /// Latest proposal in the snapshot carrying a submitted draft's contents
    pub fn newest_matching(&self, submitted: &ValidProposal) -> Option<ProposalId> {
        self.proposals
            .iter()
            .rev()
            .find(|p| {
                p.title == submitted.title
                    && p.description == submitted.description
                    && p.final_date == submitted.final_date
            })
            .map(|p| p.id)
    }

    /// Evaluate every proposal without the withdrawal lookup.
    pub fn evaluate_local(&self, account: Option<&Account>, now: EpochSeconds) -> Vec<ProposalView> {
        self.proposals
            .iter()
            .map(|p| view_for(p, account, now))
            .collect()
    }

    /// Evaluate every proposal, resolving withdrawal eligibility for the
    /// connected account. Each proposal is classified before its lookup.
    pub async fn evaluate<W>(
        &self,
        account: Option<&Account>,
        now: EpochSeconds,
        withdrawals: &W,
    ) -> Result<Vec<ProposalView>>
    where
        W: WithdrawalQuery + ?Sized,
    {
        let mut views = Vec::with_capacity(self.proposals.len());
        for proposal in &self.proposals {
            let mut view = view_for(proposal, account, now);
            if let (Some(account), Some(vote)) = (account, view.vote) {
                let eligible = can_withdraw(proposal, account, &vote, now, withdrawals).await?;
                view.can_withdraw = Some(eligible);
            }
            views.push(view);
        }
        Ok(views)
    }

    /// Build a vote request against the current snapshot.
    pub fn plan_vote(
        &self,
        id: ProposalId,
        account: &Account,
        side: VoteSide,
        power: VotingPower,
        now: EpochSeconds,
    ) -> Result<VoteRequest> {
        VoteRequest::new(self.get(id)?, account, now, side, power)
    }

    /// Confirm a withdrawal is allowed before sending it.
    pub async fn plan_withdraw<W>(
        &self,
        id: ProposalId,
        account: &Account,
        now: EpochSeconds,
        withdrawals: &W,
    ) -> Result<ProposalId>
    where
        W: WithdrawalQuery + ?Sized,
    {
        let proposal = self.get(id)?;
        let view = project(proposal, account)?;
        if !view.has_voted() {
            return Err(GovernanceError::WithdrawalUnavailable(format!(
                "{} has no stake on proposal {}",
                account, id
            )));
        }
        if proposal.phase(now).is_active() {
            return Err(GovernanceError::WithdrawalUnavailable(format!(
                "proposal {} is still active",
                id
            )));
        }
        if !can_withdraw(proposal, account, &view, now, withdrawals).await? {
            return Err(GovernanceError::WithdrawalUnavailable(format!(
                "stake on proposal {} already withdrawn",
                id
            )));
        }
        Ok(id)
    }
}

/// Newest first, the order proposals are listed in
pub fn display_order(views: &[ProposalView]) -> impl Iterator<Item = &ProposalView> {
    views.iter().rev()
}

fn view_for(proposal: &Proposal, account: Option<&Account>, now: EpochSeconds) -> ProposalView {
    let phase = proposal.phase(now);

    let (vote, actions, warning) = match account.map(|a| project(proposal, a)) {
        None => (
            None,
            VoteActions::resolve(phase, &AccountVoteView::NoVote, false),
            None,
        ),
        Some(Ok(vote)) => (Some(vote), VoteActions::resolve(phase, &vote, true), None),
        Some(Err(e)) => (None, VoteActions::disabled(), Some(e.to_string())),
    };

    ProposalView {
        id: proposal.id,
        title: proposal.title.clone(),
        description: proposal.description.clone(),
        proposer: proposal.proposer.clone(),
        phase,
        started: display_date(proposal.starting_date),
        finishes: display_date(proposal.final_date),
        starts_in_future: proposal.starts_in_future(now),
        tally: aggregate(&proposal.positive, &proposal.negative),
        vote,
        actions,
        can_withdraw: None,
        warning,
    }
}

fn display_date(seconds: EpochSeconds) -> Option<String> {
    match epoch_seconds_to_date_string(seconds) {
        Ok(date) => Some(date),
        Err(e) => {
            log::warn!("⚠️ {}", e);
            None
        }
    }
}
