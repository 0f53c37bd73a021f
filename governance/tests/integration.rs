use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use lct_governance::*;

/// In-memory ledger that applies actions the way the contract would.
struct MockLedger {
    proposals: Mutex<Vec<Proposal>>,
    withdrawals: Mutex<HashSet<(ProposalId, Account)>>,
    signer: Account,
    now: EpochSeconds,
}

impl MockLedger {
    fn new(signer: &str, now: EpochSeconds, proposals: Vec<Proposal>) -> Self {
        Self {
            proposals: Mutex::new(proposals),
            withdrawals: Mutex::new(HashSet::new()),
            signer: Account::new(signer),
            now,
        }
    }
}

#[async_trait]
impl LedgerQuery for MockLedger {
    async fn fetch_proposals(&self) -> Result<Vec<Proposal>> {
        Ok(self.proposals.lock().unwrap().clone())
    }

    async fn token_balance(&self, _account: &Account) -> Result<RawStake> {
        Ok(to_raw_stake(10))
    }
}

#[async_trait]
impl WithdrawalQuery for MockLedger {
    async fn has_withdrawn(&self, proposal_id: ProposalId, account: &Account) -> Result<bool> {
        Ok(self
            .withdrawals
            .lock()
            .unwrap()
            .contains(&(proposal_id, account.clone())))
    }
}

#[async_trait]
impl GovernanceActions for MockLedger {
    async fn submit_proposal(&self, proposal: &ValidProposal) -> Result<()> {
        let mut proposals = self.proposals.lock().unwrap();
        let id = proposals.len() as ProposalId;
        proposals.push(Proposal {
            id,
            title: proposal.title.clone(),
            description: proposal.description.clone(),
            proposer: self.signer.clone(),
            starting_date: self.now,
            final_date: proposal.final_date,
            positive: Vec::new(),
            negative: Vec::new(),
        });
        Ok(())
    }

    async fn cast_vote(&self, request: &VoteRequest) -> Result<()> {
        let mut proposals = self.proposals.lock().unwrap();
        let proposal = proposals
            .iter_mut()
            .find(|p| p.id == request.proposal_id)
            .ok_or(GovernanceError::ProposalNotFound(request.proposal_id))?;
        let vote = Vote::new(self.signer.clone(), request.power.raw());
        match request.side {
            VoteSide::InFavor => proposal.positive.push(vote),
            VoteSide::Against => proposal.negative.push(vote),
        }
        Ok(())
    }

    async fn withdraw(&self, proposal_id: ProposalId) -> Result<()> {
        self.withdrawals
            .lock()
            .unwrap()
            .insert((proposal_id, self.signer.clone()));
        Ok(())
    }
}

fn proposal(id: ProposalId, final_date: EpochSeconds) -> Proposal {
    Proposal {
        id,
        title: "Fund the audit".to_string(),
        description: "Pay for an external review".to_string(),
        proposer: Account::new("0xp"),
        starting_date: 0,
        final_date,
        positive: vec![
            Vote::new("0xA", to_raw_stake(3)),
            Vote::new("0xB", to_raw_stake(1)),
        ],
        negative: vec![Vote::new("0xC", to_raw_stake(4))],
    }
}

#[test]
fn test_even_tally_scenario() {
    let p = proposal(0, 1000);
    let tally = aggregate(&p.positive, &p.negative);

    assert_eq!(tally.for_total, DisplayStake::from_whole(4));
    assert_eq!(tally.against_total, DisplayStake::from_whole(4));
    assert_eq!(tally.for_percentage, 50.0);
    assert_eq!(tally.against_percentage, 50.0);
}

#[tokio::test]
async fn test_closed_proposal_offers_withdrawal() {
    let p = proposal(0, 1000);
    let ledger = MockLedger::new("0xa", 1000, vec![p.clone()]);
    let account = Account::new("0xa");

    assert_eq!(classify(&p, 1000), ProposalPhase::Closed);
    let view = project(&p, &account).unwrap();
    assert!(can_withdraw(&p, &account, &view, 1000, &ledger).await.unwrap());
}

#[tokio::test]
async fn test_active_proposal_never_offers_withdrawal() {
    let p = proposal(0, 1000);
    let ledger = MockLedger::new("0xa", 999, vec![p.clone()]);

    assert_eq!(classify(&p, 999), ProposalPhase::Active);
    for account in ["0xa", "0xc", "0xnobody"] {
        let account = Account::new(account);
        let view = project(&p, &account).unwrap();
        assert!(!can_withdraw(&p, &account, &view, 999, &ledger).await.unwrap());
    }
}

#[tokio::test]
async fn test_withdraw_then_refresh_disables_action() {
    let ledger = MockLedger::new("0xa", 2000, vec![proposal(0, 1000)]);
    let account = Account::new("0xa");
    let mut board = ProposalBoard::new();
    board.refresh(&ledger, 2000).await.unwrap();

    let id = board
        .plan_withdraw(0, &account, 2000, &ledger)
        .await
        .unwrap();
    ledger.withdraw(id).await.unwrap();

    board.refresh(&ledger, 2001).await.unwrap();
    let views = board.evaluate(Some(&account), 2001, &ledger).await.unwrap();
    assert_eq!(views[0].can_withdraw, Some(false));

    assert!(matches!(
        board.plan_withdraw(0, &account, 2001, &ledger).await,
        Err(GovernanceError::WithdrawalUnavailable(_))
    ));
}

#[tokio::test]
async fn test_propose_vote_and_tally_flow() {
    let now = date_to_epoch_seconds("2024-06-01").unwrap() + 600;
    let ledger = MockLedger::new("0xd", now, Vec::new());
    let account = Account::new("0xD");

    let draft = ProposalDraft::new("Lower fees", "Halve the protocol fee", "2024-06-15");
    let valid = draft.validate(now).unwrap();
    ledger.submit_proposal(&valid).await.unwrap();

    let mut board = ProposalBoard::new();
    board.refresh(&ledger, now).await.unwrap();
    let created = board.get(0).unwrap();
    assert_eq!(
        epoch_seconds_to_date_string(created.final_date).unwrap(),
        "2024-06-15"
    );

    let views = board.evaluate_local(Some(&account), now);
    assert!(views[0].actions.can_cast());
    assert!(views[0].tally.is_empty());
    assert_eq!(views[0].tally.for_percentage, 1.0);

    let balance = ledger.token_balance(&account).await.unwrap();
    assert!(matches!(
        VotingPower::select(11, balance),
        Err(GovernanceError::OutOfRange { .. })
    ));
    let power = VotingPower::select(6, balance).unwrap();
    let request = board
        .plan_vote(0, &account, VoteSide::Against, power, now)
        .unwrap();
    ledger.cast_vote(&request).await.unwrap();

    board.refresh(&ledger, now).await.unwrap();
    let views = board.evaluate(Some(&account), now, &ledger).await.unwrap();
    let view = &views[0];
    assert_eq!(view.vote, Some(AccountVoteView::VotedAgainst(to_raw_stake(6))));
    assert!(!view.actions.can_cast());
    assert_eq!(view.tally.against_percentage, 100.0);
    assert_eq!(view.can_withdraw, Some(false));

    assert!(matches!(
        board.plan_vote(0, &account, VoteSide::InFavor, power, now),
        Err(GovernanceError::AlreadyVoted(_))
    ));
}

#[test]
fn test_invalid_draft_is_never_submitted() {
    let now = date_to_epoch_seconds("2024-06-01").unwrap();
    let err = ProposalDraft::new("", "body", "2024-05-01")
        .validate(now)
        .unwrap_err();
    assert!(err.is_validation());
}
