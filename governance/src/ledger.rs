//! Ledger boundary: query traits, submission actions and the HTTP client
//!
//! The client is a thin JSON gateway wrapper. Every failure surfaces as
//! `LedgerUnavailable`; retries are left to the caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{GovernanceError, Result};
use crate::proposal::{Account, Proposal, ProposalId, ValidProposal};
use crate::stake::{serde_raw_stake, RawStake, TokenBalance};
use crate::time_codec::EpochSeconds;
use crate::voting::VoteRequest;
use crate::withdrawal::WithdrawalQuery;

/// Read access to proposals and balances
#[async_trait]
pub trait LedgerQuery: Send + Sync {
    /// All proposals, in ledger order
    async fn fetch_proposals(&self) -> Result<Vec<Proposal>>;

    async fn token_balance(&self, account: &Account) -> Result<RawStake>;
}

/// Fire-and-confirm ledger actions. A success means the caller must
/// refresh its snapshot before re-evaluating.
#[async_trait]
pub trait GovernanceActions: Send + Sync {
    async fn submit_proposal(&self, proposal: &ValidProposal) -> Result<()>;

    async fn cast_vote(&self, request: &VoteRequest) -> Result<()>;

    async fn withdraw(&self, proposal_id: ProposalId) -> Result<()>;
}

impl From<reqwest::Error> for GovernanceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GovernanceError::LedgerUnavailable(format!("request timed out: {}", e))
        } else if e.is_decode() {
            GovernanceError::LedgerUnavailable(format!("invalid response: {}", e))
        } else {
            GovernanceError::LedgerUnavailable(format!("request failed: {}", e))
        }
    }
}

#[derive(Debug, Clone)]
pub struct LedgerClient {
    endpoint: String,
    account: Option<Account>,
    client: Client,
}

impl LedgerClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        log::info!("📡 Ledger client initialized: {}", endpoint);
        Ok(Self {
            endpoint,
            account: None,
            client,
        })
    }

    /// Account that signs submitted actions
    pub fn with_account(mut self, account: Account) -> Self {
        self.account = Some(account);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    fn signer(&self) -> Result<&Account> {
        self.account
            .as_ref()
            .ok_or_else(|| GovernanceError::Unauthorized("no account connected".to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        log::debug!("→ GET {}", url);
        let response = self.client.get(url).send().await?;
        let response = Self::check_status(response, url).await?;
        Ok(response.json().await?)
    }

    async fn post_json<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<()> {
        log::debug!("→ POST {}", url);
        let response = self.client.post(url).json(body).send().await?;
        Self::check_status(response, url).await?;
        Ok(())
    }

    async fn check_status(response: Response, url: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        log::error!("❌ {} failed: {} {}", url, status, detail);
        Err(GovernanceError::LedgerUnavailable(format!(
            "HTTP {} from {}: {}",
            status.as_u16(),
            url,
            detail
        )))
    }
}

#[async_trait]
impl LedgerQuery for LedgerClient {
    async fn fetch_proposals(&self) -> Result<Vec<Proposal>> {
        let url = format!("{}/proposals", self.endpoint);
        let proposals: Vec<Proposal> = self.get_json(&url).await?;
        log::info!("✅ Retrieved {} proposals", proposals.len());
        Ok(proposals)
    }

    async fn token_balance(&self, account: &Account) -> Result<RawStake> {
        let url = format!("{}/token/balance/{}", self.endpoint, account);
        let balance: TokenBalance = self.get_json(&url).await?;
        Ok(balance.balance)
    }
}

#[async_trait]
impl WithdrawalQuery for LedgerClient {
    async fn has_withdrawn(&self, proposal_id: ProposalId, account: &Account) -> Result<bool> {
        let url = format!(
            "{}/proposals/{}/withdrawals/{}",
            self.endpoint, proposal_id, account
        );
        let response: WithdrawalStatus = self.get_json(&url).await?;
        Ok(response.withdrawn)
    }
}

#[async_trait]
impl GovernanceActions for LedgerClient {
    async fn submit_proposal(&self, proposal: &ValidProposal) -> Result<()> {
        let body = NewProposalBody {
            proposer: self.signer()?,
            title: &proposal.title,
            description: &proposal.description,
            final_date: proposal.final_date,
        };
        self.post_json(&format!("{}/proposals", self.endpoint), &body)
            .await?;
        log::info!("✅ Proposal submitted: {}", proposal.title);
        Ok(())
    }

    async fn cast_vote(&self, request: &VoteRequest) -> Result<()> {
        let voter = self.signer()?;
        let stake = request.power.raw();

        // The governance contract pulls the stake, so the allowance goes first.
        let approve = ApproveBody {
            owner: voter,
            amount: stake,
        };
        self.post_json(&format!("{}/token/approve", self.endpoint), &approve)
            .await?;

        let body = VoteBody {
            voter,
            in_favor: request.side.in_favor(),
            stake,
        };
        let url = format!("{}/proposals/{}/votes", self.endpoint, request.proposal_id);
        self.post_json(&url, &body).await?;
        log::info!(
            "✅ Vote cast on proposal {}: {:?} with {} tokens",
            request.proposal_id,
            request.side,
            request.power.whole_units()
        );
        Ok(())
    }

    async fn withdraw(&self, proposal_id: ProposalId) -> Result<()> {
        let body = WithdrawBody {
            account: self.signer()?,
        };
        let url = format!("{}/proposals/{}/withdraw", self.endpoint, proposal_id);
        self.post_json(&url, &body).await?;
        log::info!("✅ Stake withdrawn from proposal {}", proposal_id);
        Ok(())
    }
}

// ============================================================================
// Wire formats
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct WithdrawalStatus {
    withdrawn: bool,
}

#[derive(Debug, Serialize)]
struct NewProposalBody<'a> {
    proposer: &'a Account,
    title: &'a str,
    description: &'a str,
    final_date: EpochSeconds,
}

#[derive(Debug, Serialize)]
struct ApproveBody<'a> {
    owner: &'a Account,
    #[serde(with = "serde_raw_stake")]
    amount: RawStake,
}

#[derive(Debug, Serialize)]
struct VoteBody<'a> {
    voter: &'a Account,
    in_favor: bool,
    #[serde(with = "serde_raw_stake")]
    stake: RawStake,
}

#[derive(Debug, Serialize)]
struct WithdrawBody<'a> {
    account: &'a Account,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stake::{to_raw_stake, VotingPower};
    use crate::voting::VoteSide;

    fn client() -> LedgerClient {
        LedgerClient::new(
            "http://localhost:3000/api/",
            Duration::from_secs(30),
            Duration::from_secs(10),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_client_creation() {
        let client = client();
        assert_eq!(client.endpoint(), "http://localhost:3000/api");
        assert!(client.account().is_none());

        let client = client.with_account(Account::new("0xABC"));
        assert_eq!(client.account(), Some(&Account::new("0xabc")));
    }

    #[tokio::test]
    async fn test_actions_require_account() {
        let client = client();
        let power = VotingPower::select(1, to_raw_stake(1)).unwrap();
        let request = VoteRequest {
            proposal_id: 1,
            side: VoteSide::InFavor,
            power,
        };

        assert!(matches!(
            client.cast_vote(&request).await,
            Err(GovernanceError::Unauthorized(_))
        ));
        assert!(matches!(
            client.withdraw(1).await,
            Err(GovernanceError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_vote_body_serialization() {
        let voter = Account::new("0xa");
        let body = VoteBody {
            voter: &voter,
            in_favor: false,
            stake: to_raw_stake(2),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(
            json,
            r#"{"voter":"0xa","in_favor":false,"stake":"2000000000000000000"}"#
        );
    }

    #[test]
    fn test_withdrawal_status_deserialization() {
        let status: WithdrawalStatus = serde_json::from_str(r#"{"withdrawn":true}"#).unwrap();
        assert!(status.withdrawn);
    }
}
