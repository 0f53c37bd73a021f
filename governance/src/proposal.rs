//! Proposal types, lifecycle classification and draft validation

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GovernanceError, Result};
use crate::stake::{serde_raw_stake, RawStake};
use crate::time_codec::{date_to_epoch_seconds, start_of_next_day, EpochSeconds};

/// Ledger-assigned proposal identifier
pub type ProposalId = u64;

/// Ledger account identifier.
///
/// Hex addresses are case-insensitive on the ledger, so the identifier is
/// normalized to lowercase on construction and compared as-is afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Account(String);

impl Account {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Account {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<&str> for Account {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<Account> for String {
    fn from(account: Account) -> Self {
        account.0
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A recorded stake for one side of a proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: Account,
    #[serde(with = "serde_raw_stake")]
    pub stake: RawStake,
}

impl Vote {
    pub fn new(voter: impl Into<Account>, stake: RawStake) -> Self {
        Self {
            voter: voter.into(),
            stake,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    pub description: String,
    pub proposer: Account,
    pub starting_date: EpochSeconds,
    pub final_date: EpochSeconds,
    #[serde(default)]
    pub positive: Vec<Vote>,
    #[serde(default)]
    pub negative: Vec<Vote>,
}

impl Proposal {
    pub fn phase(&self, now: EpochSeconds) -> ProposalPhase {
        classify(self, now)
    }

    /// The recorded start lies ahead of `now`. Informational only: voting
    /// is open from creation until `final_date` either way.
    pub fn starts_in_future(&self, now: EpochSeconds) -> bool {
        now < self.starting_date
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalPhase {
    /// Accepting votes
    Active,
    /// Final date reached; stake can be withdrawn
    Closed,
}

impl ProposalPhase {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// `Active` iff `now < final_date`. The start date does not gate anything.
pub fn classify(proposal: &Proposal, now: EpochSeconds) -> ProposalPhase {
    if now < proposal.final_date {
        ProposalPhase::Active
    } else {
        ProposalPhase::Closed
    }
}

/// Per-field validation messages for a proposal draft
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub title: Option<String>,
    pub description: Option<String>,
    pub final_date: Option<String>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.final_date.is_none()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = [
            ("title", &self.title),
            ("description", &self.description),
            ("final_date", &self.final_date),
        ];
        let mut first = true;
        for (name, message) in fields {
            if let Some(message) = message {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", name, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Raw user input for a new proposal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposalDraft {
    pub title: String,
    pub description: String,
    /// `YYYY-MM-DD`
    pub final_date: String,
}

/// A draft that passed validation and can be submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidProposal {
    pub title: String,
    pub description: String,
    pub final_date: EpochSeconds,
}

impl ProposalDraft {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        final_date: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            final_date: final_date.into(),
        }
    }

    /// Check every field and report all failures at once. The finish date
    /// must fall on tomorrow (UTC) or later.
    pub fn validate(&self, now: EpochSeconds) -> Result<ValidProposal> {
        let mut errors = FieldErrors::default();

        let title = self.title.trim();
        if title.is_empty() {
            errors.title = Some("Title is required".to_string());
        }

        let description = self.description.trim();
        if description.is_empty() {
            errors.description = Some("Description is required".to_string());
        }

        let mut final_date = None;
        if self.final_date.trim().is_empty() {
            errors.final_date = Some("Finish date is required".to_string());
        } else {
            match date_to_epoch_seconds(&self.final_date) {
                Ok(epoch) if epoch < start_of_next_day(now) => {
                    errors.final_date = Some("Finish date must be at least tomorrow".to_string());
                }
                Ok(epoch) => final_date = Some(epoch),
                Err(e) => errors.final_date = Some(e.to_string()),
            }
        }

        match final_date {
            Some(final_date) if errors.is_empty() => Ok(ValidProposal {
                title: title.to_string(),
                description: description.to_string(),
                final_date,
            }),
            _ => Err(GovernanceError::Validation(errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stake::to_raw_stake;

    fn proposal(final_date: EpochSeconds) -> Proposal {
        Proposal {
            id: 1,
            title: "Fund audit".to_string(),
            description: "Third-party audit".to_string(),
            proposer: Account::new("0xAbC"),
            starting_date: 100,
            final_date,
            positive: Vec::new(),
            negative: Vec::new(),
        }
    }

    #[test]
    fn test_lifecycle_boundary() {
        let p = proposal(1000);
        assert_eq!(classify(&p, 999), ProposalPhase::Active);
        assert_eq!(classify(&p, 1000), ProposalPhase::Closed);
        assert_eq!(classify(&p, 1001), ProposalPhase::Closed);
    }

    #[test]
    fn test_start_date_does_not_gate() {
        let p = proposal(1000);
        assert!(p.starts_in_future(50));
        assert_eq!(p.phase(50), ProposalPhase::Active);
    }

    #[test]
    fn test_account_normalization() {
        assert_eq!(Account::new("0xABCdef"), Account::new(" 0xabcDEF "));
        assert_eq!(Account::new("0xABCdef").as_str(), "0xabcdef");
    }

    #[test]
    fn test_proposal_deserialization() {
        let json = r#"{
            "id": 7,
            "title": "Raise quorum",
            "description": "Raise it",
            "proposer": "0xF39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            "starting_date": 1700000000,
            "final_date": 1700864000,
            "positive": [{"voter": "0xAA", "stake": "3000000000000000000"}],
            "negative": [{"voter": "0xbb", "stake": "0xde0b6b3a7640000"}]
        }"#;
        let p: Proposal = serde_json::from_str(json).unwrap();

        assert_eq!(p.id, 7);
        assert_eq!(
            p.proposer.as_str(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
        assert_eq!(p.positive, vec![Vote::new("0xaa", to_raw_stake(3))]);
        assert_eq!(p.negative, vec![Vote::new("0xBB", to_raw_stake(1))]);
    }

    #[test]
    fn test_missing_vote_lists_default_empty() {
        let json = r#"{"id":1,"title":"t","description":"d","proposer":"0x1",
            "starting_date":1,"final_date":2}"#;
        let p: Proposal = serde_json::from_str(json).unwrap();
        assert!(p.positive.is_empty());
        assert!(p.negative.is_empty());
    }

    #[test]
    fn test_draft_validation_success() {
        let now = date_to_epoch_seconds("2024-06-01").unwrap() + 3600;
        let valid = ProposalDraft::new(" Title ", "Body", "2024-06-02")
            .validate(now)
            .unwrap();

        assert_eq!(valid.title, "Title");
        assert_eq!(valid.final_date, date_to_epoch_seconds("2024-06-02").unwrap());
    }

    #[test]
    fn test_draft_validation_collects_all_errors() {
        let now = date_to_epoch_seconds("2024-06-01").unwrap();
        match ProposalDraft::new("", "  ", "2024-06-01").validate(now) {
            Err(GovernanceError::Validation(errors)) => {
                assert_eq!(errors.title.as_deref(), Some("Title is required"));
                assert_eq!(errors.description.as_deref(), Some("Description is required"));
                assert_eq!(
                    errors.final_date.as_deref(),
                    Some("Finish date must be at least tomorrow")
                );
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_draft_validation_bad_date() {
        let now = date_to_epoch_seconds("2024-06-01").unwrap();
        let err = ProposalDraft::new("t", "d", "June 5th")
            .validate(now)
            .unwrap_err();
        assert!(err.is_validation());
        match err {
            GovernanceError::Validation(errors) => {
                assert!(errors.title.is_none());
                assert!(errors.final_date.unwrap().starts_with("Invalid date"));
            }
            other => panic!("unexpected {:?}", other),
        }

        let missing = ProposalDraft::new("t", "d", "").validate(now).unwrap_err();
        assert!(missing.to_string().contains("Finish date is required"));
    }
}
