use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ClaimError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

/// Fields pulled out of a free-text claim description. Any of them may be
/// missing; partial extraction is the normal case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDetails {
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub procedure: Option<String>,
    pub location: Option<String>,
    pub policy_duration_months: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Approved,
    Rejected,
}

/// A policy-document snippet cited in support of a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevantClause {
    pub text: String,
    pub source: String,
    /// Rank of the clause within its source document
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    pub query_details: QueryDetails,
    pub decision: Decision,
    pub amount: Option<f64>,
    pub justification: String,
    #[serde(default)]
    pub relevant_clauses: Vec<RelevantClause>,
}

impl ClaimResponse {
    /// Checks the decision/amount invariant: an approval carries a finite,
    /// non-negative amount and a rejection carries none.
    pub fn validate(&self) -> Result<()> {
        if self.justification.trim().is_empty() {
            return Err(ClaimError::Validation(
                "decision is missing a justification".to_string(),
            ));
        }

        match (self.decision, self.amount) {
            (Decision::Approved, Some(amount)) if amount.is_finite() && amount >= 0.0 => Ok(()),
            (Decision::Approved, Some(amount)) => Err(ClaimError::Validation(format!(
                "approved claim has an invalid amount: {}",
                amount
            ))),
            (Decision::Approved, None) => Err(ClaimError::Validation(
                "approved claim has no amount".to_string(),
            )),
            (Decision::Rejected, None) => Ok(()),
            (Decision::Rejected, Some(_)) => Err(ClaimError::Validation(
                "rejected claim must not carry an amount".to_string(),
            )),
        }
    }
}

/// A stored submission together with the decision produced for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimQuery {
    pub id: String,
    pub query: String,
    pub attachment_name: Option<String>,
    pub response: Option<ClaimResponse>,
    pub created_at: DateTime<Utc>,
}

/// Input to `ClaimStore::create`; the store assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewClaim {
    pub query: String,
    pub attachment_name: Option<String>,
    pub response: ClaimResponse,
}

/// What `POST /claims` hands back: the new id next to the decision fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub id: String,
    #[serde(flatten)]
    pub response: ClaimResponse,
}

impl ClaimReceipt {
    pub fn from_claim(claim: ClaimQuery) -> Result<Self> {
        let response = claim.response.ok_or_else(|| {
            ClaimError::Internal(format!("claim {} was stored without a response", claim.id))
        })?;
        Ok(Self {
            id: claim.id,
            response,
        })
    }
}
