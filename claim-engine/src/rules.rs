use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{ClaimResponse, Decision, QueryDetails};

pub const MATERNITY_WAITING_MONTHS: u32 = 36;
pub const PRE_EXISTING_WAITING_MONTHS: u32 = 24;
pub const DEFAULT_COVERAGE: f64 = 500_000.0;

const MATERNITY_TERMS: &[&str] = &[
    "maternity",
    "pregnancy",
    "pregnant",
    "childbirth",
    "delivery",
    "baby",
];

const PRE_EXISTING_TERMS: &[&str] = &[
    "pre-existing",
    "preexisting",
    "pre existing",
    "existing condition",
    "chronic",
];

const ACCIDENT_TERMS: &[&str] = &["accident"];

/// Which rule produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    MaternityWaitingPeriod,
    PreExistingWaitingPeriod,
    AccidentCover,
    GeneralCover,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub decision: Decision,
    pub amount: Option<f64>,
    pub justification: String,
    pub rule: Rule,
}

impl Verdict {
    pub fn into_response(self, query_details: QueryDetails) -> ClaimResponse {
        ClaimResponse {
            query_details,
            decision: self.decision,
            amount: self.amount,
            justification: self.justification,
            relevant_clauses: Vec::new(),
        }
    }
}

/// Waiting periods and payout used by the local decision rules.
///
/// Rules are checked top to bottom and the first one that applies decides the
/// claim. An unknown policy duration counts as zero months.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleBook {
    pub maternity_waiting_months: u32,
    pub pre_existing_waiting_months: u32,
    pub default_amount: f64,
}

impl Default for RuleBook {
    fn default() -> Self {
        Self {
            maternity_waiting_months: MATERNITY_WAITING_MONTHS,
            pre_existing_waiting_months: PRE_EXISTING_WAITING_MONTHS,
            default_amount: DEFAULT_COVERAGE,
        }
    }
}

impl RuleBook {
    pub fn with_default_amount(mut self, amount: f64) -> Self {
        self.default_amount = amount;
        self
    }

    pub fn evaluate(&self, details: &QueryDetails, text: &str) -> Verdict {
        let months = details.policy_duration_months.unwrap_or(0);
        let text = text.to_lowercase();

        let verdict = if mentions_any(&text, MATERNITY_TERMS)
            && months < self.maternity_waiting_months
        {
            Verdict {
                decision: Decision::Rejected,
                amount: None,
                justification: format!(
                    "Maternity claims are subject to a {}-month waiting period. Current policy duration: {} months.",
                    self.maternity_waiting_months, months
                ),
                rule: Rule::MaternityWaitingPeriod,
            }
        } else if self.is_pre_existing(details, &text) && months < self.pre_existing_waiting_months {
            Verdict {
                decision: Decision::Rejected,
                amount: None,
                justification: format!(
                    "Pre-existing conditions are subject to a {}-month waiting period. Current policy duration: {} months.",
                    self.pre_existing_waiting_months, months
                ),
                rule: Rule::PreExistingWaitingPeriod,
            }
        } else if mentions_any(&text, ACCIDENT_TERMS) {
            Verdict {
                decision: Decision::Approved,
                amount: Some(self.default_amount),
                justification: "Accident coverage applies. Accidents are not subject to waiting periods."
                    .to_string(),
                rule: Rule::AccidentCover,
            }
        } else {
            Verdict {
                decision: Decision::Approved,
                amount: Some(self.default_amount),
                justification: "The claim complies with the policy terms and no waiting period applies."
                    .to_string(),
                rule: Rule::GeneralCover,
            }
        };

        info!(
            rule = ?verdict.rule,
            decision = ?verdict.decision,
            policy_duration_months = months,
            "Evaluated claim rules"
        );

        verdict
    }

    /// Reads the marker from the procedure, or from the whole text when no
    /// procedure was recognised.
    fn is_pre_existing(&self, details: &QueryDetails, lowercase_text: &str) -> bool {
        match details.procedure.as_deref() {
            Some(procedure) => mentions_any(&procedure.to_lowercase(), PRE_EXISTING_TERMS),
            None => mentions_any(lowercase_text, PRE_EXISTING_TERMS),
        }
    }
}

fn mentions_any(lowercase_text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| lowercase_text.contains(term))
}
