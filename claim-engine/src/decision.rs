use async_trait::async_trait;
use tracing::info;

use crate::{
    error::Result,
    extract::extract_query_details,
    models::ClaimResponse,
    rules::RuleBook,
    submission::ClaimSubmission,
};

/// Core trait for anything that can turn a claim submission into a decision
#[async_trait]
pub trait DecisionEngine: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Produce a decision for the given submission
    async fn decide(&self, submission: &ClaimSubmission) -> Result<ClaimResponse>;
}

/// Decides claims in-process with the field extractor and the rule book.
/// Attachments are accepted but not read.
#[derive(Debug, Clone, Default)]
pub struct LocalDecisionEngine {
    rules: RuleBook,
}

impl LocalDecisionEngine {
    pub fn new(rules: RuleBook) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }
}

#[async_trait]
impl DecisionEngine for LocalDecisionEngine {
    fn name(&self) -> &str {
        "local"
    }

    async fn decide(&self, submission: &ClaimSubmission) -> Result<ClaimResponse> {
        let details = extract_query_details(&submission.query);
        let verdict = self.rules.evaluate(&details, &submission.query);

        info!(
            engine = self.name(),
            decision = ?verdict.decision,
            has_attachment = submission.attachment.is_some(),
            "Claim decided locally"
        );

        Ok(verdict.into_response(details))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Decision, Gender};
    use crate::rules::DEFAULT_COVERAGE;

    #[tokio::test]
    async fn test_local_engine_decides_reference_query() {
        let engine = LocalDecisionEngine::default();
        let submission = ClaimSubmission::new(
            "46-year-old male, knee surgery in Pune, 3-month-old insurance policy",
        );

        let response = engine.decide(&submission).await.unwrap();

        assert_eq!(response.decision, Decision::Approved);
        assert_eq!(response.amount, Some(DEFAULT_COVERAGE));
        assert_eq!(response.query_details.gender, Some(Gender::Male));
        assert_eq!(response.query_details.location.as_deref(), Some("Pune"));
        assert!(response.validate().is_ok());
    }
}
