pub mod decision;
pub mod error;
pub mod extract;
pub mod models;
#[cfg(feature = "remote")]
pub mod remote;
pub mod rules;
pub mod runner;
pub mod storage;
pub mod storage_postgres;
pub mod submission;

// Re-export commonly used types
pub use decision::{DecisionEngine, LocalDecisionEngine};
pub use error::{ClaimError, Result, UpstreamError};
pub use extract::extract_query_details;
pub use models::{
    ClaimQuery, ClaimReceipt, ClaimResponse, Decision, Gender, NewClaim, QueryDetails,
    RelevantClause,
};
#[cfg(feature = "remote")]
pub use remote::RemoteDecisionEngine;
pub use rules::{RuleBook, Verdict};
pub use runner::ClaimRunner;
pub use storage::{ClaimStore, InMemoryClaimStore};
pub use storage_postgres::PostgresClaimStore;
pub use submission::{Attachment, AttachmentPolicy, ClaimSubmission};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_local_pipeline_end_to_end() {
        let store = Arc::new(InMemoryClaimStore::new());
        let runner = ClaimRunner::new(Arc::new(LocalDecisionEngine::default()), store.clone());

        let first = runner
            .submit(ClaimSubmission::new(
                "46-year-old male, knee surgery in Pune, 3-month-old insurance policy",
            ))
            .await
            .unwrap();
        let second = runner
            .submit(ClaimSubmission::new("maternity care, 12-month policy"))
            .await
            .unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);

        let receipt = ClaimReceipt::from_claim(first).unwrap();
        assert_eq!(receipt.response.decision, Decision::Approved);
        assert_eq!(receipt.response.query_details.age, Some(46));
    }
}
