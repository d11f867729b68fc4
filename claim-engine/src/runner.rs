//! ClaimRunner – the _validate → decide → persist_ pipeline behind `POST /claims`.
//!
//! The runner is built once at startup from a [`DecisionEngine`] and a
//! [`ClaimStore`] and shared across requests:
//! ```ignore
//! let runner = ClaimRunner::new(Arc::new(LocalDecisionEngine::default()), store);
//! let claim = runner.submit(ClaimSubmission::new("maternity care, 12-month policy")).await?;
//! ```
//!
//! Persisting is the final step. A request that is dropped while the engine is
//! still working never reaches the store, and a failed decision never produces
//! a record. Nothing is retried; the caller resubmits.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    decision::DecisionEngine,
    error::{ClaimError, Result},
    models::{ClaimQuery, NewClaim},
    storage::ClaimStore,
    submission::{AttachmentPolicy, ClaimSubmission},
};

#[derive(Clone)]
pub struct ClaimRunner {
    engine: Arc<dyn DecisionEngine>,
    store: Arc<dyn ClaimStore>,
    policy: AttachmentPolicy,
}

impl ClaimRunner {
    pub fn new(engine: Arc<dyn DecisionEngine>, store: Arc<dyn ClaimStore>) -> Self {
        Self {
            engine,
            store,
            policy: AttachmentPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: AttachmentPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &AttachmentPolicy {
        &self.policy
    }

    pub fn store(&self) -> &Arc<dyn ClaimStore> {
        &self.store
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Validate, decide and persist one submission, returning the stored record.
    pub async fn submit(&self, submission: ClaimSubmission) -> Result<ClaimQuery> {
        // 1. Reject bad input before any work is done
        self.policy.validate(&submission).inspect_err(|e| {
            warn!(error = %e, "Claim submission rejected");
        })?;

        // 2. Decide
        let response = self.engine.decide(&submission).await?;
        response.validate().map_err(|e| {
            error!(engine = self.engine.name(), error = %e, "Engine produced an invalid decision");
            ClaimError::Internal(format!(
                "{} engine produced an invalid decision: {}",
                self.engine.name(),
                e
            ))
        })?;

        // 3. Persist
        let claim = self
            .store
            .create(NewClaim {
                attachment_name: submission.attachment_name(),
                query: submission.query,
                response,
            })
            .await
            .inspect_err(|e| error!(error = %e, "Failed to store claim query"))?;

        info!(
            claim_id = %claim.id,
            engine = self.engine.name(),
            decision = ?claim.response.as_ref().map(|r| r.decision),
            "Claim query stored"
        );

        Ok(claim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        decision::LocalDecisionEngine,
        error::UpstreamError,
        models::{ClaimResponse, Decision},
        storage::InMemoryClaimStore,
        submission::{Attachment, PDF_CONTENT_TYPE},
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingEngine {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DecisionEngine for FailingEngine {
        fn name(&self) -> &str {
            "failing"
        }

        async fn decide(&self, _submission: &ClaimSubmission) -> Result<ClaimResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(UpstreamError::ConnectionRefused("127.0.0.1:9".to_string()).into())
        }
    }

    /// Engine that approves without an amount.
    struct AmountlessEngine;

    #[async_trait]
    impl DecisionEngine for AmountlessEngine {
        fn name(&self) -> &str {
            "amountless"
        }

        async fn decide(&self, _submission: &ClaimSubmission) -> Result<ClaimResponse> {
            Ok(ClaimResponse {
                query_details: Default::default(),
                decision: Decision::Approved,
                amount: None,
                justification: "Covered.".to_string(),
                relevant_clauses: Vec::new(),
            })
        }
    }

    fn runner_with_memory_store() -> (ClaimRunner, Arc<InMemoryClaimStore>) {
        let store = Arc::new(InMemoryClaimStore::new());
        let runner = ClaimRunner::new(Arc::new(LocalDecisionEngine::default()), store.clone());
        (runner, store)
    }

    #[tokio::test]
    async fn test_submit_persists_decision() {
        let (runner, store) = runner_with_memory_store();
        let attachment = Attachment {
            file_name: Some("policy.pdf".to_string()),
            content_type: PDF_CONTENT_TYPE.to_string(),
            bytes: b"%PDF-1.4".to_vec(),
        };

        let claim = runner
            .submit(ClaimSubmission::new("maternity care, 12-month policy").with_attachment(attachment))
            .await
            .unwrap();

        assert_eq!(claim.attachment_name.as_deref(), Some("policy.pdf"));
        assert_eq!(claim.response.as_ref().unwrap().decision, Decision::Rejected);
        assert_eq!(store.get(&claim.id).await.unwrap(), Some(claim));
    }

    #[tokio::test]
    async fn test_non_pdf_is_rejected_before_deciding() {
        let store = Arc::new(InMemoryClaimStore::new());
        let engine = Arc::new(FailingEngine {
            calls: AtomicUsize::new(0),
        });
        let runner = ClaimRunner::new(engine.clone(), store.clone());
        let attachment = Attachment {
            file_name: Some("notes.txt".to_string()),
            content_type: "text/plain".to_string(),
            bytes: b"hello".to_vec(),
        };

        let err = runner
            .submit(ClaimSubmission::new("knee surgery").with_attachment(attachment))
            .await
            .unwrap_err();

        assert!(matches!(err, ClaimError::Validation(_)));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failure_stores_nothing() {
        let store = Arc::new(InMemoryClaimStore::new());
        let engine = Arc::new(FailingEngine {
            calls: AtomicUsize::new(0),
        });
        let runner = ClaimRunner::new(engine.clone(), store.clone());

        let err = runner.submit(ClaimSubmission::new("knee surgery")).await.unwrap_err();

        assert!(matches!(err, ClaimError::Upstream(UpstreamError::ConnectionRefused(_))));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let (runner, store) = runner_with_memory_store();
        let err = runner.submit(ClaimSubmission::new("")).await.unwrap_err();

        assert!(matches!(err, ClaimError::Validation(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_decision_is_internal_and_not_stored() {
        let store = Arc::new(InMemoryClaimStore::new());
        let runner = ClaimRunner::new(Arc::new(AmountlessEngine), store.clone());

        let err = runner.submit(ClaimSubmission::new("knee surgery")).await.unwrap_err();

        assert!(matches!(err, ClaimError::Internal(_)), "{err:?}");
        assert!(store.is_empty());
    }
}
