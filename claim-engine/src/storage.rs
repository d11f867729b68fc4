use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use uuid::Uuid;

use crate::{
    error::Result,
    models::{ClaimQuery, NewClaim},
};

/// Trait for storing and retrieving claim queries.
///
/// Records are immutable once created. `list` returns the newest record first.
#[async_trait]
pub trait ClaimStore: Send + Sync {
    async fn create(&self, claim: NewClaim) -> Result<ClaimQuery>;
    async fn get(&self, id: &str) -> Result<Option<ClaimQuery>>;
    async fn list(&self) -> Result<Vec<ClaimQuery>>;
    /// Administrative removal; returns whether a record existed
    async fn delete(&self, id: &str) -> Result<bool>;
    /// Release backend resources. The store must not be used afterwards.
    async fn close(&self) {}
}

/// Builds the record a store persists for `claim`, with a fresh id.
pub(crate) fn new_record(claim: NewClaim) -> ClaimQuery {
    ClaimQuery {
        id: Uuid::new_v4().to_string(),
        query: claim.query,
        attachment_name: claim.attachment_name,
        response: Some(claim.response),
        created_at: Utc::now(),
    }
}

struct Entry {
    seq: u64,
    claim: ClaimQuery,
}

/// In-memory implementation of ClaimStore
pub struct InMemoryClaimStore {
    claims: Arc<DashMap<String, Entry>>,
    next_seq: AtomicU64,
}

impl InMemoryClaimStore {
    pub fn new() -> Self {
        Self {
            claims: Arc::new(DashMap::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

impl Default for InMemoryClaimStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClaimStore for InMemoryClaimStore {
    async fn create(&self, claim: NewClaim) -> Result<ClaimQuery> {
        let record = new_record(claim);
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.claims.insert(
            record.id.clone(),
            Entry {
                seq,
                claim: record.clone(),
            },
        );
        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Option<ClaimQuery>> {
        Ok(self.claims.get(id).map(|entry| entry.claim.clone()))
    }

    async fn list(&self) -> Result<Vec<ClaimQuery>> {
        let mut entries: Vec<(u64, ClaimQuery)> = self
            .claims
            .iter()
            .map(|entry| (entry.seq, entry.claim.clone()))
            .collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(entries.into_iter().map(|(_, claim)| claim).collect())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.claims.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClaimResponse, Decision, QueryDetails};
    use std::collections::HashSet;

    fn new_claim(query: &str) -> NewClaim {
        NewClaim {
            query: query.to_string(),
            attachment_name: Some("policy.pdf".to_string()),
            response: ClaimResponse {
                query_details: QueryDetails::default(),
                decision: Decision::Rejected,
                amount: None,
                justification: "Waiting period not completed.".to_string(),
                relevant_clauses: Vec::new(),
            },
        }
    }

    #[tokio::test]
    async fn test_create_then_get_round_trips() {
        let store = InMemoryClaimStore::new();
        let created = store.create(new_claim("maternity care")).await.unwrap();

        let fetched = store.get(&created.id).await.unwrap();
        assert_eq!(fetched, Some(created));
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = InMemoryClaimStore::new();
        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(store.create(new_claim(&format!("claim {i}"))).await.unwrap().id);
        }

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 5);

        let listed_ids: Vec<String> = listed.iter().map(|c| c.id.clone()).collect();
        ids.reverse();
        assert_eq!(listed_ids, ids);

        for claim in listed {
            assert_eq!(store.get(&claim.id).await.unwrap(), Some(claim));
        }
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryClaimStore::new();
        let created = store.create(new_claim("dental")).await.unwrap();

        assert!(store.delete(&created.id).await.unwrap());
        assert!(!store.delete(&created.id).await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_unique_ids() {
        let store = Arc::new(InMemoryClaimStore::new());
        let handles: Vec<_> = (0..64)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.create(new_claim(&format!("claim {i}"))).await })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap().unwrap().id);
        }

        assert_eq!(ids.len(), 64);
        assert_eq!(store.list().await.unwrap().len(), 64);
    }
}
