//! Runs against a live database: `DATABASE_URL=postgres://... cargo test -- --ignored`

use claim_engine::{
    ClaimResponse, ClaimStore, Decision, NewClaim, PostgresClaimStore, QueryDetails,
    RelevantClause,
};

async fn connect() -> Option<PostgresClaimStore> {
    let url = std::env::var("DATABASE_URL").ok()?;
    Some(PostgresClaimStore::connect(&url).await.unwrap())
}

fn new_claim(query: &str) -> NewClaim {
    NewClaim {
        query: query.to_string(),
        attachment_name: Some("policy.pdf".to_string()),
        response: ClaimResponse {
            query_details: QueryDetails {
                age: Some(46),
                procedure: Some("knee surgery".to_string()),
                policy_duration_months: Some(3),
                ..Default::default()
            },
            decision: Decision::Approved,
            amount: Some(500000.0),
            justification: "Covered.".to_string(),
            relevant_clauses: vec![RelevantClause {
                text: "Orthopedic procedures are covered".to_string(),
                source: "policy.pdf".to_string(),
                position: 4,
            }],
        },
    }
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn test_postgres_round_trip() {
    let Some(store) = connect().await else {
        return;
    };

    let created = store.create(new_claim("knee surgery in Pune")).await.unwrap();
    let fetched = store.get(&created.id).await.unwrap().unwrap();

    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.query, "knee surgery in Pune");
    assert_eq!(fetched.attachment_name.as_deref(), Some("policy.pdf"));
    assert_eq!(fetched.response, created.response);
    assert!(store.get("missing-id").await.unwrap().is_none());

    assert!(store.delete(&created.id).await.unwrap());
    assert!(!store.delete(&created.id).await.unwrap());
    store.close().await;
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn test_postgres_lists_newest_first() {
    let Some(store) = connect().await else {
        return;
    };

    let mut ids = Vec::new();
    for query in ["first", "second", "third"] {
        ids.push(store.create(new_claim(query)).await.unwrap().id);
    }

    // The table may hold rows from other runs, so only the relative order matters
    let listed: Vec<String> = store
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|claim| claim.id)
        .filter(|id| ids.contains(id))
        .collect();
    assert_eq!(listed, vec![ids[2].clone(), ids[1].clone(), ids[0].clone()]);

    for id in &ids {
        store.delete(id).await.unwrap();
    }
    store.close().await;
}
