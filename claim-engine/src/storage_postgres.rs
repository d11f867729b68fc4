use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgPoolOptions, postgres::PgRow, types::Json};
use tracing::info;

use crate::{
    error::Result,
    models::{ClaimQuery, ClaimResponse, NewClaim},
    storage::{ClaimStore, new_record},
};

const MAX_CONNECTIONS: u32 = 5;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS claim_queries (
    id TEXT PRIMARY KEY,
    seq BIGSERIAL NOT NULL,
    query TEXT NOT NULL,
    attachment_name TEXT,
    response JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

/// Postgres-backed ClaimStore. Responses are kept in a JSONB column.
pub struct PostgresClaimStore {
    pool: PgPool,
}

impl PostgresClaimStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        info!("Connected to PostgreSQL claim store");

        Ok(Self { pool })
    }

    fn from_row(row: PgRow) -> Result<ClaimQuery> {
        let response: Option<Json<ClaimResponse>> = row.try_get("response")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        Ok(ClaimQuery {
            id: row.try_get("id")?,
            query: row.try_get("query")?,
            attachment_name: row.try_get("attachment_name")?,
            response: response.map(|json| json.0),
            created_at,
        })
    }
}

#[async_trait]
impl ClaimStore for PostgresClaimStore {
    async fn create(&self, claim: NewClaim) -> Result<ClaimQuery> {
        let record = new_record(claim);

        sqlx::query(
            "INSERT INTO claim_queries (id, query, attachment_name, response, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&record.id)
        .bind(&record.query)
        .bind(&record.attachment_name)
        .bind(record.response.as_ref().map(Json))
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Option<ClaimQuery>> {
        let row = sqlx::query(
            "SELECT id, query, attachment_name, response, created_at \
             FROM claim_queries WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<ClaimQuery>> {
        let rows = sqlx::query(
            "SELECT id, query, attachment_name, response, created_at \
             FROM claim_queries ORDER BY seq DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::from_row).collect()
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM claim_queries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Closed PostgreSQL claim store");
    }
}
