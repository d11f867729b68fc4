use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::{Next, from_fn},
    response::Json,
    routing::get,
};
use claim_engine::{ClaimQuery, ClaimReceipt, ClaimRunner, ClaimStore};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, info};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    multipart::read_submission,
};

/// Room for multipart framing and the query text on top of the attachment
/// limit, so oversized files are reported by the attachment check.
const BODY_LIMIT_HEADROOM: usize = 1024 * 1024;

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

#[derive(Clone)]
pub struct AppState {
    pub runner: ClaimRunner,
}

impl AppState {
    pub fn new(runner: ClaimRunner) -> Self {
        Self { runner }
    }

    fn store(&self) -> &Arc<dyn ClaimStore> {
        self.runner.store()
    }
}

/// Middleware to add correlation ID to all requests
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        request
            .headers_mut()
            .insert(CORRELATION_ID_HEADER, value.clone());

        let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
        let mut response = next.run(request).instrument(span).await;
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
        return response;
    }

    next.run(request).await
}

fn claim_routes() -> Router<AppState> {
    Router::new()
        .route("/claims", get(list_claims).post(submit_claim))
        .route("/claims/{id}", get(get_claim).delete(delete_claim))
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.runner.policy().max_bytes + BODY_LIMIT_HEADROOM;

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(claim_routes())
        .nest("/api", claim_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Claims Gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Insurance claim query intake and decision gateway",
        "endpoints": {
            "POST /claims": "Submit a claim query (multipart: query, optional PDF file)",
            "GET /claims": "List stored claim queries, newest first",
            "GET /claims/{id}": "Get a stored claim query",
            "DELETE /claims/{id}": "Delete a stored claim query",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn submit_claim(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<ClaimReceipt>> {
    let submission = read_submission(multipart, state.runner.policy()).await?;

    info!(
        engine = state.runner.engine_name(),
        query_length = submission.query.len(),
        attachment = ?submission.attachment_name(),
        "Processing claim query"
    );

    let claim = state.runner.submit(submission).await?;
    let receipt = ClaimReceipt::from_claim(claim)?;

    info!(claim_id = %receipt.id, decision = ?receipt.response.decision, "Claim query processed");
    Ok(Json(receipt))
}

async fn get_claim(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ClaimQuery>> {
    match state.store().get(&id).await? {
        Some(claim) => Ok(Json(claim)),
        None => Err(ApiError::not_found(&id)),
    }
}

async fn list_claims(State(state): State<AppState>) -> ApiResult<Json<Vec<ClaimQuery>>> {
    let claims = state.store().list().await?;
    info!(count = claims.len(), "Listing claim queries");
    Ok(Json(claims))
}

async fn delete_claim(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.store().delete(&id).await? {
        info!(claim_id = %id, "Claim query deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(&id))
    }
}
