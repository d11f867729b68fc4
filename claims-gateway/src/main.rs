use claim_engine::{
    AttachmentPolicy, ClaimRunner, ClaimStore, DecisionEngine, InMemoryClaimStore,
    LocalDecisionEngine, PostgresClaimStore, RemoteDecisionEngine, RuleBook,
};
use claims_gateway::{AppState, DecisionMode, GatewayConfig, LogFormat, build_router};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured tracing based on the configured log format
fn init_tracing(format: &LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "claims_gateway=debug,claim_engine=debug,tower_http=debug".into());

    match format {
        LogFormat::Pretty => {
            // Human-readable logging for development
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

async fn create_claim_store(database_url: Option<&str>) -> Arc<dyn ClaimStore> {
    let Some(database_url) = database_url else {
        info!("Using in-memory claim store (set DATABASE_URL to use PostgreSQL)");
        return Arc::new(InMemoryClaimStore::new());
    };

    info!("Using PostgreSQL claim store");
    match PostgresClaimStore::connect(database_url).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!(
                "Failed to connect to PostgreSQL: {}. Falling back to in-memory storage.",
                e
            );
            Arc::new(InMemoryClaimStore::new())
        }
    }
}

fn create_decision_engine(mode: &DecisionMode) -> anyhow::Result<Arc<dyn DecisionEngine>> {
    match mode {
        DecisionMode::Local { default_coverage } => {
            info!(default_coverage, "Deciding claims locally");
            let rules = RuleBook::default().with_default_amount(*default_coverage);
            Ok(Arc::new(LocalDecisionEngine::new(rules)))
        }
        DecisionMode::Remote { url, timeout } => {
            info!(url = %url, timeout_secs = timeout.as_secs(), "Forwarding claims to decision service");
            Ok(Arc::new(RemoteDecisionEngine::new(url.clone(), *timeout)?))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::from_env()?;
    init_tracing(&config.log_format);

    let store = create_claim_store(config.database_url.as_deref()).await;
    let engine = create_decision_engine(&config.decision)?;
    let policy = AttachmentPolicy::default().with_max_bytes(config.max_attachment_bytes);
    let runner = ClaimRunner::new(engine, store.clone()).with_policy(policy);

    let app = build_router(AppState::new(runner));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Claims gateway running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Claims gateway stopped");
    Ok(())
}
