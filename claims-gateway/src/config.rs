use anyhow::{Context, Result};
use claim_engine::{rules::DEFAULT_COVERAGE, submission::MAX_ATTACHMENT_BYTES};
use std::time::Duration;

/// Where claim decisions come from.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionMode {
    /// In-process field extraction and rule book
    Local { default_coverage: f64 },
    /// Forward to the external claims-analysis service
    Remote { url: String, timeout: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Gateway settings, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub decision: DecisionMode,
    pub max_attachment_bytes: usize,
    pub database_url: Option<String>,
    pub log_format: LogFormat,
}

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Unset or blank keys fall
    /// back to defaults; values that do not parse are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT must be a port number, got {:?}", raw))?,
            None => DEFAULT_PORT,
        };

        let max_attachment_bytes = match get("MAX_ATTACHMENT_BYTES") {
            Some(raw) => raw.parse::<usize>().with_context(|| {
                format!("MAX_ATTACHMENT_BYTES must be a byte count, got {:?}", raw)
            })?,
            None => MAX_ATTACHMENT_BYTES,
        };

        let decision = match get("DECISION_SERVICE_URL") {
            Some(url) => {
                let secs = match get("UPSTREAM_TIMEOUT_SECS") {
                    Some(raw) => raw.parse::<u64>().with_context(|| {
                        format!("UPSTREAM_TIMEOUT_SECS must be whole seconds, got {:?}", raw)
                    })?,
                    None => DEFAULT_UPSTREAM_TIMEOUT_SECS,
                };
                DecisionMode::Remote {
                    url,
                    timeout: Duration::from_secs(secs),
                }
            }
            None => {
                let default_coverage = match get("DEFAULT_COVERAGE") {
                    Some(raw) => {
                        let amount = raw.parse::<f64>().with_context(|| {
                            format!("DEFAULT_COVERAGE must be a number, got {:?}", raw)
                        })?;
                        anyhow::ensure!(
                            amount.is_finite() && amount >= 0.0,
                            "DEFAULT_COVERAGE must be a non-negative amount, got {}",
                            amount
                        );
                        amount
                    }
                    None => DEFAULT_COVERAGE,
                };
                DecisionMode::Local { default_coverage }
            }
        };

        let log_format = match get("LOG_FORMAT").as_deref() {
            Some("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            decision,
            max_attachment_bytes,
            database_url: get("DATABASE_URL"),
            log_format,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
