//! Client for the external claims-analysis service.
//!
//! The service takes the same multipart shape the gateway receives (`query`
//! text plus an optional `file`) and answers with a PascalCase JSON decision.
//! Its payload is normalized into [`ClaimResponse`] here, so nothing past this
//! module sees the wire format.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::{
    decision::DecisionEngine,
    error::{ClaimError, Result, UpstreamError},
    models::{ClaimResponse, Decision, Gender, QueryDetails, RelevantClause},
    submission::ClaimSubmission,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_ERROR_BODY_CHARS: usize = 500;

pub struct RemoteDecisionEngine {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteDecisionEngine {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_form(submission: &ClaimSubmission) -> Result<Form> {
        let mut form = Form::new().text("query", submission.query.clone());

        if let Some(attachment) = &submission.attachment {
            let file_name = attachment
                .file_name
                .clone()
                .unwrap_or_else(|| "document.pdf".to_string());
            let part = Part::bytes(attachment.bytes.clone())
                .file_name(file_name)
                .mime_str(&attachment.content_type)
                .map_err(|e| {
                    ClaimError::Validation(format!("Invalid attachment content type: {}", e))
                })?;
            form = form.part("file", part);
        }

        Ok(form)
    }
}

#[async_trait]
impl DecisionEngine for RemoteDecisionEngine {
    fn name(&self) -> &str {
        "remote"
    }

    async fn decide(&self, submission: &ClaimSubmission) -> Result<ClaimResponse> {
        let form = Self::build_form(submission)?;
        let started = Instant::now();

        info!(
            endpoint = %self.endpoint,
            has_attachment = submission.attachment.is_some(),
            "Forwarding claim to decision service"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| classify_transport_error(&self.endpoint, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(&self.endpoint, e))?;

        info!(
            endpoint = %self.endpoint,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Decision service responded"
        );

        if !status.is_success() {
            let message = error_message(&body);
            error!(status = status.as_u16(), message = %message, "Decision service failed");
            return Err(UpstreamError::Application {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let fallback_source = submission
            .attachment_name()
            .unwrap_or_else(|| "policy document".to_string());
        parse_decision(status.as_u16(), &body, &fallback_source).map_err(|e| {
            warn!(error = %e, "Rejected decision service payload");
            ClaimError::from(e)
        })
    }
}

fn classify_transport_error(endpoint: &str, err: reqwest::Error) -> ClaimError {
    let upstream = if err.is_timeout() {
        UpstreamError::Timeout(format!("{}: {}", endpoint, err))
    } else if err.is_connect() {
        UpstreamError::ConnectionRefused(format!("{}: {}", endpoint, err))
    } else if err.is_body() || err.is_decode() {
        UpstreamError::MalformedResponse(format!("unreadable response body: {}", err))
    } else {
        UpstreamError::Transport(format!("{}: {}", endpoint, err))
    };
    error!(reason = upstream.reason(), error = %err, "Decision service call failed");
    upstream.into()
}

/// Pulls a human-readable message out of an error body.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["error", "detail", "message"] {
            if let Some(text) = value.get(key).and_then(Value::as_str) {
                return text.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response body".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect()
    }
}

/// Numbers from the service may arrive as JSON numbers or as text such as
/// `"46"` or `"₹85,000"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireNumber {
    Number(f64),
    Text(String),
}

impl WireNumber {
    fn as_f64(&self) -> Option<f64> {
        match self {
            WireNumber::Number(n) => Some(*n),
            WireNumber::Text(text) => {
                let start = text.find(|c: char| c.is_ascii_digit())?;
                // A sign in the currency prefix makes the value unusable
                if text[..start].contains('-') {
                    return None;
                }
                let digits: String = text[start..]
                    .chars()
                    .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
                    .filter(|c| *c != ',')
                    .collect();
                digits.parse().ok()
            }
        }
    }

    fn as_u32(&self) -> Option<u32> {
        self.as_f64()
            .filter(|n| n.is_finite() && *n >= 0.0 && *n <= u32::MAX as f64)
            .map(|n| n as u32)
    }
}

#[derive(Debug, Default, Deserialize)]
struct WireQueryDetails {
    age: Option<WireNumber>,
    gender: Option<String>,
    procedure: Option<String>,
    location: Option<String>,
    #[serde(alias = "policyDurationMonths")]
    policy_duration: Option<WireNumber>,
}

#[derive(Debug, Deserialize)]
struct WireClause {
    text: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    position: Option<WireNumber>,
}

#[derive(Debug, Deserialize)]
struct WireDecision {
    #[serde(rename = "QueryDetails", alias = "queryDetails", default)]
    query_details: Option<WireQueryDetails>,
    #[serde(rename = "Decision", alias = "decision")]
    decision: String,
    #[serde(rename = "Amount", alias = "amount", default)]
    amount: Option<WireNumber>,
    #[serde(rename = "Justification", alias = "justification", default)]
    justification: Option<String>,
    #[serde(rename = "RelevantClauses", alias = "relevantClauses", default)]
    relevant_clauses: Vec<WireClause>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_gender(value: Option<String>) -> Option<Gender> {
    match value?.trim().to_ascii_lowercase().as_str() {
        "male" | "m" | "man" => Some(Gender::Male),
        "female" | "f" | "woman" => Some(Gender::Female),
        _ => None,
    }
}

pub(crate) fn parse_decision(
    status: u16,
    body: &str,
    fallback_source: &str,
) -> std::result::Result<ClaimResponse, UpstreamError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| UpstreamError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    if let Some(message) = value.get("error").filter(|v| !v.is_null()) {
        let message = message
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| message.to_string());
        return Err(UpstreamError::Application { status, message });
    }

    let wire: WireDecision = serde_json::from_value(value)
        .map_err(|e| UpstreamError::MalformedResponse(format!("unexpected shape: {}", e)))?;

    let decision = match wire.decision.trim().to_ascii_lowercase().as_str() {
        "approved" => Decision::Approved,
        "rejected" => Decision::Rejected,
        other => {
            return Err(UpstreamError::MalformedResponse(format!(
                "unknown decision {:?}",
                other
            )));
        }
    };

    let amount = match decision {
        Decision::Approved => {
            let amount = wire.amount.as_ref().and_then(WireNumber::as_f64);
            match amount {
                Some(a) if a.is_finite() && a >= 0.0 => Some(a),
                _ => {
                    return Err(UpstreamError::MalformedResponse(
                        "approved decision without a valid amount".to_string(),
                    ));
                }
            }
        }
        Decision::Rejected => None,
    };

    let justification = non_empty(wire.justification).ok_or_else(|| {
        UpstreamError::MalformedResponse("decision without a justification".to_string())
    })?;

    let details = wire.query_details.unwrap_or_default();
    let query_details = QueryDetails {
        age: details.age.as_ref().and_then(WireNumber::as_u32),
        gender: parse_gender(details.gender),
        procedure: non_empty(details.procedure),
        location: non_empty(details.location),
        policy_duration_months: details.policy_duration.as_ref().and_then(WireNumber::as_u32),
    };

    let relevant_clauses = wire
        .relevant_clauses
        .into_iter()
        .enumerate()
        .map(|(index, clause)| RelevantClause {
            text: clause.text,
            source: non_empty(clause.source).unwrap_or_else(|| fallback_source.to_string()),
            position: clause
                .position
                .as_ref()
                .and_then(WireNumber::as_u32)
                .unwrap_or(index as u32),
        })
        .collect();

    Ok(ClaimResponse {
        query_details,
        decision,
        amount,
        justification,
        relevant_clauses,
    })
}
