use axum::extract::Multipart;
use claim_engine::{Attachment, AttachmentPolicy, ClaimSubmission};
use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// Field names accepted for the uploaded document. `pdf` is what the legacy
/// web client sends.
const FILE_FIELDS: &[&str] = &["file", "pdf"];

/// Reads a `POST /claims` body into a submission.
///
/// A named attachment's content type is checked as soon as its part header is
/// seen, before the body is read. The size limit is enforced while streaming,
/// so an oversized upload is cut off without being buffered in full.
pub async fn read_submission(
    mut multipart: Multipart,
    policy: &AttachmentPolicy,
) -> ApiResult<ClaimSubmission> {
    let mut query: Option<String> = None;
    let mut attachment: Option<Attachment> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to process multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "query" {
            let text = field
                .text()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read query: {}", e)))?;
            query = Some(text);
        } else if FILE_FIELDS.contains(&name.as_str()) {
            let file_name = field
                .file_name()
                .filter(|name| !name.is_empty())
                .map(str::to_string);
            let content_type = field.content_type().map(str::to_string);

            // Browsers send an empty, unnamed part when nothing was picked, so
            // the type of an unnamed part is only judged once it has content.
            if file_name.is_some() {
                policy.check_content_type(content_type.as_deref())?;
            }

            let mut bytes = Vec::new();
            while let Some(chunk) = field.chunk().await.map_err(|e| {
                ApiError::bad_request(format!("Failed to read file chunk: {}", e))
            })? {
                policy.check_size(bytes.len() + chunk.len())?;
                bytes.extend_from_slice(&chunk);
            }

            if file_name.is_none() {
                if bytes.is_empty() {
                    debug!(field = %name, "Skipping empty file part");
                    continue;
                }
                policy.check_content_type(content_type.as_deref())?;
            }

            debug!(file_name = ?file_name, size = bytes.len(), "Received attachment");
            attachment = Some(Attachment {
                file_name,
                content_type: content_type.unwrap_or_default(),
                bytes,
            });
        } else {
            debug!(field = %name, "Ignoring unknown multipart field");
        }
    }

    let query = query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Query is required"))?;

    Ok(ClaimSubmission { query, attachment })
}
