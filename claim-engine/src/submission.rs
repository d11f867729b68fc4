use crate::error::{ClaimError, Result};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

/// Uploaded policy document. The bytes are only held for the lifetime of the
/// request; the store keeps the file name alone.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// One claim query as received from a client.
#[derive(Debug, Clone)]
pub struct ClaimSubmission {
    pub query: String,
    pub attachment: Option<Attachment>,
}

impl ClaimSubmission {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn attachment_name(&self) -> Option<String> {
        self.attachment.as_ref().and_then(|a| a.file_name.clone())
    }
}

/// Content type and size constraints for uploaded documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPolicy {
    pub content_type: String,
    pub max_bytes: usize,
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self {
            content_type: PDF_CONTENT_TYPE.to_string(),
            max_bytes: MAX_ATTACHMENT_BYTES,
        }
    }
}

impl AttachmentPolicy {
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Matches the declared content type, ignoring case and any parameters.
    pub fn check_content_type(&self, content_type: Option<&str>) -> Result<()> {
        let declared = content_type
            .and_then(|ct| ct.split(';').next())
            .map(str::trim)
            .unwrap_or("");

        if declared.eq_ignore_ascii_case(&self.content_type) {
            Ok(())
        } else {
            Err(ClaimError::Validation(format!(
                "Only {} files are allowed (got {})",
                self.content_type,
                if declared.is_empty() { "no content type" } else { declared }
            )))
        }
    }

    pub fn check_size(&self, len: usize) -> Result<()> {
        if len > self.max_bytes {
            return Err(ClaimError::Validation(format!(
                "Attachment is {} bytes, the limit is {} bytes",
                len, self.max_bytes
            )));
        }
        Ok(())
    }

    pub fn validate(&self, submission: &ClaimSubmission) -> Result<()> {
        if submission.query.trim().is_empty() {
            return Err(ClaimError::Validation("Query is required".to_string()));
        }

        if let Some(attachment) = &submission.attachment {
            self.check_content_type(Some(&attachment.content_type))?;
            self.check_size(attachment.bytes.len())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(len: usize) -> Attachment {
        Attachment {
            file_name: Some("policy.pdf".to_string()),
            content_type: PDF_CONTENT_TYPE.to_string(),
            bytes: vec![0u8; len],
        }
    }

    #[test]
    fn test_blank_query_rejected() {
        let policy = AttachmentPolicy::default();
        assert!(matches!(
            policy.validate(&ClaimSubmission::new("  \n")),
            Err(ClaimError::Validation(_))
        ));
        assert!(policy.validate(&ClaimSubmission::new("knee surgery")).is_ok());
    }

    #[test]
    fn test_content_type_check() {
        let policy = AttachmentPolicy::default();
        assert!(policy.check_content_type(Some("application/pdf")).is_ok());
        assert!(policy.check_content_type(Some("Application/PDF; name=x")).is_ok());
        assert!(policy.check_content_type(Some("text/plain")).is_err());
        assert!(policy.check_content_type(None).is_err());
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let policy = AttachmentPolicy::default().with_max_bytes(16);
        let at_limit = ClaimSubmission::new("claim").with_attachment(pdf(16));
        let over_limit = ClaimSubmission::new("claim").with_attachment(pdf(17));

        assert!(policy.validate(&at_limit).is_ok());
        assert!(policy.validate(&over_limit).is_err());
        assert_eq!(at_limit.attachment_name().as_deref(), Some("policy.pdf"));
    }
}
