//! Provider error type raised at the transport boundary

use crate::query::xml::ResponseNode;

/// Code used when the request never produced a provider answer
pub const REQUEST_FAILED: &str = "RequestFailed";

/// Code used when the provider answered with something that is not a
/// decodable response document
pub const MALFORMED_RESPONSE: &str = "MalformedResponse";

/// A fault reported by (or on the way to) the provider
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

impl ProviderError {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            status: None,
            code: code.to_string(),
            message: message.to_string(),
            request_id: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn request_failed(message: impl Into<String>) -> Self {
        Self::new(REQUEST_FAILED, &message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(MALFORMED_RESPONSE, &message.into())
    }

    /// Build from an error document. Both the EC2 shape
    /// (`Response/Errors/Error`) and the CloudWatch shape
    /// (`ErrorResponse/Error`) carry `Code` and `Message` somewhere below
    /// the root.
    pub fn from_document(status: u16, doc: &ResponseNode) -> Self {
        let code = doc.find_text("Code").unwrap_or("Unknown");
        let message = doc.find_text("Message").unwrap_or("no message");
        let request_id = doc
            .find_text("RequestID")
            .or_else(|| doc.find_text("RequestId"))
            .map(|s| s.to_string());

        Self {
            status: Some(status),
            code: code.to_string(),
            message: message.to_string(),
            request_id,
        }
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        match (&self.status, &self.request_id) {
            (Some(status), Some(id)) => format!("{} [{}] {} (request {})", status, self.code, self.message, id),
            (Some(status), None) => format!("{} [{}] {}", status, self.code, self.message),
            _ => format!("[{}] {}", self.code, self.message),
        }
    }
}
