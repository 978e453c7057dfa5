//! Adapter interfaces for external services.
//!
//! The orchestrator only sees these traits. Each call either succeeds or
//! fails with a [`ServiceError`] that says whether trying again later could
//! help, which is all the per-idea isolation logic needs to know.

pub mod gemini;
pub mod resend;
pub mod wav;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{DeliveryRecord, VoiceStyle};

// Re-export the concrete clients
pub use gemini::{GeminiClient, GeminiSettings};
pub use resend::{EmailSettings, ResendNotifier};

/// Failure of an external service call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// Timeout, rate limit, 5xx: may succeed on a later attempt
    #[error("transient service error: {0}")]
    Transient(String),

    /// Rejected request or unusable response: retrying won't help
    #[error("permanent service error: {0}")]
    Permanent(String),
}

impl ServiceError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = format!("HTTP {}: {}", status, truncate(body, 300));
        if status == reqwest::StatusCode::REQUEST_TIMEOUT
            || status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status.is_server_error()
        {
            Self::Transient(message)
        } else {
            Self::Permanent(message)
        }
    }

    /// Malformed or empty response body
    pub fn malformed(what: impl std::fmt::Display) -> Self {
        Self::Permanent(format!("malformed response: {}", what))
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
            return Self::Transient(e.to_string());
        }
        if let Some(status) = e.status() {
            return Self::from_status(status, &e.to_string());
        }
        if e.is_decode() {
            return Self::malformed(e);
        }
        Self::Permanent(e.to_string())
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Turns an idea into written feedback
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str, idea_text: &str) -> Result<String, ServiceError>;
}

/// Turns feedback text into audio bytes
#[async_trait]
pub trait SpeechClient: Send + Sync {
    fn name(&self) -> &str;

    async fn synthesize(&self, text: &str, style: VoiceStyle) -> Result<Vec<u8>, ServiceError>;
}

/// Delivers feedback to a person
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn send(
        &self,
        feedback_text: &str,
        audio: Option<&[u8]>,
        recipient: &str,
    ) -> Result<DeliveryRecord, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_classification() {
        assert!(ServiceError::from_status(StatusCode::TOO_MANY_REQUESTS, "quota").is_transient());
        assert!(ServiceError::from_status(StatusCode::SERVICE_UNAVAILABLE, "").is_transient());
        assert!(ServiceError::from_status(StatusCode::REQUEST_TIMEOUT, "").is_transient());
        assert!(!ServiceError::from_status(StatusCode::BAD_REQUEST, "bad").is_transient());
        assert!(!ServiceError::from_status(StatusCode::UNAUTHORIZED, "key").is_transient());
    }

    #[test]
    fn test_status_message_truncated() {
        let body = "x".repeat(1000);
        let err = ServiceError::from_status(StatusCode::BAD_REQUEST, &body);
        assert!(err.to_string().len() < 400);
    }

    #[test]
    fn test_malformed_is_permanent() {
        assert!(!ServiceError::malformed("no candidates").is_transient());
    }
}
