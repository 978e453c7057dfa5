//! Resend email client for delivering feedback.
//!
//! Endpoint: POST /emails
//! Auth: Bearer token

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::{Notifier, ServiceError};
use crate::domain::DeliveryRecord;

pub const DEFAULT_API_BASE: &str = "https://api.resend.com";

/// Characters of feedback quoted in the email body
const SUMMARY_CHARS: usize = 200;

/// Sender identity and transport settings
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub api_base: String,
    pub from: String,
    pub subject: String,
    pub timeout: Duration,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            from: "Idea Review <onboarding@resend.dev>".to_string(),
            subject: "Your business idea analysis".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Resend API client
pub struct ResendNotifier {
    api_key: String,
    settings: EmailSettings,
    client: reqwest::Client,
}

/// Payload for POST /emails
#[derive(Debug, Serialize)]
pub struct EmailPayload {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Serialize)]
pub struct Attachment {
    pub filename: String,
    /// Base64 file content
    pub content: String,
    pub content_type: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    id: Option<String>,
}

impl ResendNotifier {
    /// Create a new client
    pub fn new(api_key: impl Into<String>, settings: EmailSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("Failed to build HTTP client for Resend")?;

        Ok(Self {
            api_key: api_key.into(),
            settings,
            client,
        })
    }

    fn api_url(&self) -> String {
        format!("{}/emails", self.settings.api_base.trim_end_matches('/'))
    }

    /// Build the email for one piece of feedback
    pub fn build_payload(
        &self,
        feedback_text: &str,
        audio: Option<&[u8]>,
        recipient: &str,
    ) -> EmailPayload {
        let summary = summarize(feedback_text, SUMMARY_CHARS);

        let mut formats = vec!["<li><strong>Text</strong>: the full written analysis</li>"];
        if audio.is_some() {
            formats.push("<li><strong>Audio</strong>: the analysis read aloud</li>");
        }

        let html = format!(
            "<h2>Business idea analysis complete</h2>\n\
             <p>Your latest idea has been reviewed. Attached:</p>\n\
             <ul>\n{}\n</ul>\n\
             <h3>Quick summary</h3>\n<p>{}</p>",
            formats.join("\n"),
            escape_html(&summary)
        );

        let mut attachments = vec![Attachment {
            filename: "analysis.txt".to_string(),
            content: BASE64.encode(feedback_text.as_bytes()),
            content_type: "text/plain".to_string(),
        }];
        if let Some(bytes) = audio {
            attachments.push(Attachment {
                filename: "analysis.wav".to_string(),
                content: BASE64.encode(bytes),
                content_type: "audio/wav".to_string(),
            });
        }

        EmailPayload {
            from: self.settings.from.clone(),
            to: vec![recipient.to_string()],
            subject: self.settings.subject.clone(),
            html,
            text: feedback_text.to_string(),
            attachments,
        }
    }
}

/// First `max_chars` characters, with an ellipsis when cut
fn summarize(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("<br>"),
            _ => out.push(c),
        }
    }
    out
}

#[async_trait]
impl Notifier for ResendNotifier {
    fn name(&self) -> &str {
        "resend"
    }

    async fn send(
        &self,
        feedback_text: &str,
        audio: Option<&[u8]>,
        recipient: &str,
    ) -> Result<DeliveryRecord, ServiceError> {
        let payload = self.build_payload(feedback_text, audio, recipient);

        let response = self
            .client
            .post(self.api_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ServiceError::from_status(status, &text));
        }

        // A 2xx without a readable body still means the mail was accepted
        let id = response
            .json::<SendResponse>()
            .await
            .ok()
            .and_then(|r| r.id);

        Ok(DeliveryRecord {
            recipient: recipient.to_string(),
            delivered: true,
            message_id: id,
        })
    }
}
