//! Gemini adapter: critique generation and text-to-speech.
//!
//! Talks to the Generative Language REST API
//! (`POST {api_base}/models/{model}:generateContent`). One client serves both
//! the analysis and the speech role; they only differ in model and
//! generation config.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::wav::ensure_wav;
use super::{AnalysisClient, ServiceError, SpeechClient};
use crate::domain::VoiceStyle;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Models and transport settings for the Gemini client
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_base: String,
    pub analysis_model: String,
    pub speech_model: String,
    /// Prebuilt voice used for every style
    pub voice_name: String,
    pub timeout: Duration,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            analysis_model: "gemini-2.5-pro".to_string(),
            speech_model: "gemini-2.5-flash-preview-tts".to_string(),
            voice_name: "Charon".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Gemini REST client
pub struct GeminiClient {
    api_key: String,
    settings: GeminiSettings,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

impl GenerateRequest {
    fn user_text(text: String, generation_config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(text),
                    inline_data: None,
                }],
            }],
            generation_config,
        }
    }
}

impl GeminiClient {
    /// Create a new client
    pub fn new(api_key: impl Into<String>, settings: GeminiSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("Failed to build HTTP client for Gemini")?;

        Ok(Self {
            api_key: api_key.into(),
            settings,
            client,
        })
    }

    /// Build API URL
    fn api_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.api_base.trim_end_matches('/'),
            model
        )
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, ServiceError> {
        let response = self
            .client
            .post(self.api_url(model))
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::from_status(status, &body));
        }

        // Body read errors keep their timeout/decode classification
        response
            .json::<GenerateResponse>()
            .await
            .map_err(ServiceError::from)
    }
}

/// Text sent to the analysis model: instructions first, idea appended
pub fn analysis_prompt(instructions: &str, idea_text: &str) -> String {
    format!(
        "{}\n\nHere is the business idea for you to analyze:\n\n{}",
        instructions.trim(),
        idea_text.trim()
    )
}

/// Text sent to the speech model: delivery instruction, then the feedback
pub fn speech_prompt(style: VoiceStyle, text: &str) -> String {
    format!("{}\n\n{}", style.instruction(), text)
}

fn speech_config(voice_name: &str) -> serde_json::Value {
    serde_json::json!({
        "voiceConfig": {
            "prebuiltVoiceConfig": { "voiceName": voice_name }
        }
    })
}

fn first_parts(response: GenerateResponse) -> Result<Vec<Part>, ServiceError> {
    if response.candidates.is_empty() {
        let reason = response
            .prompt_feedback
            .map(|f| f.to_string())
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(ServiceError::malformed(reason));
    }

    let candidate = response.candidates.into_iter().next();
    match candidate {
        Some(Candidate {
            content: Some(content),
            ..
        }) if !content.parts.is_empty() => Ok(content.parts),
        Some(Candidate { finish_reason, .. }) => Err(ServiceError::malformed(format!(
            "empty candidate (finish reason: {})",
            finish_reason.as_deref().unwrap_or("unknown")
        ))),
        None => Err(ServiceError::malformed("no candidates")),
    }
}

fn extract_text(response: GenerateResponse) -> Result<String, ServiceError> {
    let text: String = first_parts(response)?
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    let text = text.trim();
    if text.is_empty() {
        return Err(ServiceError::malformed("candidate has no text"));
    }
    Ok(text.to_string())
}

fn extract_audio(response: GenerateResponse) -> Result<Vec<u8>, ServiceError> {
    let inline = first_parts(response)?
        .into_iter()
        .find_map(|p| p.inline_data)
        .ok_or_else(|| ServiceError::malformed("no audio data received"))?;

    let bytes = BASE64
        .decode(inline.data.as_bytes())
        .map_err(|e| ServiceError::malformed(format!("audio is not valid base64: {}", e)))?;
    if bytes.is_empty() {
        return Err(ServiceError::malformed("audio payload is empty"));
    }

    ensure_wav(bytes, &inline.mime_type).map_err(ServiceError::malformed)
}

#[async_trait]
impl AnalysisClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str, idea_text: &str) -> Result<String, ServiceError> {
        let request = GenerateRequest::user_text(
            analysis_prompt(prompt, idea_text),
            GenerationConfig {
                temperature: 0.7,
                max_output_tokens: Some(2048),
                response_modalities: None,
                speech_config: None,
            },
        );

        debug!(model = %self.settings.analysis_model, "Requesting analysis");
        let response = self
            .generate_content(&self.settings.analysis_model, &request)
            .await?;
        extract_text(response)
    }
}

#[async_trait]
impl SpeechClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini-tts"
    }

    async fn synthesize(&self, text: &str, style: VoiceStyle) -> Result<Vec<u8>, ServiceError> {
        let request = GenerateRequest::user_text(
            speech_prompt(style, text),
            GenerationConfig {
                temperature: 1.0,
                max_output_tokens: None,
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(speech_config(&self.settings.voice_name)),
            },
        );

        debug!(model = %self.settings.speech_model, %style, "Requesting speech");
        let response = self
            .generate_content(&self.settings.speech_model, &request)
            .await?;
        extract_audio(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> GenerateResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_api_url() {
        let client = GeminiClient::new(
            "KEY",
            GeminiSettings {
                api_base: "https://example.test/v1beta/".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(
            client.api_url("gemini-2.5-pro"),
            "https://example.test/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }

    #[test]
    fn test_analysis_request_shape() {
        let request = GenerateRequest::user_text(
            analysis_prompt("Be honest.", "Idea A"),
            GenerationConfig {
                temperature: 0.7,
                max_output_tokens: Some(2048),
                response_modalities: None,
                speech_config: None,
            },
        );
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        let text = json["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Be honest."));
        assert!(text.ends_with("Idea A"));
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 2048);
        assert!(json["generationConfig"].get("responseModalities").is_none());
    }

    #[test]
    fn test_speech_request_shape() {
        let request = GenerateRequest::user_text(
            speech_prompt(VoiceStyle::Serious, "Feedback A"),
            GenerationConfig {
                temperature: 1.0,
                max_output_tokens: None,
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(speech_config("Charon")),
            },
        );
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["generationConfig"]["responseModalities"][0], "AUDIO");
        assert_eq!(
            json["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"],
            "Charon"
        );
        let text = json["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.contains("verdict"));
        assert!(text.ends_with("Feedback A"));
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response = parse(serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Feedback " }, { "text": "A\n" }] },
                "finishReason": "STOP"
            }]
        }));
        assert_eq!(extract_text(response).unwrap(), "Feedback A");
    }

    #[test]
    fn test_extract_text_blocked_prompt() {
        let response = parse(serde_json::json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }));
        let err = extract_text(response).unwrap_err();
        assert!(!err.is_transient());
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_extract_text_empty_candidate() {
        let response = parse(serde_json::json!({
            "candidates": [{ "finishReason": "MAX_TOKENS" }]
        }));
        let err = extract_text(response).unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));
    }

    #[test]
    fn test_extract_audio_wraps_pcm() {
        let pcm = [0x10u8, 0x00, 0x20, 0x00];
        let response = parse(serde_json::json!({
            "candidates": [{
                "content": { "parts": [{
                    "inlineData": { "mimeType": "audio/L16;codec=pcm;rate=24000", "data": BASE64.encode(pcm) }
                }]}
            }]
        }));

        let wav = extract_audio(response).unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[wav.len() - 4..], &pcm);
    }

    #[test]
    fn test_extract_audio_missing() {
        let response = parse(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "I cannot speak" }] } }]
        }));
        assert!(matches!(extract_audio(response), Err(ServiceError::Permanent(_))));
    }

    /// Serve one canned HTTP response, then hold the connection open
    async fn serve_once(head_and_body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 8192];
            let _ = socket.read(&mut buf).await;
            socket.write_all(head_and_body.as_bytes()).await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });
        format!("http://{}", addr)
    }

    fn local_client(api_base: String) -> GeminiClient {
        GeminiClient::new(
            "KEY",
            GeminiSettings {
                api_base,
                timeout: Duration::from_millis(300),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_body_timeout_is_transient() {
        let base = serve_once(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 500\r\n\r\n{\"candidates\"",
        )
        .await;

        let err = local_client(base).generate("Be honest.", "Idea A").await.unwrap_err();
        assert!(err.is_transient(), "{:?}", err);
    }
}
