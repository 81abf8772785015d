//! HTTP client for the check-analyzer backend.
//!
//! The backend owns image preprocessing, the OCR engines, and the LLM calls;
//! this side only speaks its two endpoints and maps failures onto the step
//! taxonomy in `error`.

pub mod types;

pub use types::{CheckAnalysisResponse, CheckDetails, CheckSide, LLMAnalysis, OllamaModel};

use crate::config::Config;
use crate::error::{CheckAiError, Result};
use reqwest::multipart;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

pub struct BackendClient {
    client: reqwest::Client,
    backend_url: String,
    ollama_url: String,
}

impl BackendClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| CheckAiError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            backend_url: config.backend_url.trim_end_matches('/').to_string(),
            ollama_url: config.ollama_url.clone(),
        })
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    /// `GET /api/ollama-models` — the model registry read.
    pub async fn fetch_models(&self) -> Result<Vec<OllamaModel>> {
        let url = format!("{}/api/ollama-models", self.backend_url);

        let response = self
            .client
            .get(&url)
            .query(&[("ollama_url", self.ollama_url.as_str())])
            .send()
            .await
            .map_err(|e| CheckAiError::ModelFetch(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CheckAiError::ModelFetch(error_message(status, &body)));
        }

        response
            .json::<Vec<OllamaModel>>()
            .await
            .map_err(|e| CheckAiError::ModelFetch(format!("invalid model list: {}", e)))
    }

    /// `POST /api/ocr-check` — multipart upload of one check image plus the
    /// JSON-encoded list of selected model names.
    pub async fn analyze_check(
        &self,
        file_name: &str,
        image_bytes: Vec<u8>,
        mime: &str,
        selected_models: &[String],
    ) -> Result<CheckAnalysisResponse> {
        let url = format!("{}/api/ocr-check", self.backend_url);
        let models_json = serde_json::to_string(selected_models)?;

        let image_part = multipart::Part::bytes(image_bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .map_err(|e| CheckAiError::Processing(format!("invalid image part: {}", e)))?;
        let form = multipart::Form::new()
            .part("image_file", image_part)
            .text("selected_models_json", models_json);

        let response = self
            .client
            .post(&url)
            .query(&[("ollama_url", self.ollama_url.as_str())])
            .multipart(form)
            .send()
            .await
            .map_err(|e| CheckAiError::Processing(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CheckAiError::Processing(error_message(status, &body)));
        }

        response
            .json::<CheckAnalysisResponse>()
            .await
            .map_err(|e| CheckAiError::Processing(format!("invalid response body: {}", e)))
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Best-effort extraction of a human-readable message from a non-2xx body:
/// JSON `detail` or `message` when present, else a line synthesized from the
/// status code and reason phrase.
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.detail.or(parsed.message) {
            if !message.trim().is_empty() {
                return message;
            }
        }
    }

    match status.canonical_reason() {
        Some(reason) => format!("HTTP {}: {}", status.as_u16(), reason),
        None => format!("HTTP {}", status.as_u16()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_detail_field() {
        let msg = error_message(
            StatusCode::SERVICE_UNAVAILABLE,
            r#"{"detail": "Ollama service at http://localhost:11434 not reachable"}"#,
        );
        assert_eq!(msg, "Ollama service at http://localhost:11434 not reachable");
    }

    #[test]
    fn error_message_falls_back_to_message_field() {
        let msg = error_message(StatusCode::BAD_REQUEST, r#"{"message": "bad image"}"#);
        assert_eq!(msg, "bad image");
    }

    #[test]
    fn error_message_synthesizes_from_status_when_body_is_useless() {
        for body in ["", "<html>oops</html>", r#"{"detail": ""}"#, r#"{"other": 1}"#] {
            let msg = error_message(StatusCode::NOT_FOUND, body);
            assert!(msg.contains("404"), "missing status in: {}", msg);
            assert!(!msg.is_empty());
        }
    }
}
