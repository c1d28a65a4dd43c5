use super::types::*;
use crate::config::Config;
use crate::error::{ProcessorError, Result};
use log::{debug, info};
use reqwest::Client;
use std::time::Duration;

const GEMINI_TIMEOUT_SECS: u64 = 120;

/// Client for the Gemini `generateContent` endpoint
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Fails with a configuration error when no API key is set
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.gemini_api_key()?.to_string();
        let client = Client::builder()
            .timeout(Duration::from_secs(GEMINI_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProcessorError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.gemini_api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    /// Model the requests go to
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends `prompt` and returns the trimmed text of the first candidate
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        info!("Requesting explanation from {}", self.model);
        debug!("Prompt is {} characters", prompt.chars().count());

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateRequest::from_prompt(prompt))
            .send()
            .await
            .map_err(|e| ProcessorError::Llm(format!("request to Gemini failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ApiErrorBody>().await {
                Ok(body) => body.error.message,
                Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
            };
            return Err(ProcessorError::Llm(format!(
                "Gemini returned HTTP {}: {}",
                status.as_u16(),
                message
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProcessorError::Llm(format!("unexpected Gemini response: {}", e)))?;

        body.text()
            .map(|text| text.trim().to_string())
            .ok_or_else(|| ProcessorError::Llm("Gemini returned no text".to_string()))
    }
}
