use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{Provider, Usage};
use super::configs::GeminiProviderConfig;
use super::utils::{gemini_response_to_message, messages_to_gemini_spec};
use crate::models::message::Message;

pub struct GeminiProvider {
    client: Client,
    config: GeminiProviderConfig,
}

impl GeminiProvider {
    pub fn new(config: GeminiProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    fn get_usage(data: &Value) -> Usage {
        let metadata = match data.get("usageMetadata") {
            Some(metadata) => metadata,
            None => return Usage::default(),
        };

        let input_tokens = metadata
            .get("promptTokenCount")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);

        let output_tokens = metadata
            .get("candidatesTokenCount")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);

        let total_tokens = metadata
            .get("totalTokenCount")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32)
            .or_else(|| match (input_tokens, output_tokens) {
                (Some(input), Some(output)) => Some(input + output),
                _ => None,
            });

        Usage::new(input_tokens, output_tokens, total_tokens)
    }

    async fn post(&self, payload: Value) -> Result<Value> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.config.host.trim_end_matches('/'),
            self.config.model,
            self.config.api_key
        );

        let response = self.client.post(&url).json(&payload).send().await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(anyhow!("Server error: {}", status))
            }
            status => Err(anyhow!("Request failed: {}", status)),
        }
    }

    /// Query the provider's model catalog and return the raw JSON body.
    pub async fn list_models(&self) -> Result<Value> {
        let url = format!(
            "{}/v1beta/models?key={}",
            self.config.host.trim_end_matches('/'),
            self.config.api_key
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(anyhow!("HTTP {} - {}", status.as_u16(), status));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn complete(&self, messages: &[Message]) -> Result<(Message, Usage)> {
        let payload = json!({
            "contents": messages_to_gemini_spec(messages)
        });

        let response = self.post(payload).await?;

        if let Some(error) = response.get("error") {
            return Err(anyhow!("Gemini API error: {}", error));
        }

        let message = gemini_response_to_message(&response)?;
        let usage = Self::get_usage(&response);

        Ok((message, usage))
    }
}
