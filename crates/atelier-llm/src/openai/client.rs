// Client for OpenAI-compatible chat-completion endpoints (HTTP direct, no SDK)

use crate::streaming::{decode_chat_stream, EventStream};
use crate::traits::{ChatClient, ChatRequest};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

pub struct CompletionClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl CompletionClient {
    /// Create a new client for the given endpoint. The API key is optional;
    /// keyless public endpoints are the default deployment target.
    pub fn new(base_url: impl Into<String>, api_key: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(key) = api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", key))
                    .context("Invalid API key format")?,
            );
        }

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        let base_url: String = base_url.into();

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build the streaming completion request payload.
    fn build_chat_request(&self, request: &ChatRequest) -> Result<Value> {
        let mut payload = serde_json::json!({
            "messages": request.messages,
            "stream": true,
            "model": request.model,
        });

        let obj = payload.as_object_mut().unwrap();

        if let Some(temp) = request.options.temperature {
            obj.insert("temperature".to_string(), serde_json::json!(temp));
        }
        if let Some(penalty) = request.options.presence_penalty {
            obj.insert("presence_penalty".to_string(), serde_json::json!(penalty));
        }
        if let Some(max_tokens) = request.options.max_tokens {
            obj.insert("max_tokens".to_string(), serde_json::json!(max_tokens));
        }

        Ok(payload)
    }
}

#[async_trait]
impl ChatClient for CompletionClient {
    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream> {
        let payload = self.build_chat_request(&request)?;

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&payload)
            .send()
            .await
            .context("Failed to send completion request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Completion endpoint error ({}): {}", status, error_text);
        }

        Ok(decode_chat_stream(response))
    }
}
