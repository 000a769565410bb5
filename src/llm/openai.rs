use std::time::Duration;

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::Config;
use crate::llm::media::download_media;
use crate::utils::http::get_http_client;
use crate::utils::timing::log_llm_timing;

const IMAGE_REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    data: Option<Vec<ImageDatum>>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    url: Option<String>,
    b64_json: Option<String>,
}

/// Thin client for the OpenAI REST API. One instance is constructed at
/// startup when an API key is configured; each method performs a single
/// attempt and leaves retry decisions to the caller.
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    chat_model: String,
    image_model: String,
    image_size: String,
    image_quality: String,
}

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

fn summarize_error_body(body: &str) -> (Option<String>, String) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return (None, "empty response body".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let message = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .or_else(|| {
                value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(|v| v.to_string())
            });
        return (message, truncate_for_log(&value.to_string(), 2000));
    }

    (None, truncate_for_log(trimmed, 2000))
}

fn summarize_chat_payload(payload: &Value) -> Value {
    let messages = payload
        .get("messages")
        .and_then(|value| value.as_array())
        .map(|messages| {
            messages
                .iter()
                .map(|message| {
                    let role = message
                        .get("role")
                        .and_then(|value| value.as_str())
                        .unwrap_or("user");
                    let content = match message.get("content") {
                        Some(Value::String(text)) => json!(truncate_for_log(text, 200)),
                        Some(Value::Array(parts)) => json!(format!("{} part(s)", parts.len())),
                        _ => json!(null),
                    };
                    json!({ "role": role, "content": content })
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    json!({
        "model": payload.get("model"),
        "messages": messages,
        "response_format": payload.pointer("/response_format/type"),
    })
}

impl OpenAiClient {
    pub fn new(config: &Config) -> Self {
        OpenAiClient {
            api_key: config.openai_api_key.trim().to_string(),
            base_url: config.openai_base_url.clone(),
            chat_model: config.openai_chat_model.clone(),
            image_model: config.openai_image_model.clone(),
            image_size: config.openai_image_size.clone(),
            image_quality: config.openai_image_quality.clone(),
        }
    }

    fn redact_api_key(&self, text: &str) -> String {
        if self.api_key.is_empty() {
            return text.to_string();
        }
        text.replace(&self.api_key, "[redacted]")
    }

    async fn post_json(
        &self,
        path: &str,
        payload: &Value,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        let client = get_http_client();
        let url = format!("{}{}", self.base_url, path);

        let mut request = client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(payload);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                let err_text = self.redact_api_key(&err.to_string());
                return Err(anyhow!(
                    "OpenAI request to {path} failed: {err_text} (timeout={}, connect={})",
                    err.is_timeout(),
                    err.is_connect()
                ));
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let (message, body_summary) = summarize_error_body(&body);
            if tracing::enabled!(tracing::Level::DEBUG) {
                debug!(
                    target: "llm.openai",
                    status = %status,
                    body = %truncate_for_log(&body, 4000)
                );
            }
            let detail = message.unwrap_or(body_summary);
            return Err(anyhow!(
                "OpenAI request to {path} failed with status {status}: {}",
                self.redact_api_key(&detail)
            ));
        }

        Ok(response.json::<Value>().await?)
    }

    async fn chat_completion(&self, payload: Value) -> Result<String> {
        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(
                target: "llm.openai",
                model = %self.chat_model,
                payload = %summarize_chat_payload(&payload)
            );
        }

        let value = self.post_json("/chat/completions", &payload, None).await?;
        let response: ChatResponse = serde_json::from_value(value)?;
        let content = response
            .choices
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(anyhow!("OpenAI completion returned no content"));
        }
        Ok(content)
    }

    async fn request_image(&self, prompt: &str) -> Result<Vec<u8>> {
        let payload = json!({
            "model": self.image_model,
            "prompt": prompt,
            "n": 1,
            "size": self.image_size,
            "quality": self.image_quality,
        });

        let value = self
            .post_json("/images/generations", &payload, Some(IMAGE_REQUEST_TIMEOUT))
            .await?;
        let response: ImagesResponse = serde_json::from_value(value)?;
        let datum = response
            .data
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| {
                anyhow!("No images returned by OpenAI (model: {})", self.image_model)
            })?;

        if let Some(encoded) = datum.b64_json {
            return Ok(general_purpose::STANDARD.decode(encoded)?);
        }

        let url = datum
            .url
            .ok_or_else(|| anyhow!("OpenAI image response carried neither url nor b64_json"))?;
        download_media(&url)
            .await
            .ok_or_else(|| anyhow!("Failed to download generated image"))
    }
}

#[async_trait::async_trait]
impl super::ModelClient for OpenAiClient {
    async fn complete_json(&self, system_prompt: &str, user_content: &str) -> Result<String> {
        let payload = json!({
            "model": self.chat_model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_content },
            ],
            "response_format": { "type": "json_object" },
        });

        log_llm_timing("openai", &self.chat_model, "complete_json", None, || async {
            self.chat_completion(payload).await
        })
        .await
    }

    async fn describe_image(&self, system_prompt: &str, photo_data_url: &str) -> Result<String> {
        let payload = json!({
            "model": self.chat_model,
            "messages": [
                { "role": "system", "content": system_prompt },
                {
                    "role": "user",
                    "content": [
                        { "type": "image_url", "image_url": { "url": photo_data_url } },
                    ],
                },
            ],
        });

        log_llm_timing("openai", &self.chat_model, "describe_image", None, || async {
            self.chat_completion(payload).await
        })
        .await
    }

    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>> {
        let metadata = json!({ "prompt": truncate_for_log(prompt, 200) });
        log_llm_timing(
            "openai",
            &self.image_model,
            "generate_image",
            Some(metadata),
            || async { self.request_image(prompt).await },
        )
        .await
    }
}
