use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::GeminiConfig;
use crate::error::ExtractError;

use super::{MediaPart, RecipeOracle};

/// Recipe oracle backed by the Gemini `generateContent` API.
///
/// Media is sent inline as base64 in the same request as the prompt, so a
/// single round trip covers both text-only and video/image extraction.
pub struct GeminiOracle {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiOracle {
    /// Build an oracle from config, falling back to the `GEMINI_API_KEY`
    /// environment variable for the key.
    pub fn new(config: &GeminiConfig) -> Result<Self, ExtractError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .ok_or_else(|| config::ConfigError::NotFound("gemini.api_key".into()))?;

        Ok(Self {
            client: Client::new(),
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Endpoint without the key query parameter, safe to log and to embed
    /// in errors.
    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn request_body(prompt: &str, media: Option<&MediaPart>) -> Value {
        let mut parts = Vec::new();
        if let Some(media) = media {
            parts.push(json!({
                "inline_data": {
                    "mime_type": media.mime_type,
                    "data": STANDARD.encode(&media.data),
                }
            }));
        }
        parts.push(json!({ "text": prompt }));

        json!({ "contents": [{ "parts": parts }] })
    }
}

#[async_trait]
impl RecipeOracle for GeminiOracle {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn extract(
        &self,
        prompt: &str,
        media: Option<&MediaPart>,
    ) -> Result<String, ExtractError> {
        let endpoint = self.endpoint();
        let url = format!("{}?key={}", endpoint, self.api_key);
        let body = Self::request_body(prompt, media);

        debug!(
            "calling {} (prompt {} chars, media: {})",
            endpoint,
            prompt.chars().count(),
            media.map_or("none".to_string(), |m| m.mime_type.clone()),
        );

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::HttpStatus {
                status: status.as_u16(),
                url: endpoint,
            });
        }

        let body: Value = response.json().await?;
        debug!("model response: {body}");

        let text = body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                ExtractError::InvalidModelOutput("model response had no text part".to_string())
            })?;

        Ok(text.to_string())
    }
}
