//! Gemini API provider for text generation
//!
//! Sends a single `generateContent` request per prompt and returns the text
//! parts of the first candidate.
//!
//! # Authentication
//!
//! The provider loads the API key from the `GEMINI_TOKEN` environment
//! variable or takes it explicitly through `GeminiProvider::new`.
//!
//! # Example
//!
//! ```ignore
//! use hermes_sync::ai::{GeminiProvider, TextGenerator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = GeminiProvider::from_env()?;
//!     let reply = provider.generate("Translate: Hello").await?;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde_json::json;

use crate::ai::generator::TextGenerator;
use crate::error::{SyncError, SyncResult};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini `generateContent` provider
#[derive(Clone)]
pub struct GeminiProvider {
    /// API key for authentication
    api_key: String,
    /// HTTP client for async requests
    client: reqwest::Client,
    /// Base URL of the Generative Language API
    base_url: String,
    model: String,
}

impl GeminiProvider {
    /// Create a provider with an explicit API key and model
    ///
    /// # Returns
    ///
    /// * `Ok(Self)` - New provider instance
    /// * `Err(SyncError)` - If the API key is empty or the HTTP client cannot be built
    pub fn new(api_key: String, model: impl Into<String>) -> SyncResult<Self> {
        if api_key.trim().is_empty() {
            return Err(SyncError::Config("Gemini API key cannot be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| SyncError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            client,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            model: model.into(),
        })
    }

    /// Create a provider from `GEMINI_TOKEN` (and `GEMINI_MODEL`, if set)
    pub fn from_env() -> SyncResult<Self> {
        let api_key = std::env::var("GEMINI_TOKEN").map_err(|_| {
            SyncError::Config("GEMINI_TOKEN environment variable not set".to_string())
        })?;
        let model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());

        Self::new(api_key, model)
    }

    /// Point the provider at another API root (proxies, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Concatenate the text parts of the first candidate
    fn extract_text(body: &serde_json::Value) -> Option<String> {
        let parts = body["candidates"][0]["content"]["parts"].as_array()?;
        let text: String = parts
            .iter()
            .filter_map(|part| part["text"].as_str())
            .collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    async fn generate(&self, prompt: &str) -> SyncResult<String> {
        let body = json!({
            "contents": [
                { "role": "user", "parts": [ { "text": prompt } ] }
            ]
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(SyncError::Translation {
                message: format!("Gemini API error ({})", status.as_u16()),
                raw: Some(text),
            });
        }

        let json: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            SyncError::Translation {
                message: format!("Failed to parse Gemini response: {}", e),
                raw: Some(text.clone()),
            }
        })?;

        Self::extract_text(&json)
            .map(|reply| reply.trim().to_string())
            .ok_or_else(|| SyncError::Translation {
                message: "Gemini response has no candidate text".to_string(),
                raw: Some(text),
            })
    }

    fn provider_name(&self) -> &str {
        "Gemini"
    }
}
