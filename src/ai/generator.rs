//! Text generation trait
//!
//! The AI service is treated as a black box: one prompt in, one text reply
//! out. Implementations handle the transport (Gemini over HTTP, a mock in
//! tests) without the rest of the crate knowing which one is in use.

use async_trait::async_trait;

use crate::error::SyncResult;

/// Generic trait for generative text providers
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Submit `prompt` and return the model's raw text reply
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The reply, unmodified apart from surrounding whitespace
    /// * `Err(SyncError)` - If the request fails or the reply has no text
    async fn generate(&self, prompt: &str) -> SyncResult<String>;

    /// Name of the provider, used in log lines
    fn provider_name(&self) -> &str;
}
