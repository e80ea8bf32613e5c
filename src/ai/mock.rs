//! Mock text generator for testing
//!
//! Deterministic, API-free stand-in for the AI service. It records every
//! prompt it receives so tests can check what was sent.
//!
//! # Example
//!
//! ```ignore
//! use hermes_sync::ai::{MockGenerator, MockReply, TextGenerator};
//!
//! #[tokio::test]
//! async fn test_generation() {
//!     let mock = MockGenerator::new(MockReply::Fixed("{}".to_string()));
//!     assert_eq!(mock.generate("hi").await.unwrap(), "{}");
//! }
//! ```

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::ai::generator::TextGenerator;
use crate::error::{SyncError, SyncResult};

/// Reply behaviours for the mock
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Always reply with this text
    Fixed(String),

    /// Reply with the prompt itself
    Echo,

    /// Fail as a transport error would
    Error(String),
}

#[derive(Debug, Clone)]
pub struct MockGenerator {
    reply: MockReply,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockGenerator {
    pub fn new(reply: MockReply) -> Self {
        Self {
            reply,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> SyncResult<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        match &self.reply {
            MockReply::Fixed(text) => Ok(text.clone()),
            MockReply::Echo => Ok(prompt.to_string()),
            MockReply::Error(msg) => Err(SyncError::Network(msg.clone())),
        }
    }

    fn provider_name(&self) -> &str {
        "Mock Generator"
    }
}
