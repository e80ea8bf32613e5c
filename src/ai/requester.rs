//! Builds the translation prompt and submits it to a `TextGenerator`

use crate::ai::generator::TextGenerator;
use crate::ai::prompt::DEFAULT_PROMPT;
use crate::error::{SyncError, SyncResult};
use crate::model::TranslationKey;

/// Composes `template + phrases` and asks the generator for translations
#[derive(Debug, Clone)]
pub struct TranslationRequester {
    template: String,
}

impl Default for TranslationRequester {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT)
    }
}

impl TranslationRequester {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// The full prompt for `phrases`, one phrase per line
    ///
    /// Phrases that already carry the key sentinel are sent without it.
    pub fn compose_prompt(&self, phrases: &[String]) -> String {
        let input = phrases
            .iter()
            .map(|phrase| TranslationKey::new(phrase.trim()).display_text().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        format!("{}{}", self.template, input)
    }

    /// Send the prompt and return the raw reply
    ///
    /// Every failure of the generator surfaces as a translation error.
    pub async fn request(
        &self,
        generator: &dyn TextGenerator,
        phrases: &[String],
    ) -> SyncResult<String> {
        let prompt = self.compose_prompt(phrases);
        tracing::debug!(
            provider = generator.provider_name(),
            phrases = phrases.len(),
            prompt_len = prompt.len(),
            "requesting translations"
        );

        generator.generate(&prompt).await.map_err(|e| match e {
            err @ SyncError::Translation { .. } => err,
            other => {
                SyncError::translation(format!("{} request failed: {}", generator.provider_name(), other))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::mock::{MockGenerator, MockReply};

    #[test]
    fn test_compose_prompt_joins_phrases_with_newlines() {
        let requester = TranslationRequester::new("Translate:\n");
        let prompt = requester.compose_prompt(&["Save".to_string(), "Cancel".to_string()]);
        assert_eq!(prompt, "Translate:\nSave\nCancel");
    }

    #[test]
    fn test_compose_prompt_strips_sentinel() {
        let requester = TranslationRequester::new("T: ");
        let prompt = requester.compose_prompt(&["__Save".to_string(), " Open ".to_string()]);
        assert_eq!(prompt, "T: Save\nOpen");
    }

    #[test]
    fn test_default_template() {
        let requester = TranslationRequester::default();
        assert!(requester.template().starts_with("You are a multilingual"));
    }

    #[tokio::test]
    async fn test_request_returns_raw_reply() {
        let generator = MockGenerator::new(MockReply::Fixed("{}".to_string()));
        let requester = TranslationRequester::new("P:");
        let reply = requester
            .request(&generator, &["greeting".to_string()])
            .await
            .unwrap();
        assert_eq!(reply, "{}");
        assert_eq!(generator.prompts(), vec!["P:greeting".to_string()]);
    }

    #[tokio::test]
    async fn test_request_wraps_failures_as_translation_errors() {
        let generator = MockGenerator::new(MockReply::Error("quota exceeded".to_string()));
        let requester = TranslationRequester::default();
        let err = requester
            .request(&generator, &["greeting".to_string()])
            .await
            .unwrap_err();
        assert!(err.is_translation());
        assert!(err.to_string().contains("quota exceeded"));
        assert!(err.to_string().starts_with("Translation failed: Mock Generator request failed"));
        assert_eq!(err.raw_response(), None);
    }
}
