//! Parser for AI translation replies
//!
//! The model is asked for a bare JSON document of the form
//! `{"<locale>": {"__<phrase>": "<text>", ...}, ...}` but does not reliably
//! comply: replies may be wrapped in a fenced code block and surrounded by
//! prose. The parser takes the first fenced block when there is one and the
//! whole trimmed reply otherwise. Anything that is not a locale map of string
//! values is an error that carries the raw reply.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{SyncError, SyncResult};
use crate::model::TranslationSet;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[^\n`]*\n(.*?)```").expect("fenced block pattern is valid")
});

/// The part of `raw` that should hold the JSON document
pub fn extract_payload(raw: &str) -> &str {
    match FENCED_BLOCK.captures(raw).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => raw.trim(),
    }
}

/// Parse an AI reply into a `TranslationSet`
///
/// No validation of locale codes or key format happens here.
pub fn parse_translation_response(raw: &str) -> SyncResult<TranslationSet> {
    let payload = extract_payload(raw);
    if payload.is_empty() {
        return Err(SyncError::Translation {
            message: "AI response is empty".to_string(),
            raw: Some(raw.to_string()),
        });
    }

    serde_json::from_str::<TranslationSet>(payload).map_err(|e| SyncError::Translation {
        message: format!("Failed to parse AI response as locale map: {}", e),
        raw: Some(raw.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{"en-US":{"__greeting":"Hello"},"fr-FR":{"__greeting":"Bonjour"}}"#;

    #[test]
    fn test_parse_bare_document() {
        let set = parse_translation_response(DOCUMENT).unwrap();
        assert_eq!(set.get("en-US", "__greeting"), Some("Hello"));
        assert_eq!(set.get("fr-FR", "__greeting"), Some("Bonjour"));
        assert_eq!(set.locale_count(), 2);
    }

    #[test]
    fn test_fenced_and_bare_give_same_result() {
        let fenced = format!("```json\n{}\n```", DOCUMENT);
        assert_eq!(
            parse_translation_response(&fenced).unwrap(),
            parse_translation_response(DOCUMENT).unwrap()
        );
    }

    #[test]
    fn test_fence_without_language_tag() {
        let fenced = format!("```\n{}\n```", DOCUMENT);
        let set = parse_translation_response(&fenced).unwrap();
        assert_eq!(set.get("fr-FR", "__greeting"), Some("Bonjour"));
    }

    #[test]
    fn test_fence_surrounded_by_prose() {
        let reply = format!(
            "Sure! Here are the translations:\n\n```json\n{}\n```\n\nLet me know if you need more.",
            DOCUMENT
        );
        let set = parse_translation_response(&reply).unwrap();
        assert_eq!(set.entry_count(), 2);
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let reply = format!("\n\n   {}  \n", DOCUMENT);
        assert!(parse_translation_response(&reply).is_ok());
    }

    #[test]
    fn test_multiline_document_in_fence() {
        let reply = "```json\n{\n  \"zh-TW\": {\n    \"__直接能源排放\": \"直接能源排放\"\n  },\n  \"en-US\": {\n    \"__直接能源排放\": \"Direct energy emissions\"\n  }\n}\n```";
        let set = parse_translation_response(reply).unwrap();
        assert_eq!(
            set.get("en-US", "__直接能源排放"),
            Some("Direct energy emissions")
        );
    }

    #[test]
    fn test_malformed_reply_is_an_error_with_raw_text() {
        let reply = "I could not translate these words.";
        let err = parse_translation_response(reply).unwrap_err();
        assert!(err.is_translation());
        assert_eq!(err.raw_response(), Some(reply));
    }

    #[test]
    fn test_malformed_fenced_content_is_an_error() {
        let reply = "```json\n{\"en-US\": {\"__a\": \"A\",}\n```";
        let err = parse_translation_response(reply).unwrap_err();
        assert_eq!(err.raw_response(), Some(reply));
    }

    #[test]
    fn test_wrong_shape_is_an_error() {
        assert!(parse_translation_response(r#"["en-US", "fr-FR"]"#).is_err());
        assert!(parse_translation_response(r#"{"en-US": "Hello"}"#).is_err());
        assert!(parse_translation_response(r#"{"en-US": {"__a": 1}}"#).is_err());
    }

    #[test]
    fn test_empty_reply_is_an_error() {
        let err = parse_translation_response("  \n ").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_no_key_format_validation() {
        let set = parse_translation_response(r#"{"xx":{"no-sentinel":"text"}}"#).unwrap();
        assert_eq!(set.get("xx", "no-sentinel"), Some("text"));
    }
}
