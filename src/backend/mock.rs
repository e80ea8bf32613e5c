//! Mock translation backend for testing
//!
//! Keeps a log of every call and lets tests script failures per key or per
//! language, so the reconciliation engine can be exercised without a network.
//!
//! # Example
//!
//! ```ignore
//! use hermes_sync::backend::MockBackend;
//!
//! let backend = MockBackend::new()
//!     .with_language("en-US", "en")
//!     .fail_create("__broken");
//! ```

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::backend::{CreateKeyOutcome, TranslationBackend};
use crate::error::{SyncError, SyncResult};
use crate::model::{BackendKeyId, LanguageIdIndex, TranslationKey};

/// One recorded backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    ListLanguages,
    CreateKey {
        key: String,
        display_text: String,
        file_id: u64,
    },
    KeyExists(String),
    AttachTranslation {
        key_id: BackendKeyId,
        language_id: String,
        text: String,
    },
}

/// Scriptable in-memory backend. Clones share the call log.
#[derive(Debug, Clone)]
pub struct MockBackend {
    languages: LanguageIdIndex,
    fail_languages: bool,
    remote_keys: HashSet<String>,
    conflicting_keys: HashSet<String>,
    failing_creates: HashSet<String>,
    failing_attach_languages: HashSet<String>,
    calls: Arc<Mutex<Vec<BackendCall>>>,
    next_id: Arc<AtomicU64>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Ids handed out by `create_key` start here and increase by one
    pub const FIRST_KEY_ID: u64 = 1000;

    pub fn new() -> Self {
        Self {
            languages: LanguageIdIndex::new(),
            fail_languages: false,
            remote_keys: HashSet::new(),
            conflicting_keys: HashSet::new(),
            failing_creates: HashSet::new(),
            failing_attach_languages: HashSet::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(Self::FIRST_KEY_ID)),
        }
    }

    pub fn with_language(mut self, locale: &str, language_id: &str) -> Self {
        self.languages
            .insert(locale.to_string(), language_id.to_string());
        self
    }

    /// Make `list_languages` fail
    pub fn fail_languages(mut self) -> Self {
        self.fail_languages = true;
        self
    }

    /// Key reported as present by `key_exists`
    pub fn with_remote_key(mut self, key: &str) -> Self {
        self.remote_keys.insert(key.to_string());
        self
    }

    /// `create_key` answers with an identifier conflict for this key
    pub fn conflict_on(mut self, key: &str) -> Self {
        self.conflicting_keys.insert(key.to_string());
        self
    }

    /// `create_key` fails for this key
    pub fn fail_create(mut self, key: &str) -> Self {
        self.failing_creates.insert(key.to_string());
        self
    }

    /// `attach_translation` fails for this backend language id
    pub fn fail_attach(mut self, language_id: &str) -> Self {
        self.failing_attach_languages
            .insert(language_id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn created_keys(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::CreateKey { key, .. } => Some(key),
                _ => None,
            })
            .collect()
    }

    /// (language id, text) of every attach call, in call order
    pub fn attached(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::AttachTranslation {
                    language_id, text, ..
                } => Some((language_id, text)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: BackendCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl TranslationBackend for MockBackend {
    async fn list_languages(&self) -> SyncResult<LanguageIdIndex> {
        self.record(BackendCall::ListLanguages);
        if self.fail_languages {
            return Err(SyncError::backend("Failed to get languages", 500, "mock failure"));
        }
        Ok(self.languages.clone())
    }

    async fn create_key(
        &self,
        key: &TranslationKey,
        display_text: &str,
        file_id: u64,
    ) -> SyncResult<CreateKeyOutcome> {
        self.record(BackendCall::CreateKey {
            key: key.to_string(),
            display_text: display_text.to_string(),
            file_id,
        });

        if self.failing_creates.contains(key.as_str()) {
            return Err(SyncError::backend(
                format!("Failed to add key '{}'", key),
                400,
                "mock failure",
            ));
        }
        if self.conflicting_keys.contains(key.as_str()) {
            return Ok(CreateKeyOutcome::AlreadyExists);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(CreateKeyOutcome::Created(BackendKeyId(id)))
    }

    async fn key_exists(&self, key: &TranslationKey) -> SyncResult<bool> {
        self.record(BackendCall::KeyExists(key.to_string()));
        Ok(self.remote_keys.contains(key.as_str()))
    }

    async fn attach_translation(
        &self,
        key_id: BackendKeyId,
        language_id: &str,
        text: &str,
    ) -> SyncResult<()> {
        self.record(BackendCall::AttachTranslation {
            key_id,
            language_id: language_id.to_string(),
            text: text.to_string(),
        });

        if self.failing_attach_languages.contains(language_id) {
            return Err(SyncError::backend(
                format!("Failed to add {} translation for string {}", language_id, key_id),
                400,
                "mock failure",
            ));
        }
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "Mock Backend"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_created_ids_are_sequential() {
        let backend = MockBackend::new();
        let first = backend.create_key(&"__a".into(), "a", 1).await.unwrap();
        let second = backend.create_key(&"__b".into(), "b", 1).await.unwrap();
        assert_eq!(first, CreateKeyOutcome::Created(BackendKeyId(1000)));
        assert_eq!(second, CreateKeyOutcome::Created(BackendKeyId(1001)));
        assert_eq!(backend.created_keys(), vec!["__a", "__b"]);
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let backend = MockBackend::new()
            .fail_create("__bad")
            .conflict_on("__dup")
            .fail_attach("fr");

        assert!(backend.create_key(&"__bad".into(), "bad", 1).await.is_err());
        assert_eq!(
            backend.create_key(&"__dup".into(), "dup", 1).await.unwrap(),
            CreateKeyOutcome::AlreadyExists
        );
        assert!(
            backend
                .attach_translation(BackendKeyId(1), "fr", "x")
                .await
                .is_err()
        );
        assert!(
            backend
                .attach_translation(BackendKeyId(1), "de", "x")
                .await
                .is_ok()
        );
        assert_eq!(backend.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_clones_share_call_log() {
        let backend = MockBackend::new().with_language("en-US", "en");
        let clone = backend.clone();
        let languages = clone.list_languages().await.unwrap();
        assert_eq!(languages.get("en-US").map(String::as_str), Some("en"));
        assert_eq!(backend.calls(), vec![BackendCall::ListLanguages]);
    }

    #[tokio::test]
    async fn test_key_exists_reports_remote_keys() {
        let backend = MockBackend::new().with_remote_key("__a");
        assert!(backend.key_exists(&"__a".into()).await.unwrap());
        assert!(!backend.key_exists(&"__b".into()).await.unwrap());
    }
}
