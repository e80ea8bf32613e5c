//! Translation backend abstraction
//!
//! The reconciliation engine talks to the backend only through the
//! `TranslationBackend` trait: locale enumeration, key creation, key lookup
//! and translation attachment. `CrowdinClient` is the HTTP implementation
//! and additionally drives the build export used by the download workflow.

pub mod crowdin;
pub mod mock;

use async_trait::async_trait;

use crate::error::SyncResult;
use crate::model::{BackendKeyId, LanguageIdIndex, TranslationKey};

pub use crowdin::{BuildProgress, CrowdinClient, DEFAULT_API_BASE};
pub use mock::{BackendCall, MockBackend};

/// Result of asking the backend to register a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateKeyOutcome {
    Created(BackendKeyId),
    /// The backend reported an identifier conflict (HTTP 409)
    AlreadyExists,
}

#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// All locales configured in the project, mapped to backend language ids
    async fn list_languages(&self) -> SyncResult<LanguageIdIndex>;

    /// Register `key` with `display_text` as its source text in file `file_id`
    async fn create_key(
        &self,
        key: &TranslationKey,
        display_text: &str,
        file_id: u64,
    ) -> SyncResult<CreateKeyOutcome>;

    /// Best-effort lookup of `key` through an identifier filter search
    async fn key_exists(&self, key: &TranslationKey) -> SyncResult<bool>;

    /// Attach `text` as the translation of key `key_id` in language `language_id`
    async fn attach_translation(
        &self,
        key_id: BackendKeyId,
        language_id: &str,
        text: &str,
    ) -> SyncResult<()>;

    /// Name of the backend, used in log lines
    fn backend_name(&self) -> &str;
}
