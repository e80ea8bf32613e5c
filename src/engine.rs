//! Upload reconciliation engine
//!
//! Runs the four upload stages in a fixed order:
//!
//! 1. **Translate** - ask the AI provider for drafts of the manifest phrases
//!    and merge them into the translation set (last write wins)
//! 2. **AddKeys** - create every reference-locale key the backend does not
//!    have yet; keys found in the local reference bundle are never created
//! 3. **AddTranslations** - attach each translated text to the keys created
//!    in step 2, one call at a time, tolerating individual failures
//! 4. **Summary** - report what was done
//!
//! Each stage can be switched off through `RunPolicy` but the order is fixed.
//! All backend calls are awaited one after another. Nothing is rolled back:
//! keys and translations committed before a failure stay in the backend.

use std::collections::HashSet;
use std::sync::Arc;

use crate::ai::{TextGenerator, TranslationRequester};
use crate::backend::{CreateKeyOutcome, TranslationBackend};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::loader::SyncInputs;
use crate::model::{
    AddedKeysIndex, ExistingKeyIndex, LanguageIdIndex, TranslationKey, TranslationSet,
};
use crate::parser::parse_translation_response;
use crate::sink::{ProgressSink, Stage};

/// Which stages run, and how a failed translation stage is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPolicy {
    pub translate: bool,
    pub add_keys: bool,
    pub add_translations: bool,
    /// Go on with key creation when the translate stage fails
    pub continue_on_translate_error: bool,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            translate: true,
            add_keys: true,
            add_translations: true,
            continue_on_translate_error: false,
        }
    }
}

/// Counts of completed work
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Locales present in the translation set
    pub languages_translated: usize,
    pub keys_added: usize,
    /// Keys not created because they already exist
    pub keys_skipped: usize,
    pub attach_succeeded: usize,
    pub attach_failed: usize,
    /// Set when the translate stage failed and the run continued anyway
    pub translation_error: Option<String>,
}

/// Drives one upload run against a backend
///
/// Holds the inputs, the translation set and the indexes built while the
/// stages run. An engine runs once; build a new one for the next run.
pub struct ReconciliationEngine {
    backend: Arc<dyn TranslationBackend>,
    generator: Option<Arc<dyn TextGenerator>>,
    sink: Arc<dyn ProgressSink>,
    policy: RunPolicy,
    requester: TranslationRequester,
    reference_locale: String,
    file_id: u64,
    manifest: Vec<String>,
    existing: ExistingKeyIndex,
    translations: TranslationSet,
    languages: LanguageIdIndex,
    added: AddedKeysIndex,
    summary: SyncSummary,
    ran: bool,
}

impl ReconciliationEngine {
    /// Create an engine with every stage enabled and no AI provider
    ///
    /// # Arguments
    ///
    /// * `config` - Supplies the reference locale and the backend file id
    /// * `inputs` - Manifest, prompt template and locally known keys
    /// * `backend` - Where keys are created and translations attached
    /// * `sink` - Receives progress and log messages
    ///
    /// # Returns
    ///
    /// An engine that has not run yet. Add a provider with `with_generator`.
    pub fn new(
        config: &SyncConfig,
        inputs: SyncInputs,
        backend: Arc<dyn TranslationBackend>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            backend,
            generator: None,
            sink,
            policy: RunPolicy::default(),
            requester: TranslationRequester::new(inputs.prompt),
            reference_locale: config.reference_locale.clone(),
            file_id: config.file_id,
            manifest: inputs.manifest,
            existing: inputs.existing,
            translations: TranslationSet::new(),
            languages: LanguageIdIndex::new(),
            added: AddedKeysIndex::new(),
            summary: SyncSummary::default(),
            ran: false,
        }
    }

    /// Provider for the translate stage. Without one the stage is a no-op.
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_policy(mut self, policy: RunPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Merge translations obtained elsewhere. Later merges win per locale and key.
    pub fn merge_translations(&mut self, set: TranslationSet) {
        self.translations.merge(set);
        self.summary.languages_translated = self.translations.locale_count();
    }

    pub fn translations(&self) -> &TranslationSet {
        &self.translations
    }

    pub fn added_keys(&self) -> &AddedKeysIndex {
        &self.added
    }

    pub fn languages(&self) -> &LanguageIdIndex {
        &self.languages
    }

    /// Work completed so far. Accurate after a failed run as well.
    pub fn summary(&self) -> SyncSummary {
        self.summary.clone()
    }

    /// Execute the enabled stages once
    ///
    /// Fatal errors are reported to the sink before they are returned.
    ///
    /// # Returns
    ///
    /// * `Ok(SyncSummary)` - Counts of the completed work
    /// * `Err(SyncError::AlreadyRan)` - If this engine has run before
    /// * `Err(SyncError)` - A failed translate stage (unless the policy says
    ///   to continue) or a key creation the backend rejected. `summary()`
    ///   still reports what was committed before the failure.
    pub async fn run(&mut self) -> SyncResult<SyncSummary> {
        if self.ran {
            return Err(SyncError::AlreadyRan);
        }
        self.ran = true;

        self.load_languages().await;

        if self.policy.translate {
            if let Err(e) = self.translate().await {
                self.sink.report(&format!("Error: {}", e));
                if !self.policy.continue_on_translate_error {
                    return Err(e);
                }
                self.summary.translation_error = Some(e.to_string());
            }
        }

        if self.policy.add_keys {
            if let Err(e) = self.add_keys().await {
                self.sink.report(&format!("Error: {}", e));
                return Err(e);
            }
        }

        if self.policy.add_translations {
            self.add_translations().await;
        }

        self.sink.report(&format!(
            "Complete: {} languages translated, {} keys added, {} translations attached, {} failed",
            self.summary.languages_translated,
            self.summary.keys_added,
            self.summary.attach_succeeded,
            self.summary.attach_failed
        ));
        Ok(self.summary())
    }

    /// `run` on a private current-thread runtime, for callers that are not async
    ///
    /// Must not be called from inside a tokio runtime.
    pub fn run_blocking(&mut self) -> SyncResult<SyncSummary> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SyncError::Runtime)?;
        runtime.block_on(self.run())
    }

    /// Fetch the backend language ids. A failure leaves the index empty,
    /// which means no translation can be attached in this run.
    async fn load_languages(&mut self) {
        match self.backend.list_languages().await {
            Ok(languages) => {
                tracing::debug!(count = languages.len(), "languages loaded");
                self.languages = languages;
            }
            Err(e) => {
                self.sink
                    .report(&format!("Warning: Could not get languages: {}", e));
            }
        }
    }

    pub(crate) async fn translate(&mut self) -> SyncResult<()> {
        let Some(generator) = self.generator.clone() else {
            self.sink
                .report("No AI provider configured, skipping translation");
            return Ok(());
        };
        if self.manifest.is_empty() {
            self.sink.report("No keys to translate");
            return Ok(());
        }

        self.sink.report(&format!(
            "Translating {} phrases with {}...",
            self.manifest.len(),
            generator.provider_name()
        ));
        self.sink.report_progress(Stage::Translate, 0, 2);

        let raw = self
            .requester
            .request(generator.as_ref(), &self.manifest)
            .await?;
        self.sink.report_progress(Stage::Translate, 1, 2);

        let parsed = parse_translation_response(&raw)?;
        self.merge_translations(parsed);
        self.sink.report_progress(Stage::Translate, 2, 2);
        self.sink.report(&format!(
            "Merged AI translations for {} languages",
            self.translations.locale_count()
        ));
        Ok(())
    }

    /// Reference-locale keys in manifest order, then any others in set order
    fn ordered_reference_keys(&self) -> Vec<TranslationKey> {
        let Some(reference) = self.translations.locale(&self.reference_locale) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut ordered = Vec::with_capacity(reference.len());
        for phrase in &self.manifest {
            let key = TranslationKey::from_phrase(TranslationKey::new(phrase.as_str()).display_text());
            if reference.contains_key(key.as_str()) && seen.insert(key.clone()) {
                ordered.push(key);
            }
        }
        for key in reference.keys() {
            if seen.insert(key.clone()) {
                ordered.push(key.clone());
            }
        }
        ordered
    }

    pub(crate) async fn add_keys(&mut self) -> SyncResult<()> {
        let keys = self.ordered_reference_keys();
        let total = keys.len();
        if total == 0 {
            self.sink.report(&format!(
                "No {} keys to add",
                self.reference_locale
            ));
            return Ok(());
        }

        for (idx, key) in keys.iter().enumerate() {
            self.sink.report_progress(Stage::AddKeys, idx + 1, total);

            if self.existing.contains(key.as_str()) {
                // The lookup is informational: a key in the local bundle is
                // never created again, whatever the backend answers.
                match self.backend.key_exists(key).await {
                    Ok(true) => self.sink.report(&format!("Key '{}' already exists", key)),
                    Ok(false) => self.sink.report(&format!(
                        "Key '{}' is in the local bundle but was not found remotely, skipping",
                        key
                    )),
                    Err(e) => self.sink.report(&format!(
                        "Key '{}' lookup failed ({}), skipping",
                        key, e
                    )),
                }
                self.summary.keys_skipped += 1;
                continue;
            }

            match self
                .backend
                .create_key(key, key.display_text(), self.file_id)
                .await?
            {
                CreateKeyOutcome::Created(id) => {
                    if self.added.record(key.clone(), id) {
                        self.summary.keys_added = self.added.len();
                        self.sink.report(&format!("Added key: {}", key));
                    }
                }
                CreateKeyOutcome::AlreadyExists => {
                    self.summary.keys_skipped += 1;
                    self.sink
                        .report(&format!("Key '{}' already exists in the backend", key));
                }
            }
        }
        Ok(())
    }

    pub(crate) async fn add_translations(&mut self) {
        if self.added.is_empty() {
            self.sink.report("No new keys to translate");
            return;
        }

        // Upper bound used for progress only; the filters below skip entries.
        let total = self.translations.entry_count() * self.added.len();
        let mut current = 0;

        let entries: Vec<_> = self.translations.entries().collect();
        for entry in entries {
            let Some(language_id) = self.languages.get(&entry.locale) else {
                continue;
            };
            let Some(key_id) = self.added.get(entry.key.as_str()) else {
                continue;
            };

            current += 1;
            self.sink
                .report_progress(Stage::AddTranslations, current, total);

            match self
                .backend
                .attach_translation(key_id, language_id, &entry.text)
                .await
            {
                Ok(()) => {
                    self.summary.attach_succeeded += 1;
                    self.sink.report(&format!(
                        "Added {} translation for {}",
                        entry.locale, entry.key
                    ));
                }
                Err(e) => {
                    self.summary.attach_failed += 1;
                    tracing::warn!(locale = %entry.locale, key = %entry.key, "attach failed: {}", e);
                    self.sink
                        .report(&format!("Warning: Failed to add translation: {}", e));
                }
            }
        }
    }
}
