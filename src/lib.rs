//! Keep localization bundles in sync with a Crowdin project
//!
//! The upload run drafts translations for pending phrases with a generative
//! model, creates the keys the backend does not know yet and attaches the
//! drafted texts to them. The download run fetches a fresh translation build
//! and exports it as JS bundles.
//!
//! ```ignore
//! use std::sync::Arc;
//! use hermes_sync::{ConfigFile, TracingSink, UploadOptions, run_upload};
//!
//! let mut file = ConfigFile::load(&ConfigFile::default_path())?;
//! let config = file.current_profile().to_sync_config();
//! let summary = run_upload(&config, UploadOptions::default(), Arc::new(TracingSink)).await?;
//! println!("{} keys added", summary.keys_added);
//! ```

pub mod ai;
pub mod backend;
pub mod bundle;
pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod model;
pub mod parser;
pub mod sink;
pub mod workflow;


pub use ai::{GeminiProvider, MockGenerator, MockReply, TextGenerator, TranslationRequester};
pub use backend::{CreateKeyOutcome, CrowdinClient, MockBackend, TranslationBackend};
pub use config::{ConfigFile, Profile, SyncConfig};
pub use engine::{ReconciliationEngine, RunPolicy, SyncSummary};
pub use error::{SyncError, SyncResult};
pub use loader::SyncInputs;
pub use model::{
    AddedKeysIndex, BackendKeyId, ExistingKeyIndex, KEY_SENTINEL, LanguageIdIndex, LocaleCode,
    TranslationEntry, TranslationKey, TranslationSet,
};
pub use parser::parse_translation_response;
pub use sink::{ChannelSink, MemorySink, ProgressSink, Stage, SyncEvent, TracingSink};
pub use workflow::{DownloadSummary, UploadOptions, run_download, run_upload};
