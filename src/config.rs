//! Configuration
//!
//! `SyncConfig` is the explicit value every workflow receives; nothing reads
//! process-wide state. `ConfigFile` persists named `Profile`s as JSON next to
//! the working directory and resolves them into a `SyncConfig`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ai::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use crate::backend::DEFAULT_API_BASE;
use crate::error::{SyncError, SyncResult};

pub const CONFIG_FILE_NAME: &str = "hermes.config.json";
pub const DEFAULT_PROFILE: &str = "default";
pub const DEFAULT_REFERENCE_LOCALE: &str = "zh-TW";
pub const DEFAULT_RESOURCE_FILE: &str = "CommonResource.json";
pub const DEFAULT_FILE_ID: u64 = 15;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Output folder → folder inside the downloaded bundle
pub const DEFAULT_EXPORT_MAPPING: [(&str, &str); 8] = [
    ("ar-sa", "ar"),
    ("en-us", "en"),
    ("ja-jp", "ja"),
    ("native", "zh-TW"),
    ("zh-cn", "zh-CN"),
    ("th-th", "th"),
    ("vi-vn", "vi"),
    ("id-ID", "id"),
];

/// Settings for one upload or download run
#[derive(Clone)]
pub struct SyncConfig {
    /// Crowdin API root, `https://api.crowdin.com/api/v2` by default
    pub api_base: String,
    pub project_id: String,
    pub crowdin_token: String,
    /// AI translation is skipped when unset
    pub gemini_token: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    /// Directory the downloaded bundle is extracted into
    pub data_path: PathBuf,
    /// Directory the exported JS bundles are written to
    pub result_path: PathBuf,
    /// Manifest of pending phrases, one per line
    pub key_path: PathBuf,
    /// Optional replacement for the built-in prompt
    pub prompts_path: PathBuf,
    /// Locale whose keys are created in the backend, and whose local
    /// bundle lists the keys that already exist
    pub reference_locale: String,
    /// File name of each locale bundle, e.g. `CommonResource.json`
    pub resource_file: String,
    /// Backend file new keys are created in
    pub file_id: u64,
    /// Delay between build status checks
    pub poll_interval: Duration,
    /// Where the downloaded build archive is written
    pub archive_path: PathBuf,
    /// `(output folder, bundle folder)` pairs used by the JS export
    pub export_mapping: Vec<(String, String)>,
}

impl SyncConfig {
    pub fn new(project_id: impl Into<String>, crowdin_token: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            project_id: project_id.into(),
            crowdin_token: crowdin_token.into(),
            gemini_token: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            data_path: PathBuf::from("translations"),
            result_path: PathBuf::from("i18n/default"),
            key_path: PathBuf::from("keys.txt"),
            prompts_path: PathBuf::from("prompts.txt"),
            reference_locale: DEFAULT_REFERENCE_LOCALE.to_string(),
            resource_file: DEFAULT_RESOURCE_FILE.to_string(),
            file_id: DEFAULT_FILE_ID,
            poll_interval: DEFAULT_POLL_INTERVAL,
            archive_path: PathBuf::from("translations.zip"),
            export_mapping: DEFAULT_EXPORT_MAPPING
                .iter()
                .map(|(out, src)| (out.to_string(), src.to_string()))
                .collect(),
        }
    }

    /// `<data>/<reference locale>/<resource file>`
    pub fn reference_bundle_path(&self) -> PathBuf {
        self.data_path
            .join(&self.reference_locale)
            .join(&self.resource_file)
    }

    /// Fail early on settings no backend call can succeed without
    pub fn validate(&self) -> SyncResult<()> {
        if self.crowdin_token.trim().is_empty() {
            return Err(SyncError::Config(
                "Crowdin API token not configured".to_string(),
            ));
        }
        if self.project_id.trim().is_empty() {
            return Err(SyncError::Config("Project ID not configured".to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("api_base", &self.api_base)
            .field("project_id", &self.project_id)
            .field("crowdin_token", &"***")
            .field("gemini_token", &self.gemini_token.as_ref().map(|_| "***"))
            .field("gemini_model", &self.gemini_model)
            .field("data_path", &self.data_path)
            .field("result_path", &self.result_path)
            .field("key_path", &self.key_path)
            .field("prompts_path", &self.prompts_path)
            .field("reference_locale", &self.reference_locale)
            .field("file_id", &self.file_id)
            .finish()
    }
}

/// Tokens are stored base64-encoded. This only keeps them from being read
/// at a glance; it is not encryption.
mod obfuscated {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn encode(token: &str) -> String {
        if token.is_empty() {
            String::new()
        } else {
            STANDARD.encode(token.as_bytes())
        }
    }

    /// Values that do not decode are taken as plain text
    pub(super) fn decode(stored: &str) -> String {
        if stored.is_empty() {
            return String::new();
        }
        STANDARD
            .decode(stored.as_bytes())
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_else(|| stored.to_string())
    }

    pub(super) fn serialize<S: Serializer>(token: &str, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(token))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let stored = String::deserialize(deserializer)?;
        Ok(decode(&stored))
    }
}

/// A named set of paths and credentials
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub project_id: String,
    pub data_path: String,
    pub result_path: String,
    pub key_path: String,
    pub prompts_path: String,
    #[serde(with = "obfuscated")]
    pub crowdin_token: String,
    #[serde(with = "obfuscated")]
    pub gemini_token: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self::new(DEFAULT_PROFILE)
    }
}

impl Profile {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            project_id: String::new(),
            data_path: "translations/".to_string(),
            result_path: "i18n/default/".to_string(),
            key_path: "keys.txt".to_string(),
            prompts_path: "prompts.txt".to_string(),
            crowdin_token: String::new(),
            gemini_token: String::new(),
        }
    }

    pub fn with_project_id(mut self, project_id: &str) -> Self {
        self.project_id = project_id.to_string();
        self
    }

    pub fn has_crowdin_token(&self) -> bool {
        !self.crowdin_token.is_empty()
    }

    pub fn has_gemini_token(&self) -> bool {
        !self.gemini_token.is_empty()
    }

    /// Resolve this profile into run settings
    pub fn to_sync_config(&self) -> SyncConfig {
        let mut config = SyncConfig::new(self.project_id.clone(), self.crowdin_token.clone());
        config.gemini_token = Some(self.gemini_token.clone()).filter(|t| !t.is_empty());
        config.data_path = PathBuf::from(&self.data_path);
        config.result_path = PathBuf::from(&self.result_path);
        config.key_path = PathBuf::from(&self.key_path);
        config.prompts_path = PathBuf::from(&self.prompts_path);
        config
    }
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("name", &self.name)
            .field("project_id", &self.project_id)
            .field("data_path", &self.data_path)
            .field("result_path", &self.result_path)
            .field("key_path", &self.key_path)
            .field("prompts_path", &self.prompts_path)
            .field("crowdin_token", &self.has_crowdin_token())
            .field("gemini_token", &self.has_gemini_token())
            .finish()
    }
}

/// Persisted profiles plus the active profile name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default = "default_profile_name")]
    pub active_profile: String,
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

fn default_profile_name() -> String {
    DEFAULT_PROFILE.to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        let mut config = Self {
            active_profile: default_profile_name(),
            profiles: BTreeMap::new(),
        };
        config.ensure_default();
        config
    }
}

impl ConfigFile {
    /// `hermes.config.json` in the current working directory
    pub fn default_path() -> PathBuf {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(CONFIG_FILE_NAME)
    }

    /// Load from `path`
    ///
    /// A missing file is created with the default profile. A file that cannot
    /// be parsed is replaced in memory by a fresh default (not written back).
    pub fn load(path: &Path) -> SyncResult<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|e| SyncError::io(path, e))?;
        match serde_json::from_str::<ConfigFile>(&content) {
            Ok(mut config) => {
                config.ensure_default();
                Ok(config)
            }
            Err(e) => {
                tracing::warn!("Config file {} is corrupt ({}), starting fresh", path.display(), e);
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, path: &Path) -> SyncResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| SyncError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| SyncError::io(path, e))
    }

    fn ensure_default(&mut self) {
        self.profiles
            .entry(DEFAULT_PROFILE.to_string())
            .or_insert_with(Profile::default);
        // Profiles written by hand may omit their name
        for (name, profile) in self.profiles.iter_mut() {
            if profile.name != *name {
                profile.name = name.clone();
            }
        }
    }

    /// The active profile, falling back to `default` if it no longer exists
    pub fn current_profile(&mut self) -> &Profile {
        self.current_profile_mut()
    }

    pub fn current_profile_mut(&mut self) -> &mut Profile {
        if !self.profiles.contains_key(&self.active_profile) {
            self.active_profile = default_profile_name();
        }
        self.ensure_default();
        self.profiles
            .entry(self.active_profile.clone())
            .or_insert_with(Profile::default)
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// Make `name` the active profile. Returns false if it does not exist.
    pub fn set_active(&mut self, name: &str) -> bool {
        if self.profiles.contains_key(name) {
            self.active_profile = name.to_string();
            true
        } else {
            false
        }
    }

    /// Add or replace a profile
    pub fn add_profile(&mut self, profile: Profile) {
        self.profiles.insert(profile.name.clone(), profile);
    }

    /// Delete a profile. The default profile cannot be deleted.
    pub fn delete_profile(&mut self, name: &str) -> bool {
        if name == DEFAULT_PROFILE {
            return false;
        }
        if self.profiles.remove(name).is_some() {
            if self.active_profile == name {
                self.active_profile = default_profile_name();
            }
            true
        } else {
            false
        }
    }
}
