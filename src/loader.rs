//! Inputs of an upload run read from disk
//!
//! The manifest, the prompt template and the reference-locale bundle are all
//! optional. A missing file degrades to an empty manifest, the built-in prompt
//! or an empty key index, so a fresh checkout can still run.

use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::ai::DEFAULT_PROMPT;
use crate::config::SyncConfig;
use crate::model::ExistingKeyIndex;

/// Everything a reconciliation run reads from disk, loaded once up front
#[derive(Debug, Clone, Default)]
pub struct SyncInputs {
    /// Pending source phrases in file order
    pub manifest: Vec<String>,
    /// Keys present in the reference locale's last downloaded bundle
    pub existing: ExistingKeyIndex,
    /// Instruction template for the AI request
    pub prompt: String,
}

impl SyncInputs {
    /// Load manifest, prompt and reference bundle from the configured paths
    ///
    /// Missing files are not errors: no manifest means nothing to translate,
    /// no bundle means every key is new, no prompt file means the built-in one.
    pub fn load(config: &SyncConfig) -> Self {
        Self {
            manifest: load_manifest(&config.key_path),
            existing: load_existing_keys(&config.reference_bundle_path()),
            prompt: load_prompt(&config.prompts_path),
        }
    }
}

/// Read a text file, treating "not found" as absent and logging other failures
fn read_optional(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("{} not found", path.display());
            None
        }
        Err(e) => {
            tracing::warn!("Failed to read '{}': {}", path.display(), e);
            None
        }
    }
}

/// Load pending phrases, one per line
///
/// Lines are trimmed and blank lines dropped.
pub fn load_manifest(path: &Path) -> Vec<String> {
    read_optional(path)
        .map(|content| parse_manifest(&content))
        .unwrap_or_default()
}

pub fn parse_manifest(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Load a custom prompt template, or the built-in one
pub fn load_prompt(path: &Path) -> String {
    match read_optional(path) {
        Some(content) if !content.trim().is_empty() => content,
        _ => DEFAULT_PROMPT.to_string(),
    }
}

/// Load keys from a flat `{key: text}` bundle
///
/// The JSON file should have the following structure:
/// ```json
/// {
///     "__Save": "儲存",
///     "__Cancel": "取消"
/// }
/// ```
/// An unreadable or malformed bundle yields an empty index.
pub fn load_existing_keys(path: &Path) -> ExistingKeyIndex {
    let Some(content) = read_optional(path) else {
        return ExistingKeyIndex::new();
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(bundle)) => ExistingKeyIndex::from_bundle(&bundle),
        Ok(_) => {
            tracing::warn!("Invalid bundle '{}': root must be an object", path.display());
            ExistingKeyIndex::new()
        }
        Err(e) => {
            tracing::warn!("Failed to parse JSON from '{}': {}", path.display(), e);
            ExistingKeyIndex::new()
        }
    }
}
