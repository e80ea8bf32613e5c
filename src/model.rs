//! Core data structures for the reconciliation workflow
//!
//! Keys are sentinel-prefixed source phrases (`"__Save"` for the phrase `"Save"`),
//! translations are grouped per locale, and the indices below track what the
//! backend already knows about.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Marker prepended to a source phrase to form its key
pub const KEY_SENTINEL: &str = "__";

/// Opaque locale tag such as `"zh-TW"`. Compared as an exact string.
pub type LocaleCode = String;

/// Canonical identifier of one translatable string in the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationKey(String);

impl TranslationKey {
    /// Wrap an identifier as-is (it may or may not carry the sentinel)
    pub fn new(identifier: impl Into<String>) -> Self {
        Self(identifier.into())
    }

    /// Build the key for a raw source phrase
    ///
    /// ```ignore
    /// assert_eq!(TranslationKey::from_phrase("greeting").as_str(), "__greeting");
    /// ```
    pub fn from_phrase(phrase: &str) -> Self {
        Self(format!("{}{}", KEY_SENTINEL, phrase))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Text shown to translators: the key without its sentinel prefix
    pub fn display_text(&self) -> &str {
        self.0.strip_prefix(KEY_SENTINEL).unwrap_or(&self.0)
    }

    pub fn is_generated(&self) -> bool {
        self.0.starts_with(KEY_SENTINEL)
    }
}

impl fmt::Display for TranslationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for TranslationKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TranslationKey {
    fn from(identifier: &str) -> Self {
        Self::new(identifier)
    }
}

/// One piece of translated text for one key in one locale
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationEntry {
    pub locale: LocaleCode,
    pub key: TranslationKey,
    pub text: String,
}

/// Locale → (key → text), built up by merging AI responses
///
/// Keyed by locale and then by key, e.g.
///   set["en-US"]["__greeting"] = "Hello"
///   set["fr-FR"]["__greeting"] = "Bonjour"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationSet(BTreeMap<LocaleCode, BTreeMap<TranslationKey, String>>);

impl TranslationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, locale: &str, key: TranslationKey, text: impl Into<String>) {
        self.0
            .entry(locale.to_string())
            .or_default()
            .insert(key, text.into());
    }

    /// Merge `other` into this set. Values from `other` win for the same locale and key.
    pub fn merge(&mut self, other: TranslationSet) {
        for (locale, values) in other.0 {
            let target = self.0.entry(locale).or_default();
            for (key, text) in values {
                target.insert(key, text);
            }
        }
    }

    pub fn get(&self, locale: &str, key: &str) -> Option<&str> {
        self.0
            .get(locale)
            .and_then(|values| values.get(key))
            .map(String::as_str)
    }

    /// All keys and texts of one locale
    pub fn locale(&self, locale: &str) -> Option<&BTreeMap<TranslationKey, String>> {
        self.0.get(locale)
    }

    pub fn locales(&self) -> impl Iterator<Item = &LocaleCode> {
        self.0.keys()
    }

    pub fn locale_count(&self) -> usize {
        self.0.len()
    }

    /// Sum of key counts across all locales
    pub fn entry_count(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = TranslationEntry> + '_ {
        self.0.iter().flat_map(|(locale, values)| {
            values.iter().map(move |(key, text)| TranslationEntry {
                locale: locale.clone(),
                key: key.clone(),
                text: text.clone(),
            })
        })
    }
}

/// Keys registered by an earlier synchronization, read from the reference
/// locale's downloaded bundle. The stored value is the bundle text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingKeyIndex(HashMap<TranslationKey, String>);

impl ExistingKeyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from a flat `{key: text}` bundle. Non-string values are ignored.
    pub fn from_bundle(bundle: &serde_json::Map<String, serde_json::Value>) -> Self {
        let entries = bundle
            .iter()
            .filter_map(|(key, value)| {
                value
                    .as_str()
                    .map(|text| (TranslationKey::new(key.as_str()), text.to_string()))
            })
            .collect();
        Self(entries)
    }

    pub fn with_key(mut self, key: &str, text: &str) -> Self {
        self.0.insert(TranslationKey::new(key), text.to_string());
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Identifier the backend assigns to a newly created key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendKeyId(pub u64);

impl fmt::Display for BackendKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Keys created during the current run and their backend ids
///
/// Entries are never replaced or removed once recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddedKeysIndex(HashMap<TranslationKey, BackendKeyId>);

impl AddedKeysIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a created key. Returns false (and keeps the first id) if the key was already recorded.
    pub fn record(&mut self, key: TranslationKey, id: BackendKeyId) -> bool {
        use std::collections::hash_map::Entry;
        match self.0.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(id);
                true
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<BackendKeyId> {
        self.0.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Locale → backend language id, fetched once per session
pub type LanguageIdIndex = HashMap<LocaleCode, String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_phrase_adds_sentinel() {
        let key = TranslationKey::from_phrase("直接能源排放");
        assert_eq!(key.as_str(), "__直接能源排放");
        assert_eq!(key.display_text(), "直接能源排放");
        assert!(key.is_generated());
    }

    #[test]
    fn test_display_text_without_sentinel() {
        let key = TranslationKey::new("plain.key");
        assert_eq!(key.display_text(), "plain.key");
        assert!(!key.is_generated());
    }

    #[test]
    fn test_merge_last_write_wins() {
        let mut first = TranslationSet::new();
        first.insert("fr-FR", "__greeting".into(), "Salut");
        first.insert("fr-FR", "__bye".into(), "Au revoir");
        first.insert("en-US", "__greeting".into(), "Hi");

        let mut second = TranslationSet::new();
        second.insert("fr-FR", "__greeting".into(), "Bonjour");
        second.insert("ja-JP", "__greeting".into(), "こんにちは");

        first.merge(second);

        assert_eq!(first.get("fr-FR", "__greeting"), Some("Bonjour"));
        assert_eq!(first.get("fr-FR", "__bye"), Some("Au revoir"));
        assert_eq!(first.get("en-US", "__greeting"), Some("Hi"));
        assert_eq!(first.get("ja-JP", "__greeting"), Some("こんにちは"));
        assert_eq!(first.locale_count(), 3);
        assert_eq!(first.entry_count(), 4);
    }

    #[test]
    fn test_entries_cover_every_locale_and_key() {
        let mut set = TranslationSet::new();
        set.insert("en-US", "__a".into(), "A");
        set.insert("en-US", "__b".into(), "B");
        set.insert("zh-TW", "__a".into(), "甲");

        let entries: Vec<_> = set.entries().collect();
        assert_eq!(entries.len(), 3);
        assert!(entries.contains(&TranslationEntry {
            locale: "zh-TW".to_string(),
            key: "__a".into(),
            text: "甲".to_string(),
        }));
    }

    #[test]
    fn test_translation_set_deserializes_from_locale_map() {
        let set: TranslationSet =
            serde_json::from_str(r#"{"en-US":{"__greeting":"Hello"}}"#).unwrap();
        assert_eq!(set.get("en-US", "__greeting"), Some("Hello"));
    }

    #[test]
    fn test_existing_index_skips_non_string_values() {
        let bundle: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(r#"{"__a":"A","__nested":{"x":"y"},"__n":3}"#).unwrap();
        let index = ExistingKeyIndex::from_bundle(&bundle);
        assert!(index.contains("__a"));
        assert!(!index.contains("__nested"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_added_keys_never_replaced() {
        let mut added = AddedKeysIndex::new();
        assert!(added.record("__a".into(), BackendKeyId(7)));
        assert!(!added.record("__a".into(), BackendKeyId(9)));
        assert_eq!(added.get("__a"), Some(BackendKeyId(7)));
        assert_eq!(added.len(), 1);
    }
}
