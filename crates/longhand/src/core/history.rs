//! Operation history
//!
//! A bounded, most-recent-first list of successful calculations, persisted as
//! a JSON array under one key of a [`KeyValueStore`] after every change.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::HistoryConfig;
use crate::render::{extract_result_text, RenderedMark};
use crate::store::{KeyValueStore, StoreError};

/// A single recorded calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Canonical input text; replaying it redraws the calculation
    pub input: String,
    /// Result text; older entries may only carry the rendered marks
    #[serde(default)]
    pub result: Option<String>,
    /// The settled drawing
    #[serde(default)]
    pub rendered: Vec<RenderedMark>,
}

impl HistoryEntry {
    /// Creates an entry with a known result
    #[must_use]
    pub fn new(input: impl Into<String>, result: impl Into<String>, rendered: Vec<RenderedMark>) -> Self {
        Self {
            input: input.into(),
            result: Some(result.into()),
            rendered,
        }
    }

    /// Result text, read off the drawing when it was not stored
    #[must_use]
    pub fn result_text(&self) -> String {
        self.result
            .clone()
            .unwrap_or_else(|| extract_result_text(&self.rendered))
    }

    /// Returns a formatted display string
    #[must_use]
    pub fn display(&self) -> String {
        format!("{} = {}", self.input, self.result_text())
    }
}

/// What [`HistoryStore::add`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// New entry at the front
    Inserted,
    /// The input is already recorded at `index`; nothing changed
    Duplicate {
        /// Position of the existing entry, 0 = most recent
        index: usize,
    },
}

/// History operations the session relies on
pub trait HistoryStore {
    /// Records an entry unless its input is already present
    ///
    /// A missing result is read off the rendered drawing before storing.
    ///
    /// On a persistence error the in-memory list has still been updated.
    fn add(&mut self, entry: HistoryEntry) -> Result<AddOutcome, StoreError>;

    /// All entries, most recent first
    fn get_all(&self) -> Vec<HistoryEntry>;

    /// Removes every entry
    fn clear_all(&mut self) -> Result<(), StoreError>;
}

/// Bounded history backed by a key-value store
#[derive(Debug, Clone)]
pub struct History<K> {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    key: String,
    store: K,
}

impl<K: KeyValueStore> History<K> {
    /// Starts an empty history without reading the store
    #[must_use]
    pub fn empty(store: K, config: &HistoryConfig) -> Self {
        Self {
            entries: VecDeque::with_capacity(config.capacity),
            capacity: config.capacity,
            key: config.storage_key.clone(),
            store,
        }
    }

    /// Reads the persisted list
    pub fn load(store: K, config: &HistoryConfig) -> Result<Self, StoreError> {
        let mut history = Self::empty(store, config);
        if let Some(json) = history.store.get(&history.key)? {
            let entries = Self::parse(&json)
                .map_err(|e| StoreError::corrupt(history.key.clone(), e.to_string()))?;
            history.entries = entries.into_iter().take(history.capacity).collect();
        }
        tracing::debug!(key = %history.key, entries = history.len(), "history loaded");
        Ok(history)
    }

    /// Like [`Self::load`], but a corrupt or unreadable store starts empty
    #[must_use]
    pub fn open(store: K, config: &HistoryConfig) -> Self {
        let mut history = Self::empty(store, config);
        match history.store.get(&history.key) {
            Ok(Some(json)) => match Self::parse(&json) {
                Ok(entries) => {
                    history.entries = entries.into_iter().take(history.capacity).collect();
                }
                Err(e) => {
                    tracing::warn!(key = %history.key, error = %e, "stored history is corrupt, starting empty");
                }
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(key = %history.key, error = %e, "history unavailable, starting empty"),
        }
        history
    }

    fn parse(json: &str) -> Result<Vec<HistoryEntry>, serde_json::Error> {
        let mut entries: Vec<HistoryEntry> = serde_json::from_str(json)?;
        for entry in &mut entries {
            if entry.result.is_none() {
                entry.result = Some(extract_result_text(&entry.rendered));
            }
        }
        Ok(entries)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries kept
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entry at `index`, 0 = most recent
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    /// Position of an input, if recorded
    #[must_use]
    pub fn position(&self, input: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.input == input)
    }

    /// Entries, most recent first
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Backing store
    #[must_use]
    pub fn store(&self) -> &K {
        &self.store
    }

    /// Serializes the list, most recent first
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.entries)
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let json = self.to_json()?;
        self.store.set(&self.key, &json)
    }
}

impl<K: KeyValueStore> HistoryStore for History<K> {
    fn add(&mut self, mut entry: HistoryEntry) -> Result<AddOutcome, StoreError> {
        if let Some(index) = self.position(&entry.input) {
            return Ok(AddOutcome::Duplicate { index });
        }
        if entry.result.is_none() {
            entry.result = Some(extract_result_text(&entry.rendered));
        }
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
        self.persist()?;
        Ok(AddOutcome::Inserted)
    }

    fn get_all(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    fn clear_all(&mut self) -> Result<(), StoreError> {
        self.entries.clear();
        self.persist()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::{FileStore, MemoryStore};

    fn config() -> HistoryConfig {
        HistoryConfig::default()
    }

    fn entry(input: &str, result: &str) -> HistoryEntry {
        HistoryEntry::new(input, result, Vec::new())
    }

    // ===== HistoryEntry tests =====

    #[test]
    fn test_entry_display() {
        assert_eq!(entry("12+34", "46").display(), "12+34 = 46");
    }

    #[test]
    fn test_entry_without_result_reads_drawing() {
        let e = HistoryEntry {
            input: "1+1".into(),
            result: None,
            rendered: vec![RenderedMark::error("boom", 1.0, 1.0)],
        };
        assert_eq!(e.result_text(), "boom");
    }

    // ===== History tests =====

    #[test]
    fn test_most_recent_first() {
        let mut history = History::empty(MemoryStore::new(), &config());
        history.add(entry("1+1", "2")).unwrap();
        history.add(entry("2+2", "4")).unwrap();
        let all = history.get_all();
        assert_eq!(all[0].input, "2+2");
        assert_eq!(all[1].input, "1+1");
    }

    #[test]
    fn test_duplicate_not_inserted() {
        let mut history = History::empty(MemoryStore::new(), &config());
        history.add(entry("1+1", "2")).unwrap();
        history.add(entry("2+2", "4")).unwrap();
        let outcome = history.add(entry("1+1", "2")).unwrap();
        assert_eq!(outcome, AddOutcome::Duplicate { index: 1 });
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = History::empty(MemoryStore::new(), &config());
        for i in 0..12 {
            history.add(entry(&format!("{i}+1"), &(i + 1).to_string())).unwrap();
        }
        assert_eq!(history.len(), 10);
        assert_eq!(history.get(0).unwrap().input, "11+1");
        assert_eq!(history.get(9).unwrap().input, "2+1");
        assert_eq!(history.position("0+1"), None);
    }

    #[test]
    fn test_every_mutation_persists() {
        let mut history = History::empty(MemoryStore::new(), &config());
        history.add(entry("1+1", "2")).unwrap();
        let stored = history.store().get("calculatorHistory").unwrap().unwrap();
        let parsed: Vec<HistoryEntry> = serde_json::from_str(&stored).unwrap();
        assert_eq!(parsed.len(), 1);

        history.clear_all().unwrap();
        assert!(history.is_empty());
        assert_eq!(history.store().get("calculatorHistory").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_add_derives_missing_result() {
        let mut history = History::empty(MemoryStore::new(), &config());
        history
            .add(HistoryEntry {
                input: "1/0".into(),
                result: None,
                rendered: vec![RenderedMark::error("boom", 1.0, 1.0)],
            })
            .unwrap();
        assert_eq!(history.get(0).unwrap().result.as_deref(), Some("boom"));

        let stored = history.store().get("calculatorHistory").unwrap().unwrap();
        let parsed: Vec<HistoryEntry> = serde_json::from_str(&stored).unwrap();
        assert_eq!(parsed[0].result.as_deref(), Some("boom"));
    }

    #[test]
    fn test_load_corrupt_fails() {
        let store = MemoryStore::new().with_value("calculatorHistory", "{not json");
        let err = History::load(store, &config()).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_open_corrupt_starts_empty() {
        let store = MemoryStore::new().with_value("calculatorHistory", "42");
        let history = History::open(store, &config());
        assert!(history.is_empty());
    }

    #[test]
    fn test_load_fills_missing_results() {
        let json = r#"[{"input":"5/0","rendered":[]}]"#;
        let store = MemoryStore::new().with_value("calculatorHistory", json);
        let history = History::load(store, &config()).unwrap();
        assert_eq!(
            history.get(0).unwrap().result.as_deref(),
            Some(crate::render::RESULT_PLACEHOLDER)
        );
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = History::empty(FileStore::open(dir.path()).unwrap(), &config());
        history.add(entry("12x34", "408")).unwrap();
        history.add(entry("945/5", "189")).unwrap();

        let reloaded = History::load(FileStore::open(dir.path()).unwrap(), &config()).unwrap();
        assert_eq!(reloaded.get_all(), history.get_all());
    }

    #[test]
    fn test_custom_key_and_capacity() {
        let config = HistoryConfig {
            capacity: 2,
            storage_key: "other".into(),
        };
        let mut history = History::empty(MemoryStore::new(), &config);
        for input in ["1+1", "1+2", "1+3"] {
            history.add(entry(input, "x")).unwrap();
        }
        assert_eq!(history.capacity(), 2);
        assert_eq!(history.len(), 2);
        assert!(history.store().get("other").unwrap().is_some());
    }
}
