//! Progress store - the explicit state container
//!
//! Holds the in-memory `Progress`, exposes the mutation API and notifies
//! registered observers after every mutation. Persistence is one such
//! observer (`Persister`), writing the whole blob under a fixed key of a
//! `KeyValueStore`.

use anyhow::{bail, Context, Result};
use chrono::format::{Item, StrftimeItems};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::{Progress, ProgressError};
use crate::curriculum::Curriculum;

/// Storage key the progress blob lives under
pub const DEFAULT_PROGRESS_KEY: &str = "genesis_progress";

/// Default insight date stamp (day.month.year)
pub const DEFAULT_DATE_FORMAT: &str = "%d.%m.%Y";

/// Flat key-value storage for serialized blobs
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value under `key` in a single write
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// One file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Store under the application data directory
    pub fn default_store() -> Result<Self> {
        Self::new(crate::config::data_dir()?)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            bail!("Invalid storage key '{}'", key);
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(contents))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}

/// In-memory store; clones share the same entries
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::default();
        if let Ok(mut entries) = store.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        store
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reacts to every progress mutation
pub trait ProgressObserver: Send {
    fn on_change(&mut self, progress: &Progress) -> Result<()>;
}

/// Writes the full progress blob after each change
pub struct Persister<S: KeyValueStore> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> Persister<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Read the blob once. Absence or a parse failure yields an empty record.
    pub fn load(&self) -> Progress {
        match self.store.get(&self.key) {
            Ok(Some(blob)) => match serde_json::from_str::<Progress>(&blob) {
                Ok(progress) => progress,
                Err(e) => {
                    warn!("Stored progress under '{}' is unreadable, starting fresh: {}", self.key, e);
                    Progress::default()
                }
            },
            Ok(None) => {
                debug!("No stored progress under '{}'", self.key);
                Progress::default()
            }
            Err(e) => {
                warn!("Failed to read stored progress: {:#}", e);
                Progress::default()
            }
        }
    }
}

impl<S: KeyValueStore> ProgressObserver for Persister<S> {
    fn on_change(&mut self, progress: &Progress) -> Result<()> {
        let blob = serde_json::to_string(progress).context("Failed to serialize progress")?;
        self.store.set(&self.key, &blob)?;
        debug!("Persisted progress ({} bytes) under '{}'", blob.len(), self.key);
        Ok(())
    }
}

/// State container for the learner's progress
pub struct ProgressStore {
    curriculum: Arc<Curriculum>,
    progress: Progress,
    observers: Vec<Box<dyn ProgressObserver>>,
    date_format: String,
}

impl ProgressStore {
    /// Start from an empty record with no observers
    pub fn in_memory(curriculum: Arc<Curriculum>) -> Self {
        Self::with_progress(curriculum, Progress::default())
    }

    pub fn with_progress(curriculum: Arc<Curriculum>, progress: Progress) -> Self {
        Self {
            curriculum,
            progress,
            observers: Vec::new(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    /// Rehydrate from `store` and persist every later mutation back into it
    pub fn open<S: KeyValueStore + 'static>(
        curriculum: Arc<Curriculum>,
        store: S,
        key: &str,
    ) -> Self {
        let persister = Persister::new(store, key);
        let progress = persister.load();

        let unknown: Vec<&str> = progress
            .studied_axiom_ids
            .iter()
            .filter(|id| !curriculum.contains(id))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            warn!("Stored progress references unknown axioms: {}", unknown.join(", "));
        }

        info!(
            "Loaded progress: {} studied, {} notes, {} insights",
            progress.studied_axiom_ids.len(),
            progress.notes.len(),
            progress.insights.len()
        );

        let mut this = Self::with_progress(curriculum, progress);
        this.subscribe(Box::new(persister));
        this
    }

    /// Register an observer that runs after every mutation
    pub fn subscribe(&mut self, observer: Box<dyn ProgressObserver>) {
        self.observers.push(observer);
    }

    /// Set the strftime pattern for insight dates; invalid or blank patterns are ignored
    pub fn set_date_format(&mut self, format: &str) {
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            warn!("Ignoring invalid date format '{}'", format);
            return;
        }
        if chrono::Local::now().format(format).to_string().trim().is_empty() {
            warn!("Ignoring date format '{}': it renders an empty date", format);
            return;
        }
        self.date_format = format.to_string();
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    pub fn curriculum_arc(&self) -> Arc<Curriculum> {
        Arc::clone(&self.curriculum)
    }

    /// Flip the studied flag; returns the new state
    pub fn toggle_studied(&mut self, axiom_id: &str) -> Result<bool> {
        self.ensure_known(axiom_id)?;
        let studied = self.progress.toggle_studied(axiom_id);
        debug!("Axiom {} studied={}", axiom_id, studied);
        self.notify()?;
        Ok(studied)
    }

    /// Replace the note for an axiom
    pub fn update_note(&mut self, axiom_id: &str, text: &str) -> Result<()> {
        self.ensure_known(axiom_id)?;
        self.progress.set_note(axiom_id, text);
        self.notify()
    }

    /// Append an insight stamped with today's date. Blank text is a no-op.
    pub fn add_insight(&mut self, axiom_id: &str, text: &str) -> Result<bool> {
        let date = chrono::Local::now().format(&self.date_format).to_string();
        self.add_insight_dated(axiom_id, text, date)
    }

    /// Append an insight with an explicit date stamp
    pub fn add_insight_dated(&mut self, axiom_id: &str, text: &str, date: String) -> Result<bool> {
        self.ensure_known(axiom_id)?;
        if !self.progress.push_insight(axiom_id, text, date) {
            return Ok(false);
        }
        self.notify()?;
        Ok(true)
    }

    fn ensure_known(&self, axiom_id: &str) -> Result<(), ProgressError> {
        if self.curriculum.contains(axiom_id) {
            Ok(())
        } else {
            Err(ProgressError::UnknownAxiom(axiom_id.to_string()))
        }
    }

    fn notify(&mut self) -> Result<()> {
        for observer in &mut self.observers {
            observer.on_change(&self.progress)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curriculum() -> Arc<Curriculum> {
        Arc::new(Curriculum::builtin().unwrap())
    }

    struct Counter(Arc<Mutex<usize>>);

    impl ProgressObserver for Counter {
        fn on_change(&mut self, _progress: &Progress) -> Result<()> {
            *self.0.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[test]
    fn test_every_mutation_persists() {
        let kv = MemoryKeyValueStore::new();
        let mut store = ProgressStore::open(curriculum(), kv.clone(), DEFAULT_PROGRESS_KEY);
        assert!(kv.is_empty());

        store.toggle_studied("A1").unwrap();
        let blob = kv.get(DEFAULT_PROGRESS_KEY).unwrap().unwrap();
        assert!(blob.contains("\"studiedAxiomIds\":[\"A1\"]"));

        store.update_note("A1", "a note").unwrap();
        let blob = kv.get(DEFAULT_PROGRESS_KEY).unwrap().unwrap();
        assert!(blob.contains("a note"));
    }

    #[test]
    fn test_blank_insight_does_not_notify() {
        let count = Arc::new(Mutex::new(0));
        let mut store = ProgressStore::in_memory(curriculum());
        store.subscribe(Box::new(Counter(Arc::clone(&count))));

        assert!(!store.add_insight("A1", "").unwrap());
        assert!(!store.add_insight("A1", "   ").unwrap());
        assert_eq!(*count.lock().unwrap(), 0);
        assert!(store.progress().insights.is_empty());

        assert!(store.add_insight("A1", "hello").unwrap());
        assert_eq!(*count.lock().unwrap(), 1);
        let entry = &store.progress().insights[0];
        assert_eq!(entry.text, "hello");
        assert!(!entry.date.is_empty());
    }

    #[test]
    fn test_unknown_axiom_rejected() {
        let mut store = ProgressStore::in_memory(curriculum());
        let err = store.toggle_studied("Z9").unwrap_err();
        assert_eq!(
            err.downcast_ref::<ProgressError>(),
            Some(&ProgressError::UnknownAxiom("Z9".to_string()))
        );
        assert!(store.progress().studied_axiom_ids.is_empty());
    }

    #[test]
    fn test_corrupt_blob_starts_empty() {
        let kv = MemoryKeyValueStore::with_entry(DEFAULT_PROGRESS_KEY, "{not json");
        let store = ProgressStore::open(curriculum(), kv, DEFAULT_PROGRESS_KEY);
        assert_eq!(store.progress(), &Progress::default());
    }

    #[test]
    fn test_date_format_applied() {
        let mut store = ProgressStore::in_memory(curriculum());
        store.set_date_format("%Y");
        store.add_insight("A1", "year only").unwrap();
        assert_eq!(store.progress().insights[0].date.len(), 4);

        store.set_date_format("%Y %");
        store.add_insight("A1", "still year").unwrap();
        assert_eq!(store.progress().insights[1].date.len(), 4);
    }

    #[test]
    fn test_blank_date_format_keeps_previous() {
        let mut store = ProgressStore::in_memory(curriculum());
        store.set_date_format("");
        store.set_date_format("   ");
        assert!(store.add_insight("A1", "hello").unwrap());

        let insight = &store.progress().insights[0];
        assert_eq!(insight.text, "hello");
        assert_eq!(insight.date.len(), "01.02.2026".len());
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut kv = FileKeyValueStore::new(dir.path()).unwrap();
        assert_eq!(kv.get("progress").unwrap(), None);

        kv.set("progress", "{}").unwrap();
        assert_eq!(kv.get("progress").unwrap().as_deref(), Some("{}"));
        assert!(dir.path().join("progress.json").exists());
        assert!(!dir.path().join("progress.json.tmp").exists());

        assert!(kv.set("../escape", "{}").is_err());
    }
}
