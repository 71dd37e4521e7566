//! Progress state
//!
//! The mutable record of studied axioms, notes and insights. `Progress` is
//! the plain value that gets serialized as one blob; `store::ProgressStore`
//! wraps it with the mutation API and the persistence effect.

pub mod store;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub use store::{
    FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, Persister, ProgressObserver,
    ProgressStore, DEFAULT_PROGRESS_KEY,
};

/// A timestamped free-text entry attached to an axiom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightEntry {
    /// Axiom the insight belongs to
    pub id: String,
    /// Localized display date
    pub date: String,
    pub text: String,
}

/// Everything the learner has recorded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    #[serde(default)]
    pub studied_axiom_ids: Vec<String>,
    #[serde(default)]
    pub notes: BTreeMap<String, String>,
    #[serde(default)]
    pub insights: Vec<InsightEntry>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProgressError {
    #[error("unknown axiom '{0}'")]
    UnknownAxiom(String),
}

impl Progress {
    pub fn is_studied(&self, axiom_id: &str) -> bool {
        self.studied_axiom_ids.iter().any(|id| id == axiom_id)
    }

    /// Flip membership of `axiom_id` in the studied set, returning the new state
    pub fn toggle_studied(&mut self, axiom_id: &str) -> bool {
        if self.is_studied(axiom_id) {
            self.studied_axiom_ids.retain(|id| id != axiom_id);
            false
        } else {
            self.studied_axiom_ids.push(axiom_id.to_string());
            true
        }
    }

    /// Replace the note for an axiom. Empty text is kept as an empty note.
    pub fn set_note(&mut self, axiom_id: &str, text: &str) {
        self.notes.insert(axiom_id.to_string(), text.to_string());
    }

    pub fn note(&self, axiom_id: &str) -> Option<&str> {
        self.notes.get(axiom_id).map(String::as_str)
    }

    /// Append an insight unless the text is blank. Returns whether one was added.
    pub fn push_insight(&mut self, axiom_id: &str, text: &str, date: String) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.insights.push(InsightEntry {
            id: axiom_id.to_string(),
            date,
            text: text.to_string(),
        });
        true
    }

    pub fn insights_for<'a>(&'a self, axiom_id: &'a str) -> impl Iterator<Item = &'a InsightEntry> + 'a {
        self.insights.iter().filter(move |i| i.id == axiom_id)
    }
}
