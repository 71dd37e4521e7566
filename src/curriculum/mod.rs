//! Curriculum store
//!
//! The ordered list of levels and their axioms. The built-in curriculum is
//! embedded at build time; a custom one can be loaded from a TOML file with
//! the same shape. Read-only at runtime.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

const BUILTIN_CURRICULUM: &str = include_str!("builtin.toml");

/// A single curriculum item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axiom {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Extended explanation shown in the item detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Practice suggestion shown in the item detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub practice: Option<String>,
}

/// An ordered group of axioms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub id: u32,
    pub code: String,
    pub name: String,
    pub subtitle: String,
    #[serde(default)]
    pub axioms: Vec<Axiom>,
}

impl Level {
    /// Position of an axiom within this level
    pub fn position_of(&self, axiom_id: &str) -> Option<usize> {
        self.axioms.iter().position(|a| a.id == axiom_id)
    }
}

#[derive(Debug, Error)]
pub enum CurriculumError {
    #[error("failed to parse curriculum: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read curriculum file: {0}")]
    Io(#[from] std::io::Error),
    #[error("curriculum has no levels")]
    Empty,
    #[error("axiom id '{0}' appears more than once")]
    DuplicateAxiom(String),
    #[error("level {0} appears out of order")]
    LevelOrder(u32),
}

#[derive(Debug, Deserialize)]
struct CurriculumFile {
    levels: Vec<Level>,
}

/// Location of an axiom inside the curriculum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxiomLocation {
    pub level_index: usize,
    pub axiom_index: usize,
}

/// The full, validated curriculum
#[derive(Debug, Clone)]
pub struct Curriculum {
    levels: Vec<Level>,
}

impl Curriculum {
    /// The curriculum that ships with the application
    pub fn builtin() -> Result<Self, CurriculumError> {
        Self::from_toml(BUILTIN_CURRICULUM)
    }

    /// Load a curriculum from a TOML file
    pub fn from_path(path: &Path) -> Result<Self, CurriculumError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, CurriculumError> {
        let file: CurriculumFile = toml::from_str(contents)?;
        Self::new(file.levels)
    }

    /// Build a curriculum, checking id uniqueness and level order
    pub fn new(levels: Vec<Level>) -> Result<Self, CurriculumError> {
        if levels.is_empty() {
            return Err(CurriculumError::Empty);
        }

        let mut seen = HashSet::new();
        let mut previous_level: Option<u32> = None;
        for level in &levels {
            if previous_level.is_some_and(|prev| level.id <= prev) {
                return Err(CurriculumError::LevelOrder(level.id));
            }
            previous_level = Some(level.id);

            for axiom in &level.axioms {
                if !seen.insert(axiom.id.as_str()) {
                    return Err(CurriculumError::DuplicateAxiom(axiom.id.clone()));
                }
            }
        }

        Ok(Self { levels })
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    /// Index of the level with the given ordinal id
    pub fn level_index_by_id(&self, id: u32) -> Option<usize> {
        self.levels.iter().position(|l| l.id == id)
    }

    /// Total number of axioms across all levels
    pub fn total_axioms(&self) -> usize {
        self.levels.iter().map(|l| l.axioms.len()).sum()
    }

    pub fn axioms(&self) -> impl Iterator<Item = &Axiom> {
        self.levels.iter().flat_map(|l| l.axioms.iter())
    }

    pub fn contains(&self, axiom_id: &str) -> bool {
        self.locate(axiom_id).is_some()
    }

    pub fn locate(&self, axiom_id: &str) -> Option<AxiomLocation> {
        self.levels.iter().enumerate().find_map(|(level_index, level)| {
            level.position_of(axiom_id).map(|axiom_index| AxiomLocation {
                level_index,
                axiom_index,
            })
        })
    }

    pub fn axiom(&self, axiom_id: &str) -> Option<&Axiom> {
        self.axioms().find(|a| a.id == axiom_id)
    }

    /// Resolve user input (id in any case) to an axiom
    pub fn find(&self, query: &str) -> Option<&Axiom> {
        let query = query.trim();
        self.axioms().find(|a| a.id.eq_ignore_ascii_case(query))
    }
}
