//! Axiom Path - self-study companion for the Axioms of Being
//!
//! - A fixed curriculum of levels and axioms with linear unlock gating
//! - Progress (studied flags, notes, insight journal) persisted as one JSON blob
//! - Dashboard aggregation over the curriculum and progress
//! - A mentor chat backed by Gemini, grounded in the whole curriculum
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use axiom_path::{Curriculum, ProgressStore};
//!
//! let curriculum = Arc::new(Curriculum::builtin()?);
//! let mut store = ProgressStore::in_memory(curriculum);
//! store.toggle_studied("A1")?;
//! assert!(!axiom_path::unlock::is_axiom_locked(&store.curriculum().levels()[0], store.progress(), 1));
//! ```

pub mod types;
pub mod curriculum;
pub mod progress;
pub mod unlock;
pub mod dashboard;
pub mod assistant;
pub mod config;
pub mod view;
pub mod chat;
pub mod cli;

pub use assistant::{AssistantError, AssistantSession, GeminiClient};
pub use config::Config;
pub use curriculum::{Axiom, Curriculum, Level};
pub use progress::{Progress, ProgressStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
