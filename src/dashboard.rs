//! Dashboard aggregation
//!
//! Read-only views derived from the curriculum and the current progress.
//! Nothing here is cached; every call recomputes from source state.

use std::collections::HashMap;

use crate::curriculum::{Axiom, Curriculum, Level};
use crate::progress::{InsightEntry, Progress};
use crate::unlock::is_level_complete;

/// Per-level state on the level map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelState {
    Done,
    InProgress,
    Untouched,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelProgress {
    pub id: u32,
    pub code: String,
    pub name: String,
    pub studied: usize,
    pub total: usize,
    pub state: LevelState,
}

/// An axiom that has a note or insights
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry<'a> {
    pub axiom: &'a Axiom,
    pub note: Option<&'a str>,
    pub insights: Vec<&'a InsightEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JournalOrder {
    #[default]
    Chronological,
    Reverse,
}

/// Studied axioms as a percentage of the whole curriculum, rounded
pub fn overall_percent(curriculum: &Curriculum, progress: &Progress) -> u32 {
    let total = curriculum.total_axioms();
    if total == 0 {
        return 0;
    }
    let studied = studied_count(curriculum, progress);
    ((studied as f64 / total as f64) * 100.0).round() as u32
}

/// Studied axioms that exist in the curriculum
pub fn studied_count(curriculum: &Curriculum, progress: &Progress) -> usize {
    curriculum
        .axioms()
        .filter(|a| progress.is_studied(&a.id))
        .count()
}

pub fn level_progress(curriculum: &Curriculum, progress: &Progress) -> Vec<LevelProgress> {
    curriculum
        .levels()
        .iter()
        .map(|level| {
            let studied = level
                .axioms
                .iter()
                .filter(|a| progress.is_studied(&a.id))
                .count();
            let total = level.axioms.len();
            let state = if studied == total {
                LevelState::Done
            } else if studied > 0 {
                LevelState::InProgress
            } else {
                LevelState::Untouched
            };
            LevelProgress {
                id: level.id,
                code: level.code.clone(),
                name: level.name.clone(),
                studied,
                total,
                state,
            }
        })
        .collect()
}

pub fn completed_levels<'a>(curriculum: &'a Curriculum, progress: &Progress) -> Vec<&'a Level> {
    curriculum
        .levels()
        .iter()
        .filter(|level| is_level_complete(level, progress))
        .collect()
}

/// Axioms with a non-empty note or at least one insight.
///
/// Chronological order follows each axiom's first insight in the log;
/// axioms that only have a note come after, in curriculum order.
pub fn journal<'a>(
    curriculum: &'a Curriculum,
    progress: &'a Progress,
    order: JournalOrder,
) -> Vec<JournalEntry<'a>> {
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    for (i, insight) in progress.insights.iter().enumerate() {
        first_seen.entry(insight.id.as_str()).or_insert(i);
    }

    let mut entries: Vec<(Option<usize>, usize, JournalEntry<'a>)> = curriculum
        .axioms()
        .enumerate()
        .filter_map(|(position, axiom)| {
            let note = progress.note(&axiom.id).filter(|n| !n.is_empty());
            let insights: Vec<&InsightEntry> = progress.insights_for(&axiom.id).collect();
            if note.is_none() && insights.is_empty() {
                return None;
            }
            let first = first_seen.get(axiom.id.as_str()).copied();
            Some((first, position, JournalEntry { axiom, note, insights }))
        })
        .collect();

    // None sorts before Some, so key note-only entries past every insight index
    entries.sort_by_key(|(first, position, _)| (first.unwrap_or(usize::MAX), *position));

    let mut ordered: Vec<JournalEntry<'a>> = entries.into_iter().map(|(_, _, e)| e).collect();
    if order == JournalOrder::Reverse {
        ordered.reverse();
    }
    ordered
}

/// The insight log, newest first
pub fn recent_insights(progress: &Progress) -> impl Iterator<Item = &InsightEntry> {
    progress.insights.iter().rev()
}

/// Everything the dashboard view shows
#[derive(Debug, Clone)]
pub struct DashboardSummary<'a> {
    pub percent: u32,
    pub studied: usize,
    pub total: usize,
    pub completed_levels: usize,
    pub levels: Vec<LevelProgress>,
    pub journal: Vec<JournalEntry<'a>>,
    pub recent_insights: Vec<&'a InsightEntry>,
}

impl<'a> DashboardSummary<'a> {
    pub fn compute(curriculum: &'a Curriculum, progress: &'a Progress, order: JournalOrder) -> Self {
        Self {
            percent: overall_percent(curriculum, progress),
            studied: studied_count(curriculum, progress),
            total: curriculum.total_axioms(),
            completed_levels: completed_levels(curriculum, progress).len(),
            levels: level_progress(curriculum, progress),
            journal: journal(curriculum, progress, order),
            recent_insights: recent_insights(progress).collect(),
        }
    }
}
