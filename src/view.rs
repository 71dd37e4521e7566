//! Terminal rendering
//!
//! Every view renders to a `String` so the CLI decides where it goes.
//! Locked levels and axioms are refused here, not in the progress store.

use crossterm::style::Stylize;
use std::fmt::Write as _;
use thiserror::Error;

use crate::curriculum::{Axiom, Curriculum};
use crate::dashboard::{DashboardSummary, LevelState};
use crate::progress::Progress;
use crate::types::{Message, Role, SideContent};
use crate::unlock::{axiom_statuses, is_axiom_locked, is_level_locked, level_statuses};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("no level matches '{0}'")]
    UnknownLevel(String),
    #[error("no axiom matches '{0}'")]
    UnknownAxiom(String),
    #[error("level {code} ({name}) is locked: study every axiom of level {previous} first")]
    LevelLocked {
        code: String,
        name: String,
        previous: String,
    },
    #[error("axiom {id} is locked: study {previous} first")]
    AxiomLocked { id: String, previous: String },
}

/// Find a level by ordinal id (`3`) or code (`III`)
pub fn resolve_level(curriculum: &Curriculum, query: &str) -> Result<usize, ViewError> {
    let query = query.trim();
    let by_id = query
        .parse::<u32>()
        .ok()
        .and_then(|id| curriculum.level_index_by_id(id));
    by_id
        .or_else(|| {
            curriculum
                .levels()
                .iter()
                .position(|l| l.code.eq_ignore_ascii_case(query))
        })
        .ok_or_else(|| ViewError::UnknownLevel(query.to_string()))
}

/// Level index, refusing it when locked
pub fn open_level(curriculum: &Curriculum, progress: &Progress, query: &str) -> Result<usize, ViewError> {
    let index = resolve_level(curriculum, query)?;
    ensure_level_open(curriculum, progress, index)?;
    Ok(index)
}

fn ensure_level_open(curriculum: &Curriculum, progress: &Progress, index: usize) -> Result<(), ViewError> {
    if !is_level_locked(curriculum, progress, index) {
        return Ok(());
    }
    let levels = curriculum.levels();
    match (levels.get(index), index.checked_sub(1).and_then(|i| levels.get(i))) {
        (Some(level), Some(previous)) => Err(ViewError::LevelLocked {
            code: level.code.clone(),
            name: level.name.clone(),
            previous: previous.code.clone(),
        }),
        _ => Err(ViewError::UnknownLevel(index.to_string())),
    }
}

/// Axiom by id, refusing it when its level or its position is locked
pub fn open_axiom<'a>(
    curriculum: &'a Curriculum,
    progress: &Progress,
    query: &str,
) -> Result<&'a Axiom, ViewError> {
    let axiom = curriculum
        .find(query)
        .ok_or_else(|| ViewError::UnknownAxiom(query.trim().to_string()))?;
    let loc = curriculum
        .locate(&axiom.id)
        .ok_or_else(|| ViewError::UnknownAxiom(axiom.id.clone()))?;

    ensure_level_open(curriculum, progress, loc.level_index)?;

    let level = &curriculum.levels()[loc.level_index];
    if is_axiom_locked(level, progress, loc.axiom_index) {
        return Err(ViewError::AxiomLocked {
            id: axiom.id.clone(),
            previous: level.axioms[loc.axiom_index - 1].id.clone(),
        });
    }
    Ok(axiom)
}

/// Level list with lock markers
pub fn render_levels(curriculum: &Curriculum, progress: &Progress) -> String {
    let mut out = String::new();
    let locks = level_statuses(curriculum, progress);

    for (level, locked) in curriculum.levels().iter().zip(locks) {
        let studied = level.axioms.iter().filter(|a| progress.is_studied(&a.id)).count();
        let total = level.axioms.len();
        let marker = if locked {
            "locked".dark_grey().to_string()
        } else if studied == total {
            "done".green().to_string()
        } else {
            "open".cyan().to_string()
        };
        let _ = writeln!(
            out,
            "{:>4}  {:<14} {:>2}/{:<2}  [{}]",
            level.code,
            level.name,
            studied,
            total,
            marker
        );
        let _ = writeln!(out, "      {}", level.subtitle.as_str().italic());
    }
    out
}

/// One level's axioms with studied/locked markers
pub fn render_level(curriculum: &Curriculum, progress: &Progress, level_index: usize) -> String {
    let mut out = String::new();
    let Some(level) = curriculum.level(level_index) else {
        return out;
    };

    let _ = writeln!(
        out,
        "{} {}: {}",
        "LEVEL".bold(),
        level.code.as_str().bold(),
        level.name.as_str().bold()
    );
    let _ = writeln!(out, "{}\n", level.subtitle.as_str().italic());

    for (axiom, locked) in level.axioms.iter().zip(axiom_statuses(level, progress)) {
        let marker = if progress.is_studied(&axiom.id) {
            "[x]".green().to_string()
        } else if locked {
            "[-]".dark_grey().to_string()
        } else {
            "[ ]".to_string()
        };
        if locked {
            let _ = writeln!(out, "  {} {:<4} {}", marker, axiom.id, "(locked)".dark_grey());
        } else {
            let _ = writeln!(out, "  {} {:<4} {}", marker, axiom.id, axiom.title);
        }
    }
    out
}

/// Item detail: text, explanation, practice, note and insights
pub fn render_axiom(axiom: &Axiom, progress: &Progress) -> String {
    let mut out = String::new();
    let status = if progress.is_studied(&axiom.id) {
        "studied".green().to_string()
    } else {
        "not studied yet".dark_grey().to_string()
    };

    let _ = writeln!(out, "{}  {}", axiom.id.as_str().bold(), axiom.title.as_str().bold());
    let _ = writeln!(out, "{}\n", status);
    let _ = writeln!(out, "{}", axiom.description);

    if let Some(explanation) = &axiom.explanation {
        let _ = writeln!(out, "\n{}", "Explanation".underlined());
        let _ = writeln!(out, "{}", explanation);
    }
    if let Some(practice) = &axiom.practice {
        let _ = writeln!(out, "\n{}", "Practice".underlined());
        let _ = writeln!(out, "{}", practice);
    }

    if let Some(note) = progress.note(&axiom.id).filter(|n| !n.is_empty()) {
        let _ = writeln!(out, "\n{}", "Note".underlined());
        let _ = writeln!(out, "{}", note);
    }

    let insights: Vec<_> = progress.insights_for(&axiom.id).collect();
    if !insights.is_empty() {
        let _ = writeln!(out, "\n{}", "Insights".underlined());
        for insight in insights {
            let _ = writeln!(out, "  {}  {}", insight.date.as_str().dark_grey(), insight.text);
        }
    }
    out
}

fn progress_bar(percent: u32, width: usize) -> String {
    let filled = (percent.min(100) as usize * width) / 100;
    format!("{}{}", "#".repeat(filled), ".".repeat(width - filled))
}

pub fn render_dashboard(summary: &DashboardSummary<'_>) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", "PATH OF BEING".bold());
    let _ = writeln!(
        out,
        "[{}] {}%",
        progress_bar(summary.percent, 30).cyan(),
        summary.percent
    );
    let _ = writeln!(
        out,
        "Studied {}/{}   Levels completed {}/{}",
        summary.studied,
        summary.total,
        summary.completed_levels,
        summary.levels.len()
    );

    let _ = writeln!(out, "\n{}", "Level map".underlined());
    for level in &summary.levels {
        let state = match level.state {
            LevelState::Done => "done".green().to_string(),
            LevelState::InProgress => "in progress".yellow().to_string(),
            LevelState::Untouched => "untouched".dark_grey().to_string(),
        };
        let _ = writeln!(
            out,
            "{:>4}  {:<14} {:>2}/{:<2}  {}",
            level.code, level.name, level.studied, level.total, state
        );
    }

    let _ = writeln!(out, "\n{}", "Journal".underlined());
    if summary.journal.is_empty() {
        let _ = writeln!(out, "{}", "Nothing written yet.".dark_grey());
    }
    for entry in &summary.journal {
        let _ = writeln!(out, "{} {}", entry.axiom.id.as_str().bold(), entry.axiom.title);
        if let Some(note) = entry.note {
            let _ = writeln!(out, "  note: {}", note);
        }
        for insight in &entry.insights {
            let _ = writeln!(out, "  {}  {}", insight.date.as_str().dark_grey(), insight.text);
        }
    }

    if !summary.recent_insights.is_empty() {
        let _ = writeln!(out, "\n{}", "Recent insights".underlined());
        for insight in &summary.recent_insights {
            let _ = writeln!(
                out,
                "  {}  {}  {}",
                insight.date.as_str().dark_grey(),
                insight.id,
                insight.text
            );
        }
    }
    out
}

/// A chat message, including its side content
pub fn render_message(message: &Message) -> String {
    let mut out = String::new();
    let speaker = match message.role {
        Role::User => message.role.to_string().bold().to_string(),
        Role::Assistant => message.role.to_string().cyan().bold().to_string(),
    };

    if !message.text.is_empty() {
        let _ = writeln!(out, "{}: {}", speaker, message.text);
    }

    match &message.side {
        Some(SideContent::SelectCredential) => {
            let _ = writeln!(
                out,
                "  {} select an API key with {} in chat or {}",
                ">".yellow(),
                "/key".bold(),
                "axioms config --set-api-key <KEY>".bold()
            );
        }
        Some(SideContent::Failure { kind, remediation, configuration }) => {
            let title = match (*kind, *configuration) {
                ("missing_credential" | "rejected", _) => "Activation required".blue().bold(),
                (_, true) => "Key misconfigured".yellow().bold(),
                _ => "Temporary obstacle".red().bold(),
            };
            let _ = writeln!(out, "{}: {} ({})", speaker, title, kind);
            let _ = writeln!(out, "  {}", remediation);
        }
        None => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::JournalOrder;

    fn builtin() -> Curriculum {
        Curriculum::builtin().unwrap()
    }

    #[test]
    fn test_resolve_level_by_id_or_code() {
        let c = builtin();
        assert_eq!(resolve_level(&c, "1"), Ok(0));
        assert_eq!(resolve_level(&c, "x"), Ok(9));
        assert_eq!(resolve_level(&c, " iii "), Ok(2));
        assert_eq!(resolve_level(&c, "42"), Err(ViewError::UnknownLevel("42".into())));
    }

    #[test]
    fn test_locked_level_refused() {
        let c = builtin();
        let p = Progress::default();
        assert!(open_level(&c, &p, "I").is_ok());
        assert_eq!(
            open_level(&c, &p, "II"),
            Err(ViewError::LevelLocked {
                code: "II".into(),
                name: c.levels()[1].name.clone(),
                previous: "I".into(),
            })
        );
    }

    #[test]
    fn test_locked_axiom_refused() {
        let c = builtin();
        let mut p = Progress::default();
        assert!(open_axiom(&c, &p, "a1").is_ok());
        assert_eq!(
            open_axiom(&c, &p, "A2"),
            Err(ViewError::AxiomLocked { id: "A2".into(), previous: "A1".into() })
        );
        p.toggle_studied("A1");
        assert!(open_axiom(&c, &p, "A2").is_ok());

        // First axiom of a locked level is still refused
        let first_of_second = c.levels()[1].axioms[0].id.clone();
        assert!(matches!(
            open_axiom(&c, &p, &first_of_second),
            Err(ViewError::LevelLocked { .. })
        ));
        assert_eq!(open_axiom(&c, &p, "nope"), Err(ViewError::UnknownAxiom("nope".into())));
    }

    #[test]
    fn test_level_view_hides_locked_titles() {
        let c = builtin();
        let p = Progress::default();
        let out = render_level(&c, &p, 0);
        let first = &c.levels()[0].axioms[0];
        let second = &c.levels()[0].axioms[1];
        assert!(out.contains(&first.title));
        assert!(!out.contains(&second.title));
        assert!(out.contains("(locked)"));
    }

    #[test]
    fn test_axiom_view_shows_journal() {
        let c = builtin();
        let axiom = c.axiom("A1").unwrap();
        let mut p = Progress::default();
        p.set_note("A1", "my note");
        p.push_insight("A1", "it clicked", "05.03.2026".into());

        let out = render_axiom(axiom, &p);
        assert!(out.contains(&axiom.description));
        assert!(out.contains("my note"));
        assert!(out.contains("it clicked"));
        assert!(out.contains("05.03.2026"));
        if let Some(practice) = &axiom.practice {
            assert!(out.contains(practice));
        }
    }

    #[test]
    fn test_axiom_view_keeps_whitespace_note() {
        let c = builtin();
        let axiom = c.axiom("A1").unwrap();
        let mut p = Progress::default();
        p.set_note("A1", "  ");

        let with_note = render_axiom(axiom, &p);
        p.set_note("A1", "");
        let without_note = render_axiom(axiom, &p);
        assert_ne!(with_note, without_note);
    }

    #[test]
    fn test_dashboard_render() {
        let c = builtin();
        let mut p = Progress::default();
        p.toggle_studied("A1");
        p.push_insight("A1", "first light", "01.01.2026".into());
        let summary = DashboardSummary::compute(&c, &p, JournalOrder::Chronological);

        let out = render_dashboard(&summary);
        assert!(out.contains("2%"));
        assert!(out.contains("Studied 1/55"));
        assert!(out.contains("first light"));
    }

    #[test]
    fn test_failure_card() {
        let msg = Message::assistant_with(
            "",
            SideContent::Failure {
                kind: "transport",
                remediation: "Try again.".into(),
                configuration: false,
            },
        );
        let out = render_message(&msg);
        assert!(out.contains("Temporary obstacle"));
        assert!(out.contains("Try again."));

        let msg = Message::assistant_with(
            "",
            SideContent::Failure {
                kind: "credential_format",
                remediation: "Check the key.".into(),
                configuration: true,
            },
        );
        assert!(render_message(&msg).contains("Key misconfigured"));
    }
}
