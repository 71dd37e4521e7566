//! Progress persistence, unlock gating and dashboard against the built-in curriculum

use axiom_path::curriculum::Curriculum;
use axiom_path::dashboard::{self, DashboardSummary, JournalOrder};
use axiom_path::progress::{FileKeyValueStore, KeyValueStore, ProgressStore, DEFAULT_PROGRESS_KEY};
use axiom_path::unlock;
use axiom_path::view;
use std::sync::Arc;
use tempfile::TempDir;

fn curriculum() -> Arc<Curriculum> {
    Arc::new(Curriculum::builtin().expect("built-in curriculum"))
}

#[test]
fn test_builtin_curriculum_shape() {
    let c = curriculum();
    assert_eq!(c.levels().len(), 10);
    assert_eq!(c.total_axioms(), 55);
    assert_eq!(c.levels()[9].code, "X");

    let ids: Vec<&str> = c.axioms().map(|a| a.id.as_str()).collect();
    for (i, id) in ids.iter().enumerate() {
        assert_eq!(*id, format!("A{}", i + 1));
    }
}

#[test]
fn test_progress_survives_reopen() -> anyhow::Result<()> {
    let dir = TempDir::new()?;

    {
        let kv = FileKeyValueStore::new(dir.path())?;
        let mut store = ProgressStore::open(curriculum(), kv, DEFAULT_PROGRESS_KEY);
        store.toggle_studied("A1")?;
        store.toggle_studied("A2")?;
        store.update_note("A1", "stayed with the breath")?;
        assert!(store.add_insight("A2", "attention moves first")?);
        assert!(!store.add_insight("A2", "   ")?);
    }

    assert!(dir.path().join("genesis_progress.json").exists());

    let kv = FileKeyValueStore::new(dir.path())?;
    let store = ProgressStore::open(curriculum(), kv, DEFAULT_PROGRESS_KEY);
    let p = store.progress();
    assert_eq!(p.studied_axiom_ids, vec!["A1".to_string(), "A2".to_string()]);
    assert_eq!(p.note("A1"), Some("stayed with the breath"));
    assert_eq!(p.insights.len(), 1);
    assert_eq!(p.insights[0].text, "attention moves first");
    assert!(!p.insights[0].date.is_empty());
    Ok(())
}

#[test]
fn test_exact_blob_reloads() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let blob = r#"{"studiedAxiomIds":["A1"],"notes":{"A1":"x"},"insights":[]}"#;
    let mut kv = FileKeyValueStore::new(dir.path())?;
    kv.set(DEFAULT_PROGRESS_KEY, blob)?;

    let mut store = ProgressStore::open(curriculum(), kv.clone(), DEFAULT_PROGRESS_KEY);
    assert!(store.progress().is_studied("A1"));
    assert_eq!(store.progress().note("A1"), Some("x"));

    // A no-op insight must not rewrite the blob
    assert!(!store.add_insight("A1", "")?);
    assert_eq!(kv.get(DEFAULT_PROGRESS_KEY)?.as_deref(), Some(blob));
    Ok(())
}

#[test]
fn test_corrupt_blob_starts_fresh() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let mut kv = FileKeyValueStore::new(dir.path())?;
    kv.set(DEFAULT_PROGRESS_KEY, "{not json")?;

    let store = ProgressStore::open(curriculum(), kv, DEFAULT_PROGRESS_KEY);
    assert!(store.progress().studied_axiom_ids.is_empty());
    Ok(())
}

#[test]
fn test_unknown_mutation_rejected() {
    let mut store = ProgressStore::in_memory(curriculum());
    assert!(store.toggle_studied("A999").is_err());
    assert!(store.update_note("nope", "text").is_err());
    assert!(store.progress().studied_axiom_ids.is_empty());
}

#[test]
fn test_walking_the_first_level_opens_the_second() -> anyhow::Result<()> {
    let c = curriculum();
    let mut store = ProgressStore::in_memory(Arc::clone(&c));
    let first: Vec<String> = c.levels()[0].axioms.iter().map(|a| a.id.clone()).collect();

    for (i, id) in first.iter().enumerate() {
        assert!(view::open_axiom(&c, store.progress(), id).is_ok(), "{} should be open", id);
        if let Some(next) = first.get(i + 1) {
            assert!(view::open_axiom(&c, store.progress(), next).is_err());
        }
        store.toggle_studied(id)?;
    }

    assert!(!unlock::is_level_locked(&c, store.progress(), 1));
    assert!(unlock::is_level_locked(&c, store.progress(), 2));
    assert_eq!(dashboard::completed_levels(&c, store.progress()).len(), 1);

    // Un-studying the middle axiom re-locks level II but keeps its own flags
    store.toggle_studied(&first[2])?;
    assert!(unlock::is_level_locked(&c, store.progress(), 1));
    assert!(store.progress().is_studied(&first[3]));
    Ok(())
}

#[test]
fn test_dashboard_over_persisted_store() -> anyhow::Result<()> {
    let c = curriculum();
    let mut store = ProgressStore::in_memory(Arc::clone(&c));
    store.add_insight_dated("A1", "first", "01.02.2026".into())?;
    store.add_insight_dated("A3", "second", "02.02.2026".into())?;
    store.update_note("A2", "only a note")?;
    store.toggle_studied("A1")?;

    let summary = DashboardSummary::compute(&c, store.progress(), JournalOrder::Chronological);
    assert_eq!(summary.studied, 1);
    assert_eq!(summary.percent, 2);
    let ids: Vec<&str> = summary.journal.iter().map(|e| e.axiom.id.as_str()).collect();
    assert_eq!(ids, vec!["A1", "A3", "A2"]);
    assert_eq!(summary.recent_insights[0].text, "second");
    Ok(())
}
