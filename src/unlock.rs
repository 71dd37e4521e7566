//! Unlock gating
//!
//! A level opens once every axiom of the level right before it is studied;
//! an axiom opens once the axiom right before it in the same level is
//! studied. Status is always recomputed from the current progress, so
//! un-studying an axiom re-locks whatever depended on it without touching
//! the dependants' own studied flags.

use crate::curriculum::{Curriculum, Level};
use crate::progress::Progress;

/// Whether the level at `level_index` is locked.
///
/// Indices past the end of the curriculum are reported as locked.
pub fn is_level_locked(curriculum: &Curriculum, progress: &Progress, level_index: usize) -> bool {
    if level_index == 0 {
        return false;
    }
    if level_index >= curriculum.levels().len() {
        return true;
    }
    let previous = &curriculum.levels()[level_index - 1];
    !is_level_complete(previous, progress)
}

/// Whether the axiom at `axiom_index` within `level` is locked.
///
/// Indices past the end of the level are reported as locked.
pub fn is_axiom_locked(level: &Level, progress: &Progress, axiom_index: usize) -> bool {
    if axiom_index == 0 {
        return false;
    }
    match level.axioms.get(axiom_index - 1) {
        Some(previous) if axiom_index < level.axioms.len() => !progress.is_studied(&previous.id),
        _ => true,
    }
}

/// Every axiom of the level is studied
pub fn is_level_complete(level: &Level, progress: &Progress) -> bool {
    level.axioms.iter().all(|a| progress.is_studied(&a.id))
}

/// Lock state of every level, in curriculum order
pub fn level_statuses(curriculum: &Curriculum, progress: &Progress) -> Vec<bool> {
    (0..curriculum.levels().len())
        .map(|i| is_level_locked(curriculum, progress, i))
        .collect()
}

/// Lock state of every axiom of a level, in position order
pub fn axiom_statuses(level: &Level, progress: &Progress) -> Vec<bool> {
    (0..level.axioms.len())
        .map(|i| is_axiom_locked(level, progress, i))
        .collect()
}

/// Whether a specific axiom can be opened: its level and its position are both unlocked
pub fn is_axiom_accessible(curriculum: &Curriculum, progress: &Progress, axiom_id: &str) -> bool {
    match curriculum.locate(axiom_id) {
        Some(loc) => {
            !is_level_locked(curriculum, progress, loc.level_index)
                && !is_axiom_locked(&curriculum.levels()[loc.level_index], progress, loc.axiom_index)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::Axiom;

    fn level(id: u32, ids: &[&str]) -> Level {
        Level {
            id,
            code: format!("L{}", id),
            name: format!("Level {}", id),
            subtitle: String::new(),
            axioms: ids
                .iter()
                .map(|i| Axiom {
                    id: i.to_string(),
                    title: i.to_string(),
                    description: String::new(),
                    explanation: None,
                    practice: None,
                })
                .collect(),
        }
    }

    fn curriculum() -> Curriculum {
        Curriculum::new(vec![
            level(1, &["A", "B", "C"]),
            level(2, &["D", "E"]),
            level(3, &["F"]),
        ])
        .unwrap()
    }

    fn studied(ids: &[&str]) -> Progress {
        Progress {
            studied_axiom_ids: ids.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_level_and_axiom_never_locked() {
        let c = curriculum();
        let p = Progress::default();
        assert!(!is_level_locked(&c, &p, 0));
        for level in c.levels() {
            assert!(!is_axiom_locked(level, &p, 0));
        }
    }

    #[test]
    fn test_axiom_locked_iff_predecessor_unstudied() {
        let c = curriculum();
        let level = &c.levels()[0];
        let all = ["A", "B", "C"];

        // Every subset of studied axioms
        for mask in 0..8u8 {
            let ids: Vec<&str> = all
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, id)| *id)
                .collect();
            let p = studied(&ids);
            for i in 1..level.axioms.len() {
                let expected = !ids.contains(&all[i - 1]);
                assert_eq!(is_axiom_locked(level, &p, i), expected, "mask {} index {}", mask, i);
            }
        }
    }

    #[test]
    fn test_level_locked_iff_previous_incomplete() {
        let c = curriculum();
        assert!(is_level_locked(&c, &studied(&["A", "B"]), 1));
        assert!(!is_level_locked(&c, &studied(&["A", "B", "C"]), 1));
        // Only the immediately preceding level is consulted
        assert!(!is_level_locked(&c, &studied(&["D", "E"]), 2));
        assert!(is_level_locked(&c, &studied(&["A", "B", "C", "D"]), 2));
    }

    #[test]
    fn test_unstudy_relocks_without_clearing() {
        let c = curriculum();
        let mut p = studied(&["A", "B", "C", "D"]);
        assert!(!is_level_locked(&c, &p, 1));

        p.toggle_studied("B");
        assert!(is_level_locked(&c, &p, 1));
        assert!(is_axiom_locked(&c.levels()[0], &p, 2));
        // Dependants keep their studied flags
        assert!(p.is_studied("C"));
        assert!(p.is_studied("D"));
    }

    #[test]
    fn test_out_of_range_is_locked() {
        let c = curriculum();
        let p = studied(&["A", "B", "C", "D", "E", "F"]);
        assert!(is_level_locked(&c, &p, 3));
        assert!(is_axiom_locked(&c.levels()[0], &p, 3));
    }

    #[test]
    fn test_statuses_and_accessibility() {
        let c = curriculum();
        let p = studied(&["A", "B", "C"]);
        assert_eq!(level_statuses(&c, &p), vec![false, false, true]);
        assert_eq!(axiom_statuses(&c.levels()[1], &p), vec![false, true]);
        assert!(is_axiom_accessible(&c, &p, "D"));
        assert!(!is_axiom_accessible(&c, &p, "E"));
        assert!(!is_axiom_accessible(&c, &p, "F"));
        assert!(!is_axiom_accessible(&c, &p, "nope"));
    }
}
