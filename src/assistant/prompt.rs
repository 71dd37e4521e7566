//! System instruction and canned chat texts

use crate::curriculum::{Axiom, Curriculum};

/// First message of every chat session
pub const GREETING: &str = "Welcome. I am here to help you move from the noise of thinking \
into plain presence. Pick an axiom to contemplate, or simply tell me what is happening in you right now.";

/// Replaces the history on reset
pub const CLEARED: &str = "The space is cleared.";

pub const KEY_REQUIRED: &str = "To talk with the mentor you need to select an API key.";

/// Shown once a key has been selected
pub const SYNCED: &str = "The space is synchronized. Now we can continue the path.";

pub const FOOTER: &str = "The truth is always within you.";

const PERSONA: &str = "You are a wise mentor for the \"Axioms of Being\" system";

const PRINCIPLES: &str = "Principles:
1. Radical kindness and acceptance.
2. The simplicity of a zen master: less theory, more direct pointing at reality.
3. Practicality: micro-actions of the body and of attention.
4. Grounding, especially on the final level.";

const REPLY_TEMPLATE: &str = "Structure every reply as:
- Insight: (a short essence)
- Image: (a living metaphor)
- Practice of the moment: (one concrete bodily or mental act)
- Question: (for honest self-reflection)";

/// Build the system instruction from the whole curriculum
pub fn system_instruction(curriculum: &Curriculum) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} (the complete body of {} truths).\n",
        PERSONA,
        curriculum.total_axioms()
    ));
    out.push_str(
        "Your task is to guide the user from mental noise into clear presence and integration of being.\n\n",
    );
    out.push_str(PRINCIPLES);
    out.push_str("\n\n");
    out.push_str(REPLY_TEMPLATE);
    out.push_str("\n\nThe full architecture of the system:\n");

    let blocks: Vec<String> = curriculum
        .levels()
        .iter()
        .map(|level| {
            let mut block = format!("LEVEL {} ({}): {}", level.id, level.code, level.name);
            for axiom in &level.axioms {
                block.push_str(&format!("\n{}: {} - {}", axiom.id, axiom.title, axiom.description));
            }
            block
        })
        .collect();
    out.push_str(&blocks.join("\n\n"));

    if let Some(last) = curriculum.levels().last() {
        out.push_str(&format!(
            "\n\nIf the user is contemplating an axiom from the {} level ({}), be especially human \
             and ironic, and take the weight off \"spiritual achievements\".\n",
            last.name.to_uppercase(),
            last.code
        ));
    }
    out
}

/// Message pre-filled when the learner focuses an axiom
pub fn contemplation_prompt(axiom: &Axiom) -> String {
    format!(
        "I am contemplating the axiom \"{}\". Help me integrate it into today.",
        axiom.title
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_lists_every_axiom() {
        let curriculum = Curriculum::builtin().unwrap();
        let text = system_instruction(&curriculum);

        assert!(text.contains("Practice of the moment"));
        for level in curriculum.levels() {
            let header = format!("LEVEL {} ({}): {}", level.id, level.code, level.name);
            assert!(text.contains(&header), "missing {}", header);
        }
        for axiom in curriculum.axioms() {
            let line = format!("{}: {} - {}", axiom.id, axiom.title, axiom.description);
            assert!(text.contains(&line), "missing {}", axiom.id);
        }
        assert!(text.contains("PARADOX level (X)"));
    }

    #[test]
    fn test_contemplation_prompt() {
        let axiom = Axiom {
            id: "A1".into(),
            title: "Here".into(),
            description: String::new(),
            explanation: None,
            practice: None,
        };
        assert_eq!(
            contemplation_prompt(&axiom),
            "I am contemplating the axiom \"Here\". Help me integrate it into today."
        );
    }
}
