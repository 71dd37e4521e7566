//! Shared types used across modules

use serde::{Deserialize, Serialize};

/// A single message in an assistant conversation
///
/// Messages are ephemeral: they live for one chat session and are never
/// written to the progress store.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub text: String,
    /// Renderable extra content shown under the text (actions, failure cards)
    pub side: Option<SideContent>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            side: None,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            side: None,
        }
    }

    /// Assistant turn that carries side content
    pub fn assistant_with(text: impl Into<String>, side: SideContent) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            side: Some(side),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Role name as the Gemini API expects it
    pub fn to_gemini_string(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "model",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "You"),
            Role::Assistant => write!(f, "Mentor"),
        }
    }
}

/// Non-text content attached to an assistant message
#[derive(Debug, Clone, PartialEq)]
pub enum SideContent {
    /// Ask the user to select or store a credential before continuing
    SelectCredential,
    /// A failed assistant call, rendered as a card
    Failure {
        kind: &'static str,
        remediation: String,
        /// Caught locally before the provider was called
        configuration: bool,
    },
}

/// Provider model tier
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Faster, cheaper model
    #[default]
    Fast,
    /// Slower model with an extended reasoning budget
    Deep,
}

impl ModelTier {
    /// The tier used for a single fallback attempt
    pub fn other(&self) -> Self {
        match self {
            ModelTier::Fast => ModelTier::Deep,
            ModelTier::Deep => ModelTier::Fast,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fast" | "flash" => Some(ModelTier::Fast),
            "deep" | "pro" => Some(ModelTier::Deep),
            _ => None,
        }
    }
}

impl std::fmt::Display for ModelTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelTier::Fast => write!(f, "flash"),
            ModelTier::Deep => write!(f, "pro"),
        }
    }
}
