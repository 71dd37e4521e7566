//! Chat session state
//!
//! Owns the message history, the selected tier and the loading flag.
//! A turn is split into `begin` and `finish` so the caller can hold the
//! session between them; `send` runs both around a backend call.

use std::sync::Arc;
use tracing::{info, warn};

use super::client::{AssistantBackend, GenerationRequest};
use super::error::AssistantError;
use super::prompt;
use crate::curriculum::{Axiom, Curriculum};
use crate::types::{Message, ModelTier, SideContent};

/// Result of submitting a message
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Blank input, nothing happened
    Ignored,
    /// A request is already in flight
    Busy,
    /// No credential; a selection prompt was appended instead of sending
    NeedsCredential,
    Replied,
    Failed(AssistantError),
}

/// A turn that has been accepted and is waiting for the backend
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub request: GenerationRequest,
}

pub struct AssistantSession {
    backend: Box<dyn AssistantBackend>,
    curriculum: Arc<Curriculum>,
    messages: Vec<Message>,
    tier: ModelTier,
    loading: bool,
    credential_present: bool,
    fallback_to_other_tier: bool,
    focus: Option<String>,
}

impl AssistantSession {
    pub fn new(backend: Box<dyn AssistantBackend>, curriculum: Arc<Curriculum>) -> Self {
        Self {
            backend,
            curriculum,
            messages: vec![Message::assistant(prompt::GREETING)],
            tier: ModelTier::default(),
            loading: false,
            credential_present: true,
            fallback_to_other_tier: false,
            focus: None,
        }
    }

    pub fn with_tier(mut self, tier: ModelTier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_to_other_tier = enabled;
        self
    }

    pub fn with_credential_present(mut self, present: bool) -> Self {
        self.credential_present = present;
        self
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn tier(&self) -> ModelTier {
        self.tier
    }

    pub fn set_tier(&mut self, tier: ModelTier) {
        self.tier = tier;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn credential_present(&self) -> bool {
        self.credential_present
    }

    pub fn focused(&self) -> Option<&Axiom> {
        self.focus.as_deref().and_then(|id| self.curriculum.axiom(id))
    }

    /// Clear the history down to a single "cleared" message
    pub fn reset(&mut self) {
        self.messages = vec![Message::assistant(prompt::CLEARED)];
    }

    /// Focus an axiom and return the contemplation prompt to pre-fill
    pub fn focus(&mut self, axiom_id: &str) -> Option<String> {
        let axiom = self.curriculum.find(axiom_id)?;
        let text = prompt::contemplation_prompt(axiom);
        self.focus = Some(axiom.id.clone());
        Some(text)
    }

    /// Swap in a backend built from a newly selected credential
    pub fn credential_selected(&mut self, backend: Box<dyn AssistantBackend>) {
        self.backend = backend;
        self.credential_present = true;
        self.messages.push(Message::assistant(prompt::SYNCED));
    }

    /// Accept a message and build the request for it.
    ///
    /// On success the user message is appended and the session is loading
    /// until `finish` is called.
    pub fn begin(&mut self, text: &str) -> Result<PendingTurn, SendOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SendOutcome::Ignored);
        }
        if self.loading {
            return Err(SendOutcome::Busy);
        }
        if !self.credential_present {
            self.messages.push(Message::assistant_with(
                prompt::KEY_REQUIRED,
                SideContent::SelectCredential,
            ));
            return Err(SendOutcome::NeedsCredential);
        }

        let history: Vec<Message> = self
            .messages
            .iter()
            .filter(|m| !m.text.trim().is_empty())
            .map(|m| Message {
                role: m.role,
                text: m.text.clone(),
                side: None,
            })
            .collect();

        self.messages.push(Message::user(text));
        self.loading = true;

        Ok(PendingTurn {
            request: GenerationRequest {
                system_instruction: prompt::system_instruction(&self.curriculum),
                history,
                message: text.to_string(),
                tier: self.tier,
            },
        })
    }

    /// Record the backend's answer for a pending turn
    pub fn finish(&mut self, result: Result<String, AssistantError>) -> SendOutcome {
        self.loading = false;
        match result {
            Ok(reply) => {
                self.messages.push(Message::assistant(reply));
                SendOutcome::Replied
            }
            Err(err) => {
                if err.requires_credential_selection() {
                    self.credential_present = false;
                }
                self.messages.push(Message::assistant_with(
                    "",
                    SideContent::Failure {
                        kind: err.kind(),
                        remediation: err.remediation(),
                        configuration: err.is_configuration(),
                    },
                ));
                SendOutcome::Failed(err)
            }
        }
    }

    /// Run one full turn against the backend
    pub async fn send(&mut self, text: &str) -> SendOutcome {
        let pending = match self.begin(text) {
            Ok(p) => p,
            Err(outcome) => return outcome,
        };
        let result = self.generate(pending.request).await;
        self.finish(result)
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, AssistantError> {
        let tier = request.tier;
        let retry = request.clone();
        match self.backend.generate(request).await {
            Err(err) if self.fallback_to_other_tier && err.allows_tier_fallback() => {
                let other = tier.other();
                warn!("Tier {} failed ({}), falling back to {}", tier, err.kind(), other);
                let result = self
                    .backend
                    .generate(GenerationRequest { tier: other, ..retry })
                    .await;
                if result.is_ok() {
                    info!("Fallback succeeded: {} -> {}", tier, other);
                }
                result
            }
            other => other,
        }
    }
}
