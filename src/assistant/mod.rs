//! Mentor assistant
//!
//! Prompt construction, credential resolution, the Gemini backend and the
//! chat session that ties them together.

pub mod client;
pub mod credentials;
pub mod error;
pub mod prompt;
pub mod session;

pub use client::{AssistantBackend, GeminiClient, GenerationRequest};
pub use credentials::{Credential, CredentialResolution, CredentialSource};
pub use error::AssistantError;
pub use session::{AssistantSession, SendOutcome};
