//! Assistant failure taxonomy
//!
//! Every way an assistant turn can fail, as a tagged variant with
//! structured fields. The chat panel turns these into failure cards using
//! `kind()` and `remediation()`.

use thiserror::Error;

/// Prefix every valid provider key starts with
pub const KEY_PREFIX: &str = "AIza";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssistantError {
    #[error("no API key configured")]
    MissingCredential,

    #[error("API key looks like a variable name ({name}) instead of a key value")]
    CredentialLooksLikeVariableName { name: String },

    #[error("API key has an invalid format (expected it to start with {expected_prefix})")]
    InvalidCredentialFormat { expected_prefix: &'static str },

    #[error("provider rejected the API key ({status}): {detail}")]
    Rejected {
        status: u16,
        detail: String,
        /// The stored credential should be treated as absent from now on
        invalidates_credential: bool,
    },

    #[error("provider returned an empty response")]
    EmptyResponse,

    #[error("request failed: {detail}")]
    Transport { detail: String },

    #[error("provider error ({status}): {detail}")]
    Unclassified { status: u16, detail: String },
}

impl AssistantError {
    /// Short stable tag for display and logs
    pub fn kind(&self) -> &'static str {
        match self {
            AssistantError::MissingCredential => "missing_credential",
            AssistantError::CredentialLooksLikeVariableName { .. } => "credential_variable_name",
            AssistantError::InvalidCredentialFormat { .. } => "credential_format",
            AssistantError::Rejected { .. } => "rejected",
            AssistantError::EmptyResponse => "empty_response",
            AssistantError::Transport { .. } => "transport",
            AssistantError::Unclassified { .. } => "unclassified",
        }
    }

    /// What the user should do about it
    pub fn remediation(&self) -> String {
        match self {
            AssistantError::MissingCredential => {
                "The mentor needs a Gemini API key. Store one with `axioms config --set-api-key <KEY>` \
                 or export GEMINI_API_KEY."
                    .to_string()
            }
            AssistantError::CredentialLooksLikeVariableName { name } => format!(
                "The configured key is the text '{}', which is a variable name. \
                 Put the key value itself in the variable, not its name.",
                name
            ),
            AssistantError::InvalidCredentialFormat { expected_prefix } => format!(
                "The configured key does not look like a Gemini API key (they start with '{}'). \
                 Copy it again from Google AI Studio.",
                expected_prefix
            ),
            AssistantError::Rejected { .. } => {
                "The provider rejected the key. Check that it belongs to a project with billing \
                 enabled (https://ai.google.dev/gemini-api/docs/billing), then select it again with \
                 `axioms config --set-api-key <KEY>`."
                    .to_string()
            }
            AssistantError::EmptyResponse => {
                "Silence came back instead of an answer. Try asking again.".to_string()
            }
            AssistantError::Transport { detail } | AssistantError::Unclassified { detail, .. } => {
                format!("The connection was interrupted. Try again in a moment. ({})", detail)
            }
        }
    }

    /// Configuration problems found before any network call
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AssistantError::MissingCredential
                | AssistantError::CredentialLooksLikeVariableName { .. }
                | AssistantError::InvalidCredentialFormat { .. }
        )
    }

    /// Failures that may succeed on the other model tier
    pub fn allows_tier_fallback(&self) -> bool {
        matches!(
            self,
            AssistantError::Transport { .. } | AssistantError::Unclassified { .. }
        )
    }

    /// Whether the session should re-prompt for credential selection
    pub fn requires_credential_selection(&self) -> bool {
        matches!(
            self,
            AssistantError::MissingCredential
                | AssistantError::Rejected {
                    invalidates_credential: true,
                    ..
                }
        )
    }
}

/// Classify a non-success provider response
pub fn classify_http_failure(status: u16, body: &str) -> AssistantError {
    let lower = body.to_lowercase();
    let detail = provider_message(body).unwrap_or_else(|| truncate(body, 300));

    if lower.contains("requested entity was not found") {
        return AssistantError::Rejected {
            status,
            detail,
            invalidates_credential: true,
        };
    }

    let key_problem = lower.contains("api key not valid")
        || lower.contains("api_key_invalid")
        || lower.contains("invalid api key")
        || lower.contains("permission_denied")
        || lower.contains("unauthenticated");

    match status {
        401 | 403 => AssistantError::Rejected {
            status,
            detail,
            invalidates_credential: false,
        },
        400 | 404 if key_problem => AssistantError::Rejected {
            status,
            detail,
            invalidates_credential: false,
        },
        _ => AssistantError::Unclassified { status, detail },
    }
}

/// `error.message` out of a provider error body, if it has one
fn provider_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_http_failure() {
        assert!(matches!(
            classify_http_failure(401, "unauthorized"),
            AssistantError::Rejected { status: 401, invalidates_credential: false, .. }
        ));
        assert!(matches!(
            classify_http_failure(403, "{}"),
            AssistantError::Rejected { status: 403, .. }
        ));

        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        match classify_http_failure(400, body) {
            AssistantError::Rejected { detail, invalidates_credential, .. } => {
                assert_eq!(detail, "API key not valid. Please pass a valid API key.");
                assert!(!invalidates_credential);
            }
            other => panic!("unexpected {:?}", other),
        }

        let body = r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#;
        assert!(classify_http_failure(404, body).requires_credential_selection());

        assert!(matches!(
            classify_http_failure(400, "bad request"),
            AssistantError::Unclassified { status: 400, .. }
        ));
        assert!(matches!(
            classify_http_failure(503, "overloaded"),
            AssistantError::Unclassified { status: 503, .. }
        ));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("абвгд", 3), "абв...");
        assert_eq!(truncate("short", 10), "short");
    }

    fn all() -> Vec<AssistantError> {
        vec![
            AssistantError::MissingCredential,
            AssistantError::CredentialLooksLikeVariableName { name: "API_KEY".into() },
            AssistantError::InvalidCredentialFormat { expected_prefix: KEY_PREFIX },
            AssistantError::Rejected { status: 403, detail: "denied".into(), invalidates_credential: false },
            AssistantError::EmptyResponse,
            AssistantError::Transport { detail: "reset".into() },
            AssistantError::Unclassified { status: 500, detail: "boom".into() },
        ]
    }

    #[test]
    fn test_kinds_are_distinct() {
        let mut kinds: Vec<&str> = all().iter().map(|e| e.kind()).collect();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), 7);
    }

    #[test]
    fn test_remediation_mentions_detail() {
        let err = AssistantError::CredentialLooksLikeVariableName { name: "GEMINI_API_KEY".into() };
        assert!(err.remediation().contains("GEMINI_API_KEY"));
        assert!(AssistantError::InvalidCredentialFormat { expected_prefix: KEY_PREFIX }
            .remediation()
            .contains("AIza"));
    }

    #[test]
    fn test_classification_flags() {
        for err in all() {
            let fallback = err.allows_tier_fallback();
            let config = err.is_configuration();
            assert!(!(fallback && config), "{:?}", err);
        }
        assert!(AssistantError::MissingCredential.requires_credential_selection());
        assert!(AssistantError::Rejected {
            status: 404,
            detail: String::new(),
            invalidates_credential: true
        }
        .requires_credential_selection());
        assert!(!AssistantError::EmptyResponse.requires_credential_selection());
    }
}
