//! Error types for port operations, and the failure classifier shared by the
//! generation client and the HTTP error mapping.

#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ImageGenError {
    /// Failure reported by the service; classify with [`FailureClass::classify`]
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
    /// Every attempt ran into the per-attempt timeout
    #[error("Image generation timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32 },
    /// Service refused the prompt on safety grounds
    #[error("Content filtered: {0}")]
    ContentFiltered(String),
    /// Credentials or service setup are wrong
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Local placeholder rendering broke; not a service failure
    #[error("Placeholder rendering failed: {0}")]
    Rendering(String),
}

/// What kind of failure an error message describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Timeout,
    ContentFiltered,
    Configuration,
    Other,
}

const TIMEOUT_MARKERS: &[&str] = &["timeout", "timed out", "deadline exceeded"];
const SAFETY_MARKERS: &[&str] = &["safety", "blocked", "filter", "prohibited content"];
const CREDENTIAL_MARKERS: &[&str] = &[
    "api key",
    "api_key",
    "apikey",
    "credential",
    "unauthorized",
    "unauthenticated",
    "permission denied",
];

impl FailureClass {
    /// Classify free-form error text by marker substrings, checked in a fixed
    /// order: timeout, safety, credentials.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        let has_any = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

        if has_any(TIMEOUT_MARKERS) {
            FailureClass::Timeout
        } else if has_any(SAFETY_MARKERS) {
            FailureClass::ContentFiltered
        } else if has_any(CREDENTIAL_MARKERS) {
            FailureClass::Configuration
        } else {
            FailureClass::Other
        }
    }

    /// Terminal failures abort the retry loop on first sight.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FailureClass::ContentFiltered | FailureClass::Configuration
        )
    }
}

impl ImageGenError {
    pub fn class(&self) -> FailureClass {
        match self {
            ImageGenError::GenerationFailed(msg) => FailureClass::classify(msg),
            ImageGenError::Timeout { .. } => FailureClass::Timeout,
            ImageGenError::ContentFiltered(_) => FailureClass::ContentFiltered,
            ImageGenError::Configuration(_) => FailureClass::Configuration,
            ImageGenError::Rendering(_) => FailureClass::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safety_messages_are_content_filtered() {
        assert_eq!(
            FailureClass::classify("Request blocked by SAFETY settings"),
            FailureClass::ContentFiltered
        );
        assert_eq!(
            FailureClass::classify("prompt rejected by content filter"),
            FailureClass::ContentFiltered
        );
    }

    #[test]
    fn credential_messages_are_configuration() {
        assert_eq!(
            FailureClass::classify("API key not valid. Please pass a valid API key."),
            FailureClass::Configuration
        );
        assert_eq!(
            FailureClass::classify("HTTP 401 Unauthorized"),
            FailureClass::Configuration
        );
    }

    #[test]
    fn status_digits_inside_identifiers_are_not_credentials() {
        let class = FailureClass::classify("Workflow 7c1e4013-9a2b-4f03-8d40-2e9b403aa401 failed");
        assert_eq!(class, FailureClass::Other);
        assert!(!class.is_terminal());
    }

    #[test]
    fn timeout_is_checked_first() {
        assert_eq!(
            FailureClass::classify("upstream timed out while applying safety filter"),
            FailureClass::Timeout
        );
    }

    #[test]
    fn everything_else_is_retryable() {
        let class = FailureClass::classify("502 Bad Gateway");
        assert_eq!(class, FailureClass::Other);
        assert!(!class.is_terminal());
        assert!(FailureClass::ContentFiltered.is_terminal());
        assert!(FailureClass::Configuration.is_terminal());
        assert!(!FailureClass::Timeout.is_terminal());
    }

    #[test]
    fn typed_errors_report_their_class() {
        assert_eq!(
            ImageGenError::GenerationFailed("permission denied".into()).class(),
            FailureClass::Configuration
        );
        assert_eq!(
            ImageGenError::Timeout { attempts: 3 }.class(),
            FailureClass::Timeout
        );
    }
}
