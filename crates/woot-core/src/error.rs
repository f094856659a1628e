//! Error types for the Woot bridge.

use thiserror::Error;

/// A shared error type for the entire bridge.
///
/// State-contract violations (`NotConfigured`, `InvalidConversation`,
/// `SessionClosed`) are returned to the caller. Profile and injection failures
/// are absorbed by the application layer and only surface in logs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WootError {
    /// An operation was invoked before the session was set up
    #[error("Session not configured: {0}")]
    NotConfigured(String),

    /// Conversation ids must be strictly positive
    #[error("Invalid conversation id: {0}")]
    InvalidConversation(i64),

    /// Session configuration or settings failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Profile request failed (network, HTTP status, or body)
    #[error("Profile fetch failed: {0}")]
    ProfileFetchFailed(String),

    /// The embedded runtime rejected or failed to execute a delivery
    #[error("Injection failed: {0}")]
    InjectionFailed(String),

    /// The session has already been closed
    #[error("Session is closed")]
    SessionClosed,

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON"
        message: String,
    },

    /// IO error (config file access)
    #[error("IO error: {message}")]
    Io { message: String },
}

impl WootError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotConfigured error naming the rejected operation
    pub fn not_configured(operation: impl Into<String>) -> Self {
        Self::NotConfigured(operation.into())
    }

    /// Creates an InvalidConfig error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Creates a ProfileFetchFailed error
    pub fn profile_fetch(message: impl Into<String>) -> Self {
        Self::ProfileFetchFailed(message.into())
    }

    /// Creates an InjectionFailed error
    pub fn injection(message: impl Into<String>) -> Self {
        Self::InjectionFailed(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotConfigured error
    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured(_))
    }

    /// Check if this is an InvalidConversation error
    pub fn is_invalid_conversation(&self) -> bool {
        matches!(self, Self::InvalidConversation(_))
    }

    /// Check if this is a config validation error
    pub fn is_invalid_config(&self) -> bool {
        matches!(self, Self::InvalidConfig(_))
    }

    /// Check if this error is recovered locally rather than surfaced.
    ///
    /// Profile and injection failures never reach the host as errors.
    pub fn is_absorbed(&self) -> bool {
        matches!(self, Self::ProfileFetchFailed(_) | Self::InjectionFailed(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for WootError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for WootError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for WootError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, WootError>`.
pub type Result<T> = std::result::Result<T, WootError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorbed_errors() {
        assert!(WootError::profile_fetch("timeout").is_absorbed());
        assert!(WootError::injection("webview gone").is_absorbed());
        assert!(!WootError::not_configured("open_chat").is_absorbed());
        assert!(!WootError::InvalidConversation(0).is_absorbed());
    }

    #[test]
    fn test_json_error_conversion() {
        let err: WootError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        match err {
            WootError::Serialization { format, .. } => assert_eq!(format, "JSON"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            WootError::InvalidConversation(-3).to_string(),
            "Invalid conversation id: -3"
        );
        assert_eq!(
            WootError::not_configured("open_chat requires setup").to_string(),
            "Session not configured: open_chat requires setup"
        );
    }
}
