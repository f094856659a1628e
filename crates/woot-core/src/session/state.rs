use serde::{Deserialize, Serialize};

/// Lifecycle of a chat session.
///
/// `Uninitialized -> Configured -> ProfileLoading -> ProfileResolved -> Closed`.
/// `Closed` is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Uninitialized,
    Configured,
    ProfileLoading,
    ProfileResolved,
    Closed,
}

impl SessionState {
    /// True once `setup` has been called and the session is still open.
    pub fn is_configured(self) -> bool {
        matches!(
            self,
            Self::Configured | Self::ProfileLoading | Self::ProfileResolved
        )
    }

    pub fn is_closed(self) -> bool {
        self == Self::Closed
    }
}

/// Which side asked for the chat to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseOrigin {
    /// Native back/close button in the header
    Native,
    /// `close` message posted by the embedded runtime
    Runtime,
}
