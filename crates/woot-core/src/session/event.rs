use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::state::CloseOrigin;
use crate::profile::HeaderState;

/// Notifications published by a session to the host shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The header should be re-rendered.
    HeaderChanged { header: HeaderState },
    /// The chat was closed; the host dismisses its container.
    /// Emitted exactly once per session.
    Closed { origin: CloseOrigin },
}

/// Messages posted by the embedded runtime to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    Close,
    Unknown(String),
}

const CLOSE_MESSAGE: &str = "close";

impl InboundMessage {
    /// Parses a raw message from the web view's message channel.
    ///
    /// Accepts the bare string `close`, the JSON string `"close"`, or a JSON
    /// object whose `type` or `event` field is `close`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed == CLOSE_MESSAGE {
            return Self::Close;
        }

        let is_close = match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::String(name)) => name == CLOSE_MESSAGE,
            Ok(Value::Object(fields)) => ["type", "event"]
                .iter()
                .any(|key| fields.get(*key).and_then(Value::as_str) == Some(CLOSE_MESSAGE)),
            _ => false,
        };

        if is_close {
            Self::Close
        } else {
            Self::Unknown(trimmed.to_string())
        }
    }
}
