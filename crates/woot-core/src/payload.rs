//! Bridge payload delivered into the embedded web runtime.
//!
//! The payload is a pure function of `(SessionConfig, ConversationId)`, so it
//! can be rebuilt and re-delivered on every load or reload of the page.
//! Values are never spliced into script text as raw strings: each one is
//! serialized as JSON and then escaped for safe embedding in a `<script>`.

use std::fmt;

use serde_json::{Value, json};

use crate::config::{SessionConfig, redact};
use crate::error::{Result, WootError};

/// Event dispatched on `window` once the globals are in place.
pub const CONFIG_LOADED_EVENT: &str = "chatwootConfigLoaded";

/// Event dispatched on `window` when the native shell closes the chat.
pub const CLOSE_EVENT: &str = "chatwootClose";

/// Global variable names, in delivery order.
pub mod globals {
    pub const ISOLATED_SHELL: &str = "__WOOT_ISOLATED_SHELL__";
    pub const ACCOUNT_ID: &str = "__WOOT_ACCOUNT_ID__";
    pub const API_HOST: &str = "__WOOT_API_HOST__";
    pub const ACCESS_TOKEN: &str = "__WOOT_ACCESS_TOKEN__";
    pub const PUBSUB_TOKEN: &str = "__PUBSUB_TOKEN__";
    pub const WEBSOCKET_URL: &str = "__WEBSOCKET_URL__";
    pub const CONVERSATION_ID: &str = "__WOOT_CONVERSATION_ID__";
}

/// A validated conversation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversationId(i64);

impl ConversationId {
    /// # Errors
    ///
    /// Returns `WootError::InvalidConversation` for ids that are zero or negative.
    pub fn new(id: i64) -> Result<Self> {
        if id > 0 {
            Ok(Self(id))
        } else {
            Err(WootError::InvalidConversation(id))
        }
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for ConversationId {
    type Error = WootError;

    fn try_from(id: i64) -> Result<Self> {
        Self::new(id)
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Configuration handed to the embedded runtime.
#[derive(Clone, PartialEq, Eq)]
pub struct BridgePayload {
    pub isolated_shell: bool,
    pub account_id: i64,
    pub api_host: String,
    pub access_token: String,
    pub pubsub_token: String,
    pub websocket_url: String,
    pub conversation_id: i64,
}

/// Builds bridge payloads from a session configuration.
pub struct BridgePayloadBuilder;

impl BridgePayloadBuilder {
    /// Derives the payload for a session and conversation. Pure and
    /// deterministic: equal inputs always produce equal payloads.
    pub fn build(config: &SessionConfig, conversation: ConversationId) -> BridgePayload {
        BridgePayload {
            isolated_shell: true,
            account_id: config.account_id(),
            api_host: config.api_host().to_string(),
            access_token: config.access_token().to_string(),
            pubsub_token: config.pubsub_token().to_string(),
            websocket_url: config.websocket_url().to_string(),
            conversation_id: conversation.get(),
        }
    }

    /// Like [`BridgePayloadBuilder::build`] for an unvalidated id.
    ///
    /// # Errors
    ///
    /// Returns `WootError::InvalidConversation` when `conversation_id <= 0`.
    pub fn build_raw(config: &SessionConfig, conversation_id: i64) -> Result<BridgePayload> {
        Ok(Self::build(config, ConversationId::new(conversation_id)?))
    }
}

impl BridgePayload {
    /// Global bindings in delivery order.
    pub fn globals(&self) -> Vec<(&'static str, Value)> {
        vec![
            (globals::ISOLATED_SHELL, Value::Bool(self.isolated_shell)),
            (globals::ACCOUNT_ID, Value::from(self.account_id)),
            (globals::API_HOST, Value::from(self.api_host.as_str())),
            (globals::ACCESS_TOKEN, Value::from(self.access_token.as_str())),
            (globals::PUBSUB_TOKEN, Value::from(self.pubsub_token.as_str())),
            (globals::WEBSOCKET_URL, Value::from(self.websocket_url.as_str())),
            (globals::CONVERSATION_ID, Value::from(self.conversation_id)),
        ]
    }

    /// Detail object of the `chatwootConfigLoaded` event.
    pub fn detail(&self) -> Value {
        json!({
            "isolatedShell": self.isolated_shell,
            "accountId": self.account_id,
            "apiHost": self.api_host,
            "accessToken": self.access_token,
            "pubsubToken": self.pubsub_token,
            "websocketUrl": self.websocket_url,
            "conversationId": self.conversation_id,
        })
    }

    /// Script that assigns every global on `window` and dispatches
    /// `chatwootConfigLoaded`.
    pub fn to_script(&self) -> String {
        let mut script = String::from("(function () {\n");
        for (name, value) in self.globals() {
            script.push_str(&format!("  window.{name} = {};\n", script_literal(&value)));
        }
        script.push_str(&format!(
            "  window.dispatchEvent(new CustomEvent({}, {{ detail: {} }}));\n",
            script_literal(&Value::from(CONFIG_LOADED_EVENT)),
            script_literal(&self.detail()),
        ));
        script.push_str("})();");
        script
    }

    /// Structured message for runtimes with a `postMessage`-style channel.
    pub fn to_message(&self) -> String {
        json!({
            "type": CONFIG_LOADED_EVENT,
            "detail": self.detail(),
        })
        .to_string()
    }
}

impl fmt::Debug for BridgePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgePayload")
            .field("isolated_shell", &self.isolated_shell)
            .field("account_id", &self.account_id)
            .field("api_host", &self.api_host)
            .field("access_token", &redact(&self.access_token))
            .field("pubsub_token", &redact(&self.pubsub_token))
            .field("websocket_url", &self.websocket_url)
            .field("conversation_id", &self.conversation_id)
            .finish()
    }
}

/// Script dispatching `chatwootClose` into the embedded runtime.
pub fn close_event_script() -> String {
    format!(
        "window.dispatchEvent(new CustomEvent({}));",
        script_literal(&Value::from(CLOSE_EVENT))
    )
}

/// Renders a JSON value as a JavaScript literal that is also safe inside an
/// HTML `<script>` element.
fn script_literal(value: &Value) -> String {
    let json = value.to_string();
    let mut escaped = String::with_capacity(json.len());
    for ch in json.chars() {
        match ch {
            '<' => escaped.push_str("\\u003c"),
            '>' => escaped.push_str("\\u003e"),
            '&' => escaped.push_str("\\u0026"),
            '\u{2028}' => escaped.push_str("\\u2028"),
            '\u{2029}' => escaped.push_str("\\u2029"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(token: &str, host: &str) -> SessionConfig {
        SessionConfig::new(42, host, token, "pubsub", "wss://example.com/cable").unwrap()
    }

    fn config() -> SessionConfig {
        config_with("access-token", "https://example.com")
    }

    #[test]
    fn test_build_is_deterministic() {
        let config = config();
        let id = ConversationId::new(9).unwrap();
        assert_eq!(
            BridgePayloadBuilder::build(&config, id),
            BridgePayloadBuilder::build(&config, id)
        );
        assert_eq!(
            BridgePayloadBuilder::build(&config, id).to_script(),
            BridgePayloadBuilder::build(&config, id).to_script()
        );
    }

    #[test]
    fn test_build_copies_fields() {
        let payload = BridgePayloadBuilder::build(&config(), ConversationId::new(9).unwrap());
        assert!(payload.isolated_shell);
        assert_eq!(payload.account_id, 42);
        assert_eq!(payload.api_host, "https://example.com");
        assert_eq!(payload.access_token, "access-token");
        assert_eq!(payload.pubsub_token, "pubsub");
        assert_eq!(payload.websocket_url, "wss://example.com/cable");
        assert_eq!(payload.conversation_id, 9);
    }

    #[test]
    fn test_rejects_non_positive_conversation() {
        assert_eq!(
            BridgePayloadBuilder::build_raw(&config(), 0),
            Err(WootError::InvalidConversation(0))
        );
        assert_eq!(
            ConversationId::try_from(-5),
            Err(WootError::InvalidConversation(-5))
        );
    }

    #[test]
    fn test_globals_order_and_names() {
        let payload = BridgePayloadBuilder::build(&config(), ConversationId::new(3).unwrap());
        let names: Vec<&str> = payload.globals().into_iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec![
                "__WOOT_ISOLATED_SHELL__",
                "__WOOT_ACCOUNT_ID__",
                "__WOOT_API_HOST__",
                "__WOOT_ACCESS_TOKEN__",
                "__PUBSUB_TOKEN__",
                "__WEBSOCKET_URL__",
                "__WOOT_CONVERSATION_ID__",
            ]
        );
    }

    #[test]
    fn test_script_assigns_globals_and_dispatches_event() {
        let script =
            BridgePayloadBuilder::build(&config(), ConversationId::new(3).unwrap()).to_script();
        assert!(script.contains("window.__WOOT_ISOLATED_SHELL__ = true;"));
        assert!(script.contains("window.__WOOT_ACCOUNT_ID__ = 42;"));
        assert!(script.contains("window.__WOOT_API_HOST__ = \"https://example.com\";"));
        assert!(script.contains("window.__WOOT_CONVERSATION_ID__ = 3;"));
        assert!(script.contains("new CustomEvent(\"chatwootConfigLoaded\""));
        assert!(script.contains("\"conversationId\":3"));
    }

    #[test]
    fn test_script_escapes_hostile_values() {
        let config = config_with(
            "a'b\"c</script><script>alert(1)</script>\u{2028}",
            "https://x.io",
        );
        let script =
            BridgePayloadBuilder::build(&config, ConversationId::new(1).unwrap()).to_script();

        assert!(!script.contains("</script>"));
        assert!(!script.contains('\u{2028}'));
        assert!(script.contains("\\u003c/script\\u003e"));
        assert!(script.contains("a'b\\\"c"));
        assert!(script.contains("\\u2028"));
    }

    #[test]
    fn test_message_round_trips_detail() {
        let payload = BridgePayloadBuilder::build(&config(), ConversationId::new(3).unwrap());
        let message: Value = serde_json::from_str(&payload.to_message()).unwrap();
        assert_eq!(message["type"], "chatwootConfigLoaded");
        assert_eq!(message["detail"]["accountId"], 42);
        assert_eq!(message["detail"]["accessToken"], "access-token");
        assert_eq!(message["detail"]["isolatedShell"], true);
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let config = config_with("super-secret-token-9999", "https://example.com");
        let payload = BridgePayloadBuilder::build(&config, ConversationId::new(3).unwrap());
        let rendered = format!("{payload:?}");
        assert!(!rendered.contains("super-secret-token-9999"));
        assert!(rendered.contains("***9999"));
    }

    #[test]
    fn test_close_event_script() {
        assert_eq!(
            close_event_script(),
            "window.dispatchEvent(new CustomEvent(\"chatwootClose\"));"
        );
    }
}
