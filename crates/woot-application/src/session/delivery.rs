use std::fmt;
use uuid::Uuid;
use woot_core::payload::BridgePayload;
use woot_core::session::EmbeddedRuntime;

/// The lifecycle point a delivery happens at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionTrigger {
    /// First delivery when a chat is opened
    InitialLoad,
    /// The runtime reported that the page finished loading
    RuntimeReady,
    /// The page was reloaded and lost its globals
    PageReloaded,
    /// Timer scheduled after a ready/reload signal
    Deferred,
}

impl fmt::Display for InjectionTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InitialLoad => "initial_load",
            Self::RuntimeReady => "runtime_ready",
            Self::PageReloaded => "page_reloaded",
            Self::Deferred => "deferred",
        };
        f.write_str(name)
    }
}

/// Hands the payload to the runtime. Failures are logged and swallowed;
/// the session state never depends on a delivery succeeding.
pub(crate) fn deliver(
    runtime: &dyn EmbeddedRuntime,
    session_id: Uuid,
    payload: &BridgePayload,
    trigger: InjectionTrigger,
) -> bool {
    match runtime.inject(payload) {
        Ok(()) => {
            tracing::debug!(
                session_id = %session_id,
                conversation_id = payload.conversation_id,
                trigger = %trigger,
                "[Session] Payload delivered"
            );
            true
        }
        Err(e) => {
            tracing::warn!(
                session_id = %session_id,
                trigger = %trigger,
                "[Session] Injection failed: {}",
                e
            );
            false
        }
    }
}
